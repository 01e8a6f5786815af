//! Name-keyed method table for building services.
//!
//! Services that expose a fixed set of methods can declare them once on a
//! [`MethodRegistry`] and forward both [`Service::dispatch`] and
//! [`Service::method_list`] to it.
//!
//! [`Service::dispatch`]: crate::Service::dispatch
//! [`Service::method_list`]: crate::Service::method_list

use std::collections::HashMap;
use std::fmt;

use serde_json::{Number, Value};

use fgp_daemon_types::{MethodDescriptor, Params};

use crate::service::ServiceError;

type Handler<S> = Box<dyn Fn(&S, &Params) -> Result<Value, ServiceError> + Send + Sync>;

struct RegisteredMethod<S> {
    descriptor: MethodDescriptor,
    handler: Handler<S>,
}

/// Ordered collection of method handlers over a service state `S`.
pub struct MethodRegistry<S> {
    methods: Vec<RegisteredMethod<S>>,
    index: HashMap<String, usize>,
}

impl<S> MethodRegistry<S> {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Registers `handler` under the descriptor's name.
    ///
    /// Registering a name twice replaces the earlier handler and keeps its
    /// position in the listing.
    #[must_use]
    pub fn register<F>(mut self, descriptor: MethodDescriptor, handler: F) -> Self
    where
        F: Fn(&S, &Params) -> Result<Value, ServiceError> + Send + Sync + 'static,
    {
        let entry = RegisteredMethod {
            descriptor,
            handler: Box::new(handler),
        };
        match self.index.get(&entry.descriptor.name).copied() {
            Some(position) => {
                if let Some(slot) = self.methods.get_mut(position) {
                    *slot = entry;
                }
            }
            None => {
                self.index
                    .insert(entry.descriptor.name.clone(), self.methods.len());
                self.methods.push(entry);
            }
        }
        self
    }

    /// Invokes the handler registered for `method`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::MethodNotFound`] when nothing is registered
    /// under `method`, or whatever the handler itself returns.
    pub fn dispatch(&self, state: &S, method: &str, params: &Params) -> Result<Value, ServiceError> {
        let entry = self
            .index
            .get(method)
            .and_then(|position| self.methods.get(*position))
            .ok_or_else(|| ServiceError::method_not_found(method))?;
        (entry.handler)(state, params)
    }

    /// Descriptors in registration order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<MethodDescriptor> {
        self.methods
            .iter()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    /// Returns `true` when `method` has a handler.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.index.contains_key(method)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns `true` when no methods are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<S> Default for MethodRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for MethodRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.methods.iter().map(|entry| &entry.descriptor.name))
            .finish()
    }
}

/// Reads an optional string parameter, falling back to `default`.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidParams`] when the value is present but not
/// a string.
pub fn str_or<'a>(params: &'a Params, name: &str, default: &'a str) -> Result<&'a str, ServiceError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(type_mismatch(name, "string", other)),
    }
}

/// Reads a required string parameter.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidParams`] when the value is missing or not a
/// string.
pub fn require_str<'a>(params: &'a Params, name: &str) -> Result<&'a str, ServiceError> {
    match params.get(name) {
        Some(Value::String(text)) => Ok(text),
        None | Some(Value::Null) => Err(ServiceError::invalid_params(format!(
            "missing required parameter '{name}'"
        ))),
        Some(other) => Err(type_mismatch(name, "string", other)),
    }
}

/// Reads an optional numeric parameter, falling back to `default`.
///
/// # Errors
///
/// Returns [`ServiceError::InvalidParams`] when the value is present but not
/// a number.
pub fn number_or(params: &Params, name: &str, default: Number) -> Result<Number, ServiceError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(number)) => Ok(number.clone()),
        Some(other) => Err(type_mismatch(name, "number", other)),
    }
}

fn type_mismatch(name: &str, expected: &str, found: &Value) -> ServiceError {
    ServiceError::invalid_params(format!(
        "parameter '{name}' must be a {expected}, got {}",
        json_type_name(found)
    ))
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    struct Counter {
        base: i64,
    }

    #[fixture]
    fn registry() -> MethodRegistry<Counter> {
        MethodRegistry::<Counter>::new()
            .register(MethodDescriptor::new("counter.base", "Base value"), |state, _| {
                Ok(json!(state.base))
            })
            .register(MethodDescriptor::new("counter.plus", "Adds n"), |state, params| {
                let n = number_or(params, "n", Number::from(0))?;
                let n = n
                    .as_i64()
                    .ok_or_else(|| ServiceError::invalid_params("n must be an integer"))?;
                Ok(json!(state.base + n))
            })
    }

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => Params::new(),
        }
    }

    #[rstest]
    fn dispatches_to_registered_handler(registry: MethodRegistry<Counter>) {
        let state = Counter { base: 40 };
        let value = registry
            .dispatch(&state, "counter.plus", &params(json!({"n": 2})))
            .expect("dispatch");
        assert_eq!(value, json!(42));
    }

    #[rstest]
    fn unknown_method_is_reported(registry: MethodRegistry<Counter>) {
        let state = Counter { base: 0 };
        let error = registry
            .dispatch(&state, "counter.minus", &Params::new())
            .expect_err("unknown method");
        assert!(matches!(error, ServiceError::MethodNotFound { method } if method == "counter.minus"));
    }

    #[rstest]
    fn descriptors_keep_registration_order(registry: MethodRegistry<Counter>) {
        let names: Vec<_> = registry
            .descriptors()
            .into_iter()
            .map(|descriptor| descriptor.name)
            .collect();
        assert_eq!(names, ["counter.base", "counter.plus"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("counter.base"));
    }

    #[rstest]
    fn re_registration_replaces_in_place(registry: MethodRegistry<Counter>) {
        let registry = registry.register(
            MethodDescriptor::new("counter.base", "Doubled base"),
            |state, _| Ok(json!(state.base * 2)),
        );
        let state = Counter { base: 5 };
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.dispatch(&state, "counter.base", &Params::new()).expect("dispatch"),
            json!(10)
        );
        let first = registry.descriptors().into_iter().next().expect("descriptor");
        assert_eq!(first.description, "Doubled base");
    }

    #[rstest]
    #[case(json!({}), Ok("fallback"))]
    #[case(json!({"text": null}), Ok("fallback"))]
    #[case(json!({"text": "abc"}), Ok("abc"))]
    fn str_or_accepts_strings_and_absence(
        #[case] raw: Value,
        #[case] expected: Result<&str, ()>,
    ) {
        let params = params(raw);
        let actual = str_or(&params, "text", "fallback").map_err(|_| ());
        assert_eq!(actual, expected);
    }

    #[test]
    fn str_or_rejects_other_types() {
        let params = params(json!({"text": 7}));
        let error = str_or(&params, "text", "").expect_err("type mismatch");
        assert_eq!(
            error.to_string(),
            "invalid params: parameter 'text' must be a string, got number"
        );
    }

    #[test]
    fn require_str_reports_missing_values() {
        let error = require_str(&Params::new(), "path").expect_err("missing");
        assert_eq!(
            error.to_string(),
            "invalid params: missing required parameter 'path'"
        );
    }

    #[test]
    fn number_or_rejects_strings() {
        let params = params(json!({"a": "1"}));
        let error = number_or(&params, "a", Number::from(0)).expect_err("type mismatch");
        assert!(matches!(error, ServiceError::InvalidParams { .. }));
    }
}
