//! Sample service bundled with the `fgpd` binary.
//!
//! `echo` exists to exercise the host end to end: it keeps a request counter,
//! reflects its input, and fails on demand.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Number, Value, json};
use tracing::info;

use fgp_daemon_types::{
    HealthEntry, HealthReport, MethodDescriptor, ParamInfo, Params, ServiceDescriptor,
};

use crate::registry::{MethodRegistry, number_or, str_or};
use crate::service::{Capabilities, Service, ServiceError};

const ECHO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::echo");

/// Service name, and therefore the socket directory name.
pub const ECHO_SERVICE_NAME: &str = "echo";
/// Reported service version.
pub const ECHO_SERVICE_VERSION: &str = "1.0.0";

/// Echo service state.
#[derive(Debug)]
pub struct EchoService {
    requests: AtomicU64,
    methods: MethodRegistry<Self>,
}

impl EchoService {
    /// Builds the service with its method table.
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches [`crate::ServiceFactory`].
    pub fn create() -> Result<Self, ServiceError> {
        Ok(Self {
            requests: AtomicU64::new(0),
            methods: Self::methods(),
        })
    }

    /// Number of requests dispatched so far.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    fn methods() -> MethodRegistry<Self> {
        MethodRegistry::<Self>::new()
            .register(
                MethodDescriptor::new("echo.ping", "Simple health check, returns pong"),
                |service: &Self, _params| Ok(json!({"pong": true, "count": service.requests()})),
            )
            .register(
                MethodDescriptor::new("echo.echo", "Echo back the input parameters")
                    .with_param(ParamInfo::optional("any", "object")),
                |_service, params| Ok(json!({"echo": params})),
            )
            .register(
                MethodDescriptor::new("echo.reverse", "Reverse a text string")
                    .with_param(ParamInfo::required("text", "string")),
                |_service, params| {
                    let text = str_or(params, "text", "")?;
                    Ok(json!({"reversed": text.chars().rev().collect::<String>()}))
                },
            )
            .register(
                MethodDescriptor::new("echo.add", "Add two numbers")
                    .with_param(ParamInfo::required("a", "number"))
                    .with_param(ParamInfo::required("b", "number")),
                |_service, params| {
                    let a = number_or(params, "a", Number::from(0))?;
                    let b = number_or(params, "b", Number::from(0))?;
                    Ok(json!({"result": add(&a, &b)?}))
                },
            )
            .register(
                MethodDescriptor::new("echo.error", "Test error handling"),
                |_service, _params| Err(ServiceError::failed("This is a test error")),
            )
    }
}

/// Integer sum when both operands are integers, float sum otherwise.
fn add(a: &Number, b: &Number) -> Result<Value, ServiceError> {
    if let (Some(left), Some(right)) = (a.as_i64(), b.as_i64()) {
        return left
            .checked_add(right)
            .map(Value::from)
            .ok_or_else(|| ServiceError::invalid_params("integer sum overflows"));
    }
    let (Some(left), Some(right)) = (a.as_f64(), b.as_f64()) else {
        return Err(ServiceError::invalid_params("operands are not representable"));
    };
    Number::from_f64(left + right)
        .map(Value::Number)
        .ok_or_else(|| ServiceError::invalid_params("sum is not a finite number"))
}

impl Service for EchoService {
    fn descriptor(&self) -> ServiceDescriptor {
        ServiceDescriptor::new(ECHO_SERVICE_NAME, ECHO_SERVICE_VERSION)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::full()
    }

    fn dispatch(&self, method: &str, params: &Params) -> Result<Value, ServiceError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.methods.dispatch(self, method, params)
    }

    fn method_list(&self) -> Vec<MethodDescriptor> {
        self.methods.descriptors()
    }

    fn on_start(&self) -> Result<(), ServiceError> {
        info!(target: ECHO_TARGET, "echo service starting");
        Ok(())
    }

    fn on_stop(&self) -> Result<(), ServiceError> {
        info!(
            target: ECHO_TARGET,
            requests = self.requests(),
            "echo service stopping"
        );
        Ok(())
    }

    fn health_check(&self) -> Result<HealthReport, ServiceError> {
        let entry = HealthEntry::healthy().with_message(format!(
            "Handled {} requests",
            self.requests()
        ));
        Ok(HealthReport::from([(ECHO_SERVICE_NAME.to_owned(), entry)]))
    }
}
