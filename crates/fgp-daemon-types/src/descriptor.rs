//! Self-reported identity and documentation of a hosted service.

use serde::{Deserialize, Serialize};

/// Static identity of a loaded service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name, also used to derive the conventional socket path.
    pub name: String,
    /// Service version, conventionally semver.
    pub version: String,
}

impl ServiceDescriptor {
    /// Builds a descriptor from a name and version.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Documentation for a single method exposed by a service.
///
/// Descriptors are informational only; the daemon never validates requests
/// against them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Fully-qualified method name, for example `echo.ping`.
    pub name: String,
    /// Human-readable summary.
    pub description: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub params: Vec<ParamInfo>,
}

impl MethodDescriptor {
    /// Builds a descriptor without parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Appends a parameter description.
    #[must_use]
    pub fn with_param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }
}

/// Description of one method parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamInfo {
    /// Parameter name as it appears in the `params` object.
    pub name: String,
    /// Informal type label such as `string` or `number`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether callers must supply the parameter.
    #[serde(default)]
    pub required: bool,
}

impl ParamInfo {
    /// Describes a mandatory parameter.
    #[must_use]
    pub fn required(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            required: true,
        }
    }

    /// Describes an optional parameter.
    #[must_use]
    pub fn optional(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            required: false,
        }
    }
}
