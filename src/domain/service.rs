//! Static service descriptor for health checks.

use serde::{Deserialize, Serialize};

/// Service name reported by the health surface
pub const SERVICE_NAME: &str = "opsdesk";

/// What this service is and which model backs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub service: String,
    pub version: String,
    pub model: String,
}

impl ServiceDescriptor {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            model: model.into(),
        }
    }
}
