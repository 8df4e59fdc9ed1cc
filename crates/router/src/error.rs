use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouterError>;

/// Tag carried by every error message produced by the router, so callers can
/// tell routing failures apart from execution engine failures.
pub const ERROR_PREFIX: &str = "[tenant-router]";

#[derive(Debug, Clone, Error)]
pub enum RouterError {
    #[error("[tenant-router] {0}")]
    Configuration(String),

    #[error("[tenant-router] tenant field `{field}` must hold a string, found {found}")]
    TypeMismatch { field: String, found: String },

    #[error("[tenant-router] batch spans multiple tenants ({first} and {second})")]
    Consistency { first: String, second: String },

    #[error("[tenant-router] connection for tenant {tenant} failed: {cause}")]
    Connection {
        tenant: String,
        cause: Arc<anyhow::Error>,
    },

    #[error("[tenant-router] provisioning {table} for tenant {tenant} failed: {cause}")]
    Provisioning {
        tenant: String,
        table: String,
        cause: Arc<anyhow::Error>,
    },
}

impl RouterError {
    pub fn missing_predicate(table: &str) -> Self {
        Self::Configuration(format!("no filter predicate on {} operation", table))
    }

    pub fn missing_tenant() -> Self {
        Self::Configuration("no tenant identifier detected".to_string())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
