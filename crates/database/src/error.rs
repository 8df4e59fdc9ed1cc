use tenancy_router::RouterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Provisioning failed: {0}")]
    ProvisioningFailed(String),

    #[error(transparent)]
    Routing(#[from] RouterError),

    #[error("Database error: {0}")]
    Other(String),
}
