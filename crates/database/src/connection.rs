use crate::error::{DatabaseError, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tenancy_router::{ConnectionConfig, OperationContext};

/// The default database. Operations the router leaves unbound run here.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connects to `url`, sizing the pool like the tenant pools
    pub async fn connect(url: &str, config: &ConnectionConfig) -> Result<Self> {
        let options: PgConnectOptions = url
            .parse()
            .map_err(|e| DatabaseError::Other(format!("Invalid database URL: {}", e)))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Pool an intercepted operation must execute on.
    ///
    /// Fails with the recorded routing error if the router aborted the operation.
    pub fn pool_for<'a>(&'a self, ctx: &'a OperationContext<PgPool>) -> Result<&'a PgPool> {
        ctx.check()?;
        Ok(ctx.target().unwrap_or(&self.pool))
    }
}
