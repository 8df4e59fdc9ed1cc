//! PostgreSQL tenant connections.
//!
//! Every tenant gets its own `PgPool` pointing at its dedicated database. The
//! router caches the pool, so the factory runs once per tenant.

use crate::error::{DatabaseError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tenancy_router::{ConnectionConfig, ConnectionFactory, TenantId};

/// Creates a connection pool per tenant database
#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnectionFactory;

impl PgConnectionFactory {
    pub fn new() -> Self {
        Self
    }

    /// Connect options for a tenant database
    pub fn connect_options(&self, tenant: &TenantId, config: &ConnectionConfig) -> Result<PgConnectOptions> {
        config.connection_url(tenant).parse().map_err(|e| {
            DatabaseError::Other(format!("Invalid database URL for tenant {}: {}", tenant, e))
        })
    }

    pub async fn connect(&self, tenant: &TenantId, config: &ConnectionConfig) -> Result<PgPool> {
        let options = self.connect_options(tenant, config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .connect_with(options)
            .await
            .map_err(|e| {
                DatabaseError::ConnectionFailed(format!(
                    "Failed to connect to tenant {} database: {}",
                    tenant, e
                ))
            })?;

        tracing::info!(
            tenant = %tenant,
            database = %config.database_name(tenant),
            "Created connection pool for tenant"
        );

        Ok(pool)
    }
}

#[async_trait]
impl ConnectionFactory<PgPool> for PgConnectionFactory {
    async fn create_connection(
        &self,
        tenant: &TenantId,
        config: &ConnectionConfig,
    ) -> anyhow::Result<PgPool> {
        Ok(self.connect(tenant, config).await?)
    }
}
