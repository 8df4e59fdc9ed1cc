use crate::config::ConnectionConfig;
use crate::tenant::TenantId;
use async_trait::async_trait;

/// Capability implemented once per entity type that the router may isolate.
#[async_trait]
pub trait Model<C>: Send + Sync {
    /// Canonical table name of the entity type
    fn table_name(&self) -> &str;

    /// Whether rows of this type live in per-tenant stores
    fn is_tenant_isolated(&self) -> bool;

    /// Overrides the router-wide tenant field for this type.
    fn tenant_field(&self) -> Option<&str> {
        None
    }

    /// Ensure `table` exists on the tenant connection.
    async fn provision(&self, connection: &C, table: &str) -> anyhow::Result<()>;
}

/// Creates the dedicated connection for a tenant on first use.
#[async_trait]
pub trait ConnectionFactory<C>: Send + Sync {
    async fn create_connection(
        &self,
        tenant: &TenantId,
        config: &ConnectionConfig,
    ) -> anyhow::Result<C>;
}
