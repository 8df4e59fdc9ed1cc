//! Tenant Router
//!
//! Entry point invoked before every data operation. For operations on
//! tenant-isolated tables it resolves the tenant, rebinds the operation to the
//! tenant's dedicated connection and makes sure the table exists there.
//!
//! ```text
//! intercept(ctx)
//!   ├─ ctx already failed?          → return
//!   ├─ IsolationRegistry::lookup    → not isolated: default connection
//!   ├─ TenantResolver::resolve      → entity values | predicate | pre-bound
//!   ├─ ConnectionRouter::get        → cached or freshly created connection
//!   └─ MigrationTracker::ensure     → provision (tenant, table) once
//! ```

use crate::config::TenantRouterConfig;
use crate::connections::ConnectionRouter;
use crate::context::{OperationContext, OperationKind};
use crate::error::{Result, RouterError};
use crate::migration::MigrationTracker;
use crate::model::{ConnectionFactory, Model};
use crate::registry::IsolationRegistry;
use crate::resolver::TenantResolver;
use crate::tenant::TenantId;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Hook the execution engine calls before running an operation.
#[async_trait]
pub trait OperationInterceptor<C>: Send + Sync {
    /// Routes the operation or records a failure on it.
    async fn intercept(&self, ctx: &mut OperationContext<C>);
}

pub struct TenantRouter<C> {
    config: TenantRouterConfig,
    registry: Arc<IsolationRegistry<C>>,
    resolver: TenantResolver,
    connections: ConnectionRouter<C>,
    migrations: MigrationTracker,
}

impl<C: Clone + Send + Sync + 'static> Clone for TenantRouter<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            registry: Arc::clone(&self.registry),
            resolver: self.resolver,
            connections: self.connections.clone(),
            migrations: self.migrations.clone(),
        }
    }
}

impl<C: Clone + Send + Sync + 'static> TenantRouter<C> {
    pub const NAME: &'static str = "tenant-router";

    /// Create a router with the given configuration and connection factory
    pub fn new(config: TenantRouterConfig, factory: Arc<dyn ConnectionFactory<C>>) -> Self {
        let connections = ConnectionRouter::new(factory, &config);
        Self {
            registry: Arc::new(IsolationRegistry::new(config.tenant_field.clone())),
            resolver: TenantResolver,
            connections,
            migrations: MigrationTracker::new(),
            config,
        }
    }

    /// Create a router keyed on `tenant_field` with default settings
    pub fn register(tenant_field: impl Into<String>, factory: Arc<dyn ConnectionFactory<C>>) -> Self {
        Self::new(TenantRouterConfig::new(tenant_field), factory)
    }

    pub fn config(&self) -> &TenantRouterConfig {
        &self.config
    }

    pub fn registry(&self) -> &IsolationRegistry<C> {
        &self.registry
    }

    /// Declare which models are tenant-isolated.
    pub fn set_isolation<I>(&self, models: I)
    where
        I: IntoIterator<Item = Arc<dyn Model<C>>>,
    {
        self.registry.register(models);
    }

    /// Pre-register a tenant connection, bypassing the factory.
    pub async fn add_connection(&self, tenant: TenantId, connection: C) {
        self.connections.add_preconfigured(tenant, connection).await;
    }

    /// Connection for a tenant, created if needed
    pub async fn connection(&self, tenant_id: &str) -> Result<C> {
        self.connections.resolve(tenant_id).await
    }

    /// Drop a tenant's cached connection. Provisioned tables stay recorded.
    pub async fn evict(&self, tenant: &TenantId) {
        self.connections.evict(tenant).await;
    }

    pub fn is_provisioned(&self, tenant: &TenantId, table: &str) -> bool {
        self.migrations.is_provisioned(tenant, table)
    }

    pub async fn stats(&self) -> TenantRouterStats {
        TenantRouterStats {
            cached_connections: self.connections.cached_connections().await,
            registered_tables: self.registry.len(),
            provisioned_pairs: self.migrations.provisioned_pairs().await,
        }
    }

    /// Route `ctx`, recording any failure on it.
    pub async fn intercept(&self, ctx: &mut OperationContext<C>) {
        if ctx.is_aborted() {
            return;
        }
        if let Err(err) = self.route(ctx).await {
            tracing::warn!(
                table = %ctx.table(),
                kind = %ctx.kind(),
                error = %err,
                "Operation aborted by tenant router"
            );
            ctx.fail(err);
        }
    }

    async fn route(&self, ctx: &mut OperationContext<C>) -> Result<()> {
        let candidates = std::iter::once(ctx.table()).chain(ctx.model_table());
        let Some(descriptor) = self.registry.lookup_isolated(candidates) else {
            tracing::debug!(table = %ctx.table(), kind = %ctx.kind(), "Table not isolated");
            return Ok(());
        };

        if matches!(ctx.kind(), OperationKind::Row | OperationKind::Raw)
            && ctx.bound_tenant().is_none()
        {
            tracing::debug!(
                table = %ctx.table(),
                kind = %ctx.kind(),
                "No tenant bound, using default connection"
            );
            return Ok(());
        }

        let tenant = self
            .resolver
            .resolve(ctx, &descriptor.tenant_field)?
            .ok_or_else(RouterError::missing_tenant)?;

        let connection = self.connections.get(&tenant).await?;
        let table = ctx.table().to_string();
        ctx.bind_target(tenant.clone(), connection.clone());

        self.migrations
            .ensure_provisioned(&tenant, &table, &descriptor, &connection)
            .await
    }
}

#[async_trait]
impl<C: Clone + Send + Sync + 'static> OperationInterceptor<C> for TenantRouter<C> {
    async fn intercept(&self, ctx: &mut OperationContext<C>) {
        TenantRouter::intercept(self, ctx).await
    }
}

/// Router statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantRouterStats {
    pub cached_connections: u64,
    pub registered_tables: usize,
    pub provisioned_pairs: u64,
}
