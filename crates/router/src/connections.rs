use crate::config::{ConnectionConfig, TenantRouterConfig};
use crate::error::{Result, RouterError};
use crate::model::ConnectionFactory;
use crate::tenant::TenantId;
use moka::future::Cache;
use std::sync::Arc;

/// Maps tenants to their dedicated connection handles.
///
/// Connections are created on first use through the [`ConnectionFactory`] and
/// cached. Concurrent first requests for one tenant share a single factory
/// call; requests for other tenants are not blocked by it.
pub struct ConnectionRouter<C> {
    factory: Arc<dyn ConnectionFactory<C>>,
    config: ConnectionConfig,
    cache: Cache<TenantId, C>,
}

impl<C: Clone + Send + Sync + 'static> Clone for ConnectionRouter<C> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            config: self.config.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<C: Clone + Send + Sync + 'static> ConnectionRouter<C> {
    pub fn new(factory: Arc<dyn ConnectionFactory<C>>, config: &TenantRouterConfig) -> Self {
        let mut builder = Cache::builder();
        if let Some(max) = config.max_cached_connections {
            builder = builder.max_capacity(max);
        }
        if let Some(ttl) = config.connection_ttl() {
            builder = builder.time_to_live(ttl);
        }

        Self {
            factory,
            config: config.connection.clone(),
            cache: builder.build(),
        }
    }

    /// Connection for a raw tenant id; blank ids are rejected.
    pub async fn resolve(&self, tenant_id: &str) -> Result<C> {
        let tenant = TenantId::parse(tenant_id).ok_or_else(RouterError::missing_tenant)?;
        self.get(&tenant).await
    }

    /// Cached connection for `tenant`, created on a miss.
    ///
    /// Factory failures are returned and nothing is cached, so the next call
    /// dials again.
    pub async fn get(&self, tenant: &TenantId) -> Result<C> {
        let entry = self
            .cache
            .entry_by_ref(tenant)
            .or_try_insert_with(self.factory.create_connection(tenant, &self.config))
            .await
            .map_err(|cause| RouterError::Connection {
                tenant: tenant.to_string(),
                cause,
            })?;

        if entry.is_fresh() {
            tracing::info!(tenant = %tenant, "Created tenant connection");
        } else {
            tracing::debug!(tenant = %tenant, "Reusing cached tenant connection");
        }

        Ok(entry.into_value())
    }

    /// Register a connection created out of band, bypassing the factory.
    pub async fn add_preconfigured(&self, tenant: TenantId, connection: C) {
        tracing::info!(tenant = %tenant, "Added preconfigured tenant connection");
        self.cache.insert(tenant, connection).await;
    }

    pub async fn evict(&self, tenant: &TenantId) {
        self.cache.invalidate(tenant).await;
        tracing::info!(tenant = %tenant, "Evicted tenant connection");
    }

    pub fn contains(&self, tenant: &TenantId) -> bool {
        self.cache.contains_key(tenant)
    }

    pub async fn cached_connections(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tenant, FakeConnection, FakeFactory};
    use std::time::Duration;

    fn router(factory: Arc<FakeFactory>) -> ConnectionRouter<FakeConnection> {
        ConnectionRouter::<FakeConnection>::new(factory, &TenantRouterConfig::default())
    }

    #[tokio::test]
    async fn test_resolve_caches_connection() {
        let factory = FakeFactory::new();
        let router = router(factory.clone());

        let first = router.resolve("t1").await.unwrap();
        let second = router.resolve(" t1 ").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.tenant, "t1");
        assert_eq!(factory.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_rejects_blank_tenant() {
        let factory = FakeFactory::new();
        let router = router(factory.clone());

        let err = router.resolve("   ").await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "[tenant-router] no tenant identifier detected");
        assert_eq!(factory.calls(), 0);
    }

    #[tokio::test]
    async fn test_factory_failure_is_not_cached() {
        let factory = FakeFactory::failing(1);
        let router = router(factory.clone());

        let err = router.resolve("t1").await.unwrap_err();
        assert!(matches!(err, RouterError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
        assert!(!router.contains(&tenant("t1")));

        let conn = router.resolve("t1").await.unwrap();
        assert_eq!(conn.serial, 1);
        assert_eq!(factory.calls(), 2);
    }

    #[tokio::test]
    async fn test_preconfigured_connection_bypasses_factory() {
        let factory = FakeFactory::new();
        let router = router(factory.clone());
        let preset = FakeConnection {
            tenant: "t1".to_string(),
            serial: 99,
        };

        router.add_preconfigured(tenant("t1"), preset.clone()).await;

        assert_eq!(router.resolve("t1").await.unwrap(), preset);
        assert_eq!(factory.calls(), 0);
    }

    #[tokio::test]
    async fn test_evict_forces_new_connection() {
        let factory = FakeFactory::new();
        let router = router(factory.clone());

        router.resolve("t1").await.unwrap();
        router.evict(&tenant("t1")).await;
        let conn = router.resolve("t1").await.unwrap();

        assert_eq!(conn.serial, 1);
        assert_eq!(factory.calls(), 2);
        assert_eq!(router.cached_connections().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_resolve_dials_once() {
        let factory = FakeFactory::slow(Duration::from_millis(50));
        let router = router(factory.clone());

        let a = tokio::spawn({
            let router = router.clone();
            async move { router.resolve("t2").await }
        });
        let b = tokio::spawn({
            let router = router.clone();
            async move { router.resolve("t2").await }
        });

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(factory.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_tenant_does_not_block_others() {
        let factory = FakeFactory::slow(Duration::from_millis(300));
        let router = router(factory.clone());
        router
            .add_preconfigured(
                tenant("fast"),
                FakeConnection {
                    tenant: "fast".to_string(),
                    serial: 7,
                },
            )
            .await;

        let slow = tokio::spawn({
            let router = router.clone();
            async move { router.resolve("slow").await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let fast = tokio::time::timeout(Duration::from_millis(100), router.resolve("fast"))
            .await
            .expect("fast tenant waited on slow tenant")
            .unwrap();
        assert_eq!(fast.serial, 7);
        assert!(slow.await.unwrap().is_ok());
    }
}
