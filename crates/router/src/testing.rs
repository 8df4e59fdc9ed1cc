//! In-memory collaborators shared by the unit tests.

use crate::config::ConnectionConfig;
use crate::model::{ConnectionFactory, Model};
use crate::tenant::TenantId;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeConnection {
    pub tenant: String,
    pub serial: usize,
}

#[derive(Default)]
pub struct FakeFactory {
    pub calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn failing(times: usize) -> Arc<Self> {
        Arc::new(Self {
            failures_left: AtomicUsize::new(times),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory<FakeConnection> for FakeFactory {
    async fn create_connection(
        &self,
        tenant: &TenantId,
        _config: &ConnectionConfig,
    ) -> anyhow::Result<FakeConnection> {
        let serial = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("dial tcp {}: connection refused", tenant);
        }
        Ok(FakeConnection {
            tenant: tenant.to_string(),
            serial,
        })
    }
}

pub struct FakeModel {
    table: String,
    isolated: bool,
    pub provisions: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeModel {
    pub fn isolated(table: &str) -> Arc<Self> {
        Arc::new(Self::build(table, true, 0, None))
    }

    pub fn shared(table: &str) -> Arc<Self> {
        Arc::new(Self::build(table, false, 0, None))
    }

    pub fn failing(table: &str, times: usize) -> Arc<Self> {
        Arc::new(Self::build(table, true, times, None))
    }

    pub fn slow(table: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self::build(table, true, 0, Some(delay)))
    }

    fn build(table: &str, isolated: bool, failures: usize, delay: Option<Duration>) -> Self {
        Self {
            table: table.to_string(),
            isolated,
            provisions: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(failures),
            delay,
        }
    }

    pub fn provisions(&self) -> usize {
        self.provisions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Model<FakeConnection> for FakeModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn is_tenant_isolated(&self) -> bool {
        self.isolated
    }

    async fn provision(&self, connection: &FakeConnection, table: &str) -> anyhow::Result<()> {
        self.provisions.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("cannot create {} on {}", table, connection.tenant);
        }
        Ok(())
    }
}

pub fn tenant(id: &str) -> TenantId {
    TenantId::parse(id).expect("non-empty tenant id")
}
