use crate::error::{Result, RouterError};
use crate::registry::IsolationDescriptor;
use crate::tenant::TenantId;
use moka::future::Cache;

/// At-most-once schema provisioning per (tenant, table) pair.
///
/// The ledger is unbounded and never expires entries. Concurrent callers for a
/// pair that is not yet provisioned wait on one provisioning run; a failed run
/// leaves the pair unmarked so the next operation retries.
#[derive(Clone)]
pub struct MigrationTracker {
    ledger: Cache<(TenantId, String), ()>,
}

impl Default for MigrationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationTracker {
    pub fn new() -> Self {
        Self {
            ledger: Cache::builder().build(),
        }
    }

    pub async fn ensure_provisioned<C>(
        &self,
        tenant: &TenantId,
        table: &str,
        descriptor: &IsolationDescriptor<C>,
        connection: &C,
    ) -> Result<()> {
        let entry = self
            .ledger
            .entry((tenant.clone(), table.to_string()))
            .or_try_insert_with(async {
                descriptor.model.provision(connection, table).await
            })
            .await
            .map_err(|cause| RouterError::Provisioning {
                tenant: tenant.to_string(),
                table: table.to_string(),
                cause,
            })?;

        if entry.is_fresh() {
            tracing::info!(tenant = %tenant, table = %table, "Provisioned tenant table");
        }
        Ok(())
    }

    pub fn is_provisioned(&self, tenant: &TenantId, table: &str) -> bool {
        self.ledger.contains_key(&(tenant.clone(), table.to_string()))
    }

    pub async fn provisioned_pairs(&self) -> u64 {
        self.ledger.run_pending_tasks().await;
        self.ledger.entry_count()
    }
}
