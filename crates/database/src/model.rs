use crate::error::{DatabaseError, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tenancy_router::Model;

/// Model provisioned from a DDL template.
///
/// `{table}` in the template is replaced by the quoted table name, e.g.
/// `CREATE TABLE IF NOT EXISTS {table} (id BIGSERIAL PRIMARY KEY, tenant_id TEXT NOT NULL)`.
#[derive(Debug, Clone)]
pub struct SqlTableModel {
    table: String,
    isolated: bool,
    tenant_field: Option<String>,
    ddl: String,
}

impl SqlTableModel {
    pub fn isolated(table: impl Into<String>, ddl: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            isolated: true,
            tenant_field: None,
            ddl: ddl.into(),
        }
    }

    pub fn shared(table: impl Into<String>, ddl: impl Into<String>) -> Self {
        Self {
            isolated: false,
            ..Self::isolated(table, ddl)
        }
    }

    pub fn with_tenant_field(mut self, field: impl Into<String>) -> Self {
        self.tenant_field = Some(field.into());
        self
    }

    pub fn create_table_sql(&self, table: &str) -> String {
        self.ddl.replace("{table}", &quote_identifier(table))
    }

    /// Runs the DDL for `table` on a tenant pool
    pub async fn create_table(&self, connection: &PgPool, table: &str) -> Result<()> {
        let sql = self.create_table_sql(table);
        sqlx::raw_sql(&sql)
            .execute(connection)
            .await
            .map_err(|e| provisioning_failed(table, e))?;
        tracing::debug!(table = %table, "Executed table DDL");
        Ok(())
    }
}

fn provisioning_failed(table: &str, err: sqlx::Error) -> DatabaseError {
    DatabaseError::ProvisioningFailed(format!("Failed to create table {}: {}", table, err))
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl Model<PgPool> for SqlTableModel {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn is_tenant_isolated(&self) -> bool {
        self.isolated
    }

    fn tenant_field(&self) -> Option<&str> {
        self.tenant_field.as_deref()
    }

    async fn provision(&self, connection: &PgPool, table: &str) -> anyhow::Result<()> {
        Ok(self.create_table(connection, table).await?)
    }
}
