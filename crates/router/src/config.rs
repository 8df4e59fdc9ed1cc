use crate::tenant::TenantId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings handed to the connection factory when a tenant connection is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Optional URL template. Supported placeholders: `{tenant}`, `{database}`,
    /// `{host}`, `{port}`, `{user}`, `{password}`.
    pub url_template: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Prepended to the sanitized tenant id to form the database name
    pub database_prefix: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url_template: None,
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: String::new(),
            database_prefix: "tenant_".to_string(),
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
        }
    }
}

impl ConnectionConfig {
    /// Load configuration from `TENANT_DB_*` environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url_template: std::env::var("TENANT_DB_URL_TEMPLATE").ok(),
            host: std::env::var("TENANT_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("TENANT_DB_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            username: std::env::var("TENANT_DB_USER").unwrap_or(defaults.username),
            password: std::env::var("TENANT_DB_PASSWORD").unwrap_or(defaults.password),
            database_prefix: std::env::var("TENANT_DB_PREFIX")
                .unwrap_or(defaults.database_prefix),
            max_connections: std::env::var("TENANT_DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_connections),
            min_connections: std::env::var("TENANT_DB_MIN_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_connections),
            acquire_timeout_secs: std::env::var("TENANT_DB_ACQUIRE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.acquire_timeout_secs),
            idle_timeout_secs: std::env::var("TENANT_DB_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.idle_timeout_secs),
        }
    }

    /// Database name for a tenant, e.g. `acme-eu` -> `tenant_acme_eu`.
    pub fn database_name(&self, tenant: &TenantId) -> String {
        let sanitized: String = tenant
            .as_str()
            .chars()
            .map(|c| match c {
                '-' | '/' | '.' | ' ' => '_',
                other => other,
            })
            .collect();
        format!("{}{}", self.database_prefix, sanitized)
    }

    /// Connection URL for a tenant database
    pub fn connection_url(&self, tenant: &TenantId) -> String {
        let database = self.database_name(tenant);
        match &self.url_template {
            Some(template) => template
                .replace("{tenant}", tenant.as_str())
                .replace("{database}", &database)
                .replace("{host}", &self.host)
                .replace("{port}", &self.port.to_string())
                .replace("{user}", &self.username)
                .replace("{password}", &self.password),
            None => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, database
            ),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Configuration for the tenant router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantRouterConfig {
    /// Column / entity field that carries the tenant id
    pub tenant_field: String,
    /// Upper bound on cached tenant connections. `None` keeps every connection
    /// for the lifetime of the process.
    pub max_cached_connections: Option<u64>,
    /// Time-to-live for cached connections
    pub connection_ttl_secs: Option<u64>,
    /// Passed verbatim to the connection factory
    pub connection: ConnectionConfig,
}

impl Default for TenantRouterConfig {
    fn default() -> Self {
        Self {
            tenant_field: "tenant_id".to_string(),
            max_cached_connections: None,
            connection_ttl_secs: None,
            connection: ConnectionConfig::default(),
        }
    }
}

impl TenantRouterConfig {
    pub fn new(tenant_field: impl Into<String>) -> Self {
        Self {
            tenant_field: tenant_field.into(),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables
    ///
    /// - `TENANT_ROUTER_TENANT_FIELD`: tenant column name (default `tenant_id`)
    /// - `TENANT_ROUTER_MAX_CONNECTIONS`: connection cache bound (default unbounded)
    /// - `TENANT_ROUTER_CONNECTION_TTL_SECS`: connection cache TTL (default none)
    /// - `TENANT_DB_*`: see [`ConnectionConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            tenant_field: std::env::var("TENANT_ROUTER_TENANT_FIELD")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| "tenant_id".to_string()),
            max_cached_connections: std::env::var("TENANT_ROUTER_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok()),
            connection_ttl_secs: std::env::var("TENANT_ROUTER_CONNECTION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            connection: ConnectionConfig::from_env(),
        }
    }

    pub fn connection_ttl(&self) -> Option<Duration> {
        self.connection_ttl_secs.map(Duration::from_secs)
    }
}
