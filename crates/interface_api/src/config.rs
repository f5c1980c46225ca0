//! API configuration
//!
//! Every setting can be overridden with an `API_`-prefixed environment
//! variable, e.g. `API_PORT=3000` or `API_CLIENT_ID=11`.

use std::time::Duration;

use serde::Deserialize;

use core_kernel::{CoreError, TenantScope, UserId};
use domain_partner::{IdRange, TenantMetadata, DEFAULT_MAX_ATTEMPTS};
use infra_db::DatabaseConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    /// Seconds to wait for a pooled connection
    pub db_acquire_timeout_secs: u64,
    /// Tenant every request operates in
    pub client_id: i32,
    pub org_id: i32,
    /// User recorded as creator of new partners
    pub created_by: i32,
    /// User recorded as last updater of new partners
    pub updated_by: i32,
    /// Inclusive bounds of the partner identifier range
    pub id_range_start: i32,
    pub id_range_end: i32,
    /// Attempts per creation before giving up on contention
    pub max_attempts: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: "postgres://localhost/erp".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            db_max_connections: 10,
            db_min_connections: 2,
            db_acquire_timeout_secs: 30,
            client_id: 11,
            org_id: 0,
            created_by: 100,
            updated_by: 100,
            id_range_start: IdRange::DEFAULT.start(),
            id_range_end: IdRange::DEFAULT.end(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the environment on top of the defaults
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port)?
            .set_default("database_url", defaults.database_url)?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_json", defaults.log_json)?
            .set_default("db_max_connections", defaults.db_max_connections)?
            .set_default("db_min_connections", defaults.db_min_connections)?
            .set_default("db_acquire_timeout_secs", defaults.db_acquire_timeout_secs)?
            .set_default("client_id", defaults.client_id)?
            .set_default("org_id", defaults.org_id)?
            .set_default("created_by", defaults.created_by)?
            .set_default("updated_by", defaults.updated_by)?
            .set_default("id_range_start", defaults.id_range_start)?
            .set_default("id_range_end", defaults.id_range_end)?
            .set_default("max_attempts", defaults.max_attempts)?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tenant and actors new partners are written under
    pub fn tenant_metadata(&self) -> TenantMetadata {
        TenantMetadata {
            scope: TenantScope::new(self.client_id, self.org_id),
            created_by: UserId::new(self.created_by),
            updated_by: UserId::new(self.updated_by),
        }
    }

    pub fn id_range(&self) -> Result<IdRange, CoreError> {
        IdRange::new(self.id_range_start, self.id_range_end)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.database_url)
            .max_connections(self.db_max_connections)
            .min_connections(self.db_min_connections)
            .connect_timeout(Duration::from_secs(self.db_acquire_timeout_secs))
    }
}
