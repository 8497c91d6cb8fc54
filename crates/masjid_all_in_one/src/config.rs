use std::time::Duration;

use access_gate::{AccessGateConfig, HttpServerConfig};
use common::http::HttpLoggingConfig;
use common::postgres::PostgresConfig;
use common::telemetry::TelemetryConfig;
use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

/// Backing store for user roles
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoleStore {
    Postgres,
    /// Process-local, empty at startup; for development only
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // HTTP server
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Comma-separated path prefixes excluded from request logging
    #[serde(default = "default_http_ignored_paths")]
    pub http_ignored_paths: String,

    // Access gate
    /// Where denied callers are redirected
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Query parameter carrying the originally requested path
    #[serde(default = "default_return_path_param")]
    pub return_path_param: String,

    #[serde(default = "default_token_cookie_name")]
    pub token_cookie_name: String,

    #[serde(default = "default_user_id_cookie_name")]
    pub user_id_cookie_name: String,

    /// Header carrying the user id alongside `Authorization: Bearer`
    #[serde(default = "default_user_id_header")]
    pub user_id_header: String,

    #[serde(default = "default_role_lookup_timeout_ms")]
    pub role_lookup_timeout_ms: u64,

    /// Role cache lifetime; 0 disables caching
    #[serde(default)]
    pub role_cache_ttl_secs: u64,

    /// Apply the gate to POST requests too
    #[serde(default)]
    pub gate_mutating_requests: bool,

    #[serde(default = "default_token_leeway_secs")]
    pub token_leeway_secs: u64,

    #[serde(default)]
    pub secure_cookies: bool,

    // Role storage
    #[serde(default = "default_role_store")]
    pub role_store: RoleStore,

    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_database")]
    pub postgres_database: String,

    #[serde(default = "default_postgres_username")]
    pub postgres_username: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_max_pool_size")]
    pub postgres_max_pool_size: usize,

    /// Apply embedded migrations at startup
    #[serde(default = "default_postgres_run_migrations")]
    pub postgres_run_migrations: bool,

    // OpenTelemetry
    #[serde(default)]
    pub otel_enabled: bool,

    #[serde(default = "default_otel_endpoint")]
    pub otel_endpoint: String,

    #[serde(default = "default_otel_service_name")]
    pub otel_service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_http_ignored_paths() -> String {
    "/health".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_return_path_param() -> String {
    "from".to_string()
}

fn default_token_cookie_name() -> String {
    "token".to_string()
}

fn default_user_id_cookie_name() -> String {
    "userId".to_string()
}

fn default_user_id_header() -> String {
    "x-user-id".to_string()
}

fn default_role_lookup_timeout_ms() -> u64 {
    2000
}

fn default_token_leeway_secs() -> u64 {
    60
}

fn default_role_store() -> RoleStore {
    RoleStore::Postgres
}

// PostgreSQL defaults
fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_database() -> String {
    "masjid".to_string()
}

fn default_postgres_username() -> String {
    "masjid".to_string()
}

fn default_postgres_password() -> String {
    "masjid".to_string()
}

fn default_postgres_max_pool_size() -> usize {
    10
}

fn default_postgres_run_migrations() -> bool {
    true
}

// OpenTelemetry defaults
fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otel_service_name() -> String {
    "masjid-all-in-one".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("MASJID"))
            .build()?
            .try_deserialize()
    }

    pub fn access_gate_config(&self) -> AccessGateConfig {
        AccessGateConfig {
            login_path: self.login_path.clone(),
            return_path_param: self.return_path_param.clone(),
            token_cookie_name: self.token_cookie_name.clone(),
            user_id_cookie_name: self.user_id_cookie_name.clone(),
            user_id_header: self.user_id_header.clone(),
            role_lookup_timeout: Duration::from_millis(self.role_lookup_timeout_ms),
            role_cache_ttl: Duration::from_secs(self.role_cache_ttl_secs),
            gate_mutating_requests: self.gate_mutating_requests,
            token_leeway_secs: self.token_leeway_secs,
            secure_cookies: self.secure_cookies,
        }
    }

    pub fn http_server_config(&self) -> HttpServerConfig {
        HttpServerConfig {
            host: self.http_host.clone(),
            port: self.http_port,
            logging: HttpLoggingConfig::from_comma_separated(&self.http_ignored_paths),
        }
    }

    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            database: self.postgres_database.clone(),
            username: self.postgres_username.clone(),
            password: self.postgres_password.clone(),
            max_pool_size: self.postgres_max_pool_size,
        }
    }

    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            service_name: self.otel_service_name.clone(),
            otel_endpoint: self.otel_endpoint.clone(),
            otel_enabled: self.otel_enabled,
            log_level: self.log_level.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "MASJID_LOG_LEVEL",
        "MASJID_HTTP_PORT",
        "MASJID_ROLE_STORE",
        "MASJID_ROLE_CACHE_TTL_SECS",
        "MASJID_GATE_MUTATING_REQUESTS",
        "MASJID_HTTP_IGNORED_PATHS",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http_port, 3000);
        assert_eq!(config.role_store, RoleStore::Postgres);

        let gate = config.access_gate_config();
        assert_eq!(gate.login_path, "/login");
        assert_eq!(gate.return_path_param, "from");
        assert_eq!(gate.role_lookup_timeout, Duration::from_secs(2));
        assert!(gate.role_cache_ttl.is_zero());
        assert!(!gate.gate_mutating_requests);
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();
        clear_env();

        std::env::set_var("MASJID_LOG_LEVEL", "debug");
        std::env::set_var("MASJID_HTTP_PORT", "8080");
        std::env::set_var("MASJID_ROLE_STORE", "memory");
        std::env::set_var("MASJID_ROLE_CACHE_TTL_SECS", "30");
        std::env::set_var("MASJID_GATE_MUTATING_REQUESTS", "true");
        std::env::set_var("MASJID_HTTP_IGNORED_PATHS", "/health,/static");

        let config = ServiceConfig::from_env().unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.role_store, RoleStore::Memory);

        let gate = config.access_gate_config();
        assert_eq!(gate.role_cache_ttl, Duration::from_secs(30));
        assert!(gate.gate_mutating_requests);

        let http = config.http_server_config();
        assert_eq!(http.logging.ignored_paths, vec!["/health", "/static"]);

        clear_env();
    }
}
