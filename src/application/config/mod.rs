pub mod auth;
pub mod database;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub database: database::DatabaseConfig,
    pub auth: auth::AuthConfig,

    // Build info
    pub version: String,

    // Logging
    pub log_level: String,
    /// `json` switches the subscriber to JSON lines, anything else is plain text
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server: server::ServerConfig::from_env(),
            database: database::DatabaseConfig::from_env(),
            auth: auth::AuthConfig::from_env(),

            version: env!("CARGO_PKG_VERSION").to_string(),

            log_level: env::var("EDUADMIN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("EDUADMIN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
