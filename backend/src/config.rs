//! Application configuration loaded via OrthoConfig.
//!
//! Values come from command-line flags, `LEDGER_`-prefixed environment
//! variables, or a configuration file, in that order of precedence.

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Configuration values for the ledger service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "LEDGER")]
pub struct AppConfig {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL. Required.
    pub database_url: Option<String>,
    /// Maximum number of pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
    /// Smallest withdrawal amount accepted, in minor units.
    #[ortho_config(default = 5_000)]
    pub minimum_withdrawal: i64,
    /// Endpoint withdrawal lifecycle events are posted to. Events are
    /// dropped when unset.
    pub webhook_url: Option<String>,
}

impl AppConfig {
    /// The configured bind address, falling back to the default.
    #[must_use]
    pub fn bind_addr(&self) -> &str {
        self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// The configured database URL, if one was provided.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// The configured webhook endpoint, if one was provided.
    #[must_use]
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }
}
