//! Shared, I/O-free domain types and configuration for the watcher
//! workspace: normalized product/variant/price/stock shells, the stock
//! status vocabulary, attribute-map normalization, and `AppConfig`.

pub mod app_config;
pub mod attributes;
pub mod config;
pub mod shell;
pub mod stock;

pub use app_config::{AppConfig, Environment};
pub use shell::{Currency, Observed, PriceShell, ProductShell, StockShell, VariantShell};
pub use stock::StockStatus;

/// Errors raised while assembling [`AppConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for environment variable {key}: {value}")]
    InvalidVar { key: &'static str, value: String },
}

impl ConfigError {
    /// Stable machine-readable error code for logs and downstream consumers.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::MissingVar(_) | ConfigError::InvalidVar { .. } => "INVALID_INPUT",
        }
    }
}
