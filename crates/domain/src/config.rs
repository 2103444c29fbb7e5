//! Runtime configuration loaded from environment variables.

use std::str::FromStr;

use thiserror::Error;

/// Order of the two side effects of a ship command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShipmentPolicy {
    /// Call the shipping collaborator first and record the stock depletion
    /// only once it succeeded.
    #[default]
    ConfirmBeforeCommit,

    /// Record the stock depletion first, then call the shipping
    /// collaborator. A failed shipment leaves the depletion committed.
    CommitThenShip,
}

impl ShipmentPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentPolicy::ConfirmBeforeCommit => "confirm-before-commit",
            ShipmentPolicy::CommitThenShip => "commit-then-ship",
        }
    }
}

impl FromStr for ShipmentPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirm-before-commit" => Ok(ShipmentPolicy::ConfirmBeforeCommit),
            "commit-then-ship" => Ok(ShipmentPolicy::CommitThenShip),
            other => Err(ConfigError::UnknownValue {
                key: "WAREHOUSE_SHIPMENT_POLICY",
                value: other.to_string(),
            }),
        }
    }
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::UnknownValue {
                key: "WAREHOUSE_LOG_FORMAT",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown value for {key}: {value}")]
    UnknownValue { key: &'static str, value: String },
}

/// Warehouse runtime configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `WAREHOUSE_SHIPMENT_POLICY`: `confirm-before-commit` (default) or `commit-then-ship`
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `WAREHOUSE_LOG_FORMAT`: `pretty` (default) or `json`
///
/// Unknown values fall back to the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub shipment_policy: ShipmentPolicy,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl WarehouseConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            shipment_policy: lookup("WAREHOUSE_SHIPMENT_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_format: lookup("WAREHOUSE_LOG_FORMAT")
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            shipment_policy: ShipmentPolicy::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
        }
    }
}
