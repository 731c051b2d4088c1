//! Node configuration loading and management.

use giftpool_settlement::GiftCardPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Full configuration for the Giftpool node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GiftpoolConfig {
    /// API server settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Float balance gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Balance alerting settings.
    #[serde(default)]
    pub alerts: AlertsConfig,

    /// Settlement settings.
    #[serde(default)]
    pub settlement: SettlementConfig,

    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API listen address.
    #[serde(default = "default_api_addr")]
    pub listen_addr: String,
    /// API port.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL of the issuing partner's balance API.
    #[serde(default = "default_gateway_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_gateway_timeout_secs")]
    pub timeout_secs: u64,
    /// How long a fetched balance stays fresh, in seconds. Older reads are
    /// treated as unknown and refreshed.
    #[serde(default = "default_cache_freshness_secs")]
    pub cache_freshness_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AlertsConfig {
    /// Outbound webhook for balance alerts; unset disables alerting.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Shared secret for the cron trigger endpoint; unset rejects all
    /// trigger calls.
    #[serde(default)]
    pub cron_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// Minimum float (in currency units) for the settle redirect to route
    /// to the gift-card UI.
    #[serde(default = "default_min_gift_card_float")]
    pub min_gift_card_float: f64,
    /// UI path for gift-card settlement.
    #[serde(default = "default_gift_card_path")]
    pub gift_card_path: String,
    /// UI path for credits settlement.
    #[serde(default = "default_credits_path")]
    pub credits_path: String,
    /// Admin override for the gift-card option.
    #[serde(default)]
    pub gift_card_policy: GiftCardPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_api_addr() -> String {
    "127.0.0.1".into()
}
fn default_api_port() -> u16 {
    8080
}
fn default_gateway_url() -> String {
    "http://127.0.0.1:9470".into()
}
fn default_gateway_timeout_secs() -> u64 {
    5
}
fn default_cache_freshness_secs() -> u64 {
    30
}
fn default_min_gift_card_float() -> f64 {
    25.0
}
fn default_gift_card_path() -> String {
    "/settle/gift-card".into()
}
fn default_credits_path() -> String {
    "/settle/credits".into()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_api_addr(),
            port: default_api_port(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            timeout_secs: default_gateway_timeout_secs(),
            cache_freshness_secs: default_cache_freshness_secs(),
        }
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            min_gift_card_float: default_min_gift_card_float(),
            gift_card_path: default_gift_card_path(),
            credits_path: default_credits_path(),
            gift_card_policy: GiftCardPolicy::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl GiftpoolConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: GiftpoolConfig = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }
}
