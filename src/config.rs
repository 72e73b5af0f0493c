use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";

/// How settlement treats an order line that asks for more units than are in stock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StockPolicy {
    /// Accept the order and clamp stock at zero.
    #[default]
    Clamp,
    /// Abort the settlement with `InsufficientStock`.
    Reject,
}

/// Thresholds and rates for the code-less discounts applied to every cart.
#[derive(Clone, Debug, Deserialize, Validate, PartialEq)]
pub struct DiscountRulesConfig {
    #[serde(default = "default_high_tier_threshold")]
    pub high_tier_threshold: Decimal,
    #[serde(default = "default_high_tier_percent")]
    #[validate(custom = "validate_percent")]
    pub high_tier_percent: Decimal,
    #[serde(default = "default_low_tier_threshold")]
    pub low_tier_threshold: Decimal,
    #[serde(default = "default_low_tier_percent")]
    #[validate(custom = "validate_percent")]
    pub low_tier_percent: Decimal,
    #[serde(default = "default_first_order_percent")]
    #[validate(custom = "validate_percent")]
    pub first_order_percent: Decimal,
    #[serde(default = "default_bulk_min_quantity")]
    #[validate(range(min = 1))]
    pub bulk_min_quantity: i64,
    #[serde(default = "default_bulk_percent")]
    #[validate(custom = "validate_percent")]
    pub bulk_percent: Decimal,
}

impl Default for DiscountRulesConfig {
    fn default() -> Self {
        Self {
            high_tier_threshold: default_high_tier_threshold(),
            high_tier_percent: default_high_tier_percent(),
            low_tier_threshold: default_low_tier_threshold(),
            low_tier_percent: default_low_tier_percent(),
            first_order_percent: default_first_order_percent(),
            bulk_min_quantity: default_bulk_min_quantity(),
            bulk_percent: default_bulk_percent(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// Upper bound on a single HTTP request
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,

    /// Operational inbox that receives a copy of every new order
    #[serde(default = "default_admin_email")]
    #[validate(email)]
    pub admin_notification_email: String,

    /// Mail relay endpoint; messages are only logged when unset
    #[serde(default)]
    #[validate(url)]
    pub notification_relay_url: Option<String>,

    #[serde(default = "default_channel_capacity")]
    #[validate(custom = "validate_capacity")]
    pub notification_channel_capacity: usize,

    #[serde(default = "default_channel_capacity")]
    #[validate(custom = "validate_capacity")]
    pub event_channel_capacity: usize,

    /// Currency label stamped on orders that do not carry one
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub default_currency: String,

    #[serde(default)]
    pub stock_policy: StockPolicy,

    /// Reject orders whose caller-supplied total disagrees with the server total
    #[serde(default = "default_true_bool")]
    pub strict_totals: bool,

    #[serde(default)]
    #[validate]
    pub discounts: DiscountRulesConfig,
}

impl AppConfig {
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            host: "127.0.0.1".to_string(),
            port: default_port(),
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            admin_notification_email: default_admin_email(),
            notification_relay_url: None,
            notification_channel_capacity: default_channel_capacity(),
            event_channel_capacity: default_channel_capacity(),
            default_currency: default_currency(),
            stock_policy: StockPolicy::default(),
            strict_totals: true,
            discounts: DiscountRulesConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self.environment.as_str(), "development" | "dev" | "local")
    }

    pub fn settlement(&self) -> SettlementSettings {
        SettlementSettings {
            stock_policy: self.stock_policy,
            strict_totals: self.strict_totals,
            default_currency: self.default_currency.clone(),
        }
    }
}

/// The slice of configuration the settlement path needs.
#[derive(Clone, Debug)]
pub struct SettlementSettings {
    pub stock_policy: StockPolicy,
    pub strict_totals: bool,
    pub default_currency: String,
}

impl Default for SettlementSettings {
    fn default() -> Self {
        Self {
            stock_policy: StockPolicy::Clamp,
            strict_totals: true,
            default_currency: default_currency(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_admin_email() -> String {
    "orders@localhost.localdomain".to_string()
}
fn default_channel_capacity() -> usize {
    1024
}
fn default_currency() -> String {
    "USD".to_string()
}
fn default_true_bool() -> bool {
    true
}
fn default_high_tier_threshold() -> Decimal {
    dec!(200)
}
fn default_high_tier_percent() -> Decimal {
    dec!(5)
}
fn default_low_tier_threshold() -> Decimal {
    dec!(100)
}
fn default_low_tier_percent() -> Decimal {
    dec!(3)
}
fn default_first_order_percent() -> Decimal {
    dec!(10)
}
fn default_bulk_min_quantity() -> i64 {
    10
}
fn default_bulk_percent() -> Decimal {
    dec!(5)
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("channel_capacity");
        err.message = Some("channel capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > dec!(100) {
        let mut err = ValidationError::new("percent");
        err.message = Some("percentages must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("storefront_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", "sqlite://storefront.db?mode=rwc")?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 8080)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("auto_migrate", true)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::new("sqlite::memory:".into(), "development".into())
    }

    #[test]
    fn defaults_validate() {
        let cfg = base_config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.stock_policy, StockPolicy::Clamp);
        assert!(cfg.strict_totals);
        assert_eq!(cfg.discounts.first_order_percent, dec!(10));
    }

    #[test]
    fn rejects_bad_log_level() {
        let mut cfg = base_config();
        cfg.log_level = "loud".into();
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("log_level"));
    }

    #[test]
    fn rejects_zero_channel_capacity() {
        let mut cfg = base_config();
        cfg.notification_channel_capacity = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_discount_rule() {
        let mut cfg = base_config();
        cfg.discounts.bulk_percent = dec!(120);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn stock_policy_parses_lowercase() {
        let policy: StockPolicy = serde_json::from_str("\"reject\"").unwrap();
        assert_eq!(policy, StockPolicy::Reject);
    }

    #[test]
    fn development_detection() {
        let mut cfg = base_config();
        assert!(cfg.is_development());
        cfg.environment = "production".into();
        assert!(!cfg.is_development());
    }
}
