//! Application configuration management.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Balance integrity thresholds.
    #[serde(default)]
    pub integrity: IntegrityConfig,
    /// Background monitoring configuration.
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    /// Accounting equation healing configuration.
    #[serde(default)]
    pub equation: EquationConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Thresholds used by the balance integrity validator.
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrityConfig {
    /// Deltas strictly above this amount are CRITICAL.
    #[serde(default = "default_critical_threshold", with = "rust_decimal::serde::str")]
    pub critical_threshold: Decimal,
    /// Deltas strictly below this amount drop to the minor tier.
    #[serde(default = "default_minor_threshold", with = "rust_decimal::serde::str")]
    pub minor_threshold: Decimal,
    /// Rounding tolerance for journal balance and double-posting checks.
    #[serde(default = "default_tolerance", with = "rust_decimal::serde::str")]
    pub tolerance: Decimal,
}

fn default_critical_threshold() -> Decimal {
    Decimal::from(1_000_000)
}

fn default_minor_threshold() -> Decimal {
    Decimal::from(1_000)
}

fn default_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            critical_threshold: default_critical_threshold(),
            minor_threshold: default_minor_threshold(),
            tolerance: default_tolerance(),
        }
    }
}

/// Background monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Whether the periodic worker runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between monitoring cycles.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Apply GL sync corrections automatically after a degraded cycle.
    #[serde(default)]
    pub auto_fix: bool,
    /// Upper bound for a single cycle or operator call, in seconds.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
    /// Difference amount that escalates an alert to critical.
    #[serde(default = "default_alert_critical", with = "rust_decimal::serde::str")]
    pub critical_balance_difference: Decimal,
    /// Difference amount that escalates an alert to high.
    #[serde(default = "default_alert_high", with = "rust_decimal::serde::str")]
    pub high_balance_difference: Decimal,
    /// Number of inconsistencies tolerated before alerts escalate.
    #[serde(default = "default_max_tolerable")]
    pub max_tolerable_inconsistencies: usize,
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    900 // 15 minutes
}

fn default_operation_timeout_secs() -> u64 {
    120
}

fn default_alert_critical() -> Decimal {
    Decimal::from(1_000_000)
}

fn default_alert_high() -> Decimal {
    Decimal::from(100_000)
}

fn default_max_tolerable() -> usize {
    5
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_secs: default_interval_secs(),
            auto_fix: false,
            operation_timeout_secs: default_operation_timeout_secs(),
            critical_balance_difference: default_alert_critical(),
            high_balance_difference: default_alert_high(),
            max_tolerable_inconsistencies: default_max_tolerable(),
        }
    }
}

impl MonitoringConfig {
    /// Interval between cycles.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Deadline applied to a single cycle or operator call.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// Accounting equation healing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EquationConfig {
    /// Code of the retained earnings account used when closing net income.
    #[serde(default = "default_retained_earnings_code")]
    pub retained_earnings_code: String,
    /// Name given to the retained earnings account if it has to be created.
    #[serde(default = "default_retained_earnings_name")]
    pub retained_earnings_name: String,
    /// Summary account codes zeroed in addition to flagged header accounts.
    #[serde(default = "default_summary_codes")]
    pub summary_codes: Vec<String>,
    /// Close revenue and expense into retained earnings during auto-heal.
    #[serde(default)]
    pub close_net_income: bool,
    /// Seconds between scheduled auto-heal runs of the monitor daemon.
    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
}

fn default_retained_earnings_code() -> String {
    "3201".to_string()
}

fn default_retained_earnings_name() -> String {
    "Retained Earnings".to_string()
}

fn default_health_check_interval_secs() -> u64 {
    86_400 // daily
}

fn default_summary_codes() -> Vec<String> {
    ["1000", "1200", "2000", "2100", "3000", "4000", "5000"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for EquationConfig {
    fn default() -> Self {
        Self {
            retained_earnings_code: default_retained_earnings_code(),
            retained_earnings_name: default_retained_earnings_name(),
            summary_codes: default_summary_codes(),
            close_net_income: false,
            health_check_interval_secs: default_health_check_interval_secs(),
        }
    }
}

impl EquationConfig {
    /// Interval between scheduled auto-heal runs.
    #[must_use]
    pub const fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEDGERWATCH")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("equation.summary_codes")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_load_uses_defaults() {
        temp_env::with_vars(
            [
                ("LEDGERWATCH__DATABASE__URL", Some("postgres://localhost/ledger")),
                ("RUN_MODE", Some("test-defaults")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/ledger");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.integrity.critical_threshold, dec!(1000000));
                assert_eq!(config.integrity.minor_threshold, dec!(1000));
                assert_eq!(config.integrity.tolerance, dec!(0.01));
                assert!(config.monitoring.enabled);
                assert!(!config.monitoring.auto_fix);
                assert_eq!(config.monitoring.interval(), Duration::from_secs(900));
                assert_eq!(config.equation.retained_earnings_code, "3201");
                assert_eq!(
                    config.equation.health_check_interval(),
                    Duration::from_secs(86_400)
                );
                assert_eq!(config.equation.summary_codes.len(), 7);
                assert!(!config.log.json);
            },
        );
    }

    #[test]
    fn test_load_env_overrides() {
        temp_env::with_vars(
            [
                ("LEDGERWATCH__DATABASE__URL", Some("postgres://db/ledger")),
                ("LEDGERWATCH__MONITORING__INTERVAL_SECS", Some("60")),
                ("LEDGERWATCH__MONITORING__AUTO_FIX", Some("true")),
                ("LEDGERWATCH__INTEGRITY__MINOR_THRESHOLD", Some("250.50")),
                ("LEDGERWATCH__EQUATION__SUMMARY_CODES", Some("1000,2000")),
                ("RUN_MODE", Some("test-overrides")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.monitoring.interval_secs, 60);
                assert!(config.monitoring.auto_fix);
                assert_eq!(config.integrity.minor_threshold, dec!(250.50));
                assert_eq!(config.equation.summary_codes, vec!["1000", "2000"]);
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("LEDGERWATCH__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("test-missing")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
