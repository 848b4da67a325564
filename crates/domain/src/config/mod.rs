mod fare;
mod retry;

pub use fare::FareConfig;
pub use retry::RetryConfig;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub fare: FareConfig,
}

impl Config {
    /// Load and validate a TOML config file. Returns a hard `Error` only on
    /// IO/parse failure; use `validate()` for soft issues.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
        let config: Config = toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;
        Ok(config)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Every retry cap must allow at least one attempt.
        let caps: [(&str, u32); 8] = [
            ("retry.max_pickup_retries", self.retry.max_pickup_retries),
            ("retry.max_dropoff_retries", self.retry.max_dropoff_retries),
            (
                "retry.max_passengers_retries",
                self.retry.max_passengers_retries,
            ),
            ("retry.max_time_retries", self.retry.max_time_retries),
            ("retry.max_confirm_retries", self.retry.max_confirm_retries),
            (
                "retry.max_pickup_verify_retries",
                self.retry.max_pickup_verify_retries,
            ),
            (
                "retry.max_dropoff_verify_retries",
                self.retry.max_dropoff_verify_retries,
            ),
            (
                "retry.max_amend_menu_retries",
                self.retry.max_amend_menu_retries,
            ),
        ];
        for (field, cap) in caps {
            if cap == 0 {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "cap must be at least 1 (zero permanently escalates on first retry)"
                        .into(),
                });
            }
        }

        // Fare currency must be a 3-letter ISO code; warn otherwise.
        if self.fare.currency.len() != 3 || !self.fare.currency.chars().all(|c| c.is_ascii_uppercase())
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "fare.currency".into(),
                message: format!(
                    "expected a 3-letter uppercase ISO currency code, got \"{}\"",
                    self.fare.currency
                ),
            });
        }

        if self.fare.flat_rate_fallback_minor == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "fare.flat_rate_fallback_minor".into(),
                message: "flat-rate fallback is zero — callers without a distance hint get a free ride"
                    .into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_issue<'a>(issues: &'a [ConfigError], field: &str) -> Option<&'a ConfigError> {
        issues.iter().find(|e| e.field == field)
    }

    #[test]
    fn default_config_has_no_errors() {
        let issues = Config::default().validate();
        let errors: Vec<_> = issues
            .iter()
            .filter(|e| e.severity == ConfigSeverity::Error)
            .collect();
        assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
    }

    #[test]
    fn zero_cap_is_error() {
        let mut cfg = Config::default();
        cfg.retry.max_confirm_retries = 0;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "retry.max_confirm_retries")
            .expect("expected a zero-cap error");
        assert_eq!(issue.severity, ConfigSeverity::Error);
    }

    #[test]
    fn lowercase_currency_is_warning() {
        let mut cfg = Config::default();
        cfg.fare.currency = "gbp".into();
        let issues = cfg.validate();
        let issue = find_issue(&issues, "fare.currency").expect("expected currency warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn zero_flat_rate_is_warning() {
        let mut cfg = Config::default();
        cfg.fare.flat_rate_fallback_minor = 0;
        let issues = cfg.validate();
        let issue = find_issue(&issues, "fare.flat_rate_fallback_minor")
            .expect("expected flat-rate warning");
        assert_eq!(issue.severity, ConfigSeverity::Warning);
    }

    #[test]
    fn config_error_display_format() {
        let err = ConfigError {
            severity: ConfigSeverity::Error,
            field: "retry.max_confirm_retries".into(),
            message: "cap must be at least 1".into(),
        };
        assert_eq!(
            format!("{err}"),
            "[ERROR] retry.max_confirm_retries: cap must be at least 1"
        );
    }
}
