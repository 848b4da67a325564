use serde::{Deserialize, Serialize};

use crate::slots::RetryKey;

/// Per-key retry caps. Read-only, shareable across
/// calls — only the per-call `RetryCounters` mutates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "d_3")]
    pub max_pickup_retries: u32,
    #[serde(default = "d_3")]
    pub max_dropoff_retries: u32,
    #[serde(default = "d_2")]
    pub max_passengers_retries: u32,
    #[serde(default = "d_2")]
    pub max_time_retries: u32,
    #[serde(default = "d_2")]
    pub max_confirm_retries: u32,
    #[serde(default = "d_3")]
    pub max_pickup_verify_retries: u32,
    #[serde(default = "d_3")]
    pub max_dropoff_verify_retries: u32,
    #[serde(default = "d_1")]
    pub max_amend_menu_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_pickup_retries: 3,
            max_dropoff_retries: 3,
            max_passengers_retries: 2,
            max_time_retries: 2,
            max_confirm_retries: 2,
            max_pickup_verify_retries: 3,
            max_dropoff_verify_retries: 3,
            max_amend_menu_retries: 1,
        }
    }
}

impl RetryConfig {
    /// The cap for a given retry key. `AmendConfirm` reuses the `Confirm`
    /// cap (see DESIGN.md).
    pub fn cap(&self, key: RetryKey) -> u32 {
        match key {
            RetryKey::Pickup => self.max_pickup_retries,
            RetryKey::Dropoff => self.max_dropoff_retries,
            RetryKey::Passengers => self.max_passengers_retries,
            RetryKey::Time => self.max_time_retries,
            RetryKey::Confirm => self.max_confirm_retries,
            RetryKey::PickupVerify => self.max_pickup_verify_retries,
            RetryKey::DropoffVerify => self.max_dropoff_verify_retries,
            RetryKey::AmendMenu => self.max_amend_menu_retries,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_1() -> u32 {
    1
}
fn d_2() -> u32 {
    2
}
fn d_3() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_pickup_retries, 3);
        assert_eq!(cfg.max_dropoff_retries, 3);
        assert_eq!(cfg.max_passengers_retries, 2);
        assert_eq!(cfg.max_time_retries, 2);
        assert_eq!(cfg.max_confirm_retries, 2);
        assert_eq!(cfg.max_pickup_verify_retries, 3);
        assert_eq!(cfg.max_dropoff_verify_retries, 3);
        assert_eq!(cfg.max_amend_menu_retries, 1);
    }

    #[test]
    fn cap_lookup_matches_field() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.cap(RetryKey::PickupVerify), cfg.max_pickup_verify_retries);
        assert_eq!(cfg.cap(RetryKey::AmendMenu), cfg.max_amend_menu_retries);
    }

    #[test]
    fn deserialize_partial_toml_fills_defaults() {
        let toml_str = r#"
max_pickup_retries = 5
"#;
        let cfg: RetryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.max_pickup_retries, 5);
        assert_eq!(cfg.max_confirm_retries, 2);
    }
}
