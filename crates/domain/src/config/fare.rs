use serde::{Deserialize, Serialize};

/// Fare estimation parameters.
///
/// All monetary values are in minor currency units (pence for GBP) to
/// avoid floating-point money.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    #[serde(default = "d_currency")]
    pub currency: String,
    /// Fixed charge added to every fare.
    #[serde(default = "d_base_fare")]
    pub base_fare_minor: u32,
    /// Charge per kilometer of estimated distance.
    #[serde(default = "d_per_km")]
    pub per_km_minor: u32,
    /// Flat quote used when no distance hint was supplied.
    #[serde(default = "d_flat_rate")]
    pub flat_rate_fallback_minor: u32,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            currency: d_currency(),
            base_fare_minor: d_base_fare(),
            per_km_minor: d_per_km(),
            flat_rate_fallback_minor: d_flat_rate(),
        }
    }
}

fn d_currency() -> String {
    "GBP".into()
}
fn d_base_fare() -> u32 {
    250
}
fn d_per_km() -> u32 {
    150
}
fn d_flat_rate() -> u32 {
    1200
}
