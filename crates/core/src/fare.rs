//! Deterministic fare estimation. Pure function, no
//! I/O: the caller-supplied distance hint is plumbing carried on
//! `ToolSync`, not something the core resolves itself.

use taxi_domain::config::FareConfig;
use taxi_domain::slots::FareQuote;

pub fn estimate(distance_hint_meters: Option<f64>, config: &FareConfig) -> FareQuote {
    match distance_hint_meters {
        Some(meters) if meters.is_finite() && meters > 0.0 => {
            let km = meters / 1000.0;
            let variable = (km * config.per_km_minor as f64).round() as u32;
            FareQuote {
                amount_minor_units: config.base_fare_minor.saturating_add(variable),
                currency: config.currency.clone(),
                basis: "distance".into(),
            }
        }
        _ => FareQuote {
            amount_minor_units: config.flat_rate_fallback_minor,
            currency: config.currency.clone(),
            basis: "flat_rate_fallback".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_hint_uses_flat_rate() {
        let config = FareConfig::default();
        let quote = estimate(None, &config);
        assert_eq!(quote.basis, "flat_rate_fallback");
        assert_eq!(quote.amount_minor_units, config.flat_rate_fallback_minor);
    }

    #[test]
    fn distance_hint_scales_with_km() {
        let config = FareConfig::default();
        let near = estimate(Some(1000.0), &config);
        let far = estimate(Some(5000.0), &config);
        assert_eq!(near.basis, "distance");
        assert!(far.amount_minor_units > near.amount_minor_units);
    }

    #[test]
    fn non_positive_hint_falls_back() {
        let config = FareConfig::default();
        let quote = estimate(Some(0.0), &config);
        assert_eq!(quote.basis, "flat_rate_fallback");
        let quote2 = estimate(Some(-5.0), &config);
        assert_eq!(quote2.basis, "flat_rate_fallback");
    }

    #[test]
    fn nan_hint_falls_back() {
        let config = FareConfig::default();
        let quote = estimate(Some(f64::NAN), &config);
        assert_eq!(quote.basis, "flat_rate_fallback");
    }
}
