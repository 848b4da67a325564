//! Booking slot model and per-call state.
//!
//! Every record here is value-like: transitions rebind fields rather than
//! mutating in place, so a `BookingState` is always a single consistent
//! snapshot an observer can inspect between events.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single caller-supplied address, with its geocoder verification state.
///
/// Invariant: `verified` is true only if `normalized` was set by a
/// successful geocode result produced during the current call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressSlot {
    pub raw: Option<String>,
    pub normalized: Option<String>,
    pub verified: bool,
}

impl AddressSlot {
    pub fn is_present(&self) -> bool {
        self.raw.is_some()
    }

    /// Apply a new raw value. Resets `verified` (and `normalized`) iff the
    /// new value differs case-insensitively from the current one.
    pub fn set_raw(&mut self, raw: String) {
        let changed = match &self.raw {
            Some(existing) => !existing.eq_ignore_ascii_case(&raw),
            None => true,
        };
        self.raw = Some(raw);
        if changed {
            self.verified = false;
            self.normalized = None;
        }
    }

    pub fn mark_verified(&mut self, normalized: Option<String>) {
        if let Some(n) = normalized {
            self.normalized = Some(n);
        }
        self.verified = true;
    }
}

/// A resolved pickup time. `is_asap` and `absolute` are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupTime {
    pub raw: String,
    pub absolute: Option<DateTime<Utc>>,
    pub is_asap: bool,
}

impl PickupTime {
    pub fn asap(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            absolute: None,
            is_asap: true,
        }
    }

    pub fn at(raw: impl Into<String>, when: DateTime<Utc>) -> Self {
        Self {
            raw: raw.into(),
            absolute: Some(when),
            is_asap: false,
        }
    }
}

/// A deterministic fare estimate, computed once both addresses verify.
/// Carries the fare quote alongside the four core slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareQuote {
    pub amount_minor_units: u32,
    pub currency: String,
    /// Human-readable description of how the figure was produced, e.g.
    /// `"distance+time"` or `"flat_rate_fallback"`.
    pub basis: String,
}

/// The four (plus special instructions) booking slots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingSlots {
    pub pickup: AddressSlot,
    pub dropoff: AddressSlot,
    pub passengers: Option<u8>,
    pub pickup_time: Option<PickupTime>,
    pub special_instructions: Option<String>,
    pub fare_quote: Option<FareQuote>,
}

impl BookingSlots {
    pub fn passengers_valid(&self) -> Option<u8> {
        self.passengers.filter(|p| (1..=8).contains(p))
    }
}

/// Keys the retry policy tracks counters against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryKey {
    Pickup,
    Dropoff,
    Passengers,
    Time,
    Confirm,
    PickupVerify,
    DropoffVerify,
    AmendMenu,
}

impl RetryKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryKey::Pickup => "pickup",
            RetryKey::Dropoff => "dropoff",
            RetryKey::Passengers => "passengers",
            RetryKey::Time => "time",
            RetryKey::Confirm => "confirm",
            RetryKey::PickupVerify => "pickup_verify",
            RetryKey::DropoffVerify => "dropoff_verify",
            RetryKey::AmendMenu => "amend_menu",
        }
    }
}

/// Per-key retry counters. Missing key is treated as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetryCounters(pub HashMap<RetryKey, u32>);

impl RetryCounters {
    pub fn get(&self, key: RetryKey) -> u32 {
        self.0.get(&key).copied().unwrap_or(0)
    }

    /// Increment the counter for `key`, returning the new value.
    pub fn increment(&mut self, key: RetryKey) -> u32 {
        let entry = self.0.entry(key).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Reset the counter for `key` to zero (removes the entry).
    pub fn reset(&mut self, key: RetryKey) {
        self.0.remove(&key);
    }
}

/// Which address, if any, is awaiting a geocoder result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PendingVerification {
    #[default]
    None,
    Pickup,
    Dropoff,
}

/// The call's current stage (a closed enum of 16 variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Start,
    CollectPickup,
    CollectDropoff,
    CollectPassengers,
    CollectTime,
    ConfirmDetails,
    Dispatching,
    Booked,
    AmendMenu,
    AmendCollectPickup,
    AmendCollectDropoff,
    AmendCollectPassengers,
    AmendCollectTime,
    AmendConfirm,
    End,
    Escalate,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::End | Stage::Escalate)
    }

    pub fn is_amend_flow(self) -> bool {
        matches!(
            self,
            Stage::Booked
                | Stage::AmendMenu
                | Stage::AmendCollectPickup
                | Stage::AmendCollectDropoff
                | Stage::AmendCollectPassengers
                | Stage::AmendCollectTime
                | Stage::AmendConfirm
        )
    }
}

/// All state owned by one call. Created by `Start()`, mutated only by the
/// single-writer event loop, never persisted past the call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingState {
    pub stage: Stage,
    pub slots: BookingSlots,
    pub retries: RetryCounters,
    pub pending_verification: PendingVerification,
    pub booking_id: Option<String>,
    pub last_prompt: Option<String>,
    pub last_turn_id_processed: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_raw_first_time_resets_nothing_but_stays_unverified() {
        let mut slot = AddressSlot::default();
        slot.set_raw("10 High St".into());
        assert_eq!(slot.raw.as_deref(), Some("10 High St"));
        assert!(!slot.verified);
    }

    #[test]
    fn set_raw_same_value_case_insensitive_does_not_reset_verified() {
        let mut slot = AddressSlot::default();
        slot.set_raw("10 High St".into());
        slot.mark_verified(Some("10 High St, AB1 2CD".into()));
        assert!(slot.verified);
        slot.set_raw("10 HIGH ST".into());
        assert!(slot.verified, "same address case-insensitively should not reset");
    }

    #[test]
    fn set_raw_changed_value_resets_verified_and_normalized() {
        let mut slot = AddressSlot::default();
        slot.set_raw("10 High St".into());
        slot.mark_verified(Some("10 High St, AB1 2CD".into()));
        slot.set_raw("Station Rd".into());
        assert!(!slot.verified);
        assert!(slot.normalized.is_none());
    }

    #[test]
    fn passengers_valid_rejects_out_of_range() {
        let mut slots = BookingSlots::default();
        slots.passengers = Some(9);
        assert_eq!(slots.passengers_valid(), None);
        slots.passengers = Some(0);
        assert_eq!(slots.passengers_valid(), None);
        slots.passengers = Some(4);
        assert_eq!(slots.passengers_valid(), Some(4));
    }

    #[test]
    fn retry_counters_missing_key_is_zero() {
        let counters = RetryCounters::default();
        assert_eq!(counters.get(RetryKey::Pickup), 0);
    }

    #[test]
    fn retry_counters_increment_and_reset() {
        let mut counters = RetryCounters::default();
        assert_eq!(counters.increment(RetryKey::Pickup), 1);
        assert_eq!(counters.increment(RetryKey::Pickup), 2);
        counters.reset(RetryKey::Pickup);
        assert_eq!(counters.get(RetryKey::Pickup), 0);
    }

    #[test]
    fn stage_terminal_and_amend_flow_classification() {
        assert!(Stage::End.is_terminal());
        assert!(Stage::Escalate.is_terminal());
        assert!(!Stage::ConfirmDetails.is_terminal());
        assert!(Stage::Booked.is_amend_flow());
        assert!(Stage::AmendConfirm.is_amend_flow());
        assert!(!Stage::CollectPickup.is_amend_flow());
    }
}
