//! Patch extractor: diff a `ToolSync` against the current
//! slots, producing only the fields that actually changed. The patch
//! extractor is the one place the core touches a collaborator (the time
//! parser) — it never interprets address or time phrases itself.

use taxi_domain::contracts::UkTimeParser;
use taxi_domain::slots::{BookingSlots, PickupTime};
use taxi_domain::{Intent, ToolSync};

#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub intent: Intent,

    pub pickup_changed: bool,
    pub pickup_raw: Option<String>,

    pub dropoff_changed: bool,
    pub dropoff_raw: Option<String>,

    pub passengers_changed: bool,
    pub passengers: Option<u8>,

    pub time_changed: bool,
    pub pickup_time: Option<PickupTime>,

    pub special_instructions: Option<String>,
}

impl Patch {
    pub fn has_any_slot_changes(&self) -> bool {
        self.pickup_changed
            || self.dropoff_changed
            || self.passengers_changed
            || self.time_changed
            || self.special_instructions.is_some()
    }

    /// Build a patch from an inbound tool sync against the current slots.
    pub fn from(tool: &ToolSync, current: &BookingSlots, time_parser: &dyn UkTimeParser) -> Patch {
        let mut patch = Patch {
            intent: tool
                .intent
                .as_deref()
                .map(Intent::from_text)
                .unwrap_or_default(),
            ..Patch::default()
        };

        // Pickup.
        if let Some(raw) = non_empty(&tool.pickup) {
            if !matches_current(&current.pickup.raw, raw) {
                patch.pickup_changed = true;
                patch.pickup_raw = Some(raw.to_owned());
            }
        }

        // Dropoff.
        if let Some(raw) = non_empty(&tool.destination) {
            if !matches_current(&current.dropoff.raw, raw) {
                patch.dropoff_changed = true;
                patch.dropoff_raw = Some(raw.to_owned());
            }
        }

        // Passengers: out-of-range values are dropped (treated as not changed).
        if let Some(n) = tool.passengers {
            if (1..=8).contains(&n) && current.passengers != Some(n) {
                patch.passengers_changed = true;
                patch.passengers = Some(n);
            }
        }

        // Pickup time: resolved via the external UK time parser. An
        // unparseable phrase is treated as "not provided".
        if let Some(text) = non_empty(&tool.pickup_time) {
            if let Some(parsed) = time_parser.parse(text) {
                let new_time = if parsed.is_asap {
                    PickupTime::asap(parsed.normalized)
                } else if let Some(when) = parsed.absolute_utc {
                    PickupTime::at(parsed.normalized, when)
                } else {
                    PickupTime::asap(parsed.normalized)
                };
                if current.pickup_time.as_ref() != Some(&new_time) {
                    patch.time_changed = true;
                    patch.pickup_time = Some(new_time);
                }
            }
        }

        // Special instructions: always surfaced when non-empty, regardless
        // of whether it differs from the stored value.
        if let Some(text) = non_empty(&tool.special_instructions) {
            patch.special_instructions = Some(text.to_owned());
        }

        patch
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn matches_current(current: &Option<String>, incoming: &str) -> bool {
    match current {
        Some(existing) => existing.eq_ignore_ascii_case(incoming),
        None => false,
    }
}
