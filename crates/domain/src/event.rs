//! Inbound event vocabulary.

use serde::{Deserialize, Serialize};

/// Caller intent, parsed upstream (by the patch extractor) from a small
/// closed set of synonyms. The core never infers intent from slot changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    #[default]
    Unknown,
    Confirm,
    Decline,
    Cancel,
    Amend,
    NewBooking,
}

impl Intent {
    /// Resolve from a small closed set of synonyms.
    pub fn from_text(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "confirm" => Intent::Confirm,
            "no" | "decline" => Intent::Decline,
            "cancel" => Intent::Cancel,
            "amend" => Intent::Amend,
            "new" | "new_booking" => Intent::NewBooking,
            _ => Intent::Unknown,
        }
    }
}

/// A tool invocation from the speech model, carrying whatever slots it
/// chose to fill in this turn. Every field is optional; absence means
/// "not mentioned this turn", not "clear this slot".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolSync {
    pub turn_id: Option<String>,
    pub pickup: Option<String>,
    pub destination: Option<String>,
    pub passengers: Option<u8>,
    pub pickup_time: Option<String>,
    pub intent: Option<String>,
    pub special_instructions: Option<String>,
    /// Supplemental plumbing field: a straight-line
    /// distance hint in meters, used only by the fare estimator.
    pub distance_hint_meters: Option<f64>,
}

/// Which backend a `BackendResult` resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    GeocodePickup,
    GeocodeDropoff,
    Dispatch,
    Amend,
}

/// The asynchronous result of a backend operation the core previously
/// requested via a `NextAction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResult {
    pub kind: BackendKind,
    pub ok: bool,
    pub normalized_address: Option<String>,
    pub booking_id: Option<String>,
    pub error: Option<String>,
}

/// The two kinds of inbound events the core accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ToolSync(ToolSync),
    BackendResult(BackendResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_synonyms() {
        assert_eq!(Intent::from_text("Yes"), Intent::Confirm);
        assert_eq!(Intent::from_text("y"), Intent::Confirm);
        assert_eq!(Intent::from_text("no"), Intent::Decline);
        assert_eq!(Intent::from_text("CANCEL"), Intent::Cancel);
        assert_eq!(Intent::from_text("amend"), Intent::Amend);
        assert_eq!(Intent::from_text("new_booking"), Intent::NewBooking);
        assert_eq!(Intent::from_text("banana"), Intent::Unknown);
    }
}
