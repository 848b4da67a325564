use serde::Serialize;

/// Structured trace events emitted by the booking orchestrator and its
/// collaborators.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    StageTransition {
        call_id: String,
        from: String,
        to: String,
    },
    RetryIncremented {
        call_id: String,
        key: String,
        count: u32,
        cap: u32,
    },
    Escalated {
        call_id: String,
        reason: String,
    },
    DuplicateTurnDropped {
        call_id: String,
        turn_id: String,
    },
    AddressVerified {
        call_id: String,
        which: String,
        normalized: String,
    },
    AddressVerificationFailed {
        call_id: String,
        which: String,
        attempt: u32,
    },
    FareQuoted {
        call_id: String,
        amount_minor_units: u32,
        currency: String,
        basis: String,
    },
    BackendDispatched {
        call_id: String,
        kind: String,
    },
    BookingConfirmed {
        call_id: String,
        booking_id: String,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "taxi_event");
    }
}
