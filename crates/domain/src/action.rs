//! Outbound action vocabulary.
//!
//! Action construction has no side effects: building a `NextAction` never
//! performs I/O. The outer shell is responsible for actually speaking
//! `Ask` text, placing geocode/dispatch/amend calls, and tearing down the
//! call on `Hangup`.

use serde::{Deserialize, Serialize};

use crate::slots::BookingSlots;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NextAction {
    /// Speak `text` to the caller. No state implications for the core.
    Ask { text: String },
    /// Resolve `raw` against the geocoder; expect a matching `BackendResult`.
    GeocodePickup { raw: String },
    GeocodeDropoff { raw: String },
    /// Dispatch the booking; expect a matching `BackendResult`.
    Dispatch { slots: BookingSlots },
    /// Amend an existing booking; expect a matching `BackendResult`.
    Amend {
        booking_id: String,
        slots: BookingSlots,
    },
    /// Hand the call off to a human operator.
    TransferToHuman { reason: String },
    /// End the call.
    Hangup { text: String },
    /// No action required (duplicate event, stale result, etc).
    None { reason: String },
}
