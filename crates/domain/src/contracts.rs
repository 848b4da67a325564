//! Collaborator contracts.
//!
//! The core consumes these traits but never implements them. The pure,
//! synchronous ones (`AddressParser`, `UkTimeParser`) are deterministic
//! text-processing collaborators; the asynchronous ones talk to vendor
//! APIs and live entirely in `taxi-collaborators`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Address parsing ─────────────────────────────────────────────────

/// Structural breakdown of a raw address string. Used only to decide
/// whether a street-type pickup lacks a house number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAddress {
    pub house_number: Option<String>,
    pub flat_or_unit: Option<String>,
    pub street_name: Option<String>,
    pub town_or_area: Option<String>,
    pub is_street_type: bool,
    pub has_house_number: bool,
}

pub trait AddressParser: Send + Sync {
    fn parse(&self, text: &str) -> ParsedAddress;
}

// ── UK time parsing ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTime {
    pub normalized: String,
    pub is_asap: bool,
    pub absolute_utc: Option<DateTime<Utc>>,
}

pub trait UkTimeParser: Send + Sync {
    /// Returns `None` when the phrase is unparseable; the core treats
    /// that identically to "not provided".
    fn parse(&self, text: &str) -> Option<ParsedTime>;
}

// ── Geocoder ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct GeocodeResponse {
    pub ok: bool,
    pub normalized_address: Option<String>,
    pub ambiguous: bool,
    pub alternatives: Vec<String>,
}

#[async_trait::async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, raw_address: &str) -> crate::error::Result<GeocodeResponse>;
}

// ── Dispatcher ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct DispatchResponse {
    pub ok: bool,
    pub booking_id: Option<String>,
    pub error: Option<String>,
}

#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        slots: &crate::slots::BookingSlots,
    ) -> crate::error::Result<DispatchResponse>;
}

// ── Amender ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct AmendResponse {
    pub ok: bool,
    pub error: Option<String>,
}

#[async_trait::async_trait]
pub trait Amender: Send + Sync {
    async fn amend(
        &self,
        booking_id: &str,
        slots: &crate::slots::BookingSlots,
    ) -> crate::error::Result<AmendResponse>;
}

// ── Human transfer / hangup ──────────────────────────────────────────

/// Fire-and-forget sink for transfers and hangups.
#[async_trait::async_trait]
pub trait HumanTransferSink: Send + Sync {
    async fn transfer(&self, reason: &str);
    async fn hangup(&self, text: &str);
}
