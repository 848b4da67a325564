//! Local stand-ins for the geocoder/dispatcher/amender backends, used by
//! the REPL when no vendor base URL is configured. Deterministic so the
//! whole booking flow can be exercised offline: any raw address containing
//! "unknown" (case-insensitive) fails to geocode, everything else succeeds
//! with a synthesized normalized form.

use async_trait::async_trait;
use chrono::Utc;

use taxi_domain::contracts::{
    AmendResponse, DispatchResponse, Geocoder, GeocodeResponse,
};
use taxi_domain::error::Result;
use taxi_domain::slots::BookingSlots;

#[derive(Debug, Clone, Default)]
pub struct StubGeocoder;

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn geocode(&self, raw_address: &str) -> Result<GeocodeResponse> {
        if raw_address.to_ascii_lowercase().contains("unknown") {
            return Ok(GeocodeResponse {
                ok: false,
                ..Default::default()
            });
        }
        Ok(GeocodeResponse {
            ok: true,
            normalized_address: Some(format!("{raw_address}, UK")),
            ambiguous: false,
            alternatives: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubDispatcher;

#[async_trait]
impl taxi_domain::contracts::Dispatcher for StubDispatcher {
    async fn dispatch(&self, _slots: &BookingSlots) -> Result<DispatchResponse> {
        Ok(DispatchResponse {
            ok: true,
            booking_id: Some(format!("BK-{}", Utc::now().timestamp_millis())),
            error: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct StubAmender;

#[async_trait]
impl taxi_domain::contracts::Amender for StubAmender {
    async fn amend(&self, _booking_id: &str, _slots: &BookingSlots) -> Result<AmendResponse> {
        Ok(AmendResponse {
            ok: true,
            error: None,
        })
    }
}
