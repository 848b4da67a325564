//! HTTP dispatcher client: submits a verified booking to the
//! fleet API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use taxi_domain::contracts::{DispatchResponse, Dispatcher};
use taxi_domain::error::{Error, Result};
use taxi_domain::slots::BookingSlots;

use crate::from_reqwest;

#[derive(Debug, Deserialize)]
struct VendorDispatchResponse {
    #[serde(default)]
    booking_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpDispatcher {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    async fn dispatch(&self, slots: &BookingSlots) -> Result<DispatchResponse> {
        let url = format!("{}/v1/bookings", self.base_url);
        let mut req = self.http.post(&url).json(slots);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let start = Instant::now();
        let resp = req.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        tracing::debug!(
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "dispatch request"
        );

        let body = resp.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            return Ok(DispatchResponse {
                ok: false,
                booking_id: None,
                error: Some(format!("dispatch returned {status}: {body}")),
            });
        }

        let parsed: VendorDispatchResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Dispatcher(format!("parsing dispatch response: {e}: {body}")))?;

        Ok(DispatchResponse {
            ok: parsed.booking_id.is_some(),
            booking_id: parsed.booking_id,
            error: parsed.error,
        })
    }
}
