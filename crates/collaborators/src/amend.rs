//! HTTP amender client: patches an existing booking in the
//! fleet API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use taxi_domain::contracts::{AmendResponse, Amender};
use taxi_domain::error::{Error, Result};
use taxi_domain::slots::BookingSlots;

use crate::from_reqwest;

#[derive(Debug, Deserialize, Default)]
struct VendorAmendResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpAmender {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpAmender {
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
impl Amender for HttpAmender {
    async fn amend(&self, booking_id: &str, slots: &BookingSlots) -> Result<AmendResponse> {
        let url = format!("{}/v1/bookings/{booking_id}", self.base_url);
        let mut req = self.http.patch(&url).json(slots);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let start = Instant::now();
        let resp = req.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        tracing::debug!(
            booking_id,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "amend request"
        );

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Ok(AmendResponse {
                ok: false,
                error: Some(format!("amend returned {status}: {body}")),
            });
        }

        let body = resp.text().await.map_err(from_reqwest)?;
        let parsed: VendorAmendResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Amender(format!("parsing amend response: {e}: {body}")))?;

        Ok(AmendResponse {
            ok: parsed.ok,
            error: parsed.error,
        })
    }
}
