//! HTTP geocoder client. Wraps a `reqwest::Client` and
//! translates the vendor's wire format into `GeocodeResponse`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use taxi_domain::contracts::{Geocoder, GeocodeResponse};
use taxi_domain::error::{Error, Result};

use crate::from_reqwest;

#[derive(Debug, Deserialize)]
struct VendorGeocodeResponse {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    ambiguous: bool,
    #[serde(default)]
    alternatives: Vec<String>,
}

/// Geocoder backed by a vendor HTTP API. Created once and reused for the
/// lifetime of the call handler process; the underlying `reqwest::Client`
/// keeps its own connection pool.
#[derive(Debug, Clone)]
pub struct HttpGeocoder {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpGeocoder {
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
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, raw_address: &str) -> Result<GeocodeResponse> {
        let url = format!("{}/v1/geocode", self.base_url);
        let mut req = self.http.get(&url).query(&[("address", raw_address)]);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let start = Instant::now();
        let resp = req.send().await.map_err(from_reqwest)?;
        let status = resp.status();
        tracing::debug!(
            address = raw_address,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "geocode request"
        );

        if !status.is_success() {
            return Ok(GeocodeResponse {
                ok: false,
                ..Default::default()
            });
        }

        let body = resp.text().await.map_err(from_reqwest)?;
        let parsed: VendorGeocodeResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Geocoder(format!("parsing geocode response: {e}: {body}")))?;

        Ok(GeocodeResponse {
            ok: !parsed.ambiguous && parsed.formatted_address.is_some(),
            normalized_address: parsed.formatted_address,
            ambiguous: parsed.ambiguous,
            alternatives: parsed.alternatives,
        })
    }
}
