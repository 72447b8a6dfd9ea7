use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::model::{Coordinates, LocationSample, PermissionResponse};

use super::LocationProvider;

pub const DEFAULT_ENDPOINT: &str = "http://ip-api.com/json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// IP geolocation lookups are city-level at best.
const APPROXIMATE_ACCURACY_M: f64 = 5_000.0;

/// Approximate position from the public address of this machine.
#[derive(Debug, Clone)]
pub struct IpApiProvider {
    endpoint: String,
    http: Client,
}

impl IpApiProvider {
    pub fn new(endpoint: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .context("Failed to build HTTP client for ip-api")?;

        Ok(Self { endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()), http })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

fn parse_body(body: &str, received_at: DateTime<Utc>) -> Result<LocationSample> {
    let parsed: IpApiResponse =
        serde_json::from_str(body).context("Failed to parse ip-api JSON")?;

    if parsed.status != "success" {
        return Err(anyhow!(
            "ip-api lookup failed: {}",
            parsed.message.as_deref().unwrap_or("no reason given")
        ));
    }

    let (lat, lon) = parsed
        .lat
        .zip(parsed.lon)
        .ok_or_else(|| anyhow!("ip-api response did not contain coordinates"))?;

    tracing::debug!(city = parsed.city.as_deref().unwrap_or("?"), lat, lon, "ip-api fix");

    let coordinates = Coordinates::new(lat, lon).with_accuracy(APPROXIMATE_ACCURACY_M);
    Ok(LocationSample::new(coordinates, received_at))
}

#[async_trait]
impl LocationProvider for IpApiProvider {
    async fn request_permission(&self) -> Result<PermissionResponse> {
        // No OS-level gate for network lookups; consent is asked by the front end.
        Ok(PermissionResponse::granted())
    }

    async fn current_position(&self) -> Result<LocationSample> {
        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .with_context(|| format!("Failed to send request to ip-api ({})", self.endpoint))?;

        let status = res.status();
        let body = res.text().await.context("Failed to read ip-api response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "ip-api request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        parse_body(&body, Utc::now())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
