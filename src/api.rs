//! HTTP client for the forecast API
//!
//! This module issues one GET per scheduled tick and classifies the result
//! into the outcome the update loop feeds through its state machine. Retrying
//! is never done here; failure recovery is a scheduling decision made by the
//! caller.

use crate::SkycastError;
use crate::config::{SkycastConfig, Units};
use crate::models::{ForecastEntry, envelope::QueryResponse, parse_forecast};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Result of one fetch attempt, as seen by the update loop
#[derive(Debug)]
pub enum FetchOutcome {
    /// HTTP 200 with a parseable forecast payload
    Success(Vec<ForecastEntry>),
    /// HTTP 200 but the results envelope is empty; data is not ready yet
    NoData,
    /// HTTP 401; the credential is bad and retrying will not help
    Unauthorized,
    /// Anything else: non-200 status, network failure, malformed body
    Transient(SkycastError),
}

/// Forecast API client
pub struct ForecastClient {
    /// HTTP client
    client: Client,
    /// API configuration
    config: SkycastConfig,
}

impl ForecastClient {
    /// Create a new forecast API client
    pub fn new(config: SkycastConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.weather.timeout_seconds.into());

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("skycast/", env!("CARGO_PKG_VERSION")))
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Build the structured query selecting the forecast for the configured
    /// place. A place id is preferred over free-text matching when set.
    fn build_query(&self) -> String {
        let weather = &self.config.weather;

        let mut query = if !weather.location_id.is_empty() {
            format!(
                "select item from weather.forecast where woeid='{}'",
                weather.location_id
            )
        } else {
            format!(
                "select item from weather.forecast where woeid in (select woeid from geo.places(1) where text='{}')",
                weather.location
            )
        };

        if weather.units == Units::Metric {
            query.push_str(" and u='c'");
        }

        query
    }

    /// Full request URL with the escaped query parameters
    fn request_url(&self) -> String {
        let weather = &self.config.weather;
        format!(
            "{}{}/{}?q={}&format=json",
            weather.base_url,
            weather.api_version,
            weather.forecast_endpoint,
            urlencoding::encode(&self.build_query())
        )
    }

    /// Issue one GET and classify the response.
    ///
    /// Exactly one response is awaited per call. The request itself is never
    /// aborted once sent; a hung server is recovered from by the next
    /// scheduled attempt, not by cancellation.
    #[instrument(skip(self))]
    pub async fn fetch_forecast(&self) -> FetchOutcome {
        let url = self.request_url();
        debug!("Requesting forecast: {url}");

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Network error fetching forecast: {e}");
                return FetchOutcome::Transient(SkycastError::api(format!("network error: {e}")));
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to read forecast response body: {e}");
                return FetchOutcome::Transient(SkycastError::api(format!(
                    "failed to read response body: {e}"
                )));
            }
        };

        classify_response(status, &body)
    }
}

/// Map an HTTP status and body onto a fetch outcome.
///
/// A body that is valid envelope JSON with the results subtree missing
/// counts as `NoData`; a body that fails deserialization is a transient
/// failure.
pub fn classify_response(status: StatusCode, body: &str) -> FetchOutcome {
    if status == StatusCode::UNAUTHORIZED {
        error!("Forecast API rejected the credential (HTTP 401)");
        return FetchOutcome::Unauthorized;
    }

    if status != StatusCode::OK {
        warn!("Forecast request failed with status {status}");
        return FetchOutcome::Transient(SkycastError::api(format!(
            "unexpected status: {status}"
        )));
    }

    match serde_json::from_str::<QueryResponse>(body) {
        Ok(response) => match parse_forecast(&response) {
            Some(entries) => {
                info!("Fetched {} forecast entries", entries.len());
                FetchOutcome::Success(entries)
            }
            None => {
                debug!("Forecast results not available yet");
                FetchOutcome::NoData
            }
        },
        Err(e) => {
            warn!("Malformed forecast body: {e}");
            FetchOutcome::Transient(SkycastError::parse(format!("malformed body: {e}")))
        }
    }
}
