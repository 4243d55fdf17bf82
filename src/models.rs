//! Data models for forecast entries and API responses
//!
//! This module contains the normalized forecast list handed to consumers,
//! the raw response envelope the forecast API returns, and the conversion
//! between the two.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Icon-font namespace prepended to raw condition codes
pub const ICON_PREFIX: &str = "wi wi-yahoo-";

/// Date format used by the forecast API, e.g. "01 Jan 2024"
const FORECAST_DATE_FORMAT: &str = "%d %b %Y";

/// One day's normalized forecast as shown to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Abbreviated weekday label, e.g. "Mon"
    pub day: String,
    /// Icon-font class token, e.g. "wi wi-yahoo-32"
    pub icon: String,
    /// High temperature as fixed-point text with one fractional digit
    pub max_temp: String,
    /// Low temperature as fixed-point text with one fractional digit
    pub min_temp: String,
}

impl ForecastEntry {
    fn from_raw(raw: &envelope::RawForecast) -> Self {
        Self {
            day: weekday_label(&raw.date),
            icon: format!("{ICON_PREFIX}{}", raw.code),
            max_temp: format_temperature(raw.high),
            min_temp: format_temperature(raw.low),
        }
    }
}

/// Lifecycle phase of the update loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No location configured; the loop runs but cannot produce useful data
    Unconfigured,
    /// Waiting for the first successful fetch
    #[default]
    Loading,
    /// At least one forecast has been loaded
    Loaded,
    /// The API rejected the credential and the loop has been halted
    Errored,
}

/// Point-in-time view of the loop state published to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Current lifecycle phase
    pub phase: Phase,
    /// True once the first forecast has loaded; never reset afterwards
    pub loaded: bool,
    /// Forecast entries in the order the API returned them
    pub forecast: Vec<ForecastEntry>,
    /// Label of the configured place, empty when unconfigured
    pub location_label: String,
}

/// Normalize a raw envelope into the consumer-facing forecast list.
///
/// Returns `None` when the nested results shape is absent; the API answered
/// but has no data yet, which callers treat as "no update this cycle".
/// Record order is preserved exactly as received.
#[must_use]
pub fn parse_forecast(response: &envelope::QueryResponse) -> Option<Vec<ForecastEntry>> {
    let records = response
        .query
        .as_ref()?
        .results
        .as_ref()?
        .channel
        .as_ref()?
        .item
        .as_ref()?
        .forecast
        .as_ref()?;

    Some(records.iter().map(ForecastEntry::from_raw).collect())
}

/// Reformat an API date as its abbreviated weekday name.
///
/// A record with a date in an unexpected format keeps its raw text as the
/// label so one odd record does not discard the whole list.
fn weekday_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, FORECAST_DATE_FORMAT)
        .map(|d| d.format("%a").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// Round half-up to one decimal and keep the trailing zero.
#[must_use]
pub fn format_temperature(value: f64) -> String {
    format!("{:.1}", (value * 10.0).round() / 10.0)
}

/// Accept temperatures both as JSON strings (what the live API sends) and
/// as plain numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
    }
}

/// Raw response envelope from the forecast API.
///
/// Every level is optional on this side: a missing `results` subtree means
/// "no data yet", not a protocol error.
pub mod envelope {
    use serde::Deserialize;

    /// Top-level response object
    #[derive(Debug, Deserialize)]
    pub struct QueryResponse {
        pub query: Option<Query>,
    }

    /// Query metadata and results
    #[derive(Debug, Deserialize)]
    pub struct Query {
        pub results: Option<Results>,
    }

    /// Results wrapper
    #[derive(Debug, Deserialize)]
    pub struct Results {
        pub channel: Option<Channel>,
    }

    /// Feed channel
    #[derive(Debug, Deserialize)]
    pub struct Channel {
        pub item: Option<Item>,
    }

    /// Channel item holding the forecast array
    #[derive(Debug, Deserialize)]
    pub struct Item {
        pub forecast: Option<Vec<RawForecast>>,
    }

    /// One raw daily forecast record
    #[derive(Debug, Deserialize)]
    pub struct RawForecast {
        pub date: String,
        pub code: String,
        #[serde(deserialize_with = "super::string_or_number")]
        pub high: f64,
        #[serde(deserialize_with = "super::string_or_number")]
        pub low: f64,
    }
}
