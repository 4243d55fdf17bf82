//! `skycast` - periodic weather-forecast fetching with retry scheduling
//!
//! This library fetches a multi-day forecast from a remote API on a
//! schedule, normalizes the responses into a stable forecast list, and
//! publishes snapshots for display.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod updater;
pub mod wind;

// Re-export core types for public API
pub use api::{FetchOutcome, ForecastClient, classify_response};
pub use config::{SkycastConfig, Units};
pub use error::SkycastError;
pub use models::{ForecastEntry, Phase, WeatherSnapshot, parse_forecast};
pub use updater::{NextFetch, Scheduler, Updater, WeatherState};
pub use wind::ms_to_beaufort;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkycastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
