//! Update scheduling loop and state transitions
//!
//! One pending delay drives one fetch at a time. The scheduler's slot is an
//! `Option`, so two armed timers cannot be represented; arming always
//! replaces whatever was pending. The next tick is armed only after the
//! previous response has been handled, which keeps fetches from overlapping.

use crate::api::{FetchOutcome, ForecastClient};
use crate::config::SkycastConfig;
use crate::models::{ForecastEntry, Phase, WeatherSnapshot};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Scheduling decision produced by handling one fetch outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextFetch {
    /// Use the configured normal update interval
    Interval,
    /// Use the configured (shorter) retry delay
    Retry,
    /// Use this explicit delay
    After(Duration),
    /// Do not schedule another fetch
    Halt,
}

/// Owns the single pending delay between ticks
#[derive(Debug)]
pub struct Scheduler {
    interval: Duration,
    retry_delay: Duration,
    pending: Option<Duration>,
}

impl Scheduler {
    /// Create a disarmed scheduler with the configured delays
    #[must_use]
    pub fn new(interval: Duration, retry_delay: Duration) -> Self {
        Self {
            interval,
            retry_delay,
            pending: None,
        }
    }

    /// Arm the next tick, replacing any pending one. `Halt` disarms.
    pub fn schedule(&mut self, next: NextFetch) {
        self.pending = match next {
            NextFetch::Interval => Some(self.interval),
            NextFetch::Retry => Some(self.retry_delay),
            NextFetch::After(delay) => Some(delay),
            NextFetch::Halt => None,
        };
    }

    /// Take the pending delay, leaving the scheduler disarmed until the
    /// outcome of the fired tick schedules the next one.
    pub fn take(&mut self) -> Option<Duration> {
        self.pending.take()
    }

    /// Currently armed delay, if any
    #[must_use]
    pub fn pending(&self) -> Option<Duration> {
        self.pending
    }
}

/// Mutable loop state: the forecast list, the loaded flag and the phase.
///
/// Plain data with explicit transitions, so tests can construct and inspect
/// it directly.
#[derive(Debug, Clone)]
pub struct WeatherState {
    phase: Phase,
    forecast: Vec<ForecastEntry>,
    loaded: bool,
    credential: Option<String>,
    location_label: String,
}

impl WeatherState {
    /// Initial state derived from configuration
    #[must_use]
    pub fn new(config: &SkycastConfig) -> Self {
        let phase = if config.has_location() {
            Phase::Loading
        } else {
            Phase::Unconfigured
        };

        Self {
            phase,
            forecast: Vec::new(),
            loaded: false,
            credential: config.weather.app_id.clone(),
            location_label: config.location_label(),
        }
    }

    /// Apply one fetch outcome and decide when to fetch next.
    ///
    /// Success replaces the forecast wholesale and latches the loaded flag;
    /// an empty envelope and a transient failure leave state untouched; a
    /// rejected credential clears it and halts the loop. Each outcome picks
    /// its delay on its own, regardless of whether a load happened before.
    pub fn apply(&mut self, outcome: FetchOutcome) -> NextFetch {
        match outcome {
            FetchOutcome::Success(entries) => {
                info!("Forecast updated: {} entries", entries.len());
                self.forecast = entries;
                self.loaded = true;
                self.phase = Phase::Loaded;
                NextFetch::Interval
            }
            FetchOutcome::NoData => {
                debug!("No forecast data this cycle");
                NextFetch::Interval
            }
            FetchOutcome::Unauthorized => {
                error!("Credential rejected; halting updates until reconfigured");
                self.credential = None;
                self.phase = Phase::Errored;
                NextFetch::Halt
            }
            FetchOutcome::Transient(e) => {
                warn!("Could not load forecast: {e}");
                NextFetch::Retry
            }
        }
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True once the first forecast has loaded
    #[must_use]
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Forecast entries in API order
    #[must_use]
    pub fn forecast(&self) -> &[ForecastEntry] {
        &self.forecast
    }

    /// Stored credential, cleared after the API rejects it
    #[must_use]
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }

    /// Consumer-facing snapshot of this state
    #[must_use]
    pub fn snapshot(&self) -> WeatherSnapshot {
        WeatherSnapshot {
            phase: self.phase,
            loaded: self.loaded,
            forecast: self.forecast.clone(),
            location_label: self.location_label.clone(),
        }
    }
}

/// Drives the fetch/reschedule cycle and publishes snapshots to consumers
pub struct Updater {
    client: ForecastClient,
    scheduler: Scheduler,
    state: WeatherState,
    publisher: watch::Sender<WeatherSnapshot>,
}

impl Updater {
    /// Build the updater and the snapshot channel consumers read from.
    ///
    /// The first tick is armed immediately with the initial load delay.
    pub fn new(config: SkycastConfig) -> Result<(Self, watch::Receiver<WeatherSnapshot>)> {
        let mut scheduler = Scheduler::new(
            config.schedule.update_interval(),
            config.schedule.retry_delay(),
        );
        scheduler.schedule(NextFetch::After(config.schedule.initial_load_delay()));

        let state = WeatherState::new(&config);
        let (publisher, subscriber) = watch::channel(state.snapshot());
        let client = ForecastClient::new(config)?;

        Ok((
            Self {
                client,
                scheduler,
                state,
                publisher,
            },
            subscriber,
        ))
    }

    /// Run until the scheduler is left disarmed.
    ///
    /// That only happens on a terminal authentication failure; recovery from
    /// it requires reconfiguring and restarting the loop.
    pub async fn run(mut self) {
        while let Some(delay) = self.scheduler.take() {
            tokio::time::sleep(delay).await;

            let outcome = self.client.fetch_forecast().await;
            let next = self.state.apply(outcome);
            self.publisher.send_replace(self.state.snapshot());
            self.scheduler.schedule(next);
        }

        info!("Update loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkycastError;

    fn test_config() -> SkycastConfig {
        let mut config = SkycastConfig::default();
        config.weather.location = "Lisbon".to_string();
        config.weather.app_id = Some("secret".to_string());
        config
    }

    fn sample_entries() -> Vec<ForecastEntry> {
        vec![ForecastEntry {
            day: "Mon".to_string(),
            icon: "wi wi-yahoo-32".to_string(),
            max_temp: "70.0".to_string(),
            min_temp: "50.0".to_string(),
        }]
    }

    #[test]
    fn test_scheduler_resolves_choices() {
        let mut scheduler = Scheduler::new(Duration::from_secs(600), Duration::from_secs(2));

        scheduler.schedule(NextFetch::Interval);
        assert_eq!(scheduler.pending(), Some(Duration::from_secs(600)));

        scheduler.schedule(NextFetch::Retry);
        assert_eq!(scheduler.pending(), Some(Duration::from_secs(2)));

        scheduler.schedule(NextFetch::After(Duration::from_millis(100)));
        assert_eq!(scheduler.pending(), Some(Duration::from_millis(100)));

        scheduler.schedule(NextFetch::Halt);
        assert_eq!(scheduler.pending(), None);
    }

    #[test]
    fn test_scheduler_take_disarms() {
        let mut scheduler = Scheduler::new(Duration::from_secs(600), Duration::from_secs(2));
        scheduler.schedule(NextFetch::Interval);

        assert_eq!(scheduler.take(), Some(Duration::from_secs(600)));
        assert_eq!(scheduler.take(), None);
        assert_eq!(scheduler.pending(), None);
    }

    #[test]
    fn test_state_starts_loading_with_location() {
        let state = WeatherState::new(&test_config());
        assert_eq!(state.phase(), Phase::Loading);
        assert!(!state.loaded());
        assert!(state.forecast().is_empty());
        assert_eq!(state.credential(), Some("secret"));
    }

    #[test]
    fn test_state_starts_unconfigured_without_location() {
        let state = WeatherState::new(&SkycastConfig::default());
        assert_eq!(state.phase(), Phase::Unconfigured);
    }

    #[test]
    fn test_success_replaces_forecast_and_latches_loaded() {
        let mut state = WeatherState::new(&test_config());

        let next = state.apply(FetchOutcome::Success(sample_entries()));
        assert_eq!(next, NextFetch::Interval);
        assert_eq!(state.phase(), Phase::Loaded);
        assert!(state.loaded());
        assert_eq!(state.forecast().len(), 1);
    }

    #[test]
    fn test_no_data_leaves_state_untouched_but_uses_interval() {
        let mut state = WeatherState::new(&test_config());
        state.apply(FetchOutcome::Success(sample_entries()));

        let before = state.snapshot();
        let next = state.apply(FetchOutcome::NoData);

        assert_eq!(next, NextFetch::Interval);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn test_transient_failure_keeps_forecast_and_retries() {
        let mut state = WeatherState::new(&test_config());
        state.apply(FetchOutcome::Success(sample_entries()));

        let next = state.apply(FetchOutcome::Transient(SkycastError::api("boom")));

        assert_eq!(next, NextFetch::Retry);
        assert_eq!(state.phase(), Phase::Loaded);
        assert!(state.loaded());
        assert_eq!(state.forecast().len(), 1);
    }

    #[test]
    fn test_transient_failure_before_first_load() {
        let mut state = WeatherState::new(&test_config());
        let next = state.apply(FetchOutcome::Transient(SkycastError::api("boom")));

        assert_eq!(next, NextFetch::Retry);
        assert_eq!(state.phase(), Phase::Loading);
        assert!(!state.loaded());
    }

    #[test]
    fn test_unauthorized_clears_credential_and_halts() {
        let mut state = WeatherState::new(&test_config());
        state.apply(FetchOutcome::Success(sample_entries()));

        let next = state.apply(FetchOutcome::Unauthorized);

        assert_eq!(next, NextFetch::Halt);
        assert_eq!(state.phase(), Phase::Errored);
        assert_eq!(state.credential(), None);
        // The last good forecast and the loaded flag survive the auth failure.
        assert!(state.loaded());
        assert_eq!(state.forecast().len(), 1);
    }

    #[test]
    fn test_updater_arms_initial_delay() {
        let (updater, subscriber) = Updater::new(test_config()).expect("updater builds");
        assert_eq!(
            updater.scheduler.pending(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(subscriber.borrow().phase, Phase::Loading);
        assert!(!subscriber.borrow().loaded);
    }
}
