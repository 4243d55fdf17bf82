//! `skycast` binary: runs the update loop and renders snapshots as text.

use anyhow::{Context, Result};
use skycast::config::SkycastConfig;
use skycast::models::{Phase, WeatherSnapshot};
use skycast::updater::Updater;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &SkycastConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        _ => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// Render one snapshot the way a display surface would: a configuration
/// hint, a loading indicator, an error line, or the forecast table.
fn render(snapshot: &WeatherSnapshot, max_days: usize) {
    match snapshot.phase {
        Phase::Unconfigured => {
            println!("Please set a weather location in the configuration.");
        }
        Phase::Errored => {
            println!("Weather unavailable: the API credential was rejected.");
        }
        _ if !snapshot.loaded => {
            println!("Loading forecast for {}...", snapshot.location_label);
        }
        _ => {
            println!("Forecast for {}:", snapshot.location_label);
            for entry in snapshot.forecast.iter().take(max_days) {
                println!(
                    "  {:<4} {:<16} {:>7} / {:>7}",
                    entry.day, entry.icon, entry.max_temp, entry.min_temp
                );
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("SKYCAST_CONFIG").map(PathBuf::from);
    let config = SkycastConfig::load_from_path(config_path)
        .with_context(|| "Failed to load configuration")?;

    init_logging(&config);
    info!("Starting skycast v{}", skycast::VERSION);

    let max_days = config.display.max_days as usize;
    let (updater, mut snapshots) = Updater::new(config)?;

    let renderer = tokio::spawn(async move {
        let initial = snapshots.borrow_and_update().clone();
        render(&initial, max_days);

        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            render(&snapshot, max_days);
        }
    });

    updater.run().await;
    renderer.await.ok();

    Ok(())
}
