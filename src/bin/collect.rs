//! One collection run: fetch every city, log anomalies, exit.
//!
//! Meant to be started by an external scheduler (cron, systemd timer, CI).

use chrono::Utc;
use log::{error, info};
use weather_anomalies::{
    AnomalyStore, Collector, OpenMeteoClient, RunOutcome, TrackerConfig, TrackerError,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), TrackerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    collect()
        .await
        .inspect_err(|e| error!("Collection run failed: {}", e))
}

async fn collect() -> Result<(), TrackerError> {
    let config = TrackerConfig::from_env()?;
    let client = OpenMeteoClient::from_config(&config)?;
    let store = AnomalyStore::from_config(&config);

    match Collector::new(&config, &client, &store).run(Utc::now()).await? {
        RunOutcome::Skipped { .. } => {}
        RunOutcome::Completed(report) => info!(
            "Checked {} cities: {} anomalies, {} failures",
            report.cities_checked,
            report.anomalies.len(),
            report.failures.len()
        ),
    }

    Ok(())
}
