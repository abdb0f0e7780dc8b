//! Serves the read-only anomaly dashboard.

use log::error;
use weather_anomalies::{serve, TrackerConfig, TrackerError};

#[tokio::main]
async fn main() -> Result<(), TrackerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = TrackerConfig::from_env().inspect_err(|e| error!("{}", e))?;
    serve(config)
        .await
        .inspect_err(|e| error!("Dashboard stopped: {}", e))
}
