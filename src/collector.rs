//! One fetch, classify and append cycle over the city registry.

use crate::config::TrackerConfig;
use crate::error::TrackerError;
use crate::store::dataset::AnomalyStore;
use crate::types::anomaly::AnomalyRecord;
use crate::weather::client::OpenMeteoClient;
use chrono::{DateTime, TimeDelta, Utc};
use log::{error, info, warn};

/// A city whose reading could not be obtained during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct CityFailure {
    pub city: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub processed_at: DateTime<Utc>,
    /// Records appended by this run, in registry order.
    pub anomalies: Vec<AnomalyRecord>,
    pub failures: Vec<CityFailure>,
    pub cities_checked: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The last logged run was too recent; nothing was fetched or written.
    Skipped {
        last_processed_at: DateTime<Utc>,
        elapsed: TimeDelta,
    },
    Completed(RunReport),
}

pub struct Collector<'a> {
    config: &'a TrackerConfig,
    client: &'a OpenMeteoClient,
    store: &'a AnomalyStore,
}

impl<'a> Collector<'a> {
    pub fn new(
        config: &'a TrackerConfig,
        client: &'a OpenMeteoClient,
        store: &'a AnomalyStore,
    ) -> Self {
        Self {
            config,
            client,
            store,
        }
    }

    /// The dedup guard. Reads the newest stored timestamp and returns it with the
    /// elapsed time when `0 <= now - last < dedup_window`.
    ///
    /// Only logged runs leave a timestamp, so a run that found nothing never
    /// suppresses the next one. A dataset that cannot be read does not block the run.
    async fn recent_run(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, TimeDelta)> {
        let store = self.store.clone();
        let last = match tokio::task::spawn_blocking(move || store.last_processed_at()).await {
            Ok(Ok(last)) => last?,
            Ok(Err(e)) => {
                warn!(
                    "Could not read last run time from {}, continuing without dedup guard: {}",
                    self.store.path().display(),
                    e
                );
                return None;
            }
            Err(e) => {
                warn!("Dedup guard task failed, continuing without it: {}", e);
                return None;
            }
        };
        let window = TimeDelta::from_std(self.config.dedup_window).unwrap_or(TimeDelta::MAX);
        let elapsed = now - last;
        (elapsed >= TimeDelta::zero() && elapsed < window).then_some((last, elapsed))
    }

    /// Runs one collection cycle stamped with `now`.
    ///
    /// Per-city fetch failures are logged and reported, never returned.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] if the batch cannot be written, or
    /// [`TrackerError::Task`] if the blocking write task panicked.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome, TrackerError> {
        if let Some((last_processed_at, elapsed)) = self.recent_run(now).await {
            warn!(
                "Skipping run, only {} s since last run (threshold: {} s)",
                elapsed.num_seconds(),
                self.config.dedup_window.as_secs()
            );
            return Ok(RunOutcome::Skipped {
                last_processed_at,
                elapsed,
            });
        }

        let mut anomalies = Vec::new();
        let mut failures = Vec::new();

        for city in &self.config.cities {
            let reading = match self.client.current(city.location).await {
                Ok(reading) => reading,
                Err(e) => {
                    error!("Error fetching data for {}: {}", city.name, e);
                    failures.push(CityFailure {
                        city: city.name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            if let Some(anomaly_type) = self.config.thresholds.classify(reading) {
                info!(
                    "{}: {} ({:.1} °C, {:.1} km/h)",
                    city.name, anomaly_type, reading.temperature_c, reading.wind_speed_kmh
                );
                anomalies.push(AnomalyRecord {
                    city: city.name.clone(),
                    temperature_c: reading.temperature_c,
                    wind_speed_kmh: reading.wind_speed_kmh,
                    processed_at: now,
                    anomaly_type,
                });
            }
        }

        if anomalies.is_empty() {
            info!("No anomalies detected.");
        } else {
            let store = self.store.clone();
            let batch = anomalies.clone();
            tokio::task::spawn_blocking(move || store.append(&batch)).await??;
            info!("Logged {} anomalies successfully.", anomalies.len());
        }

        Ok(RunOutcome::Completed(RunReport {
            processed_at: now,
            anomalies,
            failures,
            cities_checked: self.config.cities.len(),
        }))
    }
}
