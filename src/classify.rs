//! Threshold rules that decide whether a reading is an anomaly.

use crate::types::anomaly::{AnomalyKind, AnomalyType};

pub const DEFAULT_HIGH_TEMP_C: f64 = 35.0;
pub const DEFAULT_LOW_TEMP_C: f64 = -5.0;
pub const DEFAULT_HIGH_WIND_KMH: f64 = 30.0;

/// Current conditions for one city, as returned by the weather source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
}

/// The limits a reading must cross to count as anomalous.
///
/// All comparisons are strict: a reading exactly on a limit is normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub high_temp_c: f64,
    pub low_temp_c: f64,
    pub high_wind_kmh: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_temp_c: DEFAULT_HIGH_TEMP_C,
            low_temp_c: DEFAULT_LOW_TEMP_C,
            high_wind_kmh: DEFAULT_HIGH_WIND_KMH,
        }
    }
}

impl Thresholds {
    /// Every threshold the reading crosses, in label order.
    pub fn crossed(&self, reading: Reading) -> Vec<AnomalyKind> {
        let mut kinds = Vec::with_capacity(2);
        if reading.temperature_c > self.high_temp_c {
            kinds.push(AnomalyKind::HighTemp);
        }
        if reading.temperature_c < self.low_temp_c {
            kinds.push(AnomalyKind::LowTemp);
        }
        if reading.wind_speed_kmh > self.high_wind_kmh {
            kinds.push(AnomalyKind::HighWind);
        }
        kinds
    }

    /// Classifies a reading, returning `None` for normal conditions.
    pub fn classify(&self, reading: Reading) -> Option<AnomalyType> {
        AnomalyType::from_kinds(self.crossed(reading))
    }
}

/// Checks a reading against the default thresholds.
///
/// ```
/// use weather_anomalies::is_anomaly;
///
/// assert!(is_anomaly(35.1, 0.0));
/// assert!(!is_anomaly(35.0, 30.0));
/// ```
pub fn is_anomaly(temperature_c: f64, wind_speed_kmh: f64) -> bool {
    classify(Reading {
        temperature_c,
        wind_speed_kmh,
    })
    .is_some()
}

/// Classifies a reading against the default thresholds.
pub fn classify(reading: Reading) -> Option<AnomalyType> {
    Thresholds::default().classify(reading)
}
