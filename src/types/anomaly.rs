//! Defines the anomaly labels and the `AnomalyRecord` row persisted to the dataset.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator placed between labels when several thresholds are crossed at once.
pub const LABEL_SEPARATOR: &str = " + ";

/// A single threshold that a reading can cross.
///
/// The declaration order is the order in which labels are joined, so a reading
/// that is both too hot and too windy is labelled `"High Temp + High Wind"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AnomalyKind {
    /// Temperature above the high threshold (35 °C by default).
    HighTemp,
    /// Temperature below the low threshold (-5 °C by default).
    LowTemp,
    /// Wind speed above the wind threshold (30 km/h by default).
    HighWind,
}

impl AnomalyKind {
    pub fn label(&self) -> &'static str {
        match self {
            AnomalyKind::HighTemp => "High Temp",
            AnomalyKind::LowTemp => "Low Temp",
            AnomalyKind::HighWind => "High Wind",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "High Temp" => Some(AnomalyKind::HighTemp),
            "Low Temp" => Some(AnomalyKind::LowTemp),
            "High Wind" => Some(AnomalyKind::HighWind),
            _ => None,
        }
    }
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnomalyTypeParseError {
    #[error("Anomaly type label is empty")]
    Empty,

    #[error("Unknown anomaly label '{0}'")]
    UnknownLabel(String),
}

/// The full classification of one reading: every threshold it crossed.
///
/// Kinds are kept sorted and unique, so two readings crossing the same thresholds
/// always produce the same label. A compound label such as `"Low Temp + High Wind"`
/// is treated as its own category by the dashboard, never decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnomalyType {
    kinds: Vec<AnomalyKind>,
}

impl AnomalyType {
    /// Builds a type from the crossed thresholds. Returns `None` when nothing was crossed.
    pub fn from_kinds(kinds: impl IntoIterator<Item = AnomalyKind>) -> Option<Self> {
        let mut kinds: Vec<AnomalyKind> = kinds.into_iter().collect();
        kinds.sort();
        kinds.dedup();
        if kinds.is_empty() {
            None
        } else {
            Some(Self { kinds })
        }
    }

    /// The label as stored in the `anomaly_type` column.
    pub fn label(&self) -> String {
        self.kinds
            .iter()
            .map(AnomalyKind::label)
            .collect::<Vec<_>>()
            .join(LABEL_SEPARATOR)
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for AnomalyType {
    type Err = AnomalyTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AnomalyTypeParseError::Empty);
        }
        let kinds = trimmed
            .split('+')
            .map(|part| {
                let part = part.trim();
                AnomalyKind::from_label(part)
                    .ok_or_else(|| AnomalyTypeParseError::UnknownLabel(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        AnomalyType::from_kinds(kinds).ok_or(AnomalyTypeParseError::Empty)
    }
}

impl Serialize for AnomalyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// One anomalous reading, as appended to the dataset.
///
/// All records written by the same collector run share `processed_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub city: String,
    pub temperature_c: f64,
    pub wind_speed_kmh: f64,
    pub processed_at: DateTime<Utc>,
    pub anomaly_type: AnomalyType,
}
