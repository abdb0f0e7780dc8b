//! Derived views of a filtered record set: metrics, chart series and the raw table.

use crate::types::anomaly::AnomalyRecord;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Column labels of the raw data table.
pub const TABLE_HEADERS: [&str; 5] = ["City", "Temp (°C)", "Wind (km/h)", "Recorded At", "Type"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub cities_affected: usize,
    /// `None` for an empty set.
    pub mean_temperature_c: Option<f64>,
}

pub fn summarize(records: &[AnomalyRecord]) -> Summary {
    let cities: BTreeSet<&str> = records.iter().map(|r| r.city.as_str()).collect();
    let mean_temperature_c = if records.is_empty() {
        None
    } else {
        let sum: f64 = records.iter().map(|r| r.temperature_c).sum();
        Some(sum / records.len() as f64)
    };
    Summary {
        total: records.len(),
        cities_affected: cities.len(),
        mean_temperature_c,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    WindSpeed,
}

impl Metric {
    fn value(&self, record: &AnomalyRecord) -> f64 {
        match self {
            Metric::Temperature => record.temperature_c,
            Metric::WindSpeed => record.wind_speed_kmh,
        }
    }

    pub fn axis_label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature (°C)",
            Metric::WindSpeed => "Wind speed (km/h)",
        }
    }
}

/// One city's points for a time-series chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySeries {
    pub city: String,
    pub times: Vec<DateTime<Utc>>,
    pub values: Vec<f64>,
}

/// Splits records by city (alphabetical), each series ordered by time.
pub fn series_by_city(records: &[AnomalyRecord], metric: Metric) -> Vec<CitySeries> {
    let mut grouped: BTreeMap<&str, Vec<&AnomalyRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.city.as_str()).or_default().push(record);
    }

    grouped
        .into_iter()
        .map(|(city, mut rows)| {
            rows.sort_by_key(|r| r.processed_at);
            CitySeries {
                city: city.to_string(),
                times: rows.iter().map(|r| r.processed_at).collect(),
                values: rows.iter().map(|r| metric.value(r)).collect(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub label: String,
    pub count: usize,
}

/// Frequency of each distinct label, most frequent first; ties by label.
pub fn type_counts(records: &[AnomalyRecord]) -> Vec<TypeCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.anomaly_type.label()).or_default() += 1;
    }
    let mut counts: Vec<TypeCount> = counts
        .into_iter()
        .map(|(label, count)| TypeCount { label, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

/// Rows for the raw table, newest first. Rows of the same run keep file order.
pub fn table_rows(records: &[AnomalyRecord]) -> Vec<&AnomalyRecord> {
    let mut rows: Vec<&AnomalyRecord> = records.iter().collect();
    rows.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
    rows
}
