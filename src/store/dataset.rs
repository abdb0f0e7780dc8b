//! The append-only CSV log of anomalies.
//!
//! Rows are converted between typed [`AnomalyRecord`]s and Polars frames at this
//! boundary only; the rest of the crate never sees column names.

use crate::config::TrackerConfig;
use crate::store::error::StoreError;
use crate::types::anomaly::AnomalyRecord;
use crate::utils::ensure_parent_dir_exists;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use log::{debug, info};
use polars::prelude::*;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const COL_CITY: &str = "city";
pub const COL_TEMPERATURE: &str = "temperature_c";
pub const COL_WIND_SPEED: &str = "wind_speed_kmh";
pub const COL_PROCESSED_AT: &str = "processed_at";
pub const COL_ANOMALY_TYPE: &str = "anomaly_type";

/// Column order of the file header.
pub const COLUMNS: [&str; 5] = [
    COL_CITY,
    COL_TEMPERATURE,
    COL_WIND_SPEED,
    COL_PROCESSED_AT,
    COL_ANOMALY_TYPE,
];

/// Formats a timestamp the way it is stored in the `processed_at` column.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parses a stored `processed_at` value.
///
/// Accepts RFC 3339 with any offset (normalised to UTC) and, for rows written by
/// other tools, a naive `YYYY-MM-DD HH:MM:SS[.f]` which is taken to be UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|rfc_err| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| rfc_err)
        })
}

#[derive(Debug, Clone)]
pub struct AnomalyStore {
    path: PathBuf,
}

impl AnomalyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &TrackerConfig) -> Self {
        Self::new(config.data_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the file exists and holds at least one byte.
    fn has_content(&self) -> Result<bool, StoreError> {
        match std::fs::metadata(&self.path) {
            Ok(metadata) => Ok(metadata.len() > 0),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Metadata(self.path.clone(), e)),
        }
    }

    /// Reads every record in file order. A missing or empty file is an empty dataset.
    pub fn read_all(&self) -> Result<Vec<AnomalyRecord>, StoreError> {
        if !self.has_content()? {
            debug!("No dataset at {}", self.path.display());
            return Ok(Vec::new());
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(self.path.clone()))
            .map_err(|e| StoreError::CsvRead(self.path.clone(), e))?
            .finish()
            .map_err(|e| StoreError::CsvRead(self.path.clone(), e))?;

        let records = self.frame_to_records(&df)?;
        debug!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    /// The newest `processed_at` in the dataset, or `None` when it is empty.
    pub fn last_processed_at(&self) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .read_all()?
            .into_iter()
            .map(|record| record.processed_at)
            .max())
    }

    /// Appends a batch of records, creating the file with a header if needed.
    ///
    /// The whole batch is encoded in memory and written with one `write_all`
    /// call in append mode. Existing rows are never touched.
    pub fn append(&self, records: &[AnomalyRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        ensure_parent_dir_exists(&self.path)?;
        let write_header = !self.has_content()?;

        let mut df = records_to_frame(records)?;
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(write_header)
            .finish(&mut df)
            .map_err(|e| StoreError::CsvWrite(self.path.clone(), e))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::WriteIo(self.path.clone(), e))?;
        file.write_all(&buffer)
            .and_then(|_| file.flush())
            .map_err(|e| StoreError::WriteIo(self.path.clone(), e))?;

        info!(
            "Appended {} records to {}{}",
            records.len(),
            self.path.display(),
            if write_header { " (new file)" } else { "" }
        );
        Ok(records.len())
    }

    fn column<'a>(&self, df: &'a DataFrame, name: &str) -> Result<&'a Column, StoreError> {
        df.column(name).map_err(|_| StoreError::MissingColumn {
            path: self.path.clone(),
            column: name.to_string(),
        })
    }

    fn frame_to_records(&self, df: &DataFrame) -> Result<Vec<AnomalyRecord>, StoreError> {
        // Whole-number readings are inferred as integers, labels could be inferred as anything.
        let city_col = self.column(df, COL_CITY)?.cast(&DataType::String)?;
        let temp_col = self.column(df, COL_TEMPERATURE)?.cast(&DataType::Float64)?;
        let wind_col = self.column(df, COL_WIND_SPEED)?.cast(&DataType::Float64)?;
        let time_col = self.column(df, COL_PROCESSED_AT)?.cast(&DataType::String)?;
        let type_col = self.column(df, COL_ANOMALY_TYPE)?.cast(&DataType::String)?;

        let cities = city_col.str()?;
        let temperatures = temp_col.f64()?;
        let winds = wind_col.f64()?;
        let times = time_col.str()?;
        let types = type_col.str()?;

        let missing = |column: &'static str, row: usize| StoreError::MissingValue { column, row };

        (0..df.height())
            .map(|row| {
                let city = cities.get(row).ok_or_else(|| missing(COL_CITY, row))?;
                let temperature_c = temperatures
                    .get(row)
                    .ok_or_else(|| missing(COL_TEMPERATURE, row))?;
                let wind_speed_kmh = winds.get(row).ok_or_else(|| missing(COL_WIND_SPEED, row))?;
                let raw_time = times
                    .get(row)
                    .ok_or_else(|| missing(COL_PROCESSED_AT, row))?;
                let raw_type = types
                    .get(row)
                    .ok_or_else(|| missing(COL_ANOMALY_TYPE, row))?;

                let processed_at =
                    parse_timestamp(raw_time).map_err(|source| StoreError::InvalidTimestamp {
                        value: raw_time.to_string(),
                        row,
                        source,
                    })?;
                let anomaly_type = raw_type
                    .parse()
                    .map_err(|source| StoreError::InvalidAnomalyType { row, source })?;

                Ok(AnomalyRecord {
                    city: city.to_string(),
                    temperature_c,
                    wind_speed_kmh,
                    processed_at,
                    anomaly_type,
                })
            })
            .collect()
    }
}

fn records_to_frame(records: &[AnomalyRecord]) -> Result<DataFrame, StoreError> {
    let df = df!(
        COL_CITY => records.iter().map(|r| r.city.as_str()).collect::<Vec<_>>(),
        COL_TEMPERATURE => records.iter().map(|r| r.temperature_c).collect::<Vec<f64>>(),
        COL_WIND_SPEED => records.iter().map(|r| r.wind_speed_kmh).collect::<Vec<f64>>(),
        COL_PROCESSED_AT => records.iter().map(|r| format_timestamp(r.processed_at)).collect::<Vec<String>>(),
        COL_ANOMALY_TYPE => records.iter().map(|r| r.anomaly_type.label()).collect::<Vec<String>>()
    )?;
    Ok(df)
}
