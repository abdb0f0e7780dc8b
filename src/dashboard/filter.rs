//! City and anomaly-type filters for the dashboard.

use crate::types::anomaly::AnomalyRecord;
use std::collections::BTreeSet;

pub const PARAM_CITY: &str = "city";
pub const PARAM_TYPE: &str = "type";
/// Present when the filter form was submitted, so an empty multi-select means "none".
pub const PARAM_APPLIED: &str = "applied";

/// Values offered by the two multi-selects, sorted alphabetically.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub types: Vec<String>,
}

impl FilterOptions {
    /// Cities seen in the data plus every registry city, and every label seen in the data.
    pub fn from_records<'a>(
        records: &[AnomalyRecord],
        registry: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let cities: BTreeSet<String> = records
            .iter()
            .map(|r| r.city.clone())
            .chain(registry.into_iter().map(str::to_string))
            .collect();
        let types: BTreeSet<String> = records.iter().map(|r| r.anomaly_type.label()).collect();
        Self {
            cities: cities.into_iter().collect(),
            types: types.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selection {
    pub cities: BTreeSet<String>,
    pub types: BTreeSet<String>,
}

impl Selection {
    /// Everything selected, the state of a fresh page.
    pub fn all(options: &FilterOptions) -> Self {
        Self {
            cities: options.cities.iter().cloned().collect(),
            types: options.types.iter().cloned().collect(),
        }
    }

    /// Reads a selection from a raw query string such as
    /// `city=Tokyo&city=Cairo&type=High+Temp&applied=1`.
    ///
    /// A dimension with no values falls back to "all" unless the form was
    /// submitted (`applied`), in which case it really is empty.
    pub fn from_query(query: Option<&str>, options: &FilterOptions) -> Self {
        let mut cities = BTreeSet::new();
        let mut types = BTreeSet::new();
        let mut applied = false;

        for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                PARAM_CITY => {
                    cities.insert(value.into_owned());
                }
                PARAM_TYPE => {
                    types.insert(value.into_owned());
                }
                PARAM_APPLIED => applied = true,
                _ => {}
            }
        }

        let defaults = Self::all(options);
        Self {
            cities: if cities.is_empty() && !applied {
                defaults.cities
            } else {
                cities
            },
            types: if types.is_empty() && !applied {
                defaults.types
            } else {
                types
            },
        }
    }

    pub fn matches(&self, record: &AnomalyRecord) -> bool {
        self.cities.contains(&record.city) && self.types.contains(&record.anomaly_type.label())
    }
}

/// Records whose city and label are both selected, in their original order.
pub fn filter_records(records: &[AnomalyRecord], selection: &Selection) -> Vec<AnomalyRecord> {
    records
        .iter()
        .filter(|record| selection.matches(record))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::anomaly::AnomalyType;
    use chrono::{TimeZone, Utc};

    fn record(city: &str, label: &str, hour: u32) -> AnomalyRecord {
        AnomalyRecord {
            city: city.to_string(),
            temperature_c: 36.0,
            wind_speed_kmh: 31.0,
            processed_at: Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap(),
            anomaly_type: label.parse::<AnomalyType>().expect("valid label"),
        }
    }

    fn dataset() -> Vec<AnomalyRecord> {
        vec![
            record("Tokyo", "High Temp", 0),
            record("Cairo", "High Temp + High Wind", 0),
            record("Sydney", "Low Temp + High Wind", 2),
            record("Cairo", "High Temp", 4),
            record("London", "High Wind", 6),
        ]
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_options_union_registry() {
        let options = FilterOptions::from_records(&dataset(), ["Athens", "Tokyo"]);
        assert_eq!(
            options.cities,
            ["Athens", "Cairo", "London", "Sydney", "Tokyo"]
        );
        assert_eq!(
            options.types,
            [
                "High Temp",
                "High Temp + High Wind",
                "High Wind",
                "Low Temp + High Wind"
            ]
        );
    }

    #[test]
    fn test_default_selection_keeps_everything() {
        let records = dataset();
        let options = FilterOptions::from_records(&records, ["Athens"]);
        let selection = Selection::from_query(None, &options);

        assert_eq!(selection, Selection::all(&options));
        assert_eq!(filter_records(&records, &selection), records);
    }

    #[test]
    fn test_filter_is_membership_intersection() {
        let records = dataset();
        let selection = Selection {
            cities: set(&["Cairo", "Sydney"]),
            types: set(&["High Temp", "Low Temp + High Wind"]),
        };

        let filtered = filter_records(&records, &selection);
        let expected: Vec<AnomalyRecord> = records
            .iter()
            .filter(|r| {
                selection.cities.contains(&r.city)
                    && selection.types.contains(&r.anomaly_type.label())
            })
            .cloned()
            .collect();

        assert_eq!(filtered, expected);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].city, "Sydney");
        assert_eq!(filtered[1].city, "Cairo");
        // Compound labels are not decomposed.
        assert!(filtered
            .iter()
            .all(|r| r.anomaly_type.label() != "High Temp + High Wind"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let records = dataset();
        let selection = Selection {
            cities: set(&["Cairo", "London", "Tokyo"]),
            types: set(&["High Temp", "High Wind"]),
        };

        let once = filter_records(&records, &selection);
        let twice = filter_records(&once, &selection);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_query_parsing() {
        let options = FilterOptions::from_records(&dataset(), ["Athens"]);

        let selection = Selection::from_query(
            Some("city=Tokyo&city=New+York&type=High%20Temp%20%2B%20High%20Wind"),
            &options,
        );
        assert_eq!(selection.cities, set(&["New York", "Tokyo"]));
        assert_eq!(selection.types, set(&["High Temp + High Wind"]));

        // Only cities given: types default to all.
        let selection = Selection::from_query(Some("city=Cairo"), &options);
        assert_eq!(selection.types.len(), options.types.len());
    }

    #[test]
    fn test_submitted_empty_form_selects_nothing() {
        let records = dataset();
        let options = FilterOptions::from_records(&records, ["Athens"]);

        let selection = Selection::from_query(Some("applied=1&type=High+Wind"), &options);
        assert!(selection.cities.is_empty());
        assert!(filter_records(&records, &selection).is_empty());
    }
}
