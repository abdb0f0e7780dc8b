//! Defines the monitored cities and their coordinates.

use serde::Serialize;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use weather_anomalies::LatLon;
///
/// let tokyo = LatLon(35.6895, 139.6917);
/// assert_eq!(tokyo.0, 35.6895); // Latitude
/// assert_eq!(tokyo.1, 139.6917); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }
}

/// A monitored location in the city registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    /// Display name, also written to the `city` column of the dataset.
    pub name: String,
    pub location: LatLon,
}

impl City {
    pub fn new(name: impl Into<String>, location: LatLon) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// The default registry, in collection order.
pub fn default_cities() -> Vec<City> {
    vec![
        City::new("New York", LatLon(40.7143, -74.006)),
        City::new("Tokyo", LatLon(35.6895, 139.6917)),
        City::new("London", LatLon(51.5085, -0.1257)),
        City::new("Cairo", LatLon(30.0626, 31.2497)),
        City::new("Sydney", LatLon(-33.8678, 151.2073)),
        City::new("Athens", LatLon(37.9838, 23.7275)),
    ]
}
