//! Client for the Open-Meteo forecast endpoint, returning the current temperature
//! and wind speed for a coordinate.

use crate::classify::Reading;
use crate::config::TrackerConfig;
use crate::types::city::LatLon;
use crate::weather::error::WeatherError;
use crate::weather::retry::{send_with_retry, RetryPolicy};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://api.open-meteo.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CURRENT_FIELDS: &str = "temperature_2m,wind_speed_10m";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temperature_2m: f64,
    wind_speed_10m: f64,
}

impl From<CurrentConditions> for Reading {
    fn from(current: CurrentConditions) -> Self {
        Reading {
            temperature_c: current.temperature_2m,
            wind_speed_kmh: current.wind_speed_10m,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    retry: RetryPolicy,
}

impl OpenMeteoClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(WeatherError::ClientBuild)?;
        Ok(Self {
            client,
            forecast_url: format!("{}/v1/forecast", base_url.trim_end_matches('/')),
            retry,
        })
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self, WeatherError> {
        Self::new(
            &config.api_base_url,
            config.request_timeout,
            config.retry.clone(),
        )
    }

    /// Fetches the current conditions at a location.
    ///
    /// Transient failures are retried according to the client's [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// * [`WeatherError::NetworkRequest`] if the request could not be sent.
    /// * [`WeatherError::HttpStatus`] for a non-success status after retries.
    /// * [`WeatherError::Decode`] if the body lacks the `current` fields.
    pub async fn current(&self, location: LatLon) -> Result<Reading, WeatherError> {
        let params = [
            ("latitude", location.latitude().to_string()),
            ("longitude", location.longitude().to_string()),
            ("current", CURRENT_FIELDS.to_string()),
        ];
        let url = &self.forecast_url;
        debug!(
            "Requesting current weather for ({}, {})",
            location.latitude(),
            location.longitude()
        );

        let response = send_with_retry(&self.retry, url, || {
            self.client.get(url).query(&params).send()
        })
        .await?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                return Err(match e.status() {
                    Some(status) => WeatherError::HttpStatus {
                        url: url.clone(),
                        status,
                        source: e,
                    },
                    None => WeatherError::NetworkRequest(url.clone(), e),
                });
            }
        };

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Decode(url.clone(), e))?;
        Ok(body.current.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> OpenMeteoClient {
        OpenMeteoClient::new(
            &server.uri(),
            Duration::from_secs(5),
            RetryPolicy::default().without_backoff(),
        )
        .expect("client builds")
    }

    fn current_body(temperature: f64, wind: f64) -> serde_json::Value {
        json!({
            "latitude": 35.7,
            "longitude": 139.69,
            "current_units": { "temperature_2m": "°C", "wind_speed_10m": "km/h" },
            "current": {
                "time": "2026-10-18T12:00",
                "interval": 900,
                "temperature_2m": temperature,
                "wind_speed_10m": wind
            }
        })
    }

    #[tokio::test]
    async fn test_current_parses_reading() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "35.6895"))
            .and(query_param("longitude", "139.6917"))
            .and(query_param("current", "temperature_2m,wind_speed_10m"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body(38.2, 12.0)))
            .expect(1)
            .mount(&server)
            .await;

        let reading = test_client(&server)
            .current(LatLon(35.6895, 139.6917))
            .await
            .expect("reading");

        assert_eq!(reading.temperature_c, 38.2);
        assert_eq!(reading.wind_speed_kmh, 12.0);
    }

    #[tokio::test]
    async fn test_retries_transient_status_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body(20.0, 10.0)))
            .expect(1)
            .mount(&server)
            .await;

        let reading = test_client(&server)
            .current(LatLon(51.5085, -0.1257))
            .await
            .expect("succeeds after retries");
        assert_eq!(reading.temperature_c, 20.0);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .current(LatLon(30.0626, 31.2497))
            .await
            .expect_err("should fail");

        match err {
            WeatherError::HttpStatus { status, .. } => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .current(LatLon(0.0, 0.0))
            .await
            .expect_err("should fail");
        assert!(matches!(err, WeatherError::HttpStatus { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "current": { "time": "now" } })),
            )
            .mount(&server)
            .await;

        let err = test_client(&server)
            .current(LatLon(0.0, 0.0))
            .await
            .expect_err("should fail");
        assert!(matches!(err, WeatherError::Decode(..)));
    }

    #[tokio::test]
    async fn test_connect_errors_are_retried() {
        // Nothing listens on a port we just released.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .and_then(|listener| listener.local_addr())
            .expect("free port")
            .port();
        let retry = RetryPolicy {
            backoff_factor: Duration::from_millis(100),
            ..RetryPolicy::default()
        };
        let client = OpenMeteoClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2), retry)
            .expect("client builds");

        let started = std::time::Instant::now();
        let err = client
            .current(LatLon(0.0, 0.0))
            .await
            .expect_err("nothing is listening");

        assert!(matches!(err, WeatherError::NetworkRequest(..)), "{err:?}");
        // 100 + 200 + 400 ms of backoff before giving up
        assert!(started.elapsed() >= Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_timeouts_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_body(20.0, 10.0))
                    .set_delay(Duration::from_millis(600)),
            )
            .mount(&server)
            .await;

        let client = OpenMeteoClient::new(
            &server.uri(),
            Duration::from_millis(200),
            RetryPolicy::default().without_backoff(),
        )
        .expect("client builds");

        let err = client
            .current(LatLon(0.0, 0.0))
            .await
            .expect_err("every attempt times out");

        assert!(matches!(err, WeatherError::NetworkRequest(..)), "{err:?}");
        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 4);
    }

    #[tokio::test]
    async fn test_retry_after_header_overrides_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body(36.0, 5.0)))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            backoff_factor: Duration::from_secs(30),
            ..RetryPolicy::default()
        };
        let client =
            OpenMeteoClient::new(&server.uri(), Duration::from_secs(5), retry).expect("client builds");

        let reading = tokio::time::timeout(Duration::from_secs(5), client.current(LatLon(0.0, 0.0)))
            .await
            .expect("Retry-After: 0 skips the 30 s backoff")
            .expect("succeeds on retry");
        assert_eq!(reading.temperature_c, 36.0);
    }
}
