//! Bounded retry with exponential backoff for weather requests.
//!
//! Retries:
//! - the configured status codes (429, 500, 502, 503, 504 by default)
//! - timeouts and connection failures
//!
//! Anything else (4xx, redirects, body errors) is returned on the first attempt.
//!
//! Retry `n` (1-based) waits `backoff_factor * 2^(n - 1)`, so 1 s, 2 s and 4 s with
//! the defaults. A 429 or 503 carrying `Retry-After` waits as the server asks
//! instead, up to [`MAX_RETRY_AFTER`].

use crate::weather::error::WeatherError;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_FACTOR: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
/// Longest wait accepted from a `Retry-After` header.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt, so a request is sent at most `max_retries + 1` times.
    pub max_retries: u32,
    /// Delay before retry `n` is `backoff_factor * 2^(n - 1)`.
    pub backoff_factor: Duration,
    pub retry_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            retry_statuses: DEFAULT_RETRY_STATUSES
                .iter()
                .filter_map(|code| StatusCode::from_u16(*code).ok())
                .collect(),
        }
    }
}

impl RetryPolicy {
    /// Same policy without any waiting between attempts.
    pub fn without_backoff(mut self) -> Self {
        self.backoff_factor = Duration::ZERO;
        self
    }

    /// Delay before the given retry (1-based). Retry 0 is the first attempt and never waits.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        self.backoff_factor.saturating_mul(factor)
    }

    pub fn should_retry_status(&self, status: StatusCode) -> bool {
        self.retry_statuses.contains(&status)
    }

    pub fn should_retry_error(error: &reqwest::Error) -> bool {
        error.is_timeout() || error.is_connect()
    }
}

/// Reads `Retry-After` as delta-seconds or an HTTP date, capped at [`MAX_RETRY_AFTER`].
///
/// Only 429 and 503 responses are honoured. A date in the past means no wait.
pub fn retry_after(status: StatusCode, headers: &HeaderMap) -> Option<Duration> {
    if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
        return None;
    }
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    let delay = match value.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => {
            let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
            (at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
        }
    };
    Some(delay.min(MAX_RETRY_AFTER))
}

/// Sends a request, re-sending it while the policy allows.
///
/// The last response is returned as-is once retries are exhausted, so the caller
/// still sees the final status. Network errors that are not retryable, or that
/// persist past the last retry, become [`WeatherError::NetworkRequest`].
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    url: &str,
    send: F,
) -> Result<Response, WeatherError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut retry = 0;
    let mut delay = Duration::ZERO;
    loop {
        if retry > 0 {
            debug!(
                "Retry {} of {} for {}, waiting {:?}",
                retry, policy.max_retries, url, delay
            );
            tokio::time::sleep(delay).await;
        }
        let exhausted = retry >= policy.max_retries;

        match send().await {
            Ok(response) => {
                let status = response.status();
                if !exhausted && policy.should_retry_status(status) {
                    warn!(
                        "Retryable status {} from {} (attempt {} of {})",
                        status,
                        url,
                        retry + 1,
                        policy.max_retries + 1
                    );
                    retry += 1;
                    delay = retry_after(status, response.headers())
                        .unwrap_or_else(|| policy.delay_for_retry(retry));
                    continue;
                }
                return Ok(response);
            }
            Err(e) => {
                if !exhausted && RetryPolicy::should_retry_error(&e) {
                    warn!(
                        "Retryable error from {} (attempt {} of {}): {}",
                        url,
                        retry + 1,
                        policy.max_retries + 1,
                        e
                    );
                    retry += 1;
                    delay = policy.delay_for_retry(retry);
                    continue;
                }
                return Err(WeatherError::NetworkRequest(url.to_string(), e));
            }
        }
    }
}
