//! Bounded retry with exponential backoff for read endpoints.
//!
//! Policy:
//!
//! - Max retries: 2 (3 total attempts)
//! - Initial delay: 500ms, doubled per attempt, capped at 8 seconds
//! - Down-jitter up to 25% (multiplier in [0.75, 1.0])
//! - `Retry-After` / `Retry-After-Ms` honored when under 60s
//!
//! Retryable: connection/timeout errors and HTTP 408, 429, 5xx.
//! Authentication failures (401) are never retried; callers tear down the
//! session instead. Write endpoints use [`RetryConfig::none`] (one shot).
//!
//! Every attempt of one logical request carries the same
//! `Idempotency-Key` plus an `X-Retry-Count` header.

use std::time::Duration;

use reqwest::{header::HeaderMap, RequestBuilder, Response, StatusCode};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting the initial request).
    pub max_retries: u32,
    /// Initial backoff delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    /// Single attempt, for one-shot write operations.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Parse `Retry-After` or `Retry-After-Ms` headers.
///
/// Returns `Some(duration)` only when the value is valid and
/// `0 < duration < 60s`.
#[must_use]
pub fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    if let Some(s) = headers.get("retry-after-ms").and_then(|v| v.to_str().ok()) {
        if let Ok(ms) = s.parse::<f64>() {
            let duration = Duration::from_secs_f64(ms / 1000.0);
            if duration > Duration::ZERO && duration < Duration::from_secs(60) {
                return Some(duration);
            }
        }
    }

    if let Some(s) = headers.get("retry-after").and_then(|v| v.to_str().ok()) {
        if let Ok(secs) = s.parse::<u64>() {
            let duration = Duration::from_secs(secs);
            if duration > Duration::ZERO && duration < Duration::from_secs(60) {
                return Some(duration);
            }
        }
    }

    None
}

/// Whether a response status warrants another attempt.
///
/// Authentication statuses are excluded unconditionally: retrying an
/// expired token cannot succeed and delays the session teardown.
#[must_use]
pub fn should_retry(status: StatusCode) -> bool {
    if status == StatusCode::UNAUTHORIZED {
        return false;
    }
    matches!(status.as_u16(), 408 | 429 | 500..=599)
}

/// Retry delay with exponential backoff and down-jitter.
///
/// `backoff_step` is 0 before the first retry, 1 before the second, etc.
/// A valid `Retry-After` header takes precedence.
#[must_use]
pub fn calculate_retry_delay(
    backoff_step: u32,
    config: &RetryConfig,
    headers: Option<&HeaderMap>,
) -> Duration {
    if let Some(delay) = headers.and_then(parse_retry_after) {
        return delay;
    }

    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

fn add_attempt_headers(
    builder: RequestBuilder,
    retry_count: u32,
    idempotency_key: &str,
) -> RequestBuilder {
    builder
        .header("X-Retry-Count", retry_count.to_string())
        .header("Idempotency-Key", idempotency_key)
}

#[must_use]
pub fn generate_idempotency_key() -> String {
    format!("backdesk-{}", Uuid::new_v4())
}

/// Outcome of a retried request.
///
/// A sum type that structurally separates success from failure so callers
/// cannot treat an error response as data.
#[derive(Debug)]
pub enum RetryOutcome {
    /// 2xx response.
    Success(Response),
    /// Non-2xx after exhausting retries (or non-retryable status).
    /// The response is kept for error-body inspection.
    HttpError(Response),
    /// Transport failure after exhausting retries.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// Transport failure on the first attempt that cannot be retried.
    NonRetryable(reqwest::Error),
}

impl RetryOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Send a request with automatic retries.
///
/// `build_request` is called once per attempt; all attempts share one
/// idempotency key. Returns once a 2xx arrives, a non-retryable condition
/// is hit, or attempts are exhausted.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let idempotency_key = generate_idempotency_key();
    let total_attempts = config.max_retries + 1;

    for attempt in 0..total_attempts {
        let is_last = attempt + 1 == total_attempts;
        let request = add_attempt_headers(build_request(), attempt, &idempotency_key);

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return RetryOutcome::Success(response);
                }

                if is_last || !should_retry(status) {
                    return RetryOutcome::HttpError(response);
                }

                let delay = calculate_retry_delay(attempt, config, Some(response.headers()));
                tracing::debug!(
                    status = %status,
                    retry = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "retrying request after error status"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if is_last || !is_retryable_error(&e) {
                    if attempt == 0 {
                        return RetryOutcome::NonRetryable(e);
                    }
                    return RetryOutcome::ConnectionError {
                        attempts: attempt + 1,
                        source: e,
                    };
                }

                let delay = calculate_retry_delay(attempt, config, None);
                tracing::debug!(
                    error = %e,
                    retry = attempt + 1,
                    delay_ms = delay.as_millis(),
                    "retrying request after connection error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }

    unreachable!("loop always returns on the final attempt")
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() || error.is_timeout() || error.is_request()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn parses_retry_after_ms() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after-ms", HeaderValue::from_static("1500"));
        assert_eq!(
            parse_retry_after(&headers),
            Some(Duration::from_millis(1500))
        );
    }

    #[test]
    fn parses_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("5"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(5)));
    }

    #[test]
    fn ignores_out_of_range_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("120"));
        assert_eq!(parse_retry_after(&headers), None);

        headers.clear();
        headers.insert("retry-after", HeaderValue::from_static("0"));
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn retryable_statuses() {
        assert!(should_retry(StatusCode::REQUEST_TIMEOUT));
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(should_retry(StatusCode::SERVICE_UNAVAILABLE));

        assert!(!should_retry(StatusCode::BAD_REQUEST));
        assert!(!should_retry(StatusCode::UNAUTHORIZED));
        assert!(!should_retry(StatusCode::NOT_FOUND));
        assert!(!should_retry(StatusCode::CONFLICT));
    }

    #[test]
    fn delay_stays_within_jitter_bounds() {
        let config = RetryConfig::default();

        // First retry: base 500ms, jitter in [0.75, 1.0].
        for _ in 0..100 {
            let delay = calculate_retry_delay(0, &config, None);
            assert!(delay >= Duration::from_millis(375));
            assert!(delay <= Duration::from_millis(500));
        }

        // Second retry: base 1000ms.
        for _ in 0..100 {
            let delay = calculate_retry_delay(1, &config, None);
            assert!(delay >= Duration::from_millis(750));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[test]
    fn delay_respects_retry_after() {
        let config = RetryConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("3"));
        assert_eq!(
            calculate_retry_delay(0, &config, Some(&headers)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn idempotency_keys_are_unique() {
        let a = generate_idempotency_key();
        let b = generate_idempotency_key();
        assert!(a.starts_with("backdesk-"));
        assert_ne!(a, b);
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry_config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            jitter_factor: 0.0,
        }
    }

    #[tokio::test]
    async fn success_on_first_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/payouts"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());
        let config = fast_retry_config();

        let outcome = send_with_retry(|| client.get(&url), &config).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn retries_on_500_then_succeeds() {
        let server = MockServer::start().await;
        let attempt = AtomicU32::new(0);

        Mock::given(method("GET"))
            .and(path("/payouts"))
            .respond_with(move |_: &wiremock::Request| {
                if attempt.fetch_add(1, Ordering::SeqCst) == 0 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200).set_body_string("ok")
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());
        let config = fast_retry_config();

        let outcome = send_with_retry(|| client.get(&url), &config).await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn unauthorized_is_never_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/payouts"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());
        let config = fast_retry_config();

        match send_with_retry(|| client.get(&url), &config).await {
            RetryOutcome::HttpError(response) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn exhausting_retries_returns_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/payouts"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3) // Initial + 2 retries
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());
        let config = fast_retry_config();

        match send_with_retry(|| client.get(&url), &config).await {
            RetryOutcome::HttpError(response) => {
                assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_shot_config_makes_single_attempt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/payouts"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());

        let outcome = send_with_retry(|| client.post(&url), &RetryConfig::none()).await;
        assert!(matches!(outcome, RetryOutcome::HttpError(_)));
    }

    #[tokio::test]
    async fn idempotency_key_is_stable_across_attempts() {
        let server = MockServer::start().await;
        let keys: std::sync::Arc<std::sync::Mutex<Vec<String>>> =
            std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let keys_clone = keys.clone();

        Mock::given(method("GET"))
            .and(path("/payouts"))
            .respond_with(move |req: &wiremock::Request| {
                let key = req
                    .headers
                    .get("Idempotency-Key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let mut guard = keys_clone.lock().unwrap();
                guard.push(key);
                if guard.len() < 3 {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(3)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());
        let config = fast_retry_config();

        let _ = send_with_retry(|| client.get(&url), &config).await;

        let collected = keys.lock().unwrap();
        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0], collected[1]);
        assert_eq!(collected[1], collected[2]);
    }

    #[tokio::test]
    async fn retry_count_header_tracks_attempts() {
        let server = MockServer::start().await;
        let attempt = AtomicU32::new(0);

        Mock::given(method("GET"))
            .and(path("/payouts"))
            .respond_with(move |req: &wiremock::Request| {
                let n = attempt.fetch_add(1, Ordering::SeqCst);
                let count = req
                    .headers
                    .get("X-Retry-Count")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u32>().ok());
                assert_eq!(count, Some(n));
                if n == 0 {
                    ResponseTemplate::new(429)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(2)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/payouts", server.uri());
        let config = fast_retry_config();

        let outcome = send_with_retry(|| client.get(&url), &config).await;
        assert!(outcome.is_success());
    }
}
