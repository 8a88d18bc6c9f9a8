//! Shared HTTP plumbing: the hardened client, authentication headers,
//! and envelope decoding.
//!
//! All endpoint methods live in their resource modules as `impl ApiClient`
//! blocks; this module owns the request/response mechanics they share.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::retry::{send_with_retry, RetryConfig, RetryOutcome};

const CONNECT_TIMEOUT_SECS: u64 = 30;
const REQUEST_TIMEOUT_SECS: u64 = 30;

const TCP_KEEPALIVE_SECS: u64 = 60;
const POOL_MAX_IDLE_PER_HOST: usize = 8;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Shared hardened HTTP client.
///
/// Redirects are disabled so authorization headers can never leak across
/// hosts.
pub fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        base_client_builder().build().unwrap_or_else(|e| {
            tracing::error!("failed to build HTTP client: {e}; using minimal fallback");
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("minimal HTTP client must build")
        })
    })
}

fn base_client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .redirect(reqwest::redirect::Policy::none())
        .tcp_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS)))
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Some(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS)))
}

/// Where the client gets the current bearer token.
///
/// Implemented by the session store; injected so the client never owns
/// authentication state and tests can substitute a fixed token.
pub trait TokenSource: Send + Sync {
    /// The bearer token of the active session, if any.
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token source for tests and one-off scripted calls.
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

pub struct ApiClient {
    base: Url,
    api_key: String,
    tokens: Arc<dyn TokenSource>,
    retry: RetryConfig,
}

impl ApiClient {
    /// `base` is normalized to end with `/` so relative endpoint paths
    /// join underneath it rather than replacing the last segment.
    #[must_use]
    pub fn new(mut base: Url, api_key: impl Into<String>, tokens: Arc<dyn TokenSource>) -> Self {
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        Self {
            base,
            api_key: api_key.into(),
            tokens,
            retry: RetryConfig::default(),
        }
    }

    /// Override the read-retry policy (tests use near-zero delays).
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::Decode(format!("invalid endpoint path {path}: {e}")))
    }

    fn bearer(&self) -> Result<String, ApiError> {
        self.tokens
            .bearer_token()
            .ok_or_else(|| ApiError::auth("no active session"))
    }

    /// Authenticated GET with the read-retry policy.
    pub(crate) async fn get_authed<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let token = self.bearer()?;
        let url = self.endpoint(path)?;
        let outcome = send_with_retry(
            || http_client().get(url.clone()).bearer_auth(&token).query(query),
            &self.retry,
        )
        .await;
        decode_payload(outcome).await
    }

    /// Authenticated GET dispatched once, with the ack treatment.
    /// Used for side-effecting GETs such as statement dispatch.
    pub(crate) async fn get_authed_ack(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(), ApiError> {
        let token = self.bearer()?;
        let url = self.endpoint(path)?;
        let outcome = send_with_retry(
            || http_client().get(url.clone()).bearer_auth(&token).query(query),
            &RetryConfig::none(),
        )
        .await;
        decode_ack(outcome).await
    }

    /// The provider-banks backend expects the bearer token in `x-api-key`
    /// rather than an Authorization header. Read semantics, so retried.
    pub(crate) async fn get_with_token_as_key<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ApiError> {
        let token = self.bearer()?;
        let url = self.endpoint(path)?;
        let outcome = send_with_retry(
            || http_client().get(url.clone()).header("x-api-key", &token),
            &self.retry,
        )
        .await;
        decode_payload(outcome).await
    }

    /// Authenticated one-shot write returning a payload.
    pub(crate) async fn post_authed<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let outcome = self.send_write(reqwest::Method::POST, path, body).await?;
        decode_payload(outcome).await
    }

    /// Authenticated one-shot write where success carries no payload.
    pub(crate) async fn post_authed_ack<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let outcome = self.send_write(reqwest::Method::POST, path, body).await?;
        decode_ack(outcome).await
    }

    pub(crate) async fn put_authed_ack<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let outcome = self.send_write(reqwest::Method::PUT, path, body).await?;
        decode_ack(outcome).await
    }

    async fn send_write<B>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<RetryOutcome, ApiError>
    where
        B: Serialize + ?Sized,
    {
        let token = self.bearer()?;
        let url = self.endpoint(path)?;
        Ok(send_with_retry(
            || {
                http_client()
                    .request(method.clone(), url.clone())
                    .bearer_auth(&token)
                    .json(body)
            },
            &RetryConfig::none(),
        )
        .await)
    }

    /// Unauthenticated POST for the auth surface, carrying the static
    /// application key. Always one-shot.
    pub(crate) async fn post_public<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let outcome = send_with_retry(|| self.public_post_builder(path, body), &RetryConfig::none())
            .await;
        decode_payload(outcome).await
    }

    pub(crate) async fn post_public_ack<B>(&self, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        let outcome = send_with_retry(|| self.public_post_builder(path, body), &RetryConfig::none())
            .await;
        decode_ack(outcome).await
    }

    fn public_post_builder<B>(&self, path: &str, body: &B) -> RequestBuilder
    where
        B: Serialize + ?Sized,
    {
        // Join errors surface as connection errors on send; the paths
        // here are fixed literals.
        let url = self
            .endpoint(path)
            .map_or_else(|_| self.base.clone(), |url| url);
        http_client()
            .post(url)
            .header("x-api-key", &self.api_key)
            .json(body)
    }
}

/// Query pairs for a paginated list request.
pub(crate) fn page_query(page: backdesk_types::PageRequest) -> [(&'static str, String); 2] {
    [
        ("page", page.page.to_string()),
        ("pageSize", page.page_size.to_string()),
    ]
}

async fn decode_payload<T: DeserializeOwned>(outcome: RetryOutcome) -> Result<T, ApiError> {
    match outcome {
        RetryOutcome::Success(response) => {
            let envelope: Envelope<T> = response.json().await.map_err(ApiError::from)?;
            envelope.into_result()
        }
        RetryOutcome::HttpError(response) => Err(classify_error(response).await),
        RetryOutcome::ConnectionError { source, .. } | RetryOutcome::NonRetryable(source) => {
            Err(ApiError::from(source))
        }
    }
}

async fn decode_ack(outcome: RetryOutcome) -> Result<(), ApiError> {
    match outcome {
        RetryOutcome::Success(response) => {
            let envelope: Envelope<serde_json::Value> =
                response.json().await.map_err(ApiError::from)?;
            envelope.into_ack()
        }
        RetryOutcome::HttpError(response) => Err(classify_error(response).await),
        RetryOutcome::ConnectionError { source, .. } | RetryOutcome::NonRetryable(source) => {
            Err(ApiError::from(source))
        }
    }
}

/// Classify a non-2xx response, preferring the server's envelope message
/// over raw body text. The body read is capped; error pages can be huge.
async fn classify_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = read_capped_error_body(response).await;
    let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
        .ok()
        .and_then(|env| env.failure_message().map(str::to_owned))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("request failed with status {status}")
            } else {
                body.chars().take(200).collect()
            }
        });
    ApiError::from_status(status, message)
}

async fn read_capped_error_body(mut response: Response) -> String {
    let mut buf: Vec<u8> = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        let remaining = MAX_ERROR_BODY_BYTES - buf.len();
        if chunk.len() >= remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            break;
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8_lossy(&buf).into_owned()
}


#[cfg(test)]
mod tests {
    use super::test_support::test_client;
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn missing_token_fails_before_any_request() {
        // No mock server mounted; hitting the network would error differently.
        let client = test_client("http://127.0.0.1:9", None);
        let err = client
            .get_authed::<serde_json::Value>("payouts", &[])
            .await
            .unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn decodes_envelope_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/widgets"))
            .and(header("authorization", "Bearer tok-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": {"name": "a"},
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok-1"));
        let value: serde_json::Value = client.get_authed("widgets", &[]).await.unwrap();
        assert_eq!(value["name"], "a");
    }

    #[tokio::test]
    async fn envelope_failure_on_200_is_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/widgets"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "message": "insufficient balance",
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let err = client
            .get_authed::<serde_json::Value>("widgets", &[])
            .await
            .unwrap_err();
        assert_eq!(err.message(), "insufficient balance");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn unauthorized_response_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/widgets"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false,
                "message": "token expired",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("stale"));
        let err = client
            .get_authed::<serde_json::Value>("widgets", &[])
            .await
            .unwrap_err();
        assert!(err.is_auth());
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn validation_error_surfaces_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/widgets"))
            .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
                "success": false,
                "message": "name is required",
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), Some("tok"));
        let err = client
            .post_authed::<_, serde_json::Value>("widgets", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { status: 422, .. }));
        assert_eq!(err.message(), "name is required");
    }

    #[tokio::test]
    async fn public_post_sends_application_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .and(header("x-api-key", "test-app-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "ok",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), None);
        client
            .post_public_ack("auth/login", &serde_json::json!({"email": "a@b.co"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn base_path_is_preserved_when_joining() {
        let base = Url::parse("https://api.example.com/api/company").unwrap();
        let client = ApiClient::new(base, "k", Arc::new(StaticToken(None)));
        let url = client.endpoint("payouts/provider-banks").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/company/payouts/provider-banks");
    }
}
