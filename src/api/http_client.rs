//! Thin JSON-over-HTTP layer shared by the REST client and the full-node RPC
//!
//! Every request carries `Content-Type: application/json` and the SDK user
//! agent. Responses are mapped to `ParadexError` before any caller sees them.
//!
//! [`HttpClient`] adds what callers can plug in on top of the pooled client:
//! a [`RetryPolicy`] for 429, 5xx and transport failures, [`RequestHook`]s
//! that see every attempt with sensitive headers redacted, a default
//! per-request timeout, and an injected `reqwest::Client`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, Request, Response, StatusCode};
use serde_json::Value;

use crate::api::ws::reconnect::backoff_ms;
use crate::config::constants::{HTTP_RETRY_BASE_DELAY_MS, HTTP_RETRY_MAX_DELAY_MS, REST_TIMEOUT};
use crate::config::logging::REDACTED;
use crate::error::{ParadexError, ParadexResult};
use crate::types::ApiErrorBody;

/// Header names (lowercase) whose values never reach hooks or logs
const SENSITIVE_HEADERS: [&str; 5] = [
    "authorization",
    "x-api-key",
    "jwt",
    "token",
    "paradex-starknet-signature",
];

/// `paradex-sdk/<version> (Rust; <os>)`
pub fn user_agent() -> String {
    format!(
        "paradex-sdk/{} (Rust; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(ua) = HeaderValue::from_str(&user_agent()) {
        headers.insert(USER_AGENT, ua);
    }
    headers
}

/// Pooled client with keep-alive, shared timeouts and the SDK default headers
pub(crate) fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REST_TIMEOUT)
        .pool_max_idle_per_host(2)
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .connect_timeout(REST_TIMEOUT)
        .default_headers(default_headers())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Copy of `headers` with credential-bearing values replaced by `[REDACTED]`
pub fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    headers
        .iter()
        .map(|(name, value)| {
            let value = if SENSITIVE_HEADERS.contains(&name.as_str()) {
                HeaderValue::from_static(REDACTED)
            } else {
                value.clone()
            };
            (name.clone(), value)
        })
        .collect()
}

/// Retry schedule for failed requests: `min(initial * 2^attempt, max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first; 0 disables retries
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay_ms: HTTP_RETRY_BASE_DELAY_MS,
            max_delay_ms: HTTP_RETRY_MAX_DELAY_MS,
        }
    }

    /// Whether the failed `attempt` (0-based) is sent again
    pub fn should_retry(&self, attempt: u32, err: &ParadexError) -> bool {
        if attempt >= self.max_retries {
            return false;
        }
        match err {
            ParadexError::RateLimited
            | ParadexError::ConnectionFailed(_)
            | ParadexError::NetworkTimeout(_) => true,
            ParadexError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(backoff_ms(attempt, self.initial_delay_ms, self.max_delay_ms))
    }
}

/// Observer called around every HTTP attempt, retries included
pub trait RequestHook: Send + Sync {
    /// `headers` are the per-request headers, already redacted
    fn on_request(&self, _method: &Method, _url: &str, _headers: &HeaderMap) {}

    /// `status` is `None` when no response arrived
    fn on_response(&self, _method: &Method, _url: &str, _status: Option<StatusCode>, _elapsed: Duration) {}
}

/// Query string parameters
pub type QueryParams<'a> = [(&'a str, String)];

#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    retry: RetryPolicy,
    hooks: Vec<Arc<dyn RequestHook>>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("retry", &self.retry)
            .field("hooks", &self.hooks.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    pub fn new() -> Self {
        Self::with_client(build_http_client())
    }

    /// Wrap a caller-built client; its own default headers and timeouts apply.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            hooks: Vec::new(),
            timeout: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Timeout for every request unless a call passes its own
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Send a request and decode the JSON response (`Null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        params: &QueryParams<'_>,
        body: Option<&Value>,
        headers: &[(&str, String)],
    ) -> ParadexResult<Value> {
        self.request_with_timeout(method, url, params, body, headers, None)
            .await
    }

    /// [`HttpClient::request`] with a timeout overriding the client default.
    pub async fn request_with_timeout(
        &self,
        method: Method,
        url: &str,
        params: &QueryParams<'_>,
        body: Option<&Value>,
        headers: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> ParadexResult<Value> {
        let mut builder = self.client.request(method, url);
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        if let Some(timeout) = timeout.or(self.timeout) {
            builder = builder.timeout(timeout);
        }
        let request = builder.build()?;
        let redacted = redact_headers(request.headers());

        let mut attempt = 0;
        loop {
            let attempt_request = request.try_clone().ok_or_else(|| {
                ParadexError::ConnectionFailed(format!("{} {}: body cannot be resent", request.method(), url))
            })?;

            let result = self.send_once(attempt_request, &redacted).await;
            let err = match result {
                Err(err) if self.retry.should_retry(attempt, &err) => err,
                other => return other,
            };

            let delay = self.retry.delay(attempt);
            tracing::warn!(
                method = %request.method(),
                url = %url,
                attempt = attempt + 1,
                max_retries = self.retry.max_retries,
                delay_ms = delay.as_millis() as u64,
                "HTTP request failed, retrying: {}",
                err
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn send_once(&self, request: Request, redacted: &HeaderMap) -> ParadexResult<Value> {
        let method = request.method().clone();
        let url = request.url().to_string();
        let timeout = request.timeout().copied().unwrap_or(REST_TIMEOUT);

        for hook in &self.hooks {
            hook.on_request(&method, &url, redacted);
        }
        tracing::debug!(method = %method, url = %url, headers = ?redacted, "HTTP request");

        let started = Instant::now();
        let sent = self.client.execute(request).await;
        let elapsed = started.elapsed();
        let status = sent.as_ref().ok().map(Response::status);

        for hook in &self.hooks {
            hook.on_response(&method, &url, status, elapsed);
        }

        let response = sent.map_err(|e| {
            if e.is_timeout() {
                ParadexError::NetworkTimeout(timeout.as_millis() as u64)
            } else {
                ParadexError::ConnectionFailed(format!("{} {} failed: {}", method, url, e))
            }
        })?;

        tracing::debug!(
            method = %method,
            url = %url,
            status = response.status().as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            "HTTP response"
        );
        handle_response(response).await
    }
}

/// Map status codes to errors and parse the body
pub(crate) async fn handle_response(response: Response) -> ParadexResult<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ParadexError::InvalidResponse(format!("Failed to read response: {}", e)))?;

    parse_response(status, &text)
}

fn parse_response(status: StatusCode, text: &str) -> ParadexResult<Value> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!("Rate limit exceeded");
        return Err(ParadexError::RateLimited);
    }

    if status.as_u16() >= 300 {
        let body: ApiErrorBody = serde_json::from_str(text).unwrap_or_default();
        let message = if body.message.is_empty() && body.error.is_empty() {
            text.to_string()
        } else {
            body.message
        };
        return Err(ParadexError::Api {
            status: status.as_u16(),
            code: body.error,
            message,
        });
    }

    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) => {
            tracing::warn!(status = status.as_u16(), "Response body is not JSON");
            Ok(Value::Null)
        }
    }
}
