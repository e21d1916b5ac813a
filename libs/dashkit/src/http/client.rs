//! Traced HTTP transport for the dashboard API.
//!
//! Wraps `reqwest::Client`, resolves request paths against a base URL and
//! opens an `outgoing_http` span for every request so list fetches and
//! writes show up next to the controller logs.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;
use tracing::{field, Instrument, Level};
use url::Url;

use super::problem::{error_message, APPLICATION_PROBLEM_JSON};
use super::transport::{Transport, TransportError};

#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport wrapping the provided reqwest::Client.
    pub fn new(inner: reqwest::Client, base_url: Url) -> Self {
        Self { inner, base_url }
    }

    /// Build a client for `base_url` with an optional overall request timeout.
    pub fn from_base_url(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;
        // `Url::join` drops the last segment unless the base ends with '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;
        Ok(Self::new(client, base))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an absolute URL or a path relative to the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        if let Ok(abs) = Url::parse(path) {
            return Ok(abs);
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl(format!("{path}: {e}")))
    }

    /// Execute a request inside an `outgoing_http` span and turn non-2xx
    /// answers into [`TransportError::Http`].
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.resolve(path)?;
        let span = tracing::span!(
            Level::INFO, "outgoing_http",
            http.method = %method,
            http.url = %url,
            http.status_code = field::Empty,
            otel.kind = "client",
        );

        async move {
            let mut req = self
                .inner
                .request(method, url)
                .header(reqwest::header::ACCEPT, format!("application/json, {APPLICATION_PROBLEM_JSON}"));
            if let Some(b) = body {
                let bytes = serde_json::to_vec(b).map_err(|e| TransportError::Decode(e.to_string()))?;
                req = req
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes);
            }

            let response = req.send().await?;
            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            let bytes = response.bytes().await?;
            if status.is_success() {
                return Ok(bytes.to_vec());
            }

            let (message, code) = error_message(status.as_u16(), &bytes);
            tracing::debug!(status = status.as_u16(), %message, "request rejected");
            Err(TransportError::Http {
                status: status.as_u16(),
                message,
                code,
            })
        }
        .instrument(span)
        .await
    }

    async fn execute_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let bytes = self.execute(method, path, body).await?;
        decode_json(&bytes)
    }
}

/// Empty bodies (204, bare 200) decode to `null`.
fn decode_json(bytes: &[u8]) -> Result<Value, TransportError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| TransportError::Decode(e.to_string()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.execute_json(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.execute_json(Method::POST, path, Some(body)).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
        self.execute_json(Method::PUT, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.execute_json(Method::DELETE, path, None).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        self.execute(Method::GET, path, None).await
    }
}
