use async_trait::async_trait;
use serde_json::Value;

/// Failure reported by a [`Transport`]. Always carries a message fit for a
/// notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid request url '{0}'")]
    InvalidUrl(String),
}

impl TransportError {
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Human-readable text without the variant prefix for HTTP errors.
    pub fn message(&self) -> String {
        match self {
            TransportError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if e.is_builder() {
            TransportError::InvalidUrl(e.to_string())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

/// The HTTP surface the list layer consumes. Paths are resolved by the
/// implementation (typically against a configured base URL).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn get(&self, path: &str) -> Result<Value, TransportError>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError>;

    async fn put(&self, path: &str, body: &Value) -> Result<Value, TransportError>;

    async fn delete(&self, path: &str) -> Result<Value, TransportError>;

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError>;
}
