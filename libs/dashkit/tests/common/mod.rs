#![allow(dead_code)]

use dashkit::{async_trait, Notice, Notifier, Transport, TransportError};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Canned answer for one request.
pub struct Reply {
    pub delay: Duration,
    pub result: Result<Value, TransportError>,
}

impl Reply {
    pub fn ok(v: Value) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(v),
        }
    }

    pub fn err(e: TransportError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(e),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = Box<dyn Fn(&str, &str) -> Reply + Send + Sync>;

/// In-memory transport: answers every call through `handler(method, path)`
/// and records the calls in order.
pub struct MockTransport {
    handler: Handler,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&str, &str) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Every GET answers `body` right away; writes answer `null`.
    pub fn fixed(body: Value) -> Arc<Self> {
        Self::new(move |method, _| match method {
            "GET" => Reply::ok(body.clone()),
            _ => Reply::ok(Value::Null),
        })
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn paths(&self, method: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
            .collect()
    }

    async fn answer(&self, method: &str, path: &str) -> Result<Value, TransportError> {
        self.calls.lock().push((method.to_string(), path.to_string()));
        let reply = (self.handler)(method, path);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<Value, TransportError> {
        self.answer("GET", path).await
    }

    async fn post(&self, path: &str, _body: &Value) -> Result<Value, TransportError> {
        self.answer("POST", path).await
    }

    async fn put(&self, path: &str, _body: &Value) -> Result<Value, TransportError> {
        self.answer("PUT", path).await
    }

    async fn delete(&self, path: &str) -> Result<Value, TransportError> {
        self.answer("DELETE", path).await
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let v = self.answer("DOWNLOAD", path).await?;
        Ok(v.to_string().into_bytes())
    }
}

/// Notifier that keeps every notice for inspection.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}
