//! Trailing-edge debounce on the Tokio runtime.
//!
//! Each [`Debouncer::call`] cancels the previously armed call, so only the
//! last call within a quiet window runs. A call whose window already elapsed
//! is not interrupted; callers that must ignore such late work carry their
//! own generation check.

use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Debouncer {
    window: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Run `f` once `window` passes without another `call` or `cancel`.
    pub fn call<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(prev) = self.pending.lock().replace(token.clone()) {
            prev.cancel();
        }

        let window = self.window;
        let fired = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    tracing::trace!("debounced call cancelled");
                }
                _ = tokio::time::sleep(window) => {
                    fired.cancel();
                    f().await;
                }
            }
        });
    }

    /// Drop the armed call, if any.
    pub fn cancel(&self) {
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
    }

    /// Whether a call is waiting for its window to elapse.
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
