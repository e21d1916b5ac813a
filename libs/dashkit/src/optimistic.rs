//! Optimistic per-entity values.
//!
//! A value is shown locally before the server confirms it and rolled back
//! if the write fails. Each write takes a token; a failing write only rolls
//! its key back while it still holds the latest token for that key, so an
//! older failure never clobbers a newer value.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::error::ListError;
use crate::http::TransportError;

/// What a failed write leaves behind under its key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Remove the key; the view falls back to server data.
    #[default]
    Clear,
    /// Put back whatever the key held before the write.
    RestorePrevious,
}

#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    token: u64,
}

pub struct OptimisticTracker<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    next_token: AtomicU64,
    policy: RollbackPolicy,
}

impl<K, V> Default for OptimisticTracker<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: Clone,
{
    fn default() -> Self {
        Self::new(RollbackPolicy::default())
    }
}

impl<K, V> OptimisticTracker<K, V>
where
    K: Eq + Hash + Clone + fmt::Display,
    V: Clone,
{
    pub fn new(policy: RollbackPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(1),
            policy,
        }
    }

    pub fn policy(&self) -> RollbackPolicy {
        self.policy
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.read().get(key).map(|e| e.value.clone())
    }

    /// Set a value outright. Any write still in flight for `key` loses its
    /// right to roll back.
    pub fn set(&self, key: K, value: V) {
        self.write_local(key, value);
    }

    pub fn clear(&self, key: &K) {
        self.entries.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn snapshot(&self) -> HashMap<K, V> {
        self.entries
            .read()
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }

    /// Show `value` under `key` immediately, then await `write`.
    ///
    /// On success the value stays. On failure the key is rolled back per
    /// the policy (unless a newer write for the same key has started) and a
    /// [`ListError::Mutation`] naming the key is returned. Other keys are
    /// never touched.
    pub async fn apply<F, Fut, R>(&self, key: K, value: V, write: F) -> Result<R, ListError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, TransportError>>,
    {
        let (token, previous) = self.write_local(key.clone(), value);

        match write().await {
            Ok(r) => {
                debug!(%key, token, "optimistic write confirmed");
                Ok(r)
            }
            Err(e) => {
                self.rollback(&key, token, previous);
                warn!(%key, token, error = %e, "optimistic write failed");
                Err(ListError::mutation(key.to_string(), e))
            }
        }
    }

    fn write_local(&self, key: K, value: V) -> (u64, Option<Entry<V>>) {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let previous = self.entries.write().insert(key, Entry { value, token });
        (token, previous)
    }

    /// The restored entry keeps its own token, so a still-pending earlier
    /// write can roll it back in turn.
    fn rollback(&self, key: &K, token: u64, previous: Option<Entry<V>>) {
        let mut entries = self.entries.write();
        if entries.get(key).map(|e| e.token) != Some(token) {
            debug!(%key, token, "newer write owns key; rollback skipped");
            return;
        }
        match (self.policy, previous) {
            (RollbackPolicy::RestorePrevious, Some(entry)) => {
                entries.insert(key.clone(), entry);
            }
            _ => {
                entries.remove(key);
            }
        }
    }
}

impl<K, V> fmt::Debug for OptimisticTracker<K, V>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptimisticTracker")
            .field("policy", &self.policy)
            .field("entries", &self.entries.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let t: OptimisticTracker<u32, bool> = OptimisticTracker::default();
        assert!(t.is_empty());
        t.set(1, true);
        assert_eq!(t.get(&1), Some(true));
        assert_eq!(t.get(&2), None);
        t.clear(&1);
        assert_eq!(t.get(&1), None);
    }

    #[tokio::test]
    async fn success_keeps_value() {
        let t: OptimisticTracker<String, bool> = OptimisticTracker::default();
        let r = t.apply("child-1".into(), true, || async { Ok(42) }).await;
        assert_eq!(r, Ok(42));
        assert_eq!(t.get(&"child-1".to_string()), Some(true));
    }

    #[tokio::test]
    async fn failure_clears_by_default() {
        let t: OptimisticTracker<String, bool> = OptimisticTracker::default();
        t.set("child-1".into(), false);
        let r = t
            .apply("child-1".into(), true, || async {
                Err::<(), _>(TransportError::http(500, "boom"))
            })
            .await;
        assert_eq!(r.unwrap_err().key(), Some("child-1"));
        assert_eq!(t.get(&"child-1".to_string()), None);
    }

    #[tokio::test]
    async fn failure_restores_previous_when_asked() {
        let t: OptimisticTracker<String, bool> = OptimisticTracker::new(RollbackPolicy::RestorePrevious);
        t.set("child-1".into(), false);
        let _ = t
            .apply("child-1".into(), true, || async {
                Err::<(), _>(TransportError::Timeout)
            })
            .await;
        assert_eq!(t.get(&"child-1".to_string()), Some(false));

        let _ = t
            .apply("child-2".into(), true, || async {
                Err::<(), _>(TransportError::Timeout)
            })
            .await;
        assert_eq!(t.get(&"child-2".to_string()), None);
    }
}
