//! Minimal observable store.
//!
//! State changes only through [`Store::dispatch`], which runs the state's
//! pure reducer, publishes the new snapshot to `watch` receivers and
//! subscribed listeners, and hands the reducer's effect back to the owner.
//! The owner's `on_state_change` step then performs the effect (spawn a
//! fetch, arm a timer); the reducer itself never does I/O.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Weak,
};
use tokio::sync::watch;

/// State that evolves by actions.
pub trait Reducer: Clone + Send + Sync + 'static {
    type Action: fmt::Debug;
    type Effect;

    fn reduce(&mut self, action: Self::Action) -> Self::Effect;
}

type Listener<S> = Arc<dyn Fn(&S) + Send + Sync>;
type Listeners<S> = RwLock<Vec<(u64, Listener<S>)>>;

pub struct Store<S: Reducer> {
    state: Mutex<S>,
    tx: watch::Sender<S>,
    listeners: Arc<Listeners<S>>,
    next_listener: AtomicU64,
}

impl<S: Reducer> Store<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _rx) = watch::channel(initial.clone());
        Self {
            state: Mutex::new(initial),
            tx,
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Apply `action` and notify observers. Listeners run after the state
    /// lock is released, so they may read the store but should not block.
    pub fn dispatch(&self, action: S::Action) -> S::Effect {
        tracing::trace!(?action, "dispatch");
        let (effect, snapshot) = {
            let mut state = self.state.lock();
            let effect = state.reduce(action);
            let snapshot = state.clone();
            // Published under the lock so receivers observe dispatch order.
            self.tx.send_replace(snapshot.clone());
            (effect, snapshot)
        };

        let listeners: Vec<Listener<S>> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
        effect
    }

    /// Clone of the current state.
    pub fn snapshot(&self) -> S {
        self.state.lock().clone()
    }

    /// Read a projection of the state without cloning all of it.
    pub fn select<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.lock())
    }

    /// Receiver that always holds the latest snapshot.
    pub fn watch(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    /// Register a callback invoked after every dispatch. Dropping the
    /// returned [`Subscription`] unregisters it.
    pub fn subscribe(&self, listener: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);
        self.listeners.write().push((id, Arc::new(listener)));

        let weak: Weak<Listeners<S>> = Arc::downgrade(&self.listeners);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(listeners) = weak.upgrade() {
                    listeners.write().retain(|(lid, _)| *lid != id);
                }
            })),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

/// Handle returned by [`Store::subscribe`].
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the listener registered for the lifetime of the store.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.unsubscribe.take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}
