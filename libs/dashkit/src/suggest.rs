//! Debounced remote suggestions for a text input (autocomplete).
//!
//! Keystrokes go to [`SuggestionSource::on_input`]; a lookup runs once the
//! input has been quiet for the debounce window. Every input, selection and
//! dismissal bumps a generation counter, and a lookup only writes its result
//! when its generation is still current.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, warn};

use crate::debounce::{Debouncer, DEFAULT_DEBOUNCE};
use crate::error::ListError;
use crate::http::Transport;
use crate::store::{Reducer, Store, Subscription};

/// Text shown for a suggestion and committed to the input on selection.
pub trait Suggestion {
    fn label(&self) -> String;
}

impl Suggestion for String {
    fn label(&self) -> String {
        self.clone()
    }
}

/// JSON records are labelled by their `name`, `label` or `title` field.
impl Suggestion for Value {
    fn label(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Object(map) => ["name", "label", "title"]
                .iter()
                .find_map(|k| match map.get(*k) {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(Value::Number(n)) => Some(n.to_string()),
                    _ => None,
                })
                .unwrap_or_default(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Where suggestions come from.
#[async_trait]
pub trait Lookup<T>: Send + Sync + 'static {
    async fn lookup(&self, term: &str) -> Result<Vec<T>, ListError>;
}

/// `GET <path>?<param>=<term>[&limit=<n>]`, decoded through the list
/// normalizer so any accepted list shape works.
pub struct RemoteLookup<T> {
    transport: Arc<dyn Transport>,
    path: String,
    param: String,
    limit: Option<u32>,
    _item: PhantomData<fn() -> T>,
}

impl<T> RemoteLookup<T> {
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
            param: dashkit_core::SEARCH_PARAM.to_string(),
            limit: None,
            _item: PhantomData,
        }
    }

    /// Query parameter carrying the term (default `search`).
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn url(&self, term: &str) -> String {
        let mut qs = url::form_urlencoded::Serializer::new(String::new());
        qs.append_pair(&self.param, term);
        if let Some(limit) = self.limit {
            qs.append_pair("limit", &limit.to_string());
        }
        let sep = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.path, sep, qs.finish())
    }
}

#[async_trait]
impl<T> Lookup<T> for RemoteLookup<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn lookup(&self, term: &str) -> Result<Vec<T>, ListError> {
        let payload = self.transport.get(&self.url(term)).await?;
        let mut items = dashkit_core::normalize::<T>(payload)?.items;
        if let Some(limit) = self.limit {
            items.truncate(limit as usize);
        }
        Ok(items)
    }
}

// ----- State -----------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct SuggestState<T> {
    /// Text bound to the input.
    pub value: String,
    pub suggestions: Vec<T>,
    pub is_open: bool,
    pub is_loading: bool,
    generation: u64,
    disposed: bool,
}

impl<T> Default for SuggestState<T> {
    fn default() -> Self {
        Self {
            value: String::new(),
            suggestions: Vec::new(),
            is_open: false,
            is_loading: false,
            generation: 0,
            disposed: false,
        }
    }
}

impl<T> SuggestState<T> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn close(&mut self) {
        self.suggestions.clear();
        self.is_open = false;
        self.is_loading = false;
    }
}

#[derive(Debug)]
pub enum SuggestAction<T> {
    Input(String),
    LookupStarted { generation: u64 },
    Resolved {
        generation: u64,
        result: Result<Vec<T>, ListError>,
    },
    /// Commit a chosen label to the input.
    Select(String),
    Dismiss,
    Dispose,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SuggestEffect {
    None,
    /// Arm the debounce timer for this lookup.
    Schedule { generation: u64, term: String },
    /// Disarm any pending lookup.
    Cancel,
    Proceed,
    Stale,
    Committed,
}

impl<T> Reducer for SuggestState<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    type Action = SuggestAction<T>;
    type Effect = SuggestEffect;

    fn reduce(&mut self, action: SuggestAction<T>) -> SuggestEffect {
        if self.disposed {
            return SuggestEffect::Stale;
        }
        match action {
            SuggestAction::Input(text) => {
                self.generation += 1;
                let term = text.trim().to_string();
                self.value = text;
                if term.is_empty() {
                    self.close();
                    return SuggestEffect::Cancel;
                }
                SuggestEffect::Schedule {
                    generation: self.generation,
                    term,
                }
            }
            SuggestAction::LookupStarted { generation } => {
                if generation != self.generation {
                    return SuggestEffect::Stale;
                }
                self.is_loading = true;
                SuggestEffect::Proceed
            }
            SuggestAction::Resolved { generation, result } => {
                if generation != self.generation {
                    return SuggestEffect::Stale;
                }
                self.is_loading = false;
                match result {
                    Ok(items) => {
                        self.is_open = !items.is_empty();
                        self.suggestions = items;
                    }
                    Err(_) => self.close(),
                }
                SuggestEffect::Committed
            }
            SuggestAction::Select(label) => {
                self.generation += 1;
                self.value = label;
                self.close();
                SuggestEffect::Cancel
            }
            SuggestAction::Dismiss => {
                self.generation += 1;
                self.is_open = false;
                self.is_loading = false;
                SuggestEffect::Cancel
            }
            SuggestAction::Dispose => {
                self.generation += 1;
                self.disposed = true;
                self.is_loading = false;
                SuggestEffect::Cancel
            }
        }
    }
}

// ----- Source ----------------------------------------------------------------

pub type SelectCallback<T> = Box<dyn Fn(&T) + Send + Sync>;

struct SourceInner<T: Clone + Send + Sync + fmt::Debug + 'static> {
    store: Store<SuggestState<T>>,
    lookup: Arc<dyn Lookup<T>>,
    debouncer: Debouncer,
    on_select: Option<SelectCallback<T>>,
}

/// Autocomplete state for one input.
pub struct SuggestionSource<T: Clone + Send + Sync + fmt::Debug + 'static> {
    inner: Arc<SourceInner<T>>,
}

impl<T> SuggestionSource<T>
where
    T: Suggestion + Clone + Send + Sync + fmt::Debug + 'static,
{
    pub fn new(lookup: Arc<dyn Lookup<T>>) -> Self {
        Self::with_options(lookup, DEFAULT_DEBOUNCE, None)
    }

    /// `on_select` receives the full record of every selected suggestion.
    pub fn with_options(
        lookup: Arc<dyn Lookup<T>>,
        debounce: Duration,
        on_select: Option<SelectCallback<T>>,
    ) -> Self {
        Self {
            inner: Arc::new(SourceInner {
                store: Store::new(SuggestState::default()),
                lookup,
                debouncer: Debouncer::new(debounce),
                on_select,
            }),
        }
    }

    pub fn state(&self) -> SuggestState<T> {
        self.inner.store.snapshot()
    }

    pub fn value(&self) -> String {
        self.inner.store.select(|s| s.value.clone())
    }

    pub fn suggestions(&self) -> Vec<T> {
        self.inner.store.select(|s| s.suggestions.clone())
    }

    pub fn is_open(&self) -> bool {
        self.inner.store.select(|s| s.is_open)
    }

    pub fn is_loading(&self) -> bool {
        self.inner.store.select(|s| s.is_loading)
    }

    pub fn subscribe(&self, listener: impl Fn(&SuggestState<T>) + Send + Sync + 'static) -> Subscription {
        self.inner.store.subscribe(listener)
    }

    pub fn watch(&self) -> tokio::sync::watch::Receiver<SuggestState<T>> {
        self.inner.store.watch()
    }

    /// Record a keystroke. Returns immediately; the lookup, if any, runs
    /// after the debounce window.
    pub fn on_input(&self, text: impl Into<String>) {
        let effect = self.inner.store.dispatch(SuggestAction::Input(text.into()));
        self.on_state_change(effect);
    }

    /// Commit `item` to the input, close the list and hand the record to
    /// the selection callback.
    pub fn on_select(&self, item: T) {
        let effect = self.inner.store.dispatch(SuggestAction::Select(item.label()));
        if effect == SuggestEffect::Stale {
            return;
        }
        self.on_state_change(effect);
        if let Some(cb) = &self.inner.on_select {
            cb(&item);
        }
    }

    /// Close the list without touching the value.
    pub fn dismiss(&self) {
        let effect = self.inner.store.dispatch(SuggestAction::Dismiss);
        self.on_state_change(effect);
    }

    /// Cancel pending work; later inputs and lookups are ignored.
    pub fn dispose(&self) {
        let effect = self.inner.store.dispatch(SuggestAction::Dispose);
        self.on_state_change(effect);
    }

    fn on_state_change(&self, effect: SuggestEffect) {
        match effect {
            SuggestEffect::Schedule { generation, term } => {
                let weak: Weak<SourceInner<T>> = Arc::downgrade(&self.inner);
                self.inner.debouncer.call(move || async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.run_lookup(generation, term).await;
                    }
                });
            }
            SuggestEffect::Cancel => self.inner.debouncer.cancel(),
            SuggestEffect::None
            | SuggestEffect::Proceed
            | SuggestEffect::Stale
            | SuggestEffect::Committed => {}
        }
    }
}

impl<T> SourceInner<T>
where
    T: Clone + Send + Sync + fmt::Debug + 'static,
{
    async fn run_lookup(&self, generation: u64, term: String) {
        if self.store.dispatch(SuggestAction::LookupStarted { generation }) != SuggestEffect::Proceed {
            return;
        }
        debug!(generation, %term, "suggestion lookup fired");

        let result = self.lookup.lookup(&term).await;
        if let Err(e) = &result {
            warn!(generation, %term, error = %e, "suggestion lookup failed");
        }

        if self.store.dispatch(SuggestAction::Resolved { generation, result }) == SuggestEffect::Stale {
            debug!(generation, "stale suggestions discarded");
        }
    }
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> Drop for SuggestionSource<T> {
    fn drop(&mut self) {
        self.inner.store.dispatch(SuggestAction::Dispose);
        self.inner.debouncer.cancel();
    }
}
