use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use dashkit_core::{decode_items, normalize_value, request_url, Filters, ListResult, QueryState, Sort, SortDir};

use super::state::{FetchRequest, FetchStatus, ListAction, ListEffect, ListState};
use crate::error::ListError;
use crate::http::Transport;
use crate::notify::{Notice, Notifier, TracingNotifier};
use crate::store::{Store, Subscription};

/// Construction-time options of a [`ListController`].
#[derive(Debug, Clone)]
pub struct ListConfig {
    /// Resource path, e.g. `/api/children`.
    pub url: String,
    pub initial_page: u32,
    pub initial_page_size: u32,
    pub initial_search: String,
    pub search_fields: Vec<String>,
    pub filters: Filters,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortDir>,
    pub auto_fetch: bool,
    pub enabled: bool,
    pub show_error_toast: bool,
}

impl ListConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            initial_page: 1,
            initial_page_size: dashkit_core::DEFAULT_PAGE_SIZE,
            initial_search: String::new(),
            search_fields: Vec::new(),
            filters: Filters::default(),
            sort_by: None,
            sort_order: None,
            auto_fetch: true,
            enabled: true,
            show_error_toast: true,
        }
    }

    fn initial_query(&self) -> Result<QueryState, ListError> {
        let sort = self
            .sort_by
            .as_ref()
            .filter(|f| !f.trim().is_empty())
            .map(|field| Sort::new(field.clone(), self.sort_order.unwrap_or_default()));

        let query = QueryState::new(self.initial_page, self.initial_page_size)?
            .with_search(self.initial_search.clone())
            .with_search_fields(self.search_fields.iter().cloned())
            .with_filters(self.filters.clone())
            .with_sort(sort);
        Ok(query)
    }
}

/// How a scheduled fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result (success or failure) was written to state.
    Committed,
    /// A newer fetch was scheduled first; the result was dropped.
    Superseded,
    /// The fetch committed an error.
    Failed(ListError),
    /// The setter did not change anything that requires a fetch.
    NotScheduled,
    /// The fetch task did not run to completion.
    Aborted,
}

/// Awaitable handle for the fetch a setter scheduled.
#[must_use = "the fetch runs regardless; await the handle to observe its outcome"]
pub struct FetchHandle(Option<JoinHandle<FetchOutcome>>);

impl FetchHandle {
    fn none() -> Self {
        Self(None)
    }

    pub fn is_scheduled(&self) -> bool {
        self.0.is_some()
    }

    pub async fn wait(self) -> FetchOutcome {
        match self.0 {
            None => FetchOutcome::NotScheduled,
            Some(handle) => handle.await.unwrap_or(FetchOutcome::Aborted),
        }
    }
}

impl fmt::Debug for FetchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FetchHandle").field(&self.is_scheduled()).finish()
    }
}

struct Inner<T: Clone + Send + Sync + fmt::Debug + 'static> {
    url: String,
    transport: Arc<dyn Transport>,
    store: Store<ListState<T>>,
    notifier: Arc<dyn Notifier>,
    show_error_toast: bool,
}

/// Query state controller for one list page.
///
/// Setters apply synchronously and schedule a fetch on the Tokio runtime;
/// only the most recently scheduled fetch may write its result. Failures
/// end up in [`ListState::error`] and never propagate out of the spawned
/// task.
pub struct ListController<T: Clone + Send + Sync + fmt::Debug + 'static> {
    inner: Arc<Inner<T>>,
}

impl<T: Clone + Send + Sync + fmt::Debug + 'static> Clone for ListController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> ListController<T>
where
    T: DeserializeOwned + Clone + Send + Sync + fmt::Debug + 'static,
{
    /// Build an idle controller. Nothing is fetched until [`mount`](Self::mount)
    /// or [`fetch_data`](Self::fetch_data).
    pub fn new(transport: Arc<dyn Transport>, config: ListConfig) -> Result<Self, ListError> {
        Self::with_notifier(transport, config, Arc::new(TracingNotifier))
    }

    pub fn with_notifier(
        transport: Arc<dyn Transport>,
        config: ListConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ListError> {
        let query = config.initial_query()?;
        let auto = config.auto_fetch && config.enabled;
        Ok(Self {
            inner: Arc::new(Inner {
                url: config.url,
                transport,
                store: Store::new(ListState::new(query, auto)),
                notifier,
                show_error_toast: config.show_error_toast,
            }),
        })
    }

    // --- state accessors ------------------------------------------------------

    pub fn state(&self) -> ListState<T> {
        self.inner.store.snapshot()
    }

    pub fn data(&self) -> Vec<T> {
        self.inner.store.select(|s| s.data.clone())
    }

    pub fn total(&self) -> u64 {
        self.inner.store.select(|s| s.total)
    }

    pub fn page(&self) -> u32 {
        self.inner.store.select(|s| s.query.page)
    }

    pub fn page_size(&self) -> u32 {
        self.inner.store.select(|s| s.query.page_size)
    }

    pub fn search(&self) -> String {
        self.inner.store.select(|s| s.query.search.clone())
    }

    pub fn loading(&self) -> bool {
        self.inner.store.select(|s| s.loading())
    }

    pub fn status(&self) -> FetchStatus {
        self.inner.store.select(|s| s.status)
    }

    pub fn error(&self) -> Option<ListError> {
        self.inner.store.select(|s| s.error.clone())
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.store.select(|s| s.total_pages())
    }

    /// URL the next fetch would request.
    pub fn current_url(&self) -> String {
        self.inner.store.select(|s| request_url(&self.inner.url, &s.query))
    }

    pub fn subscribe(&self, listener: impl Fn(&ListState<T>) + Send + Sync + 'static) -> Subscription {
        self.inner.store.subscribe(listener)
    }

    pub fn watch(&self) -> tokio::sync::watch::Receiver<ListState<T>> {
        self.inner.store.watch()
    }

    // --- operations ------------------------------------------------------------

    /// Initial load, when auto-fetch and enabled are both set.
    pub fn mount(&self) -> FetchHandle {
        self.dispatch(ListAction::Mount)
    }

    pub fn set_page(&self, page: u32) -> Result<FetchHandle, ListError> {
        self.dispatch_checked(ListAction::SetPage(page))
    }

    pub fn set_page_size(&self, page_size: u32) -> Result<FetchHandle, ListError> {
        self.dispatch_checked(ListAction::SetPageSize(page_size))
    }

    pub fn set_search(&self, search: impl Into<String>) -> FetchHandle {
        self.dispatch(ListAction::SetSearch(search.into()))
    }

    pub fn set_filters(&self, filters: Filters) -> FetchHandle {
        self.dispatch(ListAction::SetFilters(filters))
    }

    pub fn set_sort(&self, field: impl Into<String>, dir: SortDir) -> FetchHandle {
        self.dispatch(ListAction::SetSort(Some(Sort::new(field, dir))))
    }

    pub fn clear_sort(&self) -> FetchHandle {
        self.dispatch(ListAction::SetSort(None))
    }

    /// Re-issue the current query in the background.
    pub fn refresh(&self) -> FetchHandle {
        self.dispatch(ListAction::Refresh)
    }

    /// Re-issue the current query and wait for it. Works with auto-fetch
    /// disabled. A result superseded by a newer fetch counts as success.
    #[instrument(name = "dashkit.list.fetch_data", skip(self), fields(url = %self.inner.url))]
    pub async fn fetch_data(&self) -> Result<(), ListError> {
        match self.inner.store.dispatch(ListAction::Refresh) {
            ListEffect::Fetch(req) => match run_fetch(self.inner.clone(), req).await {
                FetchOutcome::Failed(e) => Err(e),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    // --- mutations ---------------------------------------------------------------

    /// `POST <url>`; refreshes the list on success.
    #[instrument(name = "dashkit.list.create", skip(self, body), fields(url = %self.inner.url))]
    pub async fn create(&self, body: &Value) -> Result<Value, ListError> {
        let res = self.inner.transport.post(&self.inner.url, body).await;
        self.after_write("new record", res)
    }

    /// `PUT <url>/<id>`; refreshes the list on success.
    #[instrument(name = "dashkit.list.update", skip(self, body), fields(url = %self.inner.url))]
    pub async fn update(&self, id: &str, body: &Value) -> Result<Value, ListError> {
        let res = self.inner.transport.put(&self.resource_url(id), body).await;
        self.after_write(id, res)
    }

    /// `DELETE <url>/<id>`; refreshes the list on success.
    #[instrument(name = "dashkit.list.remove", skip(self), fields(url = %self.inner.url))]
    pub async fn remove(&self, id: &str) -> Result<Value, ListError> {
        let res = self.inner.transport.delete(&self.resource_url(id)).await;
        self.after_write(id, res)
    }

    fn resource_url(&self, id: &str) -> String {
        let base = self.inner.url.split('?').next().unwrap_or_default();
        format!("{}/{}", base.trim_end_matches('/'), id)
    }

    fn after_write(
        &self,
        key: &str,
        res: Result<Value, crate::http::TransportError>,
    ) -> Result<Value, ListError> {
        match res {
            Ok(v) => {
                let refresh = self.refresh();
                debug!(key, scheduled = refresh.is_scheduled(), "write confirmed; list refresh in background");
                drop(refresh);
                Ok(v)
            }
            Err(e) => {
                warn!(key, error = %e, "write failed");
                Err(ListError::mutation(key, e))
            }
        }
    }

    // --- dispatch plumbing --------------------------------------------------------

    fn dispatch(&self, action: ListAction<T>) -> FetchHandle {
        let effect = self.inner.store.dispatch(action);
        self.on_state_change(effect)
    }

    fn dispatch_checked(&self, action: ListAction<T>) -> Result<FetchHandle, ListError> {
        match self.inner.store.dispatch(action) {
            ListEffect::Rejected(e) => Err(e),
            effect => Ok(self.on_state_change(effect)),
        }
    }

    /// Performs the reducer's effect after every dispatch.
    fn on_state_change(&self, effect: ListEffect) -> FetchHandle {
        match effect {
            ListEffect::Fetch(req) => {
                FetchHandle(Some(tokio::spawn(run_fetch(self.inner.clone(), req))))
            }
            ListEffect::Rejected(e) => {
                debug!(error = %e, "action rejected");
                FetchHandle::none()
            }
            ListEffect::None | ListEffect::Committed | ListEffect::Stale => FetchHandle::none(),
        }
    }
}

impl<T> Inner<T>
where
    T: DeserializeOwned + Clone + Send + Sync + fmt::Debug + 'static,
{
    async fn load(&self, url: &str) -> Result<ListResult<T>, ListError> {
        let payload = self.transport.get(url).await?;
        let (shape, raw) = normalize_value(payload)?;
        debug!(?shape, items = raw.items.len(), total = raw.total, "list response normalized");
        Ok(decode_items(raw)?)
    }

    fn surface(&self, err: &ListError) {
        if self.show_error_toast {
            self.notifier.notify(Notice::error(err.user_message()));
        }
    }
}

async fn run_fetch<T>(inner: Arc<Inner<T>>, req: FetchRequest) -> FetchOutcome
where
    T: DeserializeOwned + Clone + Send + Sync + fmt::Debug + 'static,
{
    let url = request_url(&inner.url, &req.query);
    debug!(seq = req.seq, %url, "list fetch started");

    let result = inner.load(&url).await;
    let failure = result.as_ref().err().cloned();

    match inner.store.dispatch(ListAction::Resolved {
        seq: req.seq,
        result,
    }) {
        ListEffect::Committed => match failure {
            Some(e) => {
                warn!(seq = req.seq, error = %e, "list fetch failed");
                inner.surface(&e);
                FetchOutcome::Failed(e)
            }
            None => {
                debug!(seq = req.seq, "list fetch committed");
                FetchOutcome::Committed
            }
        },
        _ => {
            debug!(seq = req.seq, "stale list response discarded");
            FetchOutcome::Superseded
        }
    }
}
