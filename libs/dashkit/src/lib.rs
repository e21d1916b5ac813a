//! # dashkit - list data for admin dashboards
//!
//! Async layer over [`dashkit_core`]:
//!
//! - **list**: query state controller with last-write-wins fetches
//! - **suggest**: debounced remote autocomplete
//! - **optimistic**: per-entity optimistic values with scoped rollback
//! - **table**: rows, pager controls and CSV export
//! - **http**: traced `reqwest` transport
//!
//! ## Example
//!
//! ```rust,ignore
//! use dashkit::{HttpTransport, ListConfig, ListController};
//!
//! let transport = Arc::new(HttpTransport::from_base_url("http://127.0.0.1:8087", None)?);
//! let list: ListController<Child> = ListController::new(transport, ListConfig::new("/children"))?;
//! list.mount().wait().await;
//! ```

pub use async_trait::async_trait;
pub use dashkit_core::{
    FilterValue, Filters, ListResult, NormalizeError, QueryState, ResponseShape, Sort, SortDir,
};

pub mod debounce;
pub mod error;
pub mod http;
pub mod list;
pub mod notify;
pub mod optimistic;
pub mod store;
pub mod suggest;
pub mod table;

pub use debounce::Debouncer;
pub use error::ListError;
pub use http::{HttpTransport, Problem, Transport, TransportError};
pub use list::{FetchHandle, FetchOutcome, FetchStatus, ListConfig, ListController, ListState};
pub use notify::{Notice, NoticeLevel, Notifier, TracingNotifier};
pub use optimistic::{OptimisticTracker, RollbackPolicy};
pub use store::{Reducer, Store, Subscription};
pub use suggest::{Lookup, RemoteLookup, SuggestState, Suggestion, SuggestionSource};
pub use table::{Body, Column, ExportError, Pager, Rendered, Table};
