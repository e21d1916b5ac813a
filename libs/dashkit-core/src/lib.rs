//! Transport-agnostic data model for paginated list views.
//!
//! Everything in this crate is pure: query state and its canonical query
//! string, the list result view model, pagination math and the response
//! normalizer. The async side (controllers, transport, timers) lives in
//! the `dashkit` crate.

pub mod normalize;
pub mod page;
pub mod query;

pub use normalize::{decode_items, normalize, normalize_value, NormalizeError, ResponseShape};
pub use page::{page_window, total_pages, ListResult};
pub use query::{request_url, FilterValue, Filters, QueryState, Sort, SortDir};

/// Default number of rows per page when the caller supplies none.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query parameter used for free-text search when no search fields are declared.
pub const SEARCH_PARAM: &str = "search";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("page must be >= 1 (got {0})")]
    InvalidPage(u32),

    #[error("page size must be > 0")]
    InvalidPageSize,

    #[error("invalid sort order '{0}', expected 'asc' or 'desc'")]
    InvalidSortOrder(String),

    #[error("invalid filter '{0}', expected key=value")]
    InvalidFilter(String),
}
