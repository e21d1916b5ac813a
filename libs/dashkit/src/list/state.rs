use dashkit_core::{total_pages, Filters, ListResult, QueryState, Sort};

use crate::error::ListError;
use crate::store::Reducer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Everything a list page renders from.
#[derive(Clone, Debug)]
pub struct ListState<T> {
    pub query: QueryState,
    pub data: Vec<T>,
    pub total: u64,
    pub status: FetchStatus,
    pub error: Option<ListError>,
    /// Number of the most recently scheduled fetch; only that fetch may commit.
    pub seq: u64,
    /// Setters refetch automatically only when this is set.
    pub auto_fetch: bool,
}

impl<T> ListState<T> {
    pub fn new(query: QueryState, auto_fetch: bool) -> Self {
        Self {
            query,
            data: Vec::new(),
            total: 0,
            status: FetchStatus::Idle,
            error: None,
            seq: 0,
            auto_fetch,
        }
    }

    pub fn loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn page(&self) -> u32 {
        self.query.page
    }

    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.query.page_size)
    }

    fn schedule(&mut self) -> ListEffect {
        self.seq += 1;
        self.status = FetchStatus::Loading;
        ListEffect::Fetch(FetchRequest {
            seq: self.seq,
            query: self.query.clone(),
        })
    }

    /// Refetch after a query change, if this controller fetches on its own.
    fn changed(&mut self) -> ListEffect {
        if self.auto_fetch {
            self.schedule()
        } else {
            ListEffect::None
        }
    }
}

#[derive(Debug)]
pub enum ListAction<T> {
    /// Initial mount: fetches when auto-fetch is on.
    Mount,
    SetPage(u32),
    SetPageSize(u32),
    SetSearch(String),
    SetFilters(Filters),
    SetSort(Option<Sort>),
    /// Re-issue the current query; fetches even with auto-fetch off.
    Refresh,
    Resolved {
        seq: u64,
        result: Result<ListResult<T>, ListError>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRequest {
    pub seq: u64,
    pub query: QueryState,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ListEffect {
    None,
    Fetch(FetchRequest),
    Rejected(ListError),
    Committed,
    Stale,
}

impl<T> Reducer for ListState<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    type Action = ListAction<T>;
    type Effect = ListEffect;

    fn reduce(&mut self, action: ListAction<T>) -> ListEffect {
        match action {
            ListAction::Mount => self.changed(),
            ListAction::SetPage(page) => {
                if page < 1 {
                    return ListEffect::Rejected(dashkit_core::Error::InvalidPage(page).into());
                }
                if page == self.query.page {
                    return ListEffect::None;
                }
                self.query.page = page;
                self.changed()
            }
            ListAction::SetPageSize(size) => {
                if size == 0 {
                    return ListEffect::Rejected(dashkit_core::Error::InvalidPageSize.into());
                }
                if size == self.query.page_size {
                    return ListEffect::None;
                }
                self.query.page_size = size;
                self.query.page = 1;
                self.changed()
            }
            ListAction::SetSearch(search) => {
                if search == self.query.search {
                    return ListEffect::None;
                }
                self.query.search = search;
                self.query.page = 1;
                self.changed()
            }
            ListAction::SetFilters(filters) => {
                if filters == self.query.filters {
                    return ListEffect::None;
                }
                self.query.filters = filters;
                self.query.page = 1;
                self.changed()
            }
            ListAction::SetSort(sort) => {
                if sort == self.query.sort {
                    return ListEffect::None;
                }
                self.query.sort = sort;
                self.changed()
            }
            ListAction::Refresh => self.schedule(),
            ListAction::Resolved { seq, result } => {
                if seq != self.seq {
                    return ListEffect::Stale;
                }
                match result {
                    Ok(list) => {
                        self.data = list.items;
                        self.total = list.total;
                        self.status = FetchStatus::Success;
                        self.error = None;
                    }
                    Err(e) => {
                        self.data.clear();
                        self.total = 0;
                        self.status = FetchStatus::Error;
                        self.error = Some(e);
                    }
                }
                ListEffect::Committed
            }
        }
    }
}
