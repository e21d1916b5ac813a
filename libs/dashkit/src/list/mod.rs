//! Paginated, searchable, filterable lists backed by the dashboard API.

mod controller;
mod state;

pub use controller::{FetchHandle, FetchOutcome, ListConfig, ListController};
pub use state::{FetchRequest, FetchStatus, ListAction, ListEffect, ListState};
