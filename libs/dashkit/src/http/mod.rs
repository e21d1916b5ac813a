pub mod client;
pub mod problem;
pub mod transport;

pub use client::HttpTransport;
pub use problem::{Problem, ValidationError, APPLICATION_PROBLEM_JSON};
pub use transport::{Transport, TransportError};
