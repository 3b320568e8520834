//! Business services behind the action handlers.

pub mod sample;
pub mod search;

use thiserror::Error;

pub use sample::{EchoSampleService, SampleService};
pub use search::{ConditionSearching, OrderBySearching, Search, SearchService, TypesenseSearch};

/// Service-layer failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The HTTP call failed or timed out.
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The backend answered with a non-success status.
    #[error("search backend returned HTTP {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },
    /// Input was rejected by the service.
    #[error("{0}")]
    Rejected(String),
}
