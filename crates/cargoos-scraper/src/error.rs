use cargoos_core::QueryError;
use thiserror::Error;

/// Failure retrieving one result page.
///
/// These never abort a search run; the orchestrator logs them and the page
/// contributes no records.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("anti-bot response {status} from {url}")]
    AntiBot { status: u16, url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid proxy \"{proxy}\": {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("renderer failed for {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("fetch cancelled")]
    Cancelled,
}

/// Failure of a whole search run, raised before any page is fetched.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryError),

    #[error("invalid search base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build page fetcher: {0}")]
    Fetcher(#[from] FetchError),

    #[error("failed to read offline fixture {path}: {source}")]
    OfflineFixture {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
