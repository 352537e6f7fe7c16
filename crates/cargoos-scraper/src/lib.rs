pub mod classify;
pub mod client;
pub mod error;
pub mod extract;
pub mod filter;
pub mod normalize;
pub mod offline;
pub mod orchestrator;
pub mod pipeline;

pub use classify::{Classification, Classifier};
pub use client::{FetchOptions, HttpPageFetcher, PageFetcher, PageRenderer};
pub use error::{FetchError, SearchError};
pub use extract::{extract_listings, ExtractOptions, ExtractedPage};
pub use normalize::{normalize_candidate, parse_moq, parse_price_range};
pub use orchestrator::{Orchestrator, PageOutcome};
pub use pipeline::{PipelineSettings, SearchPipeline};
pub use reqwest::Url;
