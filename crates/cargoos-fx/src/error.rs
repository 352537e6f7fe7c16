use rust_decimal::Decimal;
use thiserror::Error;

/// Errors resolving a CNY exchange rate.
#[derive(Debug, Error)]
pub enum FxError {
    /// Manual source selected without a rate.
    #[error("manual FX source requires a rate")]
    MissingManualRate,

    #[error("manual FX rate must be positive, got {0}")]
    InvalidManualRate(Decimal),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate source {url} returned HTTP {status}")]
    UpstreamStatus { status: u16, url: String },

    #[error("invalid rate source URL \"{url}\": {reason}")]
    InvalidSourceUrl { url: String, reason: String },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The feed parsed but did not yield a usable rate.
    #[error("rate feed: {0}")]
    Parse(String),
}

impl FxError {
    /// Whether the failure came from the remote rate source rather than the
    /// caller's input.
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        !matches!(self, Self::MissingManualRate | Self::InvalidManualRate(_))
    }
}

#[derive(Debug, Error)]
pub enum LandedCostError {
    #[error("invalid landed-cost input: {field} {reason}")]
    InvalidInput {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Fx(#[from] FxError),
}
