use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read scoring rules at {path}: {source}")]
    RulesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scoring rules: {0}")]
    RulesFileParse(#[from] serde_yaml::Error),

    #[error("scoring rules validation failed: {0}")]
    Validation(String),
}

/// Rejected search parameters. Raised before any fetch is attempted.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("query text must be non-empty")]
    EmptyQuery,

    #[error("{field} out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RfqError {
    #[error("unsupported RFQ language: {0}")]
    UnsupportedLanguage(String),

    #[error("RFQ title must be non-empty")]
    EmptyTitle,

    #[error("I/O error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
