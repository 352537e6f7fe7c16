use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::QueryError;

pub const MAX_PAGES: u32 = 20;
pub const MAX_CONCURRENCY: usize = 10;
pub const MAX_TIMEOUT_SECS: u64 = 60;
pub const MAX_MIN_YEARS: u32 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Fast,
    Precise,
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Fast => write!(f, "fast"),
            SearchMode::Precise => write!(f, "precise"),
        }
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fast" => Ok(SearchMode::Fast),
            "precise" => Ok(SearchMode::Precise),
            other => Err(format!("unknown search mode '{other}'")),
        }
    }
}

/// Parameters for one supplier search run.
///
/// Missing fields take the defaults of [`SearchQuery::default`], so a query
/// string with only `q=` set deserializes into a runnable search. Call
/// [`SearchQuery::validate`] before handing the query to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    pub q: String,
    pub mode: SearchMode,
    pub pages: u32,
    pub concurrency: usize,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub proxy: Option<String>,
    pub cookie: Option<String>,
    pub only_factories: bool,
    pub audited_only: bool,
    pub online: bool,
    pub render: bool,
    pub offline_demo: bool,
    pub min_years: u32,
    pub moq_max: Option<u32>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub region: Option<String>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            mode: SearchMode::Fast,
            pages: 1,
            concurrency: 3,
            timeout: 15,
            proxy: None,
            cookie: None,
            only_factories: true,
            audited_only: true,
            online: true,
            render: false,
            offline_demo: false,
            min_years: 0,
            moq_max: None,
            price_min: None,
            price_max: None,
            region: None,
        }
    }
}

impl SearchQuery {
    #[must_use]
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    /// Whether the run should skip the network and use offline fixtures.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.offline_demo || !self.online
    }

    #[must_use]
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Check every bounded parameter.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] naming the first field that is out of range.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.q.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if !(1..=MAX_PAGES).contains(&self.pages) {
            return Err(out_of_range("pages", format!("must be 1..={MAX_PAGES}")));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(out_of_range(
                "concurrency",
                format!("must be 1..={MAX_CONCURRENCY}"),
            ));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.timeout) {
            return Err(out_of_range(
                "timeout",
                format!("must be 1..={MAX_TIMEOUT_SECS} seconds"),
            ));
        }
        if self.min_years > MAX_MIN_YEARS {
            return Err(out_of_range(
                "min_years",
                format!("must be 0..={MAX_MIN_YEARS}"),
            ));
        }
        if self.moq_max == Some(0) {
            return Err(out_of_range("moq_max", "must be at least 1".to_string()));
        }
        for (field, bound) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if let Some(v) = bound {
                if !v.is_finite() || v < 0.0 {
                    return Err(out_of_range(
                        field,
                        format!("must be a non-negative number, got {v}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn out_of_range(field: &'static str, reason: String) -> QueryError {
    QueryError::OutOfRange { field, reason }
}
