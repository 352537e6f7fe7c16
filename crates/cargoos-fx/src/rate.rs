use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where the CNY rate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FxSource {
    /// Central Bank of Russia daily feed, cached.
    #[default]
    Cbr,
    /// Caller-supplied rate.
    Manual,
}

impl fmt::Display for FxSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cbr => write!(f, "cbr"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for FxSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cbr" => Ok(Self::Cbr),
            "manual" => Ok(Self::Manual),
            other => Err(format!("unknown FX source '{other}' (expected cbr|manual)")),
        }
    }
}

/// One CNY rate in the target currency and when it was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FxRate {
    pub value: Decimal,
    pub captured_at: DateTime<Utc>,
}

impl FxRate {
    /// Whether the rate is still usable at `now`. A capture time in the
    /// future counts as fresh.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.captured_at)
            .to_std()
            .map_or(true, |age| age <= ttl)
    }
}
