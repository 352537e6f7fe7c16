//! CNY rate resolution: manual override or a cached remote rate.

use std::sync::Arc;
use std::time::Duration;

use cargoos_core::AppConfig;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::cache::{FileRateCache, RateCache};
use crate::error::FxError;
use crate::rate::{FxRate, FxSource};
use crate::source::{CbrRateSource, RateSource};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

pub struct FxResolver {
    cache: Arc<dyn RateCache>,
    source: Arc<dyn RateSource>,
    ttl: Duration,
    /// Serializes refreshes so concurrent stale lookups fetch once.
    refresh: Mutex<()>,
}

impl FxResolver {
    #[must_use]
    pub fn new(cache: Arc<dyn RateCache>, source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            cache,
            source,
            ttl,
            refresh: Mutex::new(()),
        }
    }

    /// Resolver backed by the CBR feed and the file cache named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FxError`] if the HTTP client cannot be built or the feed URL
    /// is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, FxError> {
        let source = CbrRateSource::with_url(&config.fx_cbr_url, config.fx_timeout_secs)?;
        let cache = FileRateCache::new(&config.fx_cache_path);
        Ok(Self::new(
            Arc::new(cache),
            Arc::new(source),
            Duration::from_secs(config.fx_cache_ttl_secs),
        ))
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Resolve the CNY rate for `source`.
    ///
    /// # Errors
    ///
    /// - [`FxError::MissingManualRate`] / [`FxError::InvalidManualRate`] for a
    ///   manual source without a positive rate; no cache or network access
    ///   happens first.
    /// - Any fetch or parse error from the remote source when the cached
    ///   rate is missing or stale.
    pub async fn resolve(&self, source: FxSource, manual: Option<Decimal>) -> Result<Decimal, FxError> {
        self.resolve_at(source, manual, Utc::now()).await
    }

    /// [`FxResolver::resolve`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// Same as [`FxResolver::resolve`].
    pub async fn resolve_at(
        &self,
        source: FxSource,
        manual: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<Decimal, FxError> {
        match source {
            FxSource::Manual => {
                let rate = manual.ok_or(FxError::MissingManualRate)?;
                if rate <= Decimal::ZERO {
                    return Err(FxError::InvalidManualRate(rate));
                }
                Ok(rate)
            }
            FxSource::Cbr => self.cached_or_fetch(now).await,
        }
    }

    async fn cached_or_fetch(&self, now: DateTime<Utc>) -> Result<Decimal, FxError> {
        if let Some(rate) = self.fresh_cached(now).await {
            return Ok(rate);
        }

        let _guard = self.refresh.lock().await;
        // another caller may have refreshed while we waited
        if let Some(rate) = self.fresh_cached(now).await {
            return Ok(rate);
        }

        let value = self.source.fetch_rate().await?;
        self.cache
            .store(&FxRate {
                value,
                captured_at: now,
            })
            .await;
        Ok(value)
    }

    async fn fresh_cached(&self, now: DateTime<Utc>) -> Option<Decimal> {
        let cached = self.cache.load().await?;
        if cached.is_fresh(now, self.ttl) {
            tracing::debug!(rate = %cached.value, captured_at = %cached.captured_at, "using cached FX rate");
            Some(cached.value)
        } else {
            tracing::debug!(captured_at = %cached.captured_at, "cached FX rate is stale");
            None
        }
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
