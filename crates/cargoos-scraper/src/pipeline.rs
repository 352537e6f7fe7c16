//! Search entry points: ranked batch and incremental stream.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cargoos_core::{AppConfig, SearchQuery, SupplierRecord};
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::classify::Classifier;
use crate::client::{HttpPageFetcher, PageFetcher, PageRenderer};
use crate::error::SearchError;
use crate::extract::ExtractOptions;
use crate::filter;
use crate::offline::offline_records;
use crate::orchestrator::{Orchestrator, PageOutcome};

/// Settings shared by every run of a [`SearchPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub search_base_url: String,
    pub extract: ExtractOptions,
    pub offline_dir: PathBuf,
    /// Wall-clock budget for a whole run. Pages still in flight when it
    /// expires are abandoned; completed pages are kept.
    pub deadline: Duration,
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            search_base_url: config.search_base_url.clone(),
            extract: ExtractOptions {
                max_candidates: config.extract_max_candidates,
                detail_marker: config.extract_detail_marker.clone(),
            },
            offline_dir: config.offline_dir.clone(),
            deadline: Duration::from_secs(config.search_deadline_secs),
        }
    }
}

pub struct SearchPipeline {
    orchestrator: Orchestrator,
    classifier: Arc<Classifier>,
    offline_dir: PathBuf,
    deadline: Duration,
}

impl SearchPipeline {
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidBaseUrl`] if the configured search URL
    /// does not parse.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: Classifier,
        settings: PipelineSettings,
    ) -> Result<Self, SearchError> {
        let base_url =
            Url::parse(&settings.search_base_url).map_err(|e| SearchError::InvalidBaseUrl {
                url: settings.search_base_url.clone(),
                reason: e.to_string(),
            })?;
        let classifier = Arc::new(classifier);
        let orchestrator = Orchestrator::new(
            fetcher,
            Arc::clone(&classifier),
            base_url,
            settings.extract,
        );
        Ok(Self {
            orchestrator,
            classifier,
            offline_dir: settings.offline_dir,
            deadline: settings.deadline,
        })
    }

    /// Pipeline backed by [`HttpPageFetcher`] and the rules file named in
    /// `config` (built-in rules if that file is unusable).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Fetcher`] if the HTTP client cannot be built, or
    /// [`SearchError::InvalidBaseUrl`] for a bad search URL.
    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        let fetcher = Arc::new(HttpPageFetcher::new(&config.user_agent)?);
        let classifier = Classifier::from_path(&config.scoring_rules_path);
        Self::new(fetcher, classifier, PipelineSettings::from_config(config))
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.orchestrator = self.orchestrator.with_renderer(renderer);
        self
    }

    /// Run a search to completion: filter every page's records, then rank.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] before any fetch if the query is
    /// out of range, or [`SearchError::OfflineFixture`] in offline mode when
    /// the snapshot cannot be read. Page failures are not errors.
    pub async fn search_batch(
        &self,
        query: &SearchQuery,
        cancel: CancellationToken,
    ) -> Result<Vec<SupplierRecord>, SearchError> {
        query.validate()?;
        tracing::info!(q = %query.q, mode = %query.mode, pages = query.pages, offline = query.is_offline(), "batch search");

        let records: Vec<SupplierRecord> = if query.is_offline() {
            self.offline().await?
        } else {
            self.page_stream(query, cancel)
                .flat_map(|outcome| stream::iter(outcome.records))
                .collect()
                .await
        };

        let mut kept = filter::apply(records, query);
        filter::rank(&mut kept);
        tracing::info!(q = %query.q, count = kept.len(), "batch search complete");
        Ok(kept)
    }

    /// Run a search, yielding each page's filtered records as soon as that
    /// page completes.
    ///
    /// Records keep their within-page order; pages arrive in completion
    /// order and no cross-page ranking is applied. Dropping the stream
    /// abandons fetches still in flight.
    ///
    /// # Errors
    ///
    /// Same as [`SearchPipeline::search_batch`]; both are raised before the
    /// stream is returned.
    pub async fn search_stream(
        &self,
        query: &SearchQuery,
        cancel: CancellationToken,
    ) -> Result<BoxStream<'_, SupplierRecord>, SearchError> {
        query.validate()?;
        tracing::info!(q = %query.q, mode = %query.mode, pages = query.pages, offline = query.is_offline(), "stream search");

        if query.is_offline() {
            let records = filter::apply(self.offline().await?, query);
            return Ok(stream::iter(records).boxed());
        }

        let query_owned = query.clone();
        Ok(self
            .page_stream(query, cancel)
            .flat_map(move |outcome| stream::iter(filter::apply(outcome.records, &query_owned)))
            .boxed())
    }

    async fn offline(&self) -> Result<Vec<SupplierRecord>, SearchError> {
        offline_records(
            &self.offline_dir,
            self.orchestrator.base_url(),
            self.orchestrator.extract_options(),
            &self.classifier,
        )
        .await
    }

    /// Page outcomes in completion order, cut off at cancellation or the
    /// run deadline.
    fn page_stream(
        &self,
        query: &SearchQuery,
        cancel: CancellationToken,
    ) -> BoxStream<'_, PageOutcome> {
        let pages = self.orchestrator.fetch_pages(query, &cancel);
        let deadline = self.deadline;
        let stop = async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(deadline) => {
                    tracing::warn!(deadline_secs = deadline.as_secs(), "search deadline reached; keeping completed pages");
                }
            }
        };
        pages.take_until(stop).boxed()
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
