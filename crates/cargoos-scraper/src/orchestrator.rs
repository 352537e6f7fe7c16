//! Concurrent page retrieval.
//!
//! One future per result page, polled together in a `FuturesUnordered` on
//! the caller's task. A semaphore sized to the query's concurrency bounds the
//! fetches in flight, and every fetch observes the run's cancellation token.
//! Outcomes come back in completion order. A failed page yields an empty
//! outcome and never affects its siblings.

use std::sync::Arc;

use cargoos_core::{SearchQuery, SupplierRecord};
use chrono::Utc;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::FutureExt;
use reqwest::Url;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::classify::Classifier;
use crate::client::{FetchOptions, PageFetcher, PageRenderer};
use crate::error::FetchError;
use crate::extract::{extract_listings, ExtractOptions, ExtractedPage};
use crate::normalize::normalize_candidate;

/// Normalized records from one result page.
#[derive(Debug, Clone)]
pub struct PageOutcome {
    pub page: u32,
    pub records: Vec<SupplierRecord>,
}

pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    renderer: Option<Arc<dyn PageRenderer>>,
    classifier: Arc<Classifier>,
    base_url: Url,
    extract: ExtractOptions,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        classifier: Arc<Classifier>,
        base_url: Url,
        extract: ExtractOptions,
    ) -> Self {
        Self {
            fetcher,
            renderer: None,
            classifier,
            base_url,
            extract,
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn extract_options(&self) -> &ExtractOptions {
        &self.extract
    }

    /// Build the search URL for one page of results.
    #[must_use]
    pub fn page_url(&self, keywords: &str, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("keywords", keywords)
            .append_pair("page", &page.to_string());
        url
    }

    /// Start one fetch per page of `query` and return them as a completion
    /// stream. Nothing runs until the stream is polled.
    #[must_use]
    pub fn fetch_pages(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> FuturesUnordered<BoxFuture<'_, PageOutcome>> {
        let semaphore = Arc::new(Semaphore::new(query.concurrency.max(1)));
        let opts = FetchOptions {
            timeout: query.timeout_duration(),
            proxy: query.proxy.clone(),
            cookie: query.cookie.clone(),
        };

        (1..=query.pages)
            .map(|page| {
                let url = self.page_url(&query.q, page);
                self.run_page(
                    page,
                    url,
                    opts.clone(),
                    query.render,
                    Arc::clone(&semaphore),
                    cancel.clone(),
                )
                .boxed()
            })
            .collect()
    }

    async fn run_page(
        &self,
        page: u32,
        url: Url,
        opts: FetchOptions,
        render: bool,
        semaphore: Arc<Semaphore>,
        cancel: CancellationToken,
    ) -> PageOutcome {
        let work = async {
            let _permit = semaphore
                .acquire()
                .await
                .map_err(|_| FetchError::Cancelled)?;
            self.retrieve(&url, &opts, render).await
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FetchError::Cancelled),
            res = work => res,
        };

        match result {
            Ok(extracted) => {
                let captured_at = Utc::now();
                let records: Vec<SupplierRecord> = extracted
                    .candidates
                    .into_iter()
                    .map(|c| normalize_candidate(c, &self.classifier, captured_at))
                    .collect();
                tracing::debug!(page, url = %url, count = records.len(), "page extracted");
                PageOutcome { page, records }
            }
            Err(FetchError::Cancelled) => {
                tracing::debug!(page, url = %url, "page fetch cancelled");
                PageOutcome {
                    page,
                    records: Vec::new(),
                }
            }
            Err(e) => {
                tracing::warn!(page, url = %url, error = %e, "page fetch failed; contributing no records");
                PageOutcome {
                    page,
                    records: Vec::new(),
                }
            }
        }
    }

    /// Static fetch, then a rendered re-fetch only for incomplete pages.
    async fn retrieve(
        &self,
        url: &Url,
        opts: &FetchOptions,
        render: bool,
    ) -> Result<ExtractedPage, FetchError> {
        let html = self.fetcher.fetch(url, opts).await?;
        let page = extract_listings(&html, url, &self.extract);

        if !render || page.is_complete() {
            return Ok(page);
        }
        let Some(renderer) = &self.renderer else {
            return Ok(page);
        };

        tracing::debug!(url = %url, "static page incomplete; rendering");
        match renderer.render(url, opts).await {
            Ok(rendered) => Ok(extract_listings(&rendered, url, &self.extract)),
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "render failed; keeping static result");
                Ok(page)
            }
        }
    }
}
