//! Offline mode: a saved results page, or two built-in sample listings.

use std::path::Path;

use cargoos_core::{RawCandidate, SupplierRecord};
use chrono::Utc;
use reqwest::Url;

use crate::classify::Classifier;
use crate::error::SearchError;
use crate::extract::{extract_listings, ExtractOptions};
use crate::normalize::normalize_candidate;

pub const SNAPSHOT_FILE: &str = "snapshot.html";

/// Records for an offline run.
///
/// Reads `<dir>/snapshot.html` and extracts it like a fetched page. When the
/// snapshot does not exist, returns the built-in samples instead.
///
/// # Errors
///
/// Returns [`SearchError::OfflineFixture`] if the snapshot exists but cannot
/// be read.
pub async fn offline_records(
    dir: &Path,
    base_url: &Url,
    extract: &ExtractOptions,
    classifier: &Classifier,
) -> Result<Vec<SupplierRecord>, SearchError> {
    let path = dir.join(SNAPSHOT_FILE);
    let captured_at = Utc::now();

    let candidates = match tokio::fs::read_to_string(&path).await {
        Ok(html) => {
            let page = extract_listings(&html, base_url, extract);
            tracing::debug!(
                path = %path.display(),
                count = page.candidates.len(),
                "extracted offline snapshot"
            );
            page.candidates
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no offline snapshot; using samples");
            sample_candidates()
        }
        Err(e) => {
            return Err(SearchError::OfflineFixture {
                path: path.display().to_string(),
                source: e,
            })
        }
    };

    Ok(candidates
        .into_iter()
        .map(|c| normalize_candidate(c, classifier, captured_at))
        .collect())
}

fn sample_candidates() -> Vec<RawCandidate> {
    vec![
        RawCandidate {
            title: Some("源头工厂 塑料瓶 OEM ODM".to_string()),
            url: "https://detail.1688.com/offer/123.html".to_string(),
            image_urls: vec![],
            price_text: Some("￥1.20-2.10".to_string()),
            moq_text: Some("起订量 500 个".to_string()),
            shop_name: Some("义乌市XX塑料制品厂".to_string()),
            location: Some("义乌".to_string()),
            tags: vec!["源头工厂".to_string(), "支持OEM".to_string()],
            certifications: vec![],
            years_active: Some(5),
        },
        RawCandidate {
            title: Some("贸易公司 批发 帽子".to_string()),
            url: "https://detail.1688.com/offer/456.html".to_string(),
            image_urls: vec![],
            price_text: Some("1.28 起".to_string()),
            moq_text: Some("MOQ 1000".to_string()),
            shop_name: Some("广州XX贸易公司".to_string()),
            location: Some("广州".to_string()),
            tags: vec!["批发".to_string()],
            certifications: vec![],
            years_active: Some(2),
        },
    ]
}
