use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A marketplace listing before normalization.
///
/// Produced by the listing extractor with every field the page happened to
/// expose; anything missing stays `None` or empty. Text fields are kept raw
/// (e.g. `"￥1.20-2.10"`) and only parsed when the record is normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidate {
    pub title: Option<String>,
    pub url: String,
    pub image_urls: Vec<String>,
    pub price_text: Option<String>,
    pub moq_text: Option<String>,
    pub shop_name: Option<String>,
    pub location: Option<String>,
    pub tags: Vec<String>,
    pub certifications: Vec<String>,
    pub years_active: Option<i32>,
}

/// One normalized, scored supplier listing.
///
/// Serialized with every field present: absent values appear as `null` or
/// `[]`, never omitted.
///
/// # Invariants
///
/// - `price_min_cny <= price_max_cny` when both are set.
/// - `is_factory_confidence` lies in `[0, 1]` and `score` in `[0, 100]`.
/// - `evidence` holds one entry per lexical rule that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub price_min_cny: Option<f64>,
    pub price_max_cny: Option<f64>,
    pub moq: Option<u32>,
    pub shop_name: Option<String>,
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_factory: bool,
    #[serde(default)]
    pub is_factory_confidence: f64,
    #[serde(default)]
    pub audited: bool,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<String>,
    pub years_active: Option<i32>,
    #[serde(default)]
    pub score: f64,
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl SupplierRecord {
    /// Upper price bound used for filtering: the max when known, else the min.
    #[must_use]
    pub fn effective_price_max(&self) -> Option<f64> {
        self.price_max_cny.or(self.price_min_cny)
    }
}
