//! Locale-aware parsing of marketplace price and MOQ strings, and the
//! `RawCandidate` -> `SupplierRecord` boundary.
//!
//! Inputs are simplified-Chinese listing fragments with Latin digits, e.g.
//! `"￥1.20-2.10"`, `"1.28 起"`, `"价格面议"`, `"起订量 500 个"`.
//! Unparseable input maps to `None`; nothing here panics.

use std::sync::LazyLock;

use cargoos_core::{RawCandidate, SupplierRecord};
use chrono::{DateTime, Utc};
use regex::Regex;

use crate::classify::Classifier;

/// Phrases meaning "price on request". Checked before any number parsing.
const NEGOTIABLE_MARKERS: &[&str] = &["价格面议", "面议", "电议"];

const CURRENCY_GLYPHS: &[char] = &['￥', '¥'];

static PRICE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*[-~～]\s*([0-9]+(?:\.[0-9]+)?)").expect("valid regex")
});

static PRICE_SINGLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*(?:起步|起|以上)?").expect("valid regex")
});

static MOQ_LABELED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:MOQ|起订量|起批量)\s*[:：]?\s*([0-9]+)").expect("valid regex")
});

static MOQ_UNIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+)\s*(?:件|个|只|套|箱|袋)").expect("valid regex"));

/// Parse a listing price into `(min, max)` CNY bounds.
///
/// A range returns both bounds exactly as written, with no reordering; a
/// single price (optionally suffixed `起`/`起步`/`以上`) returns `(v, None)`.
#[must_use]
pub fn parse_price_range(text: &str) -> (Option<f64>, Option<f64>) {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !CURRENCY_GLYPHS.contains(c) && *c != ',')
        .collect();
    if cleaned.is_empty() {
        return (None, None);
    }

    if NEGOTIABLE_MARKERS.iter().any(|m| cleaned.contains(m)) {
        return (None, None);
    }

    if let Some(caps) = PRICE_RANGE_RE.captures(&cleaned) {
        let low = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
        let high = caps.get(2).and_then(|m| m.as_str().parse::<f64>().ok());
        if let (Some(low), Some(high)) = (low, high) {
            return (Some(low), Some(high));
        }
    }

    let single = PRICE_SINGLE_RE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());
    (single, None)
}

/// Parse a minimum order quantity.
///
/// A labeled number (`MOQ`, `起订量`, `起批量`) takes precedence over a bare
/// number followed by a unit word. Values that overflow `u32` yield `None`.
#[must_use]
pub fn parse_moq(text: &str) -> Option<u32> {
    let caps = MOQ_LABELED_RE
        .captures(text)
        .or_else(|| MOQ_UNIT_RE.captures(text))?;
    caps.get(1)?.as_str().parse::<u32>().ok()
}

/// Turn an extracted candidate into a scored `SupplierRecord`.
///
/// Reversed price bounds are swapped here so the record always satisfies
/// `price_min_cny <= price_max_cny`. An empty title falls back to the URL.
#[must_use]
pub fn normalize_candidate(
    raw: RawCandidate,
    classifier: &Classifier,
    captured_at: DateTime<Utc>,
) -> SupplierRecord {
    let (mut price_min, mut price_max) = parse_price_range(raw.price_text.as_deref().unwrap_or(""));
    if let (Some(lo), Some(hi)) = (price_min, price_max) {
        if lo > hi {
            price_min = Some(hi);
            price_max = Some(lo);
        }
    }
    let moq = raw.moq_text.as_deref().and_then(parse_moq);

    let title = raw.title.as_deref().map(str::trim).unwrap_or_default().to_string();
    let audited = classifier.is_audited(&raw.tags);
    let classification = classifier.classify(&title, &raw.tags, raw.years_active, audited);

    let display_title = if title.is_empty() {
        raw.url.clone()
    } else {
        title
    };

    SupplierRecord {
        title: display_title,
        url: raw.url,
        image_urls: raw.image_urls,
        price_min_cny: price_min,
        price_max_cny: price_max,
        moq,
        shop_name: non_blank(raw.shop_name),
        location: non_blank(raw.location),
        tags: raw.tags,
        is_factory: classification.is_factory,
        is_factory_confidence: classification.confidence,
        audited,
        certifications: raw.certifications,
        evidence: classification.evidence,
        years_active: raw.years_active,
        score: classification.score,
        captured_at,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
