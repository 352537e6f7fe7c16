//! Tolerant listing extraction from search-result markup.
//!
//! Any anchor whose `href` contains the detail marker and whose visible text
//! is non-empty becomes a candidate. The remaining fields are read from the
//! anchor's enclosing card when the markup offers them; whatever is missing
//! stays empty. Markup structure is never required.

use std::collections::HashSet;
use std::sync::LazyLock;

use cargoos_core::RawCandidate;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

/// How many ancestors above an anchor to search for its listing card.
const MAX_CARD_DEPTH: usize = 4;

/// Shortest attribute value accepted as an image URL.
const MIN_IMAGE_URL_LEN: usize = 8;

const IMAGE_ATTRS: &[&str] = &["data-src", "data-lazyload", "data-img", "src"];

const KNOWN_CERTIFICATIONS: &[&str] = &[
    "ISO9001", "ISO14001", "ISO", "CE", "RoHS", "FDA", "BSCI", "SGS", "FSC", "REACH",
];

const SKU_MARKERS: &[&str] = &["skuMap", "skuProps"];

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

static IMAGE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));

static PRICE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class*="price"]"#).expect("valid selector"));

static MOQ_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class*="moq"], [class*="min-order"]"#).expect("valid selector"));

static SHOP_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="company"], [class*="shop"]"#).expect("valid selector")
});

static LOCATION_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="location"], [class*="address"]"#).expect("valid selector")
});

static TAG_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[class*="tag"], [class*="badge"]"#).expect("valid selector")
});

static PRICE_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"[￥¥]\s*[0-9][0-9,]*(?:\.[0-9]+)?(?:\s*[-~～]\s*[￥¥]?\s*[0-9][0-9,]*(?:\.[0-9]+)?)?(?:\s*(?:起步|起|以上))?",
    )
    .expect("valid regex")
});

static MOQ_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:MOQ|最小起订量?|起订量|起批量)\s*[:：]?\s*[0-9]+(?:\s*[件个只套箱袋])?|[0-9]+\s*[件个只套箱袋]\s*起(?:订|批)?)",
    )
    .expect("valid regex")
});

static YEARS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^0-9])([0-9]{1,2})\s*年").expect("valid regex"));

/// Extraction knobs. Both trade coverage against false positives.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Candidates kept per page; the rest are dropped.
    pub max_candidates: usize,
    /// Substring an `href` must contain to count as a detail link.
    pub detail_marker: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_candidates: 5,
            detail_marker: "detail".to_string(),
        }
    }
}

/// Everything extracted from one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub candidates: Vec<RawCandidate>,
    /// The markup embeds SKU data (`skuMap`/`skuProps`).
    pub has_sku_data: bool,
}

impl ExtractedPage {
    /// A page is complete when some candidate has a title and the page
    /// carries a price, an MOQ, or SKU data. Incomplete pages are candidates
    /// for a rendered re-fetch.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        let has_title = self
            .candidates
            .iter()
            .any(|c| c.title.as_deref().is_some_and(|t| !t.is_empty()));
        let has_commerce = self.has_sku_data
            || self
                .candidates
                .iter()
                .any(|c| c.price_text.is_some() || c.moq_text.is_some());
        has_title && has_commerce
    }
}

/// Extract up to `opts.max_candidates` listings from `html`.
///
/// Relative and protocol-relative links are resolved against `page_url`;
/// duplicate detail URLs are kept once, in first-seen order.
#[must_use]
pub fn extract_listings(html: &str, page_url: &Url, opts: &ExtractOptions) -> ExtractedPage {
    let document = Html::parse_document(html);
    let has_sku_data = SKU_MARKERS.iter().any(|m| html.contains(m));

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        if candidates.len() >= opts.max_candidates {
            break;
        }

        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains(opts.detail_marker.as_str()) {
            continue;
        }
        let title = collapse_text(anchor);
        if title.is_empty() {
            continue;
        }
        let Some(url) = resolve(page_url, href) else {
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }

        let card = enclosing_card(anchor, &title);
        candidates.push(read_card(card, title, url, page_url));
    }

    ExtractedPage {
        candidates,
        has_sku_data,
    }
}

fn read_card(card: ElementRef<'_>, title: String, url: String, page_url: &Url) -> RawCandidate {
    let card_text = collapse_text(card);
    let context = card_text.replacen(&title, " ", 1);

    let price_text = first_text(card, &PRICE_SELECTOR)
        .filter(|t| t.chars().any(|c| c.is_ascii_digit()) || t.contains("面议"))
        .or_else(|| PRICE_TEXT_RE.find(&context).map(|m| m.as_str().to_string()))
        .or_else(|| {
            ["价格面议", "面议", "电议"]
                .iter()
                .find(|m| context.contains(*m))
                .map(|m| (*m).to_string())
        });

    let moq_text = first_text(card, &MOQ_SELECTOR)
        .or_else(|| MOQ_TEXT_RE.find(&context).map(|m| m.as_str().to_string()));

    let shop_name = first_text(card, &SHOP_SELECTOR).filter(|t| *t != title);
    let location = first_text(card, &LOCATION_SELECTOR);

    let years_active = YEARS_RE
        .captures(&context)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i32>().ok());

    RawCandidate {
        title: Some(title),
        url,
        image_urls: image_urls(card, page_url),
        price_text,
        moq_text,
        shop_name,
        location,
        tags: leaf_texts(card, &TAG_SELECTOR),
        certifications: certifications(&context),
        years_active,
    }
}

/// Nearest ancestor (bounded) whose text carries more than the anchor's own.
fn enclosing_card<'a>(anchor: ElementRef<'a>, anchor_text: &str) -> ElementRef<'a> {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(MAX_CARD_DEPTH)
        .take_while(|el| !matches!(el.value().name(), "body" | "html"))
        .find(|el| collapse_text(*el).len() > anchor_text.len())
        .unwrap_or(anchor)
}

fn resolve(page_url: &Url, href: &str) -> Option<String> {
    let mut url = page_url.join(href.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

fn collapse_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .map(collapse_text)
        .find(|t| !t.is_empty())
}

/// Texts of matching elements that contain no nested match, deduplicated.
fn leaf_texts(card: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for el in card.select(selector) {
        let has_nested = el
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|d| selector.matches(&d));
        if has_nested {
            continue;
        }
        let text = collapse_text(el);
        if !text.is_empty() && !out.contains(&text) {
            out.push(text);
        }
    }
    out
}

fn image_urls(card: ElementRef<'_>, page_url: &Url) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for img in card.select(&IMAGE_SELECTOR) {
        let src = IMAGE_ATTRS
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|v| v.len() >= MIN_IMAGE_URL_LEN && !v.starts_with("data:"));
        if let Some(url) = src.and_then(|s| resolve(page_url, s)) {
            if !out.contains(&url) {
                out.push(url);
            }
        }
    }
    out
}

fn certifications(context: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in context.split(|c: char| !c.is_ascii_alphanumeric()) {
        if let Some(known) = KNOWN_CERTIFICATIONS
            .iter()
            .find(|k| token.eq_ignore_ascii_case(k))
        {
            let known = (*known).to_string();
            if !out.contains(&known) {
                out.push(known);
            }
        }
    }
    out
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
