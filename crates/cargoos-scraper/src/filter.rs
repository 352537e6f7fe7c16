//! Declarative record filter and the batch ranking order.

use std::cmp::Ordering;

use cargoos_core::{SearchQuery, SupplierRecord};

/// Whether `record` passes every constraint in `query`.
///
/// Unknown MOQ passes `moq_max`. Unknown price counts as 0 for `price_min`,
/// so it fails any positive minimum, and passes `price_max`, which compares
/// the upper bound or, for a single price, the price itself.
#[must_use]
pub fn matches(record: &SupplierRecord, query: &SearchQuery) -> bool {
    if query.only_factories && !record.is_factory {
        return false;
    }
    if query.audited_only && !record.audited {
        return false;
    }
    if let (Some(limit), Some(moq)) = (query.moq_max, record.moq) {
        if moq > limit {
            return false;
        }
    }
    if let Some(min) = query.price_min {
        if record.price_min_cny.unwrap_or(0.0) < min {
            return false;
        }
    }
    if let Some(max) = query.price_max {
        if !record.effective_price_max().is_none_or(|p| p <= max) {
            return false;
        }
    }
    true
}

/// Keep records passing [`matches`], preserving input order.
#[must_use]
pub fn apply(records: Vec<SupplierRecord>, query: &SearchQuery) -> Vec<SupplierRecord> {
    records.into_iter().filter(|r| matches(r, query)).collect()
}

/// Batch order: score descending, then lowest price first, unpriced last.
///
/// Stable, so equal keys keep their arrival order.
pub fn rank(records: &mut [SupplierRecord]) {
    records.sort_by(rank_order);
}

fn rank_order(a: &SupplierRecord, b: &SupplierRecord) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| price_key(a).total_cmp(&price_key(b)))
}

fn price_key(record: &SupplierRecord) -> f64 {
    record.price_min_cny.unwrap_or(f64::INFINITY)
}
