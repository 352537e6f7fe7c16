use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::cache::MemoryRateCache;
use crate::error::FxError;
use crate::source::RateSource;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}

fn input() -> LandedCostInput {
    LandedCostInput {
        unit_price_cny: dec("10"),
        qty: 100,
        cbm_total: None,
        gross_weight_total: None,
        duty_rate_pct: dec("5"),
        vat_rate_pct: dec("13"),
        freight_total_cny: dec("2000"),
        freight_total: Decimal::ZERO,
        inland_cn_cny: Decimal::ZERO,
        inland_destination: Decimal::ZERO,
        insurance_pct: Decimal::ZERO,
        mode: ShippingMode::SeaLcl,
        fx_source: FxSource::Manual,
        fx_rate: Some(dec("12.5")),
    }
}

#[test]
fn worked_example() {
    let result = calculate(&input(), dec("12.5"), "RUB").expect("landed cost");
    assert_eq!(result.goods, dec("12500.00"));
    assert_eq!(result.freight, dec("25000.00"));
    assert_eq!(result.inland, Decimal::ZERO);
    assert_eq!(result.insurance, Decimal::ZERO);
    assert_eq!(result.duty, dec("625.00"));
    assert_eq!(result.vat, dec("4956.25"));
    assert_eq!(result.total, dec("43081.25"));
    assert_eq!(result.per_unit, dec("430.81"));
    assert_eq!(result.fx_rate_used, dec("12.5"));
    assert_eq!(result.currency, "RUB");
    assert_eq!(result.mode, ShippingMode::SeaLcl);
}

#[test]
fn mixed_currency_freight_and_inland_are_combined() {
    let order = LandedCostInput {
        freight_total: dec("1000"),
        freight_total_cny: dec("100"),
        inland_destination: dec("300"),
        inland_cn_cny: dec("20"),
        insurance_pct: dec("1"),
        duty_rate_pct: Decimal::ZERO,
        vat_rate_pct: Decimal::ZERO,
        ..input()
    };
    let result = calculate(&order, dec("12"), "RUB").expect("landed cost");
    assert_eq!(result.goods, dec("12000"));
    assert_eq!(result.freight, dec("2200"));
    assert_eq!(result.inland, dec("540"));
    assert_eq!(result.insurance, dec("120"));
    assert_eq!(result.total, dec("14860"));
}

#[test]
fn zero_quantity_divides_by_one() {
    let order = LandedCostInput {
        qty: 0,
        ..input()
    };
    let result = calculate(&order, dec("12.5"), "RUB").expect("landed cost");
    assert_eq!(result.goods, Decimal::ZERO);
    assert_eq!(result.per_unit, result.total);
}

#[test]
fn rounding_is_half_to_even() {
    // goods = 0.125 and 0.135 at rate 1, qty 1
    let low = LandedCostInput {
        unit_price_cny: dec("0.125"),
        qty: 1,
        freight_total_cny: Decimal::ZERO,
        duty_rate_pct: Decimal::ZERO,
        vat_rate_pct: Decimal::ZERO,
        ..input()
    };
    let high = LandedCostInput {
        unit_price_cny: dec("0.135"),
        ..low.clone()
    };
    assert_eq!(calculate(&low, Decimal::ONE, "RUB").expect("cost").goods, dec("0.12"));
    assert_eq!(calculate(&high, Decimal::ONE, "RUB").expect("cost").goods, dec("0.14"));
}

#[test]
fn negative_inputs_are_rejected() {
    let cases = [
        ("qty", LandedCostInput { qty: -1, ..input() }),
        ("unit_price_cny", LandedCostInput { unit_price_cny: dec("-0.01"), ..input() }),
        ("vat_rate_pct", LandedCostInput { vat_rate_pct: dec("-13"), ..input() }),
        ("cbm_total", LandedCostInput { cbm_total: Some(dec("-1")), ..input() }),
    ];
    for (expected, order) in cases {
        match calculate(&order, dec("12.5"), "RUB") {
            Err(LandedCostError::InvalidInput { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected InvalidInput({expected}), got: {other:?}"),
        }
    }
}

#[test]
fn reported_rate_is_rounded_but_amounts_use_the_exact_rate() {
    let order = LandedCostInput {
        unit_price_cny: dec("100"),
        qty: 1,
        freight_total_cny: Decimal::ZERO,
        duty_rate_pct: Decimal::ZERO,
        vat_rate_pct: Decimal::ZERO,
        ..input()
    };
    let result = calculate(&order, dec("11.2345"), "RUB").expect("landed cost");
    assert_eq!(result.fx_rate_used, dec("11.23"));
    assert_eq!(result.goods, dec("1123.45"));
}

#[test]
fn overflowing_amounts_are_rejected_not_panicking() {
    let huge_goods = LandedCostInput {
        unit_price_cny: dec("100000000000000000000"),
        qty: 10_000_000_000,
        ..input()
    };
    assert!(matches!(
        calculate(&huge_goods, dec("12.5"), "RUB"),
        Err(LandedCostError::InvalidInput { field: "qty", .. })
    ));

    let huge_freight = LandedCostInput {
        freight_total: Decimal::MAX,
        freight_total_cny: dec("1"),
        ..input()
    };
    assert!(matches!(
        calculate(&huge_freight, dec("12.5"), "RUB"),
        Err(LandedCostError::InvalidInput { field: "freight_total", .. })
    ));
}

#[test]
fn non_positive_rate_is_rejected() {
    for rate in [Decimal::ZERO, dec("-12.5")] {
        let result = calculate(&input(), rate, "RUB");
        assert!(matches!(
            result,
            Err(LandedCostError::InvalidInput { field: "fx_rate", .. })
        ));
    }
}

#[test]
fn deserializes_legacy_field_names_with_defaults() {
    let order: LandedCostInput = serde_json::from_str(
        r#"{"exw_or_fob_cny": "10", "qty": 100, "duty_rate_pct": "5", "vat_rate_pct": "13",
            "freight_total_rub": "1500", "fx_source": "manual", "fx_cny_rub": "12.5"}"#,
    )
    .expect("deserialize");
    assert_eq!(order.unit_price_cny, dec("10"));
    assert_eq!(order.freight_total, dec("1500"));
    assert_eq!(order.fx_rate, Some(dec("12.5")));
    assert_eq!(order.mode, ShippingMode::SeaLcl);
    assert_eq!(order.insurance_pct, Decimal::ZERO);
}

#[test]
fn shipping_mode_round_trips_through_text() {
    for mode in [
        ShippingMode::Air,
        ShippingMode::AirExpress,
        ShippingMode::SeaLcl,
        ShippingMode::RailLcl,
        ShippingMode::Fcl20,
        ShippingMode::Fcl40,
        ShippingMode::Fcl40hq,
    ] {
        assert_eq!(mode.to_string().parse::<ShippingMode>(), Ok(mode));
        assert_eq!(
            serde_json::to_value(mode).expect("serialize"),
            serde_json::Value::String(mode.to_string())
        );
    }
    assert!("ship".parse::<ShippingMode>().is_err());
}

struct FixedSource(Decimal);

#[async_trait]
impl RateSource for FixedSource {
    async fn fetch_rate(&self) -> Result<Decimal, FxError> {
        Ok(self.0)
    }
}

fn resolver() -> FxResolver {
    FxResolver::new(
        Arc::new(MemoryRateCache::new()),
        Arc::new(FixedSource(dec("12.5"))),
        Duration::from_secs(3600),
    )
}

#[tokio::test]
async fn quote_uses_resolved_cbr_rate() {
    let order = LandedCostInput {
        fx_source: FxSource::Cbr,
        fx_rate: None,
        ..input()
    };
    let result = quote_landed_cost(&resolver(), &order, "RUB")
        .await
        .expect("quote");
    assert_eq!(result.total, dec("43081.25"));
    assert_eq!(result.fx_rate_used, dec("12.5"));
}

#[tokio::test]
async fn quote_surfaces_missing_manual_rate() {
    let order = LandedCostInput {
        fx_rate: None,
        ..input()
    };
    let result = quote_landed_cost(&resolver(), &order, "RUB").await;
    assert!(matches!(
        result,
        Err(LandedCostError::Fx(FxError::MissingManualRate))
    ));
}

#[tokio::test]
async fn quote_rejects_bad_input_before_resolving() {
    let order = LandedCostInput {
        qty: -5,
        fx_rate: None,
        ..input()
    };
    let result = quote_landed_cost(&resolver(), &order, "RUB").await;
    assert!(matches!(result, Err(LandedCostError::InvalidInput { field: "qty", .. })));
}
