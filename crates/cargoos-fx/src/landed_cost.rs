//! Delivered-duty-paid landed cost for a CNY-priced order.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::LandedCostError;
use crate::rate::FxSource;
use crate::resolver::FxResolver;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMode {
    Air,
    AirExpress,
    #[default]
    SeaLcl,
    RailLcl,
    Fcl20,
    Fcl40,
    Fcl40hq,
}

impl ShippingMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Air => "air",
            Self::AirExpress => "air_express",
            Self::SeaLcl => "sea_lcl",
            Self::RailLcl => "rail_lcl",
            Self::Fcl20 => "fcl20",
            Self::Fcl40 => "fcl40",
            Self::Fcl40hq => "fcl40hq",
        }
    }
}

impl fmt::Display for ShippingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "air" => Ok(Self::Air),
            "air_express" => Ok(Self::AirExpress),
            "sea_lcl" => Ok(Self::SeaLcl),
            "rail_lcl" => Ok(Self::RailLcl),
            "fcl20" => Ok(Self::Fcl20),
            "fcl40" => Ok(Self::Fcl40),
            "fcl40hq" => Ok(Self::Fcl40hq),
            other => Err(format!("unknown shipping mode '{other}'")),
        }
    }
}

/// One order to cost. Money fields without a currency suffix are in the
/// target currency; percentages are whole numbers (`13` for 13%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandedCostInput {
    #[serde(alias = "exw_or_fob_cny")]
    pub unit_price_cny: Decimal,
    pub qty: i64,
    /// Echoed for the caller; not used in the calculation.
    #[serde(default)]
    pub cbm_total: Option<Decimal>,
    /// Gross weight, echoed like `cbm_total`.
    #[serde(default, alias = "gw_total")]
    pub gross_weight_total: Option<Decimal>,
    pub duty_rate_pct: Decimal,
    pub vat_rate_pct: Decimal,
    #[serde(default)]
    pub freight_total_cny: Decimal,
    #[serde(default, alias = "freight_total_rub")]
    pub freight_total: Decimal,
    #[serde(default)]
    pub inland_cn_cny: Decimal,
    #[serde(default, alias = "inland_ru_rub")]
    pub inland_destination: Decimal,
    #[serde(default)]
    pub insurance_pct: Decimal,
    #[serde(default)]
    pub mode: ShippingMode,
    #[serde(default)]
    pub fx_source: FxSource,
    #[serde(default, alias = "fx_cny_rub")]
    pub fx_rate: Option<Decimal>,
}

impl LandedCostInput {
    /// Reject negative quantities, amounts, and percentages.
    ///
    /// # Errors
    ///
    /// Returns [`LandedCostError::InvalidInput`] naming the first bad field.
    pub fn validate(&self) -> Result<(), LandedCostError> {
        if self.qty < 0 {
            return Err(negative("qty"));
        }
        let amounts = [
            ("unit_price_cny", self.unit_price_cny),
            ("duty_rate_pct", self.duty_rate_pct),
            ("vat_rate_pct", self.vat_rate_pct),
            ("freight_total_cny", self.freight_total_cny),
            ("freight_total", self.freight_total),
            ("inland_cn_cny", self.inland_cn_cny),
            ("inland_destination", self.inland_destination),
            ("insurance_pct", self.insurance_pct),
        ];
        if let Some(&(field, _)) = amounts.iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(negative(field));
        }
        for (field, value) in [
            ("cbm_total", self.cbm_total),
            ("gross_weight_total", self.gross_weight_total),
        ] {
            if value.is_some_and(|v| v < Decimal::ZERO) {
                return Err(negative(field));
            }
        }
        Ok(())
    }
}

fn negative(field: &'static str) -> LandedCostError {
    LandedCostError::InvalidInput {
        field,
        reason: "must not be negative".to_string(),
    }
}

/// Cost breakdown in the target currency, each amount rounded to 2 dp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandedCostResult {
    /// CNY rate the amounts were computed with, rounded like the amounts.
    pub fx_rate_used: Decimal,
    pub currency: String,
    pub goods: Decimal,
    pub freight: Decimal,
    pub inland: Decimal,
    pub insurance: Decimal,
    pub duty: Decimal,
    pub vat: Decimal,
    pub total: Decimal,
    pub per_unit: Decimal,
    pub mode: ShippingMode,
    pub cbm_total: Option<Decimal>,
    pub gross_weight_total: Option<Decimal>,
    pub calculated_at: DateTime<Utc>,
}

/// Compute the landed cost of `input` at `rate`.
///
/// Intermediate values stay exact; only the reported amounts are rounded
/// (half to even).
///
/// # Errors
///
/// Returns [`LandedCostError::InvalidInput`] for negative inputs, a
/// non-positive rate, or amounts too large to represent.
pub fn calculate(
    input: &LandedCostInput,
    rate: Decimal,
    currency: &str,
) -> Result<LandedCostResult, LandedCostError> {
    input.validate()?;
    if rate <= Decimal::ZERO {
        return Err(LandedCostError::InvalidInput {
            field: "fx_rate",
            reason: format!("must be positive, got {rate}"),
        });
    }

    let qty = Decimal::from(input.qty);
    let goods = mul(mul(input.unit_price_cny, qty, "qty")?, rate, "unit_price_cny")?;
    let freight = add(
        input.freight_total,
        mul(input.freight_total_cny, rate, "freight_total_cny")?,
        "freight_total",
    )?;
    let inland = add(
        input.inland_destination,
        mul(input.inland_cn_cny, rate, "inland_cn_cny")?,
        "inland_destination",
    )?;
    let insurance = pct(goods, input.insurance_pct, "insurance_pct")?;
    let duty = pct(goods, input.duty_rate_pct, "duty_rate_pct")?;
    let vat_base = add(add(goods, duty, "duty_rate_pct")?, freight, "freight_total")?;
    let vat = pct(vat_base, input.vat_rate_pct, "vat_rate_pct")?;
    let total = [freight, inland, insurance, duty, vat]
        .into_iter()
        .try_fold(goods, |acc, part| add(acc, part, "total"))?;
    let per_unit = total
        .checked_div(Decimal::from(input.qty.max(1)))
        .ok_or_else(|| too_large("qty"))?;

    Ok(LandedCostResult {
        fx_rate_used: round2(rate),
        currency: currency.to_string(),
        goods: round2(goods),
        freight: round2(freight),
        inland: round2(inland),
        insurance: round2(insurance),
        duty: round2(duty),
        vat: round2(vat),
        total: round2(total),
        per_unit: round2(per_unit),
        mode: input.mode,
        cbm_total: input.cbm_total,
        gross_weight_total: input.gross_weight_total,
        calculated_at: Utc::now(),
    })
}

/// Validate `input`, resolve its rate, then [`calculate`].
///
/// # Errors
///
/// Returns [`LandedCostError::InvalidInput`] before any rate lookup for bad
/// input, or [`LandedCostError::Fx`] when the rate cannot be resolved.
pub async fn quote_landed_cost(
    resolver: &FxResolver,
    input: &LandedCostInput,
    currency: &str,
) -> Result<LandedCostResult, LandedCostError> {
    input.validate()?;
    let rate = resolver.resolve(input.fx_source, input.fx_rate).await?;
    tracing::debug!(rate = %rate, source = %input.fx_source, qty = input.qty, "quoting landed cost");
    calculate(input, rate, currency)
}

fn mul(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, LandedCostError> {
    a.checked_mul(b).ok_or_else(|| too_large(field))
}

fn add(a: Decimal, b: Decimal, field: &'static str) -> Result<Decimal, LandedCostError> {
    a.checked_add(b).ok_or_else(|| too_large(field))
}

/// `base * pct / 100`
fn pct(base: Decimal, rate_pct: Decimal, field: &'static str) -> Result<Decimal, LandedCostError> {
    mul(base, rate_pct, field)?
        .checked_div(HUNDRED)
        .ok_or_else(|| too_large(field))
}

fn too_large(field: &'static str) -> LandedCostError {
    LandedCostError::InvalidInput {
        field,
        reason: "amount too large".to_string(),
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

#[cfg(test)]
#[path = "landed_cost_test.rs"]
mod tests;
