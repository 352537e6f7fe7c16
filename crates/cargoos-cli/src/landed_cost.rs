//! `landed-cost` command.

use cargoos_core::AppConfig;
use cargoos_fx::{quote_landed_cost, FxResolver, FxSource, LandedCostInput, ShippingMode};
use clap::Args;
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub struct LandedCostArgs {
    /// Unit price (EXW or FOB) in CNY
    #[arg(long)]
    pub unit_price_cny: Decimal,
    #[arg(long)]
    pub qty: i64,
    /// Import duty, percent
    #[arg(long)]
    pub duty_rate_pct: Decimal,
    /// Import VAT, percent
    #[arg(long)]
    pub vat_rate_pct: Decimal,
    /// Freight billed in CNY
    #[arg(long, default_value = "0")]
    pub freight_total_cny: Decimal,
    /// Freight billed in the target currency
    #[arg(long, default_value = "0")]
    pub freight_total: Decimal,
    #[arg(long, default_value = "0")]
    pub inland_cn_cny: Decimal,
    #[arg(long, default_value = "0")]
    pub inland_destination: Decimal,
    #[arg(long, default_value = "0")]
    pub insurance_pct: Decimal,
    #[arg(long)]
    pub cbm_total: Option<Decimal>,
    #[arg(long)]
    pub gross_weight_total: Option<Decimal>,
    /// air | air_express | sea_lcl | rail_lcl | fcl20 | fcl40 | fcl40hq
    #[arg(long, default_value = "sea_lcl")]
    pub mode: ShippingMode,
    /// cbr | manual
    #[arg(long, default_value = "cbr")]
    pub fx_source: FxSource,
    /// CNY rate, required with `--fx-source manual`
    #[arg(long)]
    pub fx_rate: Option<Decimal>,
}

impl LandedCostArgs {
    pub fn to_input(&self) -> LandedCostInput {
        LandedCostInput {
            unit_price_cny: self.unit_price_cny,
            qty: self.qty,
            cbm_total: self.cbm_total,
            gross_weight_total: self.gross_weight_total,
            duty_rate_pct: self.duty_rate_pct,
            vat_rate_pct: self.vat_rate_pct,
            freight_total_cny: self.freight_total_cny,
            freight_total: self.freight_total,
            inland_cn_cny: self.inland_cn_cny,
            inland_destination: self.inland_destination,
            insurance_pct: self.insurance_pct,
            mode: self.mode,
            fx_source: self.fx_source,
            fx_rate: self.fx_rate,
        }
    }
}

/// Quote the order and print the breakdown as JSON.
///
/// # Errors
///
/// Returns an error for invalid input or when the rate cannot be resolved.
pub(crate) async fn run_landed_cost(
    config: &AppConfig,
    args: &LandedCostArgs,
) -> anyhow::Result<()> {
    let resolver = FxResolver::from_config(config)?;
    let result = quote_landed_cost(&resolver, &args.to_input(), &config.fx_target_currency).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
