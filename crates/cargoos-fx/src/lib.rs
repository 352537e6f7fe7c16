pub mod cache;
pub mod error;
pub mod landed_cost;
pub mod rate;
pub mod resolver;
pub mod source;

pub use cache::{FileRateCache, MemoryRateCache, RateCache};
pub use error::{FxError, LandedCostError};
pub use landed_cost::{
    calculate, quote_landed_cost, LandedCostInput, LandedCostResult, ShippingMode,
};
pub use rate::{FxRate, FxSource};
pub use resolver::FxResolver;
pub use source::{parse_cbr_rate, CbrRateSource, RateSource, DEFAULT_CBR_URL};
