// Market metadata domain
pub mod cache;
pub mod fees;
pub mod index;
pub mod precision;
pub mod timeframe;
pub mod types;

pub use cache::MarketCache;
pub use fees::{FeeSchedule, FeeTier, FeeTiers};
pub use index::MarketIndex;
pub use precision::{Rounding, decimal_to_precision};
pub use timeframe::Timeframe;
pub use types::{Currency, Limits, Market, MinMax, Precision, PrecisionMode};
