use super::fees::FeeSchedule;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a precision value is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    /// Smallest representable increment, e.g. `0.01`.
    #[default]
    TickSize,
    /// Number of decimal places, e.g. `2`.
    DecimalPlaces,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Precision {
    pub mode: PrecisionMode,
    pub amount: Option<Decimal>,
    pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MinMax {
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

impl MinMax {
    pub fn new(min: Option<Decimal>, max: Option<Decimal>) -> Self {
        Self { min, max }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Limits {
    pub amount: MinMax,
    pub price: MinMax,
    pub cost: MinMax,
}

/// A tradable base/quote pair and its trading rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Exchange-native pair key, e.g. `btc_mxn`.
    pub id: String,
    /// Exchange-native numeric id, where the exchange has one.
    pub numeric_id: Option<i64>,
    /// Canonical `BASE/QUOTE`.
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub base_id: String,
    pub quote_id: String,
    pub precision: Precision,
    pub limits: Limits,
    pub fees: FeeSchedule,
    /// `None` when the exchange does not say.
    pub active: Option<bool>,
    pub info: Value,
}

impl Market {
    pub fn maker(&self) -> Option<Decimal> {
        self.fees.maker
    }

    pub fn taker(&self) -> Option<Decimal> {
        self.fees.taker
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Currency {
    pub id: String,
    pub code: String,
    pub name: Option<String>,
    pub precision: Option<Decimal>,
    pub active: Option<bool>,
    /// Withdrawal fee.
    pub fee: Option<Decimal>,
    pub limits: MinMax,
    pub info: Value,
}

impl Currency {
    /// Placeholder built from a market leg when the exchange has no currency listing.
    pub fn from_code(id: &str, code: &str) -> Self {
        Self {
            id: id.to_string(),
            code: code.to_string(),
            name: None,
            precision: None,
            active: None,
            fee: None,
            limits: MinMax::default(),
            info: Value::Null,
        }
    }
}
