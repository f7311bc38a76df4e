use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "buy",
            OrderSide::Sell => "sell",
        }
    }

    /// Parses the wire value, case-insensitively. Anything else is `None`.
    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "buy" | "bid" => Some(OrderSide::Buy),
            "sell" | "ask" => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "market",
            OrderType::Limit => "limit",
            OrderType::Stop => "stop",
            OrderType::StopLimit => "stop_limit",
        }
    }

    pub fn from_wire(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "market" => Some(OrderType::Market),
            "limit" => Some(OrderType::Limit),
            "stop" | "stop_loss" => Some(OrderType::Stop),
            "stop_limit" | "stop_loss_limit" => Some(OrderType::StopLimit),
            _ => None,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical order status. Exchange statuses are mapped through an explicit
/// per-exchange table; anything unmapped is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
    Expired,
    Rejected,
    Other(String),
}

impl OrderStatus {
    /// Looks `raw` up in `table`, then against the canonical names, and finally
    /// passes it through as [`OrderStatus::Other`].
    pub fn from_wire(raw: &str, table: &[(&str, OrderStatus)]) -> Self {
        if let Some((_, status)) = table.iter().find(|(wire, _)| *wire == raw) {
            return status.clone();
        }
        match raw {
            "open" => OrderStatus::Open,
            "closed" => OrderStatus::Closed,
            "canceled" => OrderStatus::Canceled,
            "expired" => OrderStatus::Expired,
            "rejected" => OrderStatus::Rejected,
            other => OrderStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Closed => "closed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Expired => "expired",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(OrderStatus::from_wire(&raw, &[]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakerOrMaker {
    Taker,
    Maker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub cost: Decimal,
    pub currency: Option<String>,
}

/// Entities carrying an optional epoch-millisecond timestamp.
pub trait Timestamped {
    fn timestamp(&self) -> Option<i64>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Option<String>,
    pub order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub order_type: Option<OrderType>,
    pub side: Option<OrderSide>,
    pub taker_or_maker: Option<TakerOrMaker>,
    pub price: Option<Decimal>,
    /// Never negative.
    pub amount: Option<Decimal>,
    /// Never negative.
    pub cost: Option<Decimal>,
    pub fee: Option<Fee>,
    pub info: Value,
}

impl Timestamped for Trade {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<String>,
    pub client_order_id: Option<String>,
    pub timestamp: Option<i64>,
    pub last_trade_timestamp: Option<i64>,
    pub symbol: Option<String>,
    pub order_type: Option<OrderType>,
    pub side: Option<OrderSide>,
    pub status: Option<OrderStatus>,
    pub price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub filled: Option<Decimal>,
    pub remaining: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub average: Option<Decimal>,
    pub fee: Option<Fee>,
    pub trades: Option<Vec<Trade>>,
    pub info: Value,
}

impl Order {
    /// `amount - remaining`, or `None` unless both are known and it fits.
    pub fn derive_filled(amount: Option<Decimal>, remaining: Option<Decimal>) -> Option<Decimal> {
        amount?.checked_sub(remaining?)
    }

    /// An order with only the raw payload set, for builders to fill in.
    pub fn from_info(info: Value) -> Self {
        Self {
            id: None,
            client_order_id: None,
            timestamp: None,
            last_trade_timestamp: None,
            symbol: None,
            order_type: None,
            side: None,
            status: None,
            price: None,
            amount: None,
            filled: None,
            remaining: None,
            cost: None,
            average: None,
            fee: None,
            trades: None,
            info,
        }
    }
}

impl Timestamped for Order {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub vwap: Option<Decimal>,
    pub open: Option<Decimal>,
    pub close: Option<Decimal>,
    pub last: Option<Decimal>,
    pub change: Option<Decimal>,
    pub percentage: Option<Decimal>,
    pub average: Option<Decimal>,
    pub base_volume: Option<Decimal>,
    pub quote_volume: Option<Decimal>,
    pub info: Value,
}

impl Ticker {
    /// `base_volume * vwap` when both are known.
    pub fn derive_quote_volume(base_volume: Option<Decimal>, vwap: Option<Decimal>) -> Option<Decimal> {
        base_volume?.checked_mul(vwap?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

/// Bids and asks exactly as the exchange ordered them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub symbol: String,
    pub timestamp: Option<i64>,
    pub nonce: Option<i64>,
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    pub fn best_bid(&self) -> Option<&BookLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&BookLevel> {
        self.asks.first()
    }
}

/// Per-currency balance, reported as received. `total == free + used` is
/// expected but not enforced: exchanges occasionally violate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BalanceEntry {
    pub free: Option<Decimal>,
    pub used: Option<Decimal>,
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Balances {
    pub currencies: BTreeMap<String, BalanceEntry>,
    pub info: Value,
}

impl Balances {
    pub fn get(&self, code: &str) -> Option<&BalanceEntry> {
        self.currencies.get(code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: Option<i64>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
}

impl Timestamped for Candle {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositAddress {
    pub currency: String,
    pub address: String,
    pub tag: Option<String>,
    pub info: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub id: Option<String>,
    pub info: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Option<String>,
    pub txid: Option<String>,
    pub timestamp: Option<i64>,
    pub kind: TransactionKind,
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
    pub address: Option<String>,
    pub tag: Option<String>,
    pub status: Option<String>,
    pub info: Value,
}

impl Timestamped for Transaction {
    fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }
}

/// Keeps items at or after `since`. With a `since` the first `limit` survive,
/// otherwise the most recent `limit`.
pub fn filter_by_since_limit<T: Timestamped>(
    items: Vec<T>,
    since: Option<i64>,
    limit: Option<u32>,
) -> Vec<T> {
    let mut result: Vec<T> = match since {
        Some(since) => items
            .into_iter()
            .filter(|item| item.timestamp().is_some_and(|ts| ts >= since))
            .collect(),
        None => items,
    };
    if let Some(limit) = limit.map(|l| l as usize)
        && result.len() > limit
    {
        if since.is_some() {
            result.truncate(limit);
        } else {
            result.drain(..result.len() - limit);
        }
    }
    result
}
