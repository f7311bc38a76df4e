// Canonical trading entities and symbol handling
pub mod symbols;
pub mod types;

pub use symbols::{CurrencyCodes, safe_symbol, split_market_id};
pub use types::{
    BalanceEntry, Balances, BookLevel, Candle, DepositAddress, Fee, Order, OrderBook, OrderSide,
    OrderStatus, OrderType, TakerOrMaker, Ticker, Timestamped, Trade, Transaction,
    TransactionKind, WithdrawalReceipt, filter_by_since_limit,
};
