//! qTrade endpoint table, description and lookup tables.

use crate::config::{ConfigLayer, FeeLayer};
use crate::domain::market::{PrecisionMode, Timeframe};
use crate::domain::ports::{Capabilities, HttpMethod};
use crate::domain::trading::types::OrderSide;
use crate::infrastructure::core::request_builder::Route;
use rust_decimal::Decimal;

pub const EXCHANGE_ID: &str = "qtrade";
pub const MARKET_ID_DELIMITER: char = '_';

pub const TICKER: Route = Route::public(HttpMethod::Get, "ticker/{market_string}");
pub const TICKERS: Route = Route::public(HttpMethod::Get, "tickers");
pub const CURRENCIES: Route = Route::public(HttpMethod::Get, "currencies");
pub const MARKETS: Route = Route::public(HttpMethod::Get, "markets");
pub const TRADES: Route = Route::public(HttpMethod::Get, "market/{market_string}/trades");
pub const ORDER_BOOK: Route = Route::public(HttpMethod::Get, "orderbook/{market_string}");
pub const OHLCV: Route = Route::public(HttpMethod::Get, "market/{market_string}/ohlcv/{interval}");

pub const BALANCES_ALL: Route = Route::private(HttpMethod::Get, "balances_all");
pub const ORDERS: Route = Route::private(HttpMethod::Get, "orders");
pub const ORDER: Route = Route::private(HttpMethod::Get, "order/{order_id}");
pub const USER_TRADES: Route = Route::private(HttpMethod::Get, "trades");
pub const WITHDRAWALS: Route = Route::private(HttpMethod::Get, "withdraws");
pub const DEPOSITS: Route = Route::private(HttpMethod::Get, "deposits");
pub const CANCEL_ORDER: Route = Route::private(HttpMethod::Post, "cancel_order");
pub const WITHDRAW: Route = Route::private(HttpMethod::Post, "withdraw");
pub const DEPOSIT_ADDRESS: Route = Route::private(HttpMethod::Post, "deposit_address/{currency}");
pub const SELL_LIMIT: Route = Route::private(HttpMethod::Post, "sell_limit");
pub const BUY_LIMIT: Route = Route::private(HttpMethod::Post, "buy_limit");

pub const ROUTES: &[Route] = &[
    TICKER,
    TICKERS,
    Route::public(HttpMethod::Get, "currency/{code}"),
    CURRENCIES,
    Route::public(HttpMethod::Get, "common"),
    Route::public(HttpMethod::Get, "market/{market_string}"),
    MARKETS,
    TRADES,
    ORDER_BOOK,
    OHLCV,
    Route::private(HttpMethod::Get, "me"),
    Route::private(HttpMethod::Get, "balances"),
    BALANCES_ALL,
    Route::private(HttpMethod::Get, "market/{market_string}"),
    ORDERS,
    ORDER,
    USER_TRADES,
    Route::private(HttpMethod::Get, "withdraw/{withdraw_id}"),
    WITHDRAWALS,
    Route::private(HttpMethod::Get, "deposit/{deposit_id}"),
    DEPOSITS,
    Route::private(HttpMethod::Get, "transfers"),
    CANCEL_ORDER,
    WITHDRAW,
    DEPOSIT_ADDRESS,
    SELL_LIMIT,
    BUY_LIMIT,
];

/// `None` for intervals the candle endpoint does not serve.
pub fn timeframe_param(timeframe: Timeframe) -> Option<&'static str> {
    match timeframe {
        Timeframe::FiveMin => Some("fivemin"),
        Timeframe::FifteenMin => Some("fifteenmin"),
        Timeframe::ThirtyMin => Some("thirtymin"),
        Timeframe::OneHour => Some("onehour"),
        Timeframe::TwoHour => Some("twohour"),
        Timeframe::FourHour => Some("fourhour"),
        Timeframe::OneDay => Some("oneday"),
        _ => None,
    }
}

/// Limit orders go to one endpoint per side.
pub fn limit_route(side: OrderSide) -> Route {
    match side {
        OrderSide::Buy => BUY_LIMIT,
        OrderSide::Sell => SELL_LIMIT,
    }
}

/// `buy_limit` / `sell_limit` carry the side.
pub fn side_of_order_type(raw: &str) -> Option<OrderSide> {
    match raw {
        "buy_limit" => Some(OrderSide::Buy),
        "sell_limit" => Some(OrderSide::Sell),
        _ => None,
    }
}

pub const CAPABILITIES: Capabilities = Capabilities {
    fetch_markets: true,
    fetch_currencies: true,
    fetch_balance: true,
    fetch_order_book: true,
    fetch_ticker: true,
    fetch_tickers: true,
    fetch_trades: true,
    fetch_my_trades: true,
    create_order: true,
    cancel_order: true,
    fetch_order: true,
    fetch_orders: true,
    fetch_open_orders: true,
    fetch_closed_orders: true,
    fetch_order_trades: false,
    fetch_deposit_address: true,
    withdraw: true,
    fetch_ohlcv: true,
    fetch_deposits: true,
    fetch_withdrawals: true,
    fetch_transactions: true,
    fetch_time: false,
};

pub fn describe() -> ConfigLayer {
    ConfigLayer {
        id: Some(EXCHANGE_ID.to_string()),
        name: Some("qTrade".to_string()),
        version: Some("v1".to_string()),
        api_url: Some("https://api.qtrade.io".to_string()),
        rate_limit_ms: Some(1000),
        precision_mode: Some(PrecisionMode::DecimalPlaces),
        fees: FeeLayer {
            maker: Some(Decimal::ZERO),
            taker: Some(Decimal::new(25, 4)),
            percentage: Some(true),
            tier_based: Some(true),
        },
        ..ConfigLayer::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframes() {
        assert_eq!(timeframe_param(Timeframe::FiveMin), Some("fivemin"));
        assert_eq!(timeframe_param(Timeframe::OneDay), Some("oneday"));
        assert_eq!(timeframe_param(Timeframe::OneMin), None);
    }

    #[test]
    fn test_limit_routes_by_side() {
        assert_eq!(limit_route(OrderSide::Buy).path, "buy_limit");
        assert_eq!(limit_route(OrderSide::Sell).path, "sell_limit");
        assert_eq!(side_of_order_type("sell_limit"), Some(OrderSide::Sell));
        assert_eq!(side_of_order_type("market"), None);
    }

    #[test]
    fn test_private_routes_are_tagged() {
        assert!(BALANCES_ALL.is_private());
        assert!(!MARKETS.is_private());
    }
}
