//! Ex876 endpoint table, description and lookup tables.

use crate::config::{ConfigLayer, FeeLayer};
use crate::domain::market::{PrecisionMode, Timeframe};
use crate::domain::ports::{Capabilities, HttpMethod};
use crate::domain::trading::types::{OrderSide, OrderStatus, OrderType};
use crate::infrastructure::core::request_builder::Route;
use rust_decimal::Decimal;

pub const EXCHANGE_ID: &str = "ex876";
pub const MARKET_ID_DELIMITER: char = '_';

pub const SYMBOLS: Route = Route::public(HttpMethod::Get, "market/symbols");
pub const SERVER_TIME: Route = Route::public(HttpMethod::Get, "market/timestamp");
pub const PRICES: Route = Route::public(HttpMethod::Get, "market/prices");
pub const PRICE: Route = Route::public(HttpMethod::Get, "market/prices/{symbol}");
pub const ORDER_BOOK: Route = Route::public(HttpMethod::Get, "market/spots/orderbook/{symbol}");
pub const TICKS: Route = Route::public(HttpMethod::Get, "market/ticks/{symbol}");
pub const BARS: Route = Route::public(HttpMethod::Get, "market/bars/{symbol}/{type}");

pub const ACCOUNTS: Route = Route::private(HttpMethod::Get, "spots/accounts");
pub const ORDER: Route = Route::private(HttpMethod::Get, "spots/orders/{orderId}");
pub const ORDER_MATCHES: Route = Route::private(HttpMethod::Get, "spots/orders/{id}/matches");
pub const CLEARINGS: Route = Route::private(HttpMethod::Get, "spots/match/clearings");
pub const OPEN_ORDERS: Route = Route::private(HttpMethod::Get, "spots/orders/open");
pub const CLOSED_ORDERS: Route = Route::private(HttpMethod::Get, "spots/orders/closed");
pub const CREATE_ORDER: Route = Route::private(HttpMethod::Post, "spots/orders");
pub const CANCEL_ORDER: Route = Route::private(HttpMethod::Post, "spots/orders/{orderId}/cancel");

pub const ROUTES: &[Route] = &[
    Route::public(HttpMethod::Get, "market/trades"),
    SERVER_TIME,
    Route::public(HttpMethod::Get, "market/fex"),
    Route::public(HttpMethod::Get, "market/errorCodes"),
    Route::public(HttpMethod::Get, "market/error"),
    Route::public(HttpMethod::Get, "market/indexes"),
    Route::public(HttpMethod::Get, "market/indexes/{name}"),
    PRICE,
    PRICES,
    SYMBOLS,
    ORDER_BOOK,
    Route::public(HttpMethod::Get, "market/contracts/orderbook/{symbol}"),
    TICKS,
    BARS,
    ACCOUNTS,
    Route::private(HttpMethod::Get, "spots/fee/rate/{symbol}"),
    ORDER,
    ORDER_MATCHES,
    CLEARINGS,
    OPEN_ORDERS,
    CLOSED_ORDERS,
    CREATE_ORDER,
    CANCEL_ORDER,
    Route::private(HttpMethod::Post, "spots/orders/cancel"),
];

pub fn status_table() -> [(&'static str, OrderStatus); 5] {
    [
        ("PENDING", OrderStatus::Open),
        ("PARTIAL_FILLED", OrderStatus::Open),
        ("FULLY_FILLED", OrderStatus::Closed),
        ("PARTIAL_CANCELLED", OrderStatus::Canceled),
        ("FULLY_CANCELLED", OrderStatus::Canceled),
    ]
}

/// Every unified timeframe is accepted verbatim by `market/bars`.
pub fn timeframe_param(timeframe: Timeframe) -> &'static str {
    timeframe.as_str()
}

/// Order types are sent as `<SIDE>_<TYPE>`, e.g. `BUY_LIMIT`.
pub fn order_type_param(side: OrderSide, order_type: OrderType) -> String {
    format!("{}_{}", side.as_str(), order_type.as_str()).to_uppercase()
}

/// Splits `BUY_LIMIT` back into side and type.
pub fn parse_order_type(raw: &str) -> (Option<OrderSide>, Option<OrderType>) {
    match raw.split_once('_') {
        Some((side, kind)) => (OrderSide::from_wire(side), OrderType::from_wire(kind)),
        None => (OrderSide::from_wire(raw), None),
    }
}

pub const CAPABILITIES: Capabilities = Capabilities {
    fetch_markets: true,
    fetch_currencies: false,
    fetch_balance: true,
    fetch_order_book: true,
    fetch_ticker: true,
    fetch_tickers: true,
    fetch_trades: true,
    fetch_my_trades: true,
    create_order: true,
    cancel_order: true,
    fetch_order: true,
    fetch_orders: false,
    fetch_open_orders: true,
    fetch_closed_orders: true,
    fetch_order_trades: true,
    fetch_deposit_address: false,
    withdraw: false,
    fetch_ohlcv: true,
    fetch_deposits: false,
    fetch_withdrawals: false,
    fetch_transactions: false,
    fetch_time: true,
};

pub fn describe() -> ConfigLayer {
    ConfigLayer {
        id: Some(EXCHANGE_ID.to_string()),
        name: Some("Ex876".to_string()),
        version: Some("v1".to_string()),
        api_url: Some("http://api.sandbox.876ex.com".to_string()),
        rate_limit_ms: Some(500),
        precision_mode: Some(PrecisionMode::DecimalPlaces),
        fees: FeeLayer {
            maker: Some(Decimal::new(1, 3)),
            taker: Some(Decimal::new(1, 3)),
            percentage: Some(true),
            tier_based: Some(false),
        },
        ..ConfigLayer::default()
    }
}
