//! Bitso endpoint table, description and lookup tables.

use crate::config::{ConfigLayer, FeeLayer};
use crate::domain::market::PrecisionMode;
use crate::domain::ports::{Capabilities, HttpMethod};
use crate::domain::trading::types::OrderStatus;
use crate::infrastructure::core::request_builder::Route;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

pub const EXCHANGE_ID: &str = "bitso";
pub const MARKET_ID_DELIMITER: char = '_';
pub const HISTORY_DEFAULT_LIMIT: u32 = 25;

pub const AVAILABLE_BOOKS: Route = Route::public(HttpMethod::Get, "available_books");
pub const TICKER: Route = Route::public(HttpMethod::Get, "ticker");
pub const ORDER_BOOK: Route = Route::public(HttpMethod::Get, "order_book");
pub const TRADES: Route = Route::public(HttpMethod::Get, "trades");

pub const BALANCE: Route = Route::private(HttpMethod::Get, "balance");
pub const FUNDING_DESTINATION: Route = Route::private(HttpMethod::Get, "funding_destination");
pub const OPEN_ORDERS: Route = Route::private(HttpMethod::Get, "open_orders");
pub const ORDER_TRADES: Route = Route::private(HttpMethod::Get, "order_trades/{oid}");
pub const ORDER: Route = Route::private(HttpMethod::Get, "orders/{oid}");
pub const USER_TRADES: Route = Route::private(HttpMethod::Get, "user_trades");
pub const CREATE_ORDER: Route = Route::private(HttpMethod::Post, "orders");
pub const CANCEL_ORDER: Route = Route::private(HttpMethod::Delete, "orders/{oid}");

pub const ROUTES: &[Route] = &[
    AVAILABLE_BOOKS,
    TICKER,
    ORDER_BOOK,
    TRADES,
    Route::private(HttpMethod::Get, "account_status"),
    BALANCE,
    Route::private(HttpMethod::Get, "fees"),
    Route::private(HttpMethod::Get, "fundings"),
    Route::private(HttpMethod::Get, "fundings/{fid}"),
    FUNDING_DESTINATION,
    Route::private(HttpMethod::Get, "kyc_documents"),
    Route::private(HttpMethod::Get, "ledger"),
    Route::private(HttpMethod::Get, "ledger/trades"),
    Route::private(HttpMethod::Get, "ledger/fees"),
    Route::private(HttpMethod::Get, "ledger/fundings"),
    Route::private(HttpMethod::Get, "ledger/withdrawals"),
    Route::private(HttpMethod::Get, "mx_bank_codes"),
    OPEN_ORDERS,
    ORDER_TRADES,
    ORDER,
    USER_TRADES,
    Route::private(HttpMethod::Get, "user_trades/{tid}"),
    Route::private(HttpMethod::Get, "withdrawals/"),
    Route::private(HttpMethod::Get, "withdrawals/{wid}"),
    Route::private(HttpMethod::Post, "bitcoin_withdrawal"),
    Route::private(HttpMethod::Post, "debit_card_withdrawal"),
    Route::private(HttpMethod::Post, "ether_withdrawal"),
    Route::private(HttpMethod::Post, "ripple_withdrawal"),
    Route::private(HttpMethod::Post, "bcash_withdrawal"),
    Route::private(HttpMethod::Post, "litecoin_withdrawal"),
    CREATE_ORDER,
    Route::private(HttpMethod::Post, "phone_number"),
    Route::private(HttpMethod::Post, "phone_verification"),
    Route::private(HttpMethod::Post, "phone_withdrawal"),
    Route::private(HttpMethod::Post, "spei_withdrawal"),
    CANCEL_ORDER,
    Route::private(HttpMethod::Delete, "orders/all"),
];

/// Crypto withdrawals go through one private POST endpoint per currency.
pub const WITHDRAWAL_ENDPOINTS: &[(&str, &str)] = &[
    ("BTC", "bitcoin_withdrawal"),
    ("ETH", "ether_withdrawal"),
    ("XRP", "ripple_withdrawal"),
    ("BCH", "bcash_withdrawal"),
    ("LTC", "litecoin_withdrawal"),
];

pub fn withdrawal_endpoint(code: &str) -> Option<&'static str> {
    WITHDRAWAL_ENDPOINTS
        .iter()
        .find(|(currency, _)| *currency == code)
        .map(|(_, path)| *path)
}

pub fn status_table() -> [(&'static str, OrderStatus); 2] {
    [
        ("partial-fill", OrderStatus::Open),
        ("completed", OrderStatus::Closed),
    ]
}

pub const CAPABILITIES: Capabilities = Capabilities {
    fetch_markets: true,
    fetch_currencies: false,
    fetch_balance: true,
    fetch_order_book: true,
    fetch_ticker: true,
    fetch_tickers: false,
    fetch_trades: true,
    fetch_my_trades: true,
    create_order: true,
    cancel_order: true,
    fetch_order: true,
    fetch_orders: false,
    fetch_open_orders: true,
    fetch_closed_orders: false,
    fetch_order_trades: true,
    fetch_deposit_address: true,
    withdraw: true,
    fetch_ohlcv: false,
    fetch_deposits: false,
    fetch_withdrawals: false,
    fetch_transactions: false,
    fetch_time: false,
};

pub fn describe() -> ConfigLayer {
    ConfigLayer {
        id: Some(EXCHANGE_ID.to_string()),
        name: Some("Bitso".to_string()),
        version: Some("v3".to_string()),
        api_url: Some("https://api.bitso.com".to_string()),
        rate_limit_ms: Some(2000),
        precision_mode: Some(PrecisionMode::TickSize),
        default_precision: Some(Decimal::new(1, 8)),
        currency_precision: BTreeMap::from([
            ("XRP".to_string(), Decimal::new(1, 6)),
            ("MXN".to_string(), Decimal::new(1, 2)),
            ("TUSD".to_string(), Decimal::new(1, 2)),
        ]),
        fees: FeeLayer {
            percentage: Some(true),
            tier_based: Some(true),
            ..FeeLayer::default()
        },
        ..ConfigLayer::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdrawal_endpoint_table() {
        assert_eq!(withdrawal_endpoint("ETH"), Some("ether_withdrawal"));
        assert_eq!(withdrawal_endpoint("LTC"), Some("litecoin_withdrawal"));
        assert!(withdrawal_endpoint("MXN").is_none());
    }

    #[test]
    fn test_every_named_route_is_in_the_table() {
        for route in [AVAILABLE_BOOKS, BALANCE, ORDER, CANCEL_ORDER, USER_TRADES, OPEN_ORDERS] {
            assert!(ROUTES.contains(&route), "{} missing", route.path);
        }
        for (_, path) in WITHDRAWAL_ENDPOINTS {
            assert!(ROUTES.contains(&Route::private(HttpMethod::Post, *path)), "{} missing", path);
        }
    }
}
