use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::sync::Arc;
use unitrade::config::Credentials;
use unitrade::domain::errors::ExchangeError;
use unitrade::domain::ports::{Exchange, HttpMethod};
use unitrade::domain::trading::types::{OrderSide, OrderStatus, OrderType};
use unitrade::domain::values::{Params, into_params};
use unitrade::infrastructure::MockTransport;
use unitrade::infrastructure::bitso::BitsoExchange;

fn books() -> Value {
    json!({
        "success": true,
        "payload": [
            {
                "book": "btc_mxn",
                "minimum_amount": "0.00015", "maximum_amount": "500",
                "minimum_price": "10", "maximum_price": "1000000",
                "minimum_value": "5", "maximum_value": "10000000",
                "tick_size": "0.01",
                "fees": {
                    "flat_rate": {"maker": "0.500", "taker": "0.650"},
                    "structure": [
                        {"volume": "1500000", "maker": "0.00500", "taker": "0.00650"},
                        {"volume": "2000000", "maker": "0.00490", "taker": "0.00637"}
                    ]
                }
            },
            {"book": "eth_mxn", "minimum_amount": "0.001", "tick_size": "0.01"}
        ]
    })
}

fn setup(credentials: Credentials) -> (Arc<MockTransport>, BitsoExchange) {
    let mock = Arc::new(MockTransport::new());
    mock.respond(HttpMethod::Get, "/v3/available_books", 200, books());
    let exchange = BitsoExchange::new(mock.clone(), credentials, None).unwrap();
    (mock, exchange)
}

fn authed() -> (Arc<MockTransport>, BitsoExchange) {
    setup(Credentials::new("key", "secret"))
}

#[tokio::test]
async fn test_markets_derive_symbols_and_tiered_fees() {
    let (_mock, exchange) = setup(Credentials::default());
    let index = exchange.load_markets(false).await.unwrap();

    let btc = index.market("BTC/MXN").unwrap();
    assert_eq!(btc.id, "btc_mxn");
    assert_eq!(btc.maker(), Some(dec!(0.005)));
    assert_eq!(btc.taker(), Some(dec!(0.0065)));
    assert!(btc.fees.tier_based);
    assert_eq!(btc.limits.amount.min, Some(dec!(0.00015)));
    assert_eq!(btc.precision.price, Some(dec!(0.01)));
    assert!(index.market("ETH/MXN").is_ok());
    assert!(matches!(index.market("DOGE/MXN"), Err(ExchangeError::BadSymbol { .. })));
}

#[tokio::test]
async fn test_markets_are_fetched_once() {
    let (mock, exchange) = setup(Credentials::default());
    mock.respond(
        HttpMethod::Get,
        "/v3/ticker",
        200,
        json!({"success": true, "payload": {"book": "btc_mxn", "volume": "2", "vwap": "100.5", "last": "101",
               "created_at": "2020-01-01T00:00:00+00:00"}}),
    );

    let (a, b) = tokio::join!(exchange.load_markets(false), exchange.load_markets(false));
    assert!(a.is_ok() && b.is_ok());
    let ticker = exchange.fetch_ticker("BTC/MXN", Params::new()).await.unwrap();
    exchange.fetch_ticker("BTC/MXN", Params::new()).await.unwrap();

    assert_eq!(mock.requests_to("/v3/available_books").len(), 1);
    assert_eq!(ticker.quote_volume, Some(dec!(201)));
    assert_eq!(ticker.timestamp, Some(1577836800000));

    exchange.load_markets(true).await.unwrap();
    assert_eq!(mock.requests_to("/v3/available_books").len(), 2);
}

#[tokio::test]
async fn test_public_trades_are_absolute() {
    let (mock, exchange) = setup(Credentials::default());
    mock.respond(
        HttpMethod::Get,
        "/v3/trades",
        200,
        json!({"success": true, "payload": [
            {"book": "btc_mxn", "tid": 2, "amount": "-0.25", "price": "100", "maker_side": "buy",
             "created_at": "2020-01-01T00:00:02+0000"},
            {"book": "btc_mxn", "tid": 1, "amount": "0.5", "price": "99", "maker_side": "sell",
             "created_at": "2020-01-01T00:00:01+0000"}
        ]}),
    );

    let trades = exchange
        .fetch_trades("BTC/MXN", None, None, Params::new())
        .await
        .unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].id.as_deref(), Some("1"));
    assert_eq!(trades[1].amount, Some(dec!(0.25)));
    assert_eq!(trades[1].cost, Some(dec!(25)));
    assert_eq!(trades[1].symbol.as_deref(), Some("BTC/MXN"));

    let url = &mock.requests_to("/v3/trades")[0].url;
    assert!(url.ends_with("?book=btc_mxn"), "{}", url);
}

#[tokio::test]
async fn test_since_without_marker_is_refused_before_any_request() {
    let (mock, exchange) = authed();
    let err = exchange
        .fetch_my_trades(Some("BTC/MXN"), Some(1_577_836_800_000), None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::ParameterUnsupported { .. }));
    assert_eq!(mock.request_count(), 0);

    let err = exchange
        .fetch_open_orders(None, None, None, into_params(json!({"marker": "abc"})))
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::BadRequest { .. }));
    assert_eq!(mock.request_count(), 0);
}

#[tokio::test]
async fn test_marker_is_forwarded_as_integer() {
    let (mock, exchange) = authed();
    mock.respond(HttpMethod::Get, "/v3/user_trades", 200, json!({"success": true, "payload": []}));

    let trades = exchange
        .fetch_my_trades(None, None, None, into_params(json!({"marker": "12345"})))
        .await
        .unwrap();
    assert!(trades.is_empty());
    let url = &mock.requests_to("/v3/user_trades")[0].url;
    assert!(url.contains("marker=12345"), "{}", url);
    assert!(url.contains("limit=25"), "{}", url);
}

#[tokio::test]
async fn test_missing_credentials_fail_before_sending() {
    let (mock, exchange) = setup(Credentials::default());
    let err = exchange.fetch_balance(Params::new()).await.unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::MissingCredentials { field: "apiKey", .. }
    ));
    assert!(mock.requests_to("/v3/balance").is_empty());

    let (mock, exchange) = setup(Credentials::new("key", ""));
    let err = exchange.fetch_balance(Params::new()).await.unwrap_err();
    assert!(matches!(
        err,
        ExchangeError::MissingCredentials { field: "secret", .. }
    ));
    assert!(mock.requests_to("/v3/balance").is_empty());
}

#[tokio::test]
async fn test_balance_and_signed_headers() {
    let (mock, exchange) = authed();
    mock.respond(
        HttpMethod::Get,
        "/v3/balance",
        200,
        json!({"success": true, "payload": {"balances": [
            {"currency": "mxn", "available": "100", "locked": "25", "total": "125"},
            {"currency": "btc", "available": "0.5", "locked": "0", "total": "0.5"}
        ]}}),
    );

    let balances = exchange.fetch_balance(Params::new()).await.unwrap();
    let mxn = balances.get("MXN").unwrap();
    assert_eq!((mxn.free, mxn.used, mxn.total), (Some(dec!(100)), Some(dec!(25)), Some(dec!(125))));

    let request = &mock.requests_to("/v3/balance")[0];
    let auth = request.header("authorization").unwrap();
    assert!(auth.starts_with("Bitso key:"), "{}", auth);
    assert_eq!(auth.split(':').count(), 3);
    assert!(mock.requests_to("/v3/available_books")[0].header("Authorization").is_none());
}

#[tokio::test]
async fn test_error_codes_are_classified() {
    let (mock, exchange) = authed();
    mock.respond(
        HttpMethod::Get,
        "/v3/balance",
        200,
        json!({"success": false, "error": {"code": "0201", "message": "Invalid Nonce or Invalid Credentials"}}),
    )
    .respond(
        HttpMethod::Get,
        "/v3/balance",
        200,
        json!({"success": false, "error": {"code": "104", "message": "Nonce too low"}}),
    );

    let first = exchange.fetch_balance(Params::new()).await.unwrap_err();
    match first {
        ExchangeError::Authentication { feedback, .. } => {
            assert!(feedback.starts_with("bitso "));
            assert!(feedback.contains("0201"));
        }
        other => panic!("unexpected {:?}", other),
    }
    let second = exchange.fetch_balance(Params::new()).await.unwrap_err();
    assert!(matches!(second, ExchangeError::InvalidNonce { .. }));
}

#[tokio::test]
async fn test_missing_success_flag_is_an_exchange_error() {
    let (mock, exchange) = authed();
    mock.respond(HttpMethod::Get, "/v3/balance", 200, json!({"payload": {}}));
    let err = exchange.fetch_balance(Params::new()).await.unwrap_err();
    assert!(matches!(err, ExchangeError::Exchange { .. }));
}

#[tokio::test]
async fn test_fetch_order_requires_exactly_one_match() {
    let (mock, exchange) = authed();
    let order = json!({
        "oid": "abc", "book": "btc_mxn", "side": "buy", "type": "limit", "status": "partial-fill",
        "price": "100", "original_amount": "1.5", "unfilled_amount": "0.5",
        "created_at": "2020-01-01T00:00:00+0000"
    });
    mock.respond(HttpMethod::Get, "/v3/orders/abc", 200, json!({"success": true, "payload": [order]}));
    mock.respond(HttpMethod::Get, "/v3/orders/none", 200, json!({"success": true, "payload": []}));
    mock.respond(
        HttpMethod::Get,
        "/v3/orders/dup",
        200,
        json!({"success": true, "payload": [order, order]}),
    );

    let found = exchange.fetch_order("abc", None, Params::new()).await.unwrap();
    assert_eq!(found.id.as_deref(), Some("abc"));
    assert_eq!(found.symbol.as_deref(), Some("BTC/MXN"));
    assert_eq!(found.status, Some(OrderStatus::Open));
    assert_eq!(found.filled, Some(dec!(1.0)));
    assert_eq!(found.remaining, Some(dec!(0.5)));

    for id in ["none", "dup"] {
        let err = exchange.fetch_order(id, None, Params::new()).await.unwrap_err();
        assert!(matches!(err, ExchangeError::OrderNotFound { .. }), "{}", id);
    }
}

#[tokio::test]
async fn test_create_and_cancel_order() {
    let (mock, exchange) = authed();
    mock.respond(HttpMethod::Post, "/v3/orders", 200, json!({"success": true, "payload": {"oid": "qlbga6b600n3xta7"}}));
    mock.respond(
        HttpMethod::Delete,
        "/v3/orders/qlbga6b600n3xta7",
        200,
        json!({"success": true, "payload": ["qlbga6b600n3xta7"]}),
    );

    let err = exchange
        .create_order("BTC/MXN", OrderType::Limit, OrderSide::Buy, dec!(0.1), None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidOrder { .. }));

    let order = exchange
        .create_order(
            "BTC/MXN",
            OrderType::Limit,
            OrderSide::Buy,
            dec!(0.123456789),
            Some(dec!(100000.129)),
            Params::new(),
        )
        .await
        .unwrap();
    assert_eq!(order.id.as_deref(), Some("qlbga6b600n3xta7"));

    let sent = &mock.requests_to("/v3/orders")[0];
    let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body["book"], "btc_mxn");
    assert_eq!(body["side"], "buy");
    assert_eq!(body["major"], "0.12345678");
    assert_eq!(body["price"], "100000.13");
    assert_eq!(sent.header("Content-Type"), Some("application/json"));

    let ack = exchange
        .cancel_order("qlbga6b600n3xta7", None, Params::new())
        .await
        .unwrap();
    assert_eq!(ack["payload"][0], "qlbga6b600n3xta7");
}

#[tokio::test]
async fn test_withdraw_dispatches_by_currency() {
    let (mock, exchange) = authed();
    mock.respond(HttpMethod::Post, "/v3/ether_withdrawal", 200, json!({"success": true, "payload": {"wid": "w1"}}));

    let receipt = exchange
        .withdraw("ETH", dec!(1.50), "0xabc", None, Params::new())
        .await
        .unwrap();
    assert_eq!(receipt.id.as_deref(), Some("w1"));
    let body: Value =
        serde_json::from_str(mock.requests_to("/v3/ether_withdrawal")[0].body.as_deref().unwrap()).unwrap();
    assert_eq!(body["amount"], "1.5");
    assert_eq!(body["address"], "0xabc");
    assert!(body.get("destination_tag").is_none());

    let err = exchange
        .withdraw("MXN", dec!(1), "clabe", None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::BadRequest { .. }));

    let before = mock.request_count();
    let err = exchange
        .withdraw("BTC", dec!(1), "bad address", None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::InvalidAddress { .. }));
    assert_eq!(mock.request_count(), before);
}

#[tokio::test]
async fn test_deposit_address_with_tag() {
    let (mock, exchange) = authed();
    mock.respond(
        HttpMethod::Get,
        "/v3/funding_destination",
        200,
        json!({"success": true, "payload": {"account_identifier_name": "XRP address",
               "account_identifier": "rLHzPsX6oXkzU2qL12kHCH8G8cnZv1rBJh?dt=53333"}}),
    );

    let address = exchange
        .fetch_deposit_address("MXN", Params::new())
        .await
        .unwrap();
    assert_eq!(address.address, "rLHzPsX6oXkzU2qL12kHCH8G8cnZv1rBJh");
    assert_eq!(address.tag.as_deref(), Some("53333"));
    let url = &mock.requests_to("/v3/funding_destination")[0].url;
    assert!(url.contains("fund_currency=mxn"), "{}", url);
}

#[tokio::test]
async fn test_unsupported_operations() {
    let (_mock, exchange) = setup(Credentials::default());
    let err = exchange.fetch_time(Params::new()).await.unwrap_err();
    assert!(matches!(err, ExchangeError::NotSupported { .. }));
    assert!(!exchange.capabilities().fetch_ohlcv);
    assert!(!exchange.capabilities().fetch_transactions);
    let err = exchange
        .fetch_transactions(None, None, None, Params::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ExchangeError::NotSupported { .. }));
}
