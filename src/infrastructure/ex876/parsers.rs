//! Ex876 payloads into canonical entities.
//!
//! Timestamps arrive as epoch milliseconds. Scales in `market/symbols` are
//! decimal-place counts.

use super::common::{MARKET_ID_DELIMITER, parse_order_type, status_table};
use crate::config::ExchangeConfig;
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{FeeSchedule, Limits, Market, MinMax, Precision, PrecisionMode};
use crate::domain::trading::symbols::{CurrencyCodes, split_market_id};
use crate::domain::trading::types::{
    BalanceEntry, Balances, Candle, Fee, Order, OrderBook, OrderSide, OrderStatus, TakerOrMaker,
    Ticker, Trade,
};
use crate::domain::values::{
    FromJson, get, safe_array, safe_bool, safe_decimal, safe_integer, safe_string,
};
use crate::infrastructure::core::normalize::{ParseContext, levels_from_pairs, trade_cost};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

pub fn parse_market(
    entry: &Value,
    config: &ExchangeConfig,
    codes: &CurrencyCodes,
) -> ExchangeResult<Market> {
    let id = safe_string(entry, "symbol")
        .ok_or_else(|| ExchangeError::bad_response(&config.id, "symbol entry without name"))?;
    let (base_id, quote_id) = split_market_id(&config.id, &id, MARKET_ID_DELIMITER)?;
    let base = codes.canonical(base_id);
    let quote = codes.canonical(quote_id);

    Ok(Market {
        symbol: format!("{}/{}", base, quote),
        base_id: base_id.to_string(),
        quote_id: quote_id.to_string(),
        id,
        numeric_id: None,
        base,
        quote,
        precision: Precision {
            mode: PrecisionMode::DecimalPlaces,
            amount: safe_integer(entry, "quantityScale").map(Decimal::from),
            price: safe_integer(entry, "priceScale").map(Decimal::from),
        },
        limits: Limits {
            amount: MinMax::new(
                safe_decimal(entry, "minQuantity"),
                safe_decimal(entry, "maxQuantity"),
            ),
            price: MinMax::default(),
            cost: MinMax::new(safe_decimal(entry, "minValue"), None),
        },
        fees: FeeSchedule::flat(config.fees.maker, config.fees.taker, config.fees.percentage),
        active: safe_bool(entry, "tradable"),
        info: entry.clone(),
    })
}

/// `spots/accounts` lists one row per currency. A missing `total` is
/// derived from the parts; a reported one is kept as is.
pub fn parse_balance(response: &Value, ctx: &ParseContext<'_>) -> Balances {
    let mut currencies = BTreeMap::new();
    for account in response.as_array().map(Vec::as_slice).unwrap_or(&[]) {
        let Some(currency_id) = safe_string(account, "currency") else {
            continue;
        };
        let free = safe_decimal(account, "available");
        let used = safe_decimal(account, "frozen");
        let total = safe_decimal(account, "total").or_else(|| free?.checked_add(used?));
        currencies.insert(
            ctx.currency_code(&currency_id),
            BalanceEntry { free, used, total },
        );
    }
    Balances {
        currencies,
        info: response.clone(),
    }
}

pub fn parse_order_book(response: &Value, symbol: &str) -> OrderBook {
    OrderBook {
        symbol: symbol.to_string(),
        timestamp: safe_integer(response, "timestamp"),
        nonce: safe_integer(response, "sequenceId"),
        bids: levels_from_pairs(safe_array(response, "bids")),
        asks: levels_from_pairs(safe_array(response, "asks")),
    }
}

/// Rolling 24h statistics from `market/prices`. `amount` is the quote volume.
/// The requested market names the ticker; the payload id is the fallback.
pub fn parse_ticker(
    entry: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Ticker> {
    let symbol = match market {
        Some(market) => market.symbol.clone(),
        None => ctx
            .symbol(safe_string(entry, "symbol").as_deref(), None)?
            .unwrap_or_default(),
    };
    let open = safe_decimal(entry, "open");
    let close = safe_decimal(entry, "close");
    let base_volume = safe_decimal(entry, "volume");
    let quote_volume = safe_decimal(entry, "amount");

    let change = close.zip(open).and_then(|(close, open)| close.checked_sub(open));
    let percentage = change
        .zip(open)
        .and_then(|(change, open)| change.checked_div(open))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
    let vwap = quote_volume
        .zip(base_volume)
        .and_then(|(quote, base)| quote.checked_div(base));
    let average = open
        .zip(close)
        .and_then(|(open, close)| open.checked_add(close))
        .and_then(|sum| sum.checked_div(Decimal::TWO));

    Ok(Ticker {
        symbol,
        timestamp: safe_integer(entry, "timestamp"),
        high: safe_decimal(entry, "high"),
        low: safe_decimal(entry, "low"),
        bid: safe_decimal(entry, "bid"),
        ask: safe_decimal(entry, "ask"),
        vwap,
        open,
        close,
        last: close,
        change,
        percentage,
        average,
        base_volume,
        quote_volume,
        info: entry.clone(),
    })
}

/// Public ticks are `[timestamp, direction, price, amount]`; direction 1 is a buy.
pub fn parse_tick(tick: &Value, symbol: &str) -> Trade {
    let price = get::<Decimal, _>(tick, 2usize);
    let amount = get::<Decimal, _>(tick, 3usize).map(|a| a.abs());
    let side = get::<i64, _>(tick, 1usize).map(|direction| {
        if direction == 1 {
            OrderSide::Buy
        } else {
            OrderSide::Sell
        }
    });
    Trade {
        id: None,
        order_id: None,
        timestamp: get::<i64, _>(tick, 0usize),
        symbol: Some(symbol.to_string()),
        order_type: None,
        side,
        taker_or_maker: None,
        price,
        amount,
        cost: trade_cost(None, price, amount),
        fee: None,
        info: tick.clone(),
    }
}

/// Fills from `spots/match/clearings` and `spots/orders/{id}/matches`.
pub fn parse_match(
    entry: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Trade> {
    let symbol = ctx.symbol(safe_string(entry, "symbol").as_deref(), market)?;
    let (side, order_type) = safe_string(entry, "type")
        .as_deref()
        .map(parse_order_type)
        .unwrap_or((None, None));
    let price = safe_decimal(entry, "price");
    let amount = safe_decimal(entry, "quantity").map(|a| a.abs());
    let fee = safe_decimal(entry, "fee").map(|cost| Fee {
        cost,
        currency: safe_string(entry, "feeCurrency").map(|id| ctx.currency_code(&id)),
    });
    let taker_or_maker = safe_string(entry, "role").and_then(|role| match role.as_str() {
        "MAKER" => Some(TakerOrMaker::Maker),
        "TAKER" => Some(TakerOrMaker::Taker),
        _ => None,
    });

    Ok(Trade {
        id: safe_string(entry, "id"),
        order_id: safe_string(entry, "orderId"),
        timestamp: safe_integer(entry, "createdAt"),
        symbol,
        order_type,
        side,
        taker_or_maker,
        price,
        amount,
        cost: trade_cost(safe_decimal(entry, "amount").map(|c| c.abs()), price, amount),
        fee,
        info: entry.clone(),
    })
}

pub fn parse_order(
    entry: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Order> {
    let (side, order_type) = safe_string(entry, "type")
        .as_deref()
        .map(parse_order_type)
        .unwrap_or((None, None));
    let amount = safe_decimal(entry, "quantity");
    let filled = safe_decimal(entry, "filledQuantity");
    let remaining = amount.zip(filled).and_then(|(amount, filled)| amount.checked_sub(filled));
    let cost = safe_decimal(entry, "filledAmount");
    let average = cost.zip(filled).and_then(|(cost, filled)| cost.checked_div(filled));
    let table = status_table();

    let mut order = Order::from_info(entry.clone());
    order.id = safe_string(entry, "id");
    order.client_order_id = safe_string(entry, "clientOrderId");
    order.timestamp = safe_integer(entry, "createdAt");
    order.last_trade_timestamp = safe_integer(entry, "updatedAt");
    order.symbol = ctx.symbol(safe_string(entry, "symbol").as_deref(), market)?;
    order.order_type = order_type;
    order.side = side;
    order.status = safe_string(entry, "status").map(|raw| OrderStatus::from_wire(&raw, &table));
    order.price = safe_decimal(entry, "price");
    order.amount = amount;
    order.remaining = remaining;
    order.filled = Order::derive_filled(amount, remaining);
    order.cost = cost;
    order.average = average;
    order.fee = safe_decimal(entry, "fee").map(|cost| Fee {
        cost,
        currency: safe_string(entry, "feeCurrency").map(|id| ctx.currency_code(&id)),
    });
    Ok(order)
}

/// Bars are `[timestamp, open, high, low, close, volume]`.
pub fn parse_candle(bar: &Value) -> Candle {
    let at = |i: usize| bar.get(i).and_then(Decimal::from_json);
    Candle {
        timestamp: bar.get(0usize).and_then(i64::from_json),
        open: at(1),
        high: at(2),
        low: at(3),
        close: at(4),
        volume: at(5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLayer;
    use crate::infrastructure::ex876::common::describe;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn ctx(codes: &CurrencyCodes) -> ParseContext<'_> {
        ParseContext {
            exchange: "ex876",
            codes,
            index: None,
            delimiter: '_',
        }
    }

    #[test]
    fn test_market_scales_are_decimal_places() {
        let config = ExchangeConfig::resolve(ConfigLayer::base(), describe(), None).unwrap();
        let codes = CurrencyCodes::default();
        let market = parse_market(
            &json!({"symbol": "BTC_USDT", "quantityScale": 4, "priceScale": 2, "minQuantity": "0.0001", "tradable": true}),
            &config,
            &codes,
        )
        .unwrap();
        assert_eq!(market.symbol, "BTC/USDT");
        assert_eq!(market.precision.mode, PrecisionMode::DecimalPlaces);
        assert_eq!(market.precision.amount, Some(dec!(4)));
        assert_eq!(market.active, Some(true));
        assert_eq!(market.taker(), Some(dec!(0.001)));
    }

    #[test]
    fn test_ticker_derivations() {
        let codes = CurrencyCodes::default();
        let ticker = parse_ticker(
            &json!({"symbol": "BTC_USDT", "timestamp": 1560000000000i64, "open": "100", "close": "110",
                    "high": "120", "low": "90", "volume": "2", "amount": "210"}),
            None,
            &ctx(&codes),
        )
        .unwrap();
        assert_eq!(ticker.symbol, "BTC/USDT");
        assert_eq!(ticker.change, Some(dec!(10)));
        assert_eq!(ticker.percentage, Some(dec!(10)));
        assert_eq!(ticker.vwap, Some(dec!(105)));
        assert_eq!(ticker.average, Some(dec!(105)));
        assert_eq!(ticker.last, Some(dec!(110)));
    }

    #[test]
    fn test_ticker_symbol_from_requested_market() {
        let config = ExchangeConfig::resolve(ConfigLayer::base(), describe(), None).unwrap();
        let codes = CurrencyCodes::default();
        let market = parse_market(&json!({"symbol": "BTC_USDT"}), &config, &codes).unwrap();
        let ticker = parse_ticker(
            &json!({"timestamp": 1, "open": "1", "close": "2"}),
            Some(&market),
            &ctx(&codes),
        )
        .unwrap();
        assert_eq!(ticker.symbol, "BTC/USDT");
        assert_eq!(ticker.vwap, None);
    }

    #[test]
    fn test_ticker_zero_and_huge_inputs_do_not_panic() {
        let codes = CurrencyCodes::default();
        let ticker = parse_ticker(
            &json!({"symbol": "BTC_USDT", "open": "0", "close": "79228162514264337593543950335",
                    "volume": "0", "amount": "5"}),
            None,
            &ctx(&codes),
        )
        .unwrap();
        assert_eq!(ticker.percentage, None);
        assert_eq!(ticker.vwap, None);
        assert_eq!(ticker.change, Some(Decimal::MAX));
    }

    #[test]
    fn test_tick_side_and_abs_amount() {
        let trade = parse_tick(&json!([1560000000000i64, 0, "9000.5", "-0.2"]), "BTC/USDT");
        assert_eq!(trade.side, Some(OrderSide::Sell));
        assert_eq!(trade.amount, Some(dec!(0.2)));
        assert_eq!(trade.cost, Some(dec!(1800.1)));
    }

    #[test]
    fn test_tick_cost_from_negative_price_is_absolute() {
        let trade = parse_tick(&json!([1, 1, "-2", "3"]), "BTC/USDT");
        assert_eq!(trade.side, Some(OrderSide::Buy));
        assert_eq!(trade.cost, Some(dec!(6)));
    }

    #[test]
    fn test_order_fill_math_and_status() {
        let codes = CurrencyCodes::default();
        let order = parse_order(
            &json!({"id": "77", "symbol": "BTC_USDT", "type": "BUY_LIMIT", "status": "PARTIAL_FILLED",
                    "price": "9000", "quantity": "1.5", "filledQuantity": "0.5", "filledAmount": "4500",
                    "createdAt": 1560000000000i64}),
            None,
            &ctx(&codes),
        )
        .unwrap();
        assert_eq!(order.status, Some(OrderStatus::Open));
        assert_eq!(order.side, Some(OrderSide::Buy));
        assert_eq!(order.remaining, Some(dec!(1.0)));
        assert_eq!(order.filled, Some(dec!(0.5)));
        assert_eq!(order.average, Some(dec!(9000)));
    }

    #[test]
    fn test_balance_total_kept_or_derived() {
        let codes = CurrencyCodes::default();
        let balances = parse_balance(
            &json!([
                {"currency": "BTC", "available": "1.0", "frozen": "0.5"},
                {"currency": "USDT", "available": "10", "frozen": "0", "total": "11"}
            ]),
            &ctx(&codes),
        );
        assert_eq!(balances.get("BTC").unwrap().total, Some(dec!(1.5)));
        assert_eq!(balances.get("USDT").unwrap().total, Some(dec!(11)));
    }

    #[test]
    fn test_candle() {
        let candle = parse_candle(&json!([1560000000000i64, "1", "2", "0.5", "1.5", "100"]));
        assert_eq!(candle.timestamp, Some(1560000000000));
        assert_eq!(candle.close, Some(dec!(1.5)));
    }
}
