//! qTrade payloads into canonical entities.
//!
//! A qTrade market lists `market_currency` (what is traded) and
//! `base_currency` (what it is priced in); they map to our base and quote.
//! Trade and ticker timestamps are microseconds.

use super::common::{MARKET_ID_DELIMITER, side_of_order_type};
use crate::config::ExchangeConfig;
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Currency, FeeSchedule, Limits, Market, MinMax, Precision, PrecisionMode};
use crate::domain::trading::symbols::{CurrencyCodes, split_market_id};
use crate::domain::trading::types::{
    BalanceEntry, Balances, Candle, DepositAddress, Order, OrderBook, OrderSide, OrderStatus, OrderType, Ticker,
    Trade, Transaction, TransactionKind,
};
use crate::domain::values::{
    get, parse8601, safe_array, safe_bool, safe_decimal, safe_decimal_2, safe_integer,
    safe_integer_product, safe_string, safe_value,
};
use crate::infrastructure::core::normalize::{
    ParseContext, check_address, levels_from_map, trade_cost,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

fn micros_to_millis() -> Decimal {
    Decimal::new(1, 3)
}

/// Splits `address:tag`.
pub fn split_address(raw: Option<String>) -> (Option<String>, Option<String>) {
    match raw {
        Some(raw) => match raw.split_once(':') {
            Some((address, tag)) => (Some(address.to_string()), Some(tag.to_string())),
            None => (Some(raw), None),
        },
        None => (None, None),
    }
}

pub fn parse_market(
    entry: &Value,
    config: &ExchangeConfig,
    codes: &CurrencyCodes,
) -> ExchangeResult<Market> {
    let id = safe_string(entry, "market_string")
        .ok_or_else(|| ExchangeError::bad_response(&config.id, "market entry without market_string"))?;
    let (fallback_base, fallback_quote) = split_market_id(&config.id, &id, MARKET_ID_DELIMITER)?;
    let base_id = safe_string(entry, "market_currency").unwrap_or_else(|| fallback_base.to_string());
    let quote_id = safe_string(entry, "base_currency").unwrap_or_else(|| fallback_quote.to_string());
    let base = codes.canonical(&base_id);
    let quote = codes.canonical(&quote_id);

    let can_view = safe_bool(entry, "can_view").unwrap_or(false);
    let can_trade = safe_bool(entry, "can_trade").unwrap_or(false);
    let maker = safe_decimal(entry, "maker_fee").or(config.fees.maker);
    let taker = safe_decimal(entry, "taker_fee").or(config.fees.taker);

    Ok(Market {
        symbol: format!("{}/{}", base, quote),
        id,
        numeric_id: safe_integer(entry, "id"),
        base,
        quote,
        base_id,
        quote_id,
        precision: Precision {
            mode: PrecisionMode::DecimalPlaces,
            amount: safe_integer(entry, "market_precision").map(Decimal::from),
            price: safe_integer(entry, "base_precision").map(Decimal::from),
        },
        limits: Limits {
            amount: MinMax::new(safe_decimal(entry, "minimum_buy_value"), None),
            ..Limits::default()
        },
        fees: FeeSchedule::flat(maker, taker, config.fees.percentage),
        active: Some(can_view && can_trade),
        info: entry.clone(),
    })
}

pub fn parse_currency(entry: &Value, codes: &CurrencyCodes) -> Option<Currency> {
    let id = safe_string(entry, "code")?;
    let config = entry.get("config").unwrap_or(&Value::Null);
    let can_withdraw = safe_bool(entry, "can_withdraw").unwrap_or(false);
    let status_ok = safe_string(entry, "status").as_deref() == Some("ok");
    Some(Currency {
        code: codes.canonical(&id),
        name: safe_string(entry, "long_name"),
        precision: safe_integer(entry, "precision").map(Decimal::from),
        active: Some(can_withdraw && status_ok),
        fee: safe_decimal(config, "withdraw_fee"),
        limits: MinMax::new(safe_decimal(entry, "minimum_order"), None),
        info: entry.clone(),
        id,
    })
}

/// `balances` holds free funds, `order_balances` the funds locked in orders.
/// A currency absent from `order_balances` has nothing locked.
pub fn parse_balance(response: &Value, ctx: &ParseContext<'_>) -> Balances {
    let data = response.get("data").unwrap_or(&Value::Null);
    let mut currencies: BTreeMap<String, BalanceEntry> = BTreeMap::new();
    for balance in safe_array(data, "balances") {
        if let Some(id) = safe_string(balance, "currency") {
            currencies.entry(ctx.currency_code(&id)).or_default().free =
                safe_decimal(balance, "balance");
        }
    }
    for balance in safe_array(data, "order_balances") {
        if let Some(id) = safe_string(balance, "currency") {
            currencies.entry(ctx.currency_code(&id)).or_default().used =
                safe_decimal(balance, "balance");
        }
    }
    for entry in currencies.values_mut() {
        let used = entry.used.unwrap_or(Decimal::ZERO);
        entry.used = Some(used);
        entry.total = entry.free.and_then(|free| free.checked_add(used));
    }
    Balances {
        currencies,
        info: response.clone(),
    }
}

/// Sides are objects keyed by price; `last_change` is in microseconds.
pub fn parse_order_book(data: &Value, symbol: &str) -> OrderBook {
    OrderBook {
        symbol: symbol.to_string(),
        timestamp: safe_integer_product(data, "last_change", micros_to_millis()),
        nonce: None,
        bids: levels_from_map(data.get("buy").unwrap_or(&Value::Null)),
        asks: levels_from_map(data.get("sell").unwrap_or(&Value::Null)),
    }
}

/// `day_change` is a ratio; percentage and absolute change derive from it.
pub fn parse_ticker(
    entry: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Ticker> {
    let symbol = ctx
        .symbol(safe_string(entry, "id_hr").as_deref(), market)?
        .unwrap_or_default();
    let open = safe_decimal(entry, "day_open");
    let last = safe_decimal(entry, "last");
    let day_change = safe_decimal(entry, "day_change");
    let percentage = day_change.and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED));
    let change = day_change.zip(open).and_then(|(ratio, open)| ratio.checked_mul(open));
    let average = safe_decimal(entry, "day_avg_price").or_else(|| {
        last?
            .checked_add(open?)
            .and_then(|sum| sum.checked_div(Decimal::TWO))
    });
    let base_volume = safe_decimal(entry, "day_volume_market");
    let quote_volume = safe_decimal(entry, "day_volume_base");
    let vwap = match (base_volume, quote_volume) {
        (Some(base), Some(quote)) if base > Decimal::ZERO => quote.checked_div(base),
        _ => None,
    };

    Ok(Ticker {
        symbol,
        timestamp: safe_integer_product(entry, "last_change", micros_to_millis()),
        high: safe_decimal(entry, "day_high"),
        low: safe_decimal(entry, "day_low"),
        bid: safe_decimal(entry, "bid"),
        ask: safe_decimal(entry, "ask"),
        vwap,
        open,
        close: last,
        last,
        change,
        percentage,
        average,
        base_volume,
        quote_volume,
        info: entry.clone(),
    })
}

/// `base_volume` is the cost in the quote currency. Order fills carry
/// `market_amount` instead of `amount`.
pub fn parse_trade(
    trade: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Trade> {
    let price = safe_decimal(trade, "price");
    let amount = safe_decimal_2(trade, "market_amount", "amount").map(|a| a.abs());
    let market_id = safe_string(trade, "market_string").or_else(|| safe_string(trade, "symbol"));
    let timestamp = safe_integer_product(trade, "created_at_ts", micros_to_millis())
        .or_else(|| parse8601(safe_string(trade, "created_at").as_deref()));

    Ok(Trade {
        id: safe_string(trade, "id"),
        order_id: safe_string(trade, "order_id"),
        timestamp,
        symbol: ctx.symbol(market_id.as_deref(), market)?,
        order_type: None,
        side: safe_string(trade, "side").as_deref().and_then(OrderSide::from_wire),
        taker_or_maker: None,
        price,
        amount,
        cost: trade_cost(safe_decimal(trade, "base_volume").map(|c| c.abs()), price, amount),
        fee: None,
        info: trade.clone(),
    })
}

/// qTrade only reports `open`; every order that is not open is closed.
pub fn parse_order(
    order: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Order> {
    let side = safe_string(order, "order_type")
        .as_deref()
        .and_then(side_of_order_type);
    let price = safe_decimal(order, "price");
    let amount = safe_decimal(order, "market_amount");
    let remaining = safe_decimal(order, "market_amount_remaining");
    let filled = Order::derive_filled(amount, remaining);

    let trades = match safe_value(order, "trades").and_then(Value::as_array) {
        Some(raw) => {
            let mut trades = raw
                .iter()
                .map(|fill| parse_trade(fill, market, ctx))
                .collect::<ExchangeResult<Vec<_>>>()?;
            for trade in &mut trades {
                trade.side = trade.side.or(side);
                trade.order_id = trade.order_id.take().or_else(|| safe_string(order, "id"));
            }
            Some(trades)
        }
        None => None,
    };

    let mut result = Order::from_info(order.clone());
    result.id = safe_string(order, "id");
    result.timestamp = parse8601(safe_string(order, "created_at").as_deref());
    result.last_trade_timestamp = trades
        .as_ref()
        .and_then(|trades| trades.first())
        .and_then(|trade| trade.timestamp);
    result.symbol = ctx.symbol(safe_string(order, "market_string").as_deref(), market)?;
    result.order_type = Some(OrderType::Limit).filter(|_| side.is_some());
    result.side = side;
    result.status = Some(if get::<bool, _>(order, "open").unwrap_or(false) {
        OrderStatus::Open
    } else {
        OrderStatus::Closed
    });
    result.price = price;
    result.amount = amount;
    result.remaining = remaining;
    result.filled = filled;
    result.cost = filled.zip(price).and_then(|(filled, price)| filled.checked_mul(price));
    result.trades = trades;
    Ok(result)
}

/// Candle slices are objects with an ISO-8601 `time`.
pub fn parse_candle(slice: &Value) -> Candle {
    Candle {
        timestamp: parse8601(safe_string(slice, "time").as_deref()),
        open: safe_decimal(slice, "open"),
        high: safe_decimal(slice, "high"),
        low: safe_decimal(slice, "low"),
        close: safe_decimal(slice, "close"),
        volume: safe_decimal(slice, "volume"),
    }
}

pub fn parse_deposit_address(
    code: &str,
    response: &Value,
    exchange: &str,
) -> ExchangeResult<DepositAddress> {
    let data = response.get("data").unwrap_or(&Value::Null);
    let (address, tag) = split_address(safe_string(data, "address"));
    let address = check_address(exchange, address.as_deref())?.to_string();
    Ok(DepositAddress {
        currency: code.to_string(),
        address,
        tag,
        info: response.clone(),
    })
}

/// Deposit and withdrawal rows share one shape; addresses may embed a tag.
pub fn parse_transaction(
    entry: &Value,
    kind: TransactionKind,
    ctx: &ParseContext<'_>,
) -> Transaction {
    let (address, tag) = split_address(safe_string(entry, "address"));
    Transaction {
        id: safe_string(entry, "id"),
        txid: entry
            .get("network_data")
            .and_then(|network| safe_string(network, "txid")),
        timestamp: parse8601(safe_string(entry, "created_at").as_deref()),
        kind,
        currency: safe_string(entry, "currency").map(|id| ctx.currency_code(&id)),
        amount: safe_decimal(entry, "amount"),
        address,
        tag,
        status: safe_string(entry, "status"),
        info: entry.clone(),
    }
}
