//! Bitso payloads into canonical entities.

use super::common::{MARKET_ID_DELIMITER, status_table};
use crate::config::ExchangeConfig;
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{
    FeeSchedule, FeeTier, FeeTiers, Limits, Market, MinMax, Precision, PrecisionMode,
};
use crate::domain::trading::symbols::{CurrencyCodes, split_market_id};
use crate::domain::trading::types::{
    BalanceEntry, Balances, DepositAddress, Fee, Order, OrderBook, OrderSide, OrderStatus,
    OrderType, Ticker, Trade,
};
use crate::domain::values::{
    parse8601, safe_array, safe_decimal, safe_decimal_2, safe_string, safe_string_2, safe_value,
};
use crate::infrastructure::core::normalize::{
    ParseContext, check_address, levels_from_objects, trade_cost,
};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;

/// One entry of `available_books`.
pub fn parse_market(
    entry: &Value,
    config: &ExchangeConfig,
    codes: &CurrencyCodes,
) -> ExchangeResult<Market> {
    let id = safe_string(entry, "book")
        .ok_or_else(|| ExchangeError::bad_response(&config.id, "market entry without book"))?;
    let (base_id, quote_id) = split_market_id(&config.id, &id, MARKET_ID_DELIMITER)?;
    let base = codes.canonical(base_id);
    let quote = codes.canonical(quote_id);

    let limits = Limits {
        amount: MinMax::new(
            safe_decimal(entry, "minimum_amount"),
            safe_decimal(entry, "maximum_amount"),
        ),
        price: MinMax::new(
            safe_decimal(entry, "minimum_price"),
            safe_decimal(entry, "maximum_price"),
        ),
        cost: MinMax::new(
            safe_decimal(entry, "minimum_value"),
            safe_decimal(entry, "maximum_value"),
        ),
    };
    let precision = Precision {
        mode: PrecisionMode::TickSize,
        amount: config.precision_for(&base),
        price: safe_decimal(entry, "tick_size").or_else(|| config.precision_for(&quote)),
    };

    Ok(Market {
        symbol: format!("{}/{}", base, quote),
        base_id: base_id.to_string(),
        quote_id: quote_id.to_string(),
        id,
        numeric_id: None,
        base,
        quote,
        precision,
        limits,
        fees: parse_fees(entry.get("fees").unwrap_or(&Value::Null), config),
        active: None,
        info: entry.clone(),
    })
}

/// `fees.structure` is the tier list; `fees.flat_rate` is quoted in percent.
fn parse_fees(fees: &Value, config: &ExchangeConfig) -> FeeSchedule {
    let hundred = Decimal::ONE_HUNDRED;
    let flat = fees.get("flat_rate").unwrap_or(&Value::Null);
    let flat_maker = safe_decimal(flat, "maker").map(|rate| rate / hundred);
    let flat_taker = safe_decimal(flat, "taker").map(|rate| rate / hundred);

    let mut tiers = FeeTiers::default();
    for tier in safe_array(fees, "structure") {
        let Some(volume) = safe_decimal(tier, "volume") else {
            continue;
        };
        if let Some(rate) = safe_decimal(tier, "maker") {
            tiers.maker.push(FeeTier { volume, rate });
        }
        if let Some(rate) = safe_decimal(tier, "taker") {
            tiers.taker.push(FeeTier { volume, rate });
        }
    }

    FeeSchedule::tiered(
        tiers,
        flat_maker.or(config.fees.maker),
        flat_taker.or(config.fees.taker),
        config.fees.percentage,
    )
}

pub fn parse_balance(response: &Value, ctx: &ParseContext<'_>) -> Balances {
    let payload = response.get("payload").unwrap_or(&Value::Null);
    let mut currencies = BTreeMap::new();
    for balance in safe_array(payload, "balances") {
        let Some(currency_id) = safe_string(balance, "currency") else {
            continue;
        };
        currencies.insert(
            ctx.currency_code(&currency_id),
            BalanceEntry {
                free: safe_decimal(balance, "available"),
                used: safe_decimal(balance, "locked"),
                total: safe_decimal(balance, "total"),
            },
        );
    }
    Balances {
        currencies,
        info: response.clone(),
    }
}

pub fn parse_order_book(payload: &Value, symbol: &str) -> OrderBook {
    OrderBook {
        symbol: symbol.to_string(),
        timestamp: parse8601(safe_string(payload, "updated_at").as_deref()),
        nonce: None,
        bids: levels_from_objects(safe_array(payload, "bids"), "price", "amount"),
        asks: levels_from_objects(safe_array(payload, "asks"), "price", "amount"),
    }
}

pub fn parse_ticker(payload: &Value, symbol: &str) -> Ticker {
    let vwap = safe_decimal(payload, "vwap");
    let base_volume = safe_decimal(payload, "volume");
    let last = safe_decimal(payload, "last");
    Ticker {
        symbol: symbol.to_string(),
        timestamp: parse8601(safe_string(payload, "created_at").as_deref()),
        high: safe_decimal(payload, "high"),
        low: safe_decimal(payload, "low"),
        bid: safe_decimal(payload, "bid"),
        ask: safe_decimal(payload, "ask"),
        vwap,
        open: None,
        close: last,
        last,
        change: None,
        percentage: None,
        average: None,
        base_volume,
        quote_volume: Ticker::derive_quote_volume(base_volume, vwap),
        info: payload.clone(),
    }
}

/// Public and private trades share one shape. Signed amounts are made absolute.
pub fn parse_trade(
    trade: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Trade> {
    let market_id = safe_string(trade, "book");
    let symbol = ctx.symbol(market_id.as_deref(), market)?;
    let price = safe_decimal(trade, "price");
    let amount = safe_decimal_2(trade, "amount", "major").map(|a| a.abs());
    let cost = safe_decimal(trade, "minor").map(|c| c.abs());

    let fee = safe_decimal(trade, "fees_amount").map(|cost| Fee {
        cost,
        currency: safe_string(trade, "fees_currency").map(|id| ctx.currency_code(&id)),
    });

    Ok(Trade {
        id: safe_string(trade, "tid"),
        order_id: safe_string(trade, "oid"),
        timestamp: parse8601(safe_string(trade, "created_at").as_deref()),
        symbol,
        order_type: None,
        side: safe_string_2(trade, "side", "maker_side")
            .as_deref()
            .and_then(OrderSide::from_wire),
        taker_or_maker: None,
        price,
        amount,
        cost: trade_cost(cost, price, amount),
        fee,
        info: trade.clone(),
    })
}

pub fn parse_order(
    order: &Value,
    market: Option<&Market>,
    ctx: &ParseContext<'_>,
) -> ExchangeResult<Order> {
    let market_id = safe_string(order, "book");
    let amount = safe_decimal(order, "original_amount");
    let remaining = safe_decimal(order, "unfilled_amount");
    let table = status_table();

    let mut parsed = Order::from_info(order.clone());
    parsed.id = safe_string(order, "oid");
    parsed.client_order_id = safe_string(order, "client_id");
    parsed.timestamp = parse8601(safe_string(order, "created_at").as_deref());
    parsed.symbol = ctx.symbol(market_id.as_deref(), market)?;
    parsed.order_type = safe_string(order, "type")
        .as_deref()
        .and_then(OrderType::from_wire);
    parsed.side = safe_string(order, "side")
        .as_deref()
        .and_then(OrderSide::from_wire);
    parsed.status = safe_string(order, "status").map(|raw| OrderStatus::from_wire(&raw, &table));
    parsed.price = safe_decimal(order, "price");
    parsed.amount = amount;
    parsed.remaining = remaining;
    parsed.filled = Order::derive_filled(amount, remaining);
    Ok(parsed)
}

/// `account_identifier` may carry a destination tag as `<address>?dt=<tag>`.
pub fn parse_deposit_address(
    code: &str,
    response: &Value,
    exchange: &str,
) -> ExchangeResult<DepositAddress> {
    let payload = safe_value(response, "payload").unwrap_or(&Value::Null);
    let identifier = safe_string(payload, "account_identifier");
    let (address, tag) = match identifier.as_deref().map(|id| id.split_once("?dt=")) {
        Some(Some((address, tag))) => (Some(address.to_string()), Some(tag.to_string())),
        _ => (identifier.clone(), None),
    };
    let address = check_address(exchange, address.as_deref())?.to_string();

    Ok(DepositAddress {
        currency: code.to_string(),
        address,
        tag,
        info: response.clone(),
    })
}
