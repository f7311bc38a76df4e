//! Building blocks shared by the per-exchange response normalizers.

use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Market, MarketIndex};
use crate::domain::trading::symbols::{CurrencyCodes, safe_symbol};
use crate::domain::trading::types::{BookLevel, Timestamped, filter_by_since_limit};
use crate::domain::values::{FromJson, safe_decimal};
use rust_decimal::Decimal;
use serde_json::Value;

/// What a normalizer needs to resolve native ids into canonical ones.
#[derive(Clone, Copy)]
pub struct ParseContext<'a> {
    pub exchange: &'a str,
    pub codes: &'a CurrencyCodes,
    pub index: Option<&'a MarketIndex>,
    /// Separator of base and quote in native market ids.
    pub delimiter: char,
}

impl<'a> ParseContext<'a> {
    pub fn symbol(
        &self,
        market_id: Option<&str>,
        market: Option<&Market>,
    ) -> ExchangeResult<Option<String>> {
        safe_symbol(
            self.exchange,
            market_id,
            market,
            self.index,
            self.codes,
            self.delimiter,
        )
    }

    /// Canonical code of a native currency id.
    pub fn currency_code(&self, id: &str) -> String {
        self.index
            .and_then(|index| index.currency_code_by_id(id))
            .map(str::to_string)
            .unwrap_or_else(|| self.codes.canonical(id))
    }

    pub fn market_by_id(&self, id: &str) -> Option<&'a Market> {
        self.index.and_then(|index| index.market_by_id(id))
    }
}

/// Book side given as objects, e.g. `[{"price": "1", "amount": "2"}]`.
/// Entries lacking either number are skipped; order is kept.
pub fn levels_from_objects(levels: &[Value], price_key: &str, amount_key: &str) -> Vec<BookLevel> {
    levels
        .iter()
        .filter_map(|level| {
            Some(BookLevel {
                price: safe_decimal(level, price_key)?,
                amount: safe_decimal(level, amount_key)?,
            })
        })
        .collect()
}

/// Book side given as `[[price, amount], ...]`.
pub fn levels_from_pairs(levels: &[Value]) -> Vec<BookLevel> {
    levels
        .iter()
        .filter_map(|level| {
            Some(BookLevel {
                price: level.get(0usize).and_then(Decimal::from_json)?,
                amount: level.get(1usize).and_then(Decimal::from_json)?,
            })
        })
        .collect()
}

/// Book side given as an object keyed by price, e.g. `{"0.02": "1.5"}`.
/// Key order of the source document is kept.
pub fn levels_from_map(side: &Value) -> Vec<BookLevel> {
    let Some(map) = side.as_object() else {
        return Vec::new();
    };
    map.iter()
        .filter_map(|(price, amount)| {
            Some(BookLevel {
                price: Decimal::from_json(&Value::String(price.clone()))?,
                amount: Decimal::from_json(amount)?,
            })
        })
        .collect()
}

/// Rejects empty addresses and ones containing whitespace.
pub fn check_address<'s>(exchange: &str, address: Option<&'s str>) -> ExchangeResult<&'s str> {
    match address {
        Some(addr) if !addr.is_empty() && !addr.chars().any(char::is_whitespace) => Ok(addr),
        other => Err(ExchangeError::InvalidAddress {
            exchange: exchange.to_string(),
            address: other.unwrap_or_default().to_string(),
        }),
    }
}

/// Reported cost, else `|price * amount|`. Overflow leaves it unknown.
pub fn trade_cost(
    cost: Option<Decimal>,
    price: Option<Decimal>,
    amount: Option<Decimal>,
) -> Option<Decimal> {
    cost.or_else(|| price?.checked_mul(amount?).map(|c| c.abs()))
}

/// Stable sort by timestamp, then the since/limit window.
pub fn sort_and_filter<T: Timestamped>(
    mut items: Vec<T>,
    since: Option<i64>,
    limit: Option<u32>,
) -> Vec<T> {
    items.sort_by_key(|item| item.timestamp());
    filter_by_since_limit(items, since, limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_object_levels_keep_source_order() {
        let bids = json!([
            {"book": "btc_mxn", "price": "100", "amount": "1"},
            {"book": "btc_mxn", "price": "101", "amount": "2"},
            {"book": "btc_mxn", "price": "99"}
        ]);
        let levels = levels_from_objects(bids.as_array().unwrap(), "price", "amount");
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].price, dec!(100));
        assert_eq!(levels[1].price, dec!(101));
    }

    #[test]
    fn test_map_levels() {
        let side = json!({"0.0202": "12.5", "0.0201": "3"});
        let levels = levels_from_map(&side);
        assert_eq!(levels[0], BookLevel { price: dec!(0.0202), amount: dec!(12.5) });
        assert_eq!(levels[1].price, dec!(0.0201));
    }

    #[test]
    fn test_pair_levels() {
        let side = json!([["1.5", 2], [1.4, "3"]]);
        let levels = levels_from_pairs(side.as_array().unwrap());
        assert_eq!(levels[1], BookLevel { price: dec!(1.4), amount: dec!(3) });
    }

    #[test]
    fn test_check_address() {
        assert_eq!(check_address("bitso", Some("abc123")).unwrap(), "abc123");
        assert!(check_address("bitso", Some("abc 123")).is_err());
        assert!(check_address("bitso", Some("")).is_err());
        assert!(check_address("bitso", None).is_err());
    }

    #[test]
    fn test_trade_cost_fallback() {
        assert_eq!(trade_cost(Some(dec!(5)), Some(dec!(2)), Some(dec!(3))), Some(dec!(5)));
        assert_eq!(trade_cost(None, Some(dec!(2)), Some(dec!(3))), Some(dec!(6)));
        assert_eq!(trade_cost(None, None, Some(dec!(3))), None);
    }

    #[test]
    fn test_trade_cost_is_never_negative() {
        assert_eq!(trade_cost(None, Some(dec!(-2)), Some(dec!(3))), Some(dec!(6)));
        assert_eq!(trade_cost(None, Some(dec!(2)), Some(dec!(-3))), Some(dec!(6)));
    }

    #[test]
    fn test_trade_cost_overflow_is_unknown() {
        assert_eq!(trade_cost(None, Some(Decimal::MAX), Some(dec!(2))), None);
    }
}
