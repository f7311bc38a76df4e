use super::precision::{Rounding, decimal_to_precision};
use super::types::{Currency, Market};
use crate::domain::errors::{ExchangeError, ExchangeResult};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Read-only market and currency lookup tables of one exchange.
#[derive(Debug, Clone, Default)]
pub struct MarketIndex {
    exchange: String,
    markets: Vec<Market>,
    by_symbol: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    currencies: HashMap<String, Currency>,
    currency_codes_by_id: HashMap<String, String>,
}

impl MarketIndex {
    /// Indexes `markets`. Currencies come from `currencies` when the exchange
    /// lists them, otherwise they are derived from the market legs.
    pub fn new(exchange: &str, markets: Vec<Market>, currencies: Option<Vec<Currency>>) -> Self {
        let mut by_symbol = HashMap::with_capacity(markets.len());
        let mut by_id = HashMap::with_capacity(markets.len());
        for (i, market) in markets.iter().enumerate() {
            by_symbol.insert(market.symbol.clone(), i);
            by_id.insert(market.id.clone(), i);
        }

        let mut currency_map: HashMap<String, Currency> = HashMap::new();
        match currencies {
            Some(list) => {
                for currency in list {
                    currency_map.insert(currency.code.clone(), currency);
                }
            }
            None => {
                for market in &markets {
                    currency_map
                        .entry(market.base.clone())
                        .or_insert_with(|| Currency::from_code(&market.base_id, &market.base));
                    currency_map
                        .entry(market.quote.clone())
                        .or_insert_with(|| Currency::from_code(&market.quote_id, &market.quote));
                }
            }
        }
        let currency_codes_by_id = currency_map
            .values()
            .map(|c| (c.id.clone(), c.code.clone()))
            .collect();

        Self {
            exchange: exchange.to_string(),
            markets,
            by_symbol,
            by_id,
            currencies: currency_map,
            currency_codes_by_id,
        }
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.markets.iter().map(|m| m.symbol.as_str())
    }

    pub fn market(&self, symbol: &str) -> ExchangeResult<&Market> {
        self.by_symbol
            .get(symbol)
            .map(|&i| &self.markets[i])
            .ok_or_else(|| ExchangeError::BadSymbol {
                exchange: self.exchange.clone(),
                symbol: symbol.to_string(),
            })
    }

    pub fn market_id(&self, symbol: &str) -> ExchangeResult<&str> {
        self.market(symbol).map(|m| m.id.as_str())
    }

    pub fn market_by_id(&self, id: &str) -> Option<&Market> {
        self.by_id.get(id).map(|&i| &self.markets[i])
    }

    pub fn currency(&self, code: &str) -> ExchangeResult<&Currency> {
        self.currencies
            .get(code)
            .ok_or_else(|| ExchangeError::BadRequest {
                exchange: self.exchange.clone(),
                reason: format!("unknown currency {}", code),
            })
    }

    pub fn currencies(&self) -> impl Iterator<Item = &Currency> {
        self.currencies.values()
    }

    /// Canonical code of an exchange-native currency id, if known.
    pub fn currency_code_by_id(&self, id: &str) -> Option<&str> {
        self.currency_codes_by_id.get(id).map(String::as_str)
    }

    pub fn amount_to_precision(&self, symbol: &str, amount: Decimal) -> ExchangeResult<String> {
        let market = self.market(symbol)?;
        decimal_to_precision(
            amount,
            market.precision.amount,
            market.precision.mode,
            Rounding::Truncate,
        )
        .ok_or_else(|| self.out_of_range("amount", amount))
    }

    pub fn price_to_precision(&self, symbol: &str, price: Decimal) -> ExchangeResult<String> {
        let market = self.market(symbol)?;
        decimal_to_precision(
            price,
            market.precision.price,
            market.precision.mode,
            Rounding::Round,
        )
        .ok_or_else(|| self.out_of_range("price", price))
    }

    fn out_of_range(&self, field: &str, value: Decimal) -> ExchangeError {
        ExchangeError::BadRequest {
            exchange: self.exchange.clone(),
            reason: format!("{} {} is out of range", field, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::{FeeSchedule, Limits, Precision, PrecisionMode};
    use rust_decimal_macros::dec;
    use serde_json::Value;

    fn market(id: &str, base: &str, quote: &str) -> Market {
        Market {
            id: id.to_string(),
            numeric_id: None,
            symbol: format!("{}/{}", base, quote),
            base: base.to_string(),
            quote: quote.to_string(),
            base_id: base.to_lowercase(),
            quote_id: quote.to_lowercase(),
            precision: Precision {
                mode: PrecisionMode::TickSize,
                amount: Some(dec!(0.00000001)),
                price: Some(dec!(0.01)),
            },
            limits: Limits::default(),
            fees: FeeSchedule::default(),
            active: None,
            info: Value::Null,
        }
    }

    #[test]
    fn test_lookup_by_symbol_and_id() {
        let index = MarketIndex::new("bitso", vec![market("btc_mxn", "BTC", "MXN")], None);
        assert_eq!(index.market_id("BTC/MXN").unwrap(), "btc_mxn");
        assert_eq!(index.market_by_id("btc_mxn").unwrap().symbol, "BTC/MXN");
        assert!(matches!(
            index.market("ETH/MXN"),
            Err(ExchangeError::BadSymbol { .. })
        ));
    }

    #[test]
    fn test_currencies_derived_from_markets() {
        let index = MarketIndex::new(
            "bitso",
            vec![market("btc_mxn", "BTC", "MXN"), market("eth_mxn", "ETH", "MXN")],
            None,
        );
        assert_eq!(index.currencies().count(), 3);
        assert_eq!(index.currency("MXN").unwrap().id, "mxn");
        assert_eq!(index.currency_code_by_id("eth"), Some("ETH"));
    }

    #[test]
    fn test_precision_helpers() {
        let index = MarketIndex::new("bitso", vec![market("btc_mxn", "BTC", "MXN")], None);
        assert_eq!(index.amount_to_precision("BTC/MXN", dec!(0.123456789)).unwrap(), "0.12345678");
        assert_eq!(index.price_to_precision("BTC/MXN", dec!(100000.456)).unwrap(), "100000.46");
    }

    #[test]
    fn test_precision_overflow_is_bad_request() {
        let index = MarketIndex::new("bitso", vec![market("btc_mxn", "BTC", "MXN")], None);
        assert!(matches!(
            index.amount_to_precision("BTC/MXN", Decimal::MAX),
            Err(ExchangeError::BadRequest { .. })
        ));
    }
}
