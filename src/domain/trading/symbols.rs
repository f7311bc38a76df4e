use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Market, MarketIndex};
use std::collections::HashMap;

/// Aliases every exchange inherits unless its configuration overrides them.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("XBT", "BTC"),
    ("BCC", "BCH"),
    ("DRK", "DASH"),
    ("BCHSV", "BSV"),
];

/// Maps exchange-native currency codes onto canonical ones.
#[derive(Debug, Clone)]
pub struct CurrencyCodes {
    aliases: HashMap<String, String>,
}

impl Default for CurrencyCodes {
    fn default() -> Self {
        Self::new(std::iter::empty::<(String, String)>())
    }
}

impl CurrencyCodes {
    /// `overrides` are applied on top of the default aliases.
    pub fn new<I, K, V>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut aliases: HashMap<String, String> = DEFAULT_ALIASES
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        for (from, to) in overrides {
            aliases.insert(from.into().to_uppercase(), to.into());
        }
        Self { aliases }
    }

    /// Upper-cases `raw` and resolves any alias.
    pub fn canonical(&self, raw: &str) -> String {
        let upper = raw.to_uppercase();
        match self.aliases.get(&upper) {
            Some(code) => code.clone(),
            None => upper,
        }
    }

    /// `BASE/QUOTE` from two native legs.
    pub fn symbol(&self, base_id: &str, quote_id: &str) -> String {
        format!("{}/{}", self.canonical(base_id), self.canonical(quote_id))
    }
}

/// Splits a native market id into its base and quote legs.
///
/// Anything but exactly one delimiter between two non-empty legs is a shape
/// error, never a partial parse.
pub fn split_market_id<'a>(
    exchange: &str,
    id: &'a str,
    delimiter: char,
) -> ExchangeResult<(&'a str, &'a str)> {
    match id.split_once(delimiter) {
        Some((base, quote))
            if !base.is_empty() && !quote.is_empty() && !quote.contains(delimiter) =>
        {
            Ok((base, quote))
        }
        _ => Err(ExchangeError::bad_response(
            exchange,
            format!("market id {:?} is not two legs split by {:?}", id, delimiter),
        )),
    }
}

/// Resolves the canonical symbol of a native market id: known markets first,
/// then the market the caller already has in hand, then by splitting the id.
pub fn safe_symbol(
    exchange: &str,
    market_id: Option<&str>,
    market: Option<&Market>,
    index: Option<&MarketIndex>,
    codes: &CurrencyCodes,
    delimiter: char,
) -> ExchangeResult<Option<String>> {
    let Some(id) = market_id else {
        return Ok(market.map(|m| m.symbol.clone()));
    };
    if let Some(found) = index.and_then(|i| i.market_by_id(id)) {
        return Ok(Some(found.symbol.clone()));
    }
    if let Some(market) = market
        && market.id == id
    {
        return Ok(Some(market.symbol.clone()));
    }
    let (base, quote) = split_market_id(exchange, id, delimiter)?;
    Ok(Some(codes.symbol(base, quote)))
}
