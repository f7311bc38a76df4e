//! Layered exchange configuration.
//!
//! An adapter's description is one [`ConfigLayer`]. It is merged over the
//! library defaults and, optionally, under a user layer read from TOML, then
//! validated into one immutable [`ExchangeConfig`] per adapter instance.

use crate::domain::market::PrecisionMode;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeeLayer {
    pub maker: Option<Decimal>,
    pub taker: Option<Decimal>,
    pub percentage: Option<bool>,
    pub tier_based: Option<bool>,
}

impl FeeLayer {
    fn merge(self, over: FeeLayer) -> FeeLayer {
        FeeLayer {
            maker: over.maker.or(self.maker),
            taker: over.taker.or(self.taker),
            percentage: over.percentage.or(self.percentage),
            tier_based: over.tier_based.or(self.tier_based),
        }
    }
}

/// One partial configuration. Unset fields defer to earlier layers.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub api_url: Option<String>,
    pub rate_limit_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub precision_mode: Option<PrecisionMode>,
    pub default_precision: Option<Decimal>,
    pub currency_precision: BTreeMap<String, Decimal>,
    pub common_currencies: BTreeMap<String, String>,
    pub fees: FeeLayer,
    pub options: Map<String, Value>,
}

impl ConfigLayer {
    /// Library-wide defaults every exchange starts from.
    pub fn base() -> Self {
        Self {
            rate_limit_ms: Some(2000),
            timeout_ms: Some(10_000),
            precision_mode: Some(PrecisionMode::TickSize),
            fees: FeeLayer {
                percentage: Some(true),
                tier_based: Some(false),
                ..FeeLayer::default()
            },
            ..Self::default()
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse exchange config overrides")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Fields set in `over` win; maps are merged key by key.
    pub fn merge(self, over: ConfigLayer) -> ConfigLayer {
        let mut currency_precision = self.currency_precision;
        currency_precision.extend(over.currency_precision);
        let mut common_currencies = self.common_currencies;
        common_currencies.extend(over.common_currencies);
        let mut options = self.options;
        for (key, value) in over.options {
            options.insert(key, value);
        }

        ConfigLayer {
            id: over.id.or(self.id),
            name: over.name.or(self.name),
            version: over.version.or(self.version),
            api_url: over.api_url.or(self.api_url),
            rate_limit_ms: over.rate_limit_ms.or(self.rate_limit_ms),
            timeout_ms: over.timeout_ms.or(self.timeout_ms),
            precision_mode: over.precision_mode.or(self.precision_mode),
            default_precision: over.default_precision.or(self.default_precision),
            currency_precision,
            common_currencies,
            fees: self.fees.merge(over.fees),
            options,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingFees {
    pub maker: Option<Decimal>,
    pub taker: Option<Decimal>,
    pub percentage: bool,
    pub tier_based: bool,
}

/// Resolved, validated configuration of one adapter instance.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub id: String,
    pub name: String,
    pub version: Option<String>,
    pub api_url: Url,
    pub rate_limit_ms: u64,
    pub timeout_ms: u64,
    pub precision_mode: PrecisionMode,
    pub default_precision: Option<Decimal>,
    pub currency_precision: BTreeMap<String, Decimal>,
    pub common_currencies: BTreeMap<String, String>,
    pub fees: TradingFees,
    pub options: Map<String, Value>,
}

impl ExchangeConfig {
    /// Merges `base`, the exchange description and an optional user layer, in
    /// that order of increasing precedence.
    pub fn resolve(
        base: ConfigLayer,
        exchange: ConfigLayer,
        user: Option<ConfigLayer>,
    ) -> Result<Self> {
        let mut merged = base.merge(exchange);
        if let Some(user) = user {
            merged = merged.merge(user);
        }

        let id = merged.id.context("Exchange config is missing an id")?;
        let raw_url = merged
            .api_url
            .with_context(|| format!("Exchange config for {} is missing api_url", id))?;
        let api_url = Url::parse(&raw_url)
            .with_context(|| format!("Invalid api_url for {}: {}", id, raw_url))?;

        Ok(Self {
            name: merged.name.unwrap_or_else(|| id.clone()),
            id,
            version: merged.version,
            api_url,
            rate_limit_ms: merged.rate_limit_ms.unwrap_or(2000),
            timeout_ms: merged.timeout_ms.unwrap_or(10_000),
            precision_mode: merged.precision_mode.unwrap_or_default(),
            default_precision: merged.default_precision,
            currency_precision: merged.currency_precision,
            common_currencies: merged.common_currencies,
            fees: TradingFees {
                maker: merged.fees.maker,
                taker: merged.fees.taker,
                percentage: merged.fees.percentage.unwrap_or(true),
                tier_based: merged.fees.tier_based.unwrap_or(false),
            },
            options: merged.options,
        })
    }

    /// Precision override of a currency, else the default increment.
    pub fn precision_for(&self, code: &str) -> Option<Decimal> {
        self.currency_precision
            .get(code)
            .copied()
            .or(self.default_precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn exchange_layer() -> ConfigLayer {
        ConfigLayer {
            id: Some("bitso".to_string()),
            name: Some("Bitso".to_string()),
            api_url: Some("https://api.bitso.com".to_string()),
            default_precision: Some(dec!(0.00000001)),
            currency_precision: BTreeMap::from([("MXN".to_string(), dec!(0.01))]),
            fees: FeeLayer {
                maker: Some(dec!(0.005)),
                taker: Some(dec!(0.005)),
                tier_based: Some(true),
                ..FeeLayer::default()
            },
            ..ConfigLayer::default()
        }
    }

    #[test]
    fn test_exchange_layer_overrides_base() {
        let config = ExchangeConfig::resolve(ConfigLayer::base(), exchange_layer(), None).unwrap();
        assert_eq!(config.id, "bitso");
        assert_eq!(config.rate_limit_ms, 2000);
        assert!(config.fees.percentage);
        assert!(config.fees.tier_based);
        assert_eq!(config.precision_for("MXN"), Some(dec!(0.01)));
        assert_eq!(config.precision_for("BTC"), Some(dec!(0.00000001)));
    }

    #[test]
    fn test_user_toml_layer_wins_and_maps_merge() {
        let user = ConfigLayer::from_toml_str(
            r#"
            api_url = "https://sandbox.bitso.com"
            rate_limit_ms = 500

            [currency_precision]
            XRP = "0.000001"

            [options]
            region = "mx"
            "#,
        )
        .unwrap();
        let config =
            ExchangeConfig::resolve(ConfigLayer::base(), exchange_layer(), Some(user)).unwrap();
        assert_eq!(config.api_url.as_str(), "https://sandbox.bitso.com/");
        assert_eq!(config.rate_limit_ms, 500);
        assert_eq!(config.precision_for("XRP"), Some(dec!(0.000001)));
        assert_eq!(config.precision_for("MXN"), Some(dec!(0.01)));
        assert_eq!(config.options.get("region").and_then(Value::as_str), Some("mx"));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let layer = ConfigLayer {
            id: Some("nowhere".to_string()),
            ..ConfigLayer::default()
        };
        assert!(ExchangeConfig::resolve(ConfigLayer::base(), layer, None).is_err());
    }
}
