use super::common::{
    self, ACCOUNTS, BARS, CANCEL_ORDER, CAPABILITIES, CLEARINGS, CLOSED_ORDERS, CREATE_ORDER,
    EXCHANGE_ID, MARKET_ID_DELIMITER, OPEN_ORDERS, ORDER, ORDER_BOOK, ORDER_MATCHES, PRICE, PRICES,
    SERVER_TIME, SYMBOLS, TICKS,
};
use super::errors::Ex876Classifier;
use super::parsers;
use crate::config::{ConfigLayer, Credentials, ExchangeConfig};
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Market, MarketCache, MarketIndex, Timeframe};
use crate::domain::ports::{Capabilities, Exchange, Transport};
use crate::domain::trading::types::{
    Balances, Candle, Order, OrderBook, OrderSide, OrderType, Ticker, Trade,
};
use crate::domain::values::{Params, extend, into_params, safe_integer};
use crate::infrastructure::core::exchange_core::{AdapterParts, ExchangeCore};
use crate::infrastructure::core::normalize::{ParseContext, sort_and_filter};
use crate::infrastructure::core::request_builder::Route;
use crate::infrastructure::signing::{HeaderManifestSigner, NonceSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

fn as_slice(response: &Value) -> &[Value] {
    response.as_array().map(Vec::as_slice).unwrap_or(&[])
}

/// Ex876 adapter. Private calls carry `API-*` headers signed over a
/// canonical request manifest.
pub struct Ex876Exchange {
    core: ExchangeCore,
}

impl Ex876Exchange {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        overrides: Option<ConfigLayer>,
    ) -> anyhow::Result<Self> {
        let config = ExchangeConfig::resolve(ConfigLayer::base(), common::describe(), overrides)?;
        let parts = AdapterParts {
            routes: common::ROUTES,
            public_prefix: "/v1/",
            private_prefix: "/v1/",
            signer: Box::new(HeaderManifestSigner::new(EXCHANGE_ID)),
            classifier: Box::new(Ex876Classifier),
        };
        info!("Ex876Exchange: using {}", config.api_url);
        Ok(Self {
            core: ExchangeCore::new(config, credentials, transport, parts),
        })
    }

    pub fn with_nonce_source(mut self, nonce: Arc<NonceSource>) -> Self {
        self.core = self.core.with_nonce_source(nonce);
        self
    }

    fn context<'a>(&'a self, index: &'a MarketIndex) -> ParseContext<'a> {
        ParseContext {
            exchange: self.id(),
            codes: self.core.codes(),
            index: Some(index),
            delimiter: MARKET_ID_DELIMITER,
        }
    }

    fn symbol_request(market: Option<&Market>) -> Params {
        let mut request = Params::new();
        if let Some(market) = market {
            request.insert("symbol".to_string(), Value::from(market.id.clone()));
        }
        request
    }

    async fn order_list(
        &self,
        route: &Route,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let response = self
            .core
            .request(route, extend(Self::symbol_request(market), params))
            .await?;
        let ctx = self.context(&index);
        let orders = as_slice(&response)
            .iter()
            .map(|order| parsers::parse_order(order, market, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?;
        Ok(sort_and_filter(orders, since, limit))
    }

    fn parse_matches(
        &self,
        response: &Value,
        market: Option<&Market>,
        index: &MarketIndex,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> ExchangeResult<Vec<Trade>> {
        let ctx = self.context(index);
        let trades = as_slice(response)
            .iter()
            .map(|entry| parsers::parse_match(entry, market, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?;
        Ok(sort_and_filter(trades, since, limit))
    }
}

#[async_trait]
impl Exchange for Ex876Exchange {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn capabilities(&self) -> &Capabilities {
        &CAPABILITIES
    }

    fn market_cache(&self) -> &MarketCache {
        self.core.market_cache()
    }

    async fn fetch_markets(&self, params: Params) -> ExchangeResult<Vec<Market>> {
        let response = self.core.request(&SYMBOLS, params).await?;
        as_slice(&response)
            .iter()
            .map(|entry| parsers::parse_market(entry, self.core.config(), self.core.codes()))
            .collect()
    }

    async fn fetch_balance(&self, params: Params) -> ExchangeResult<Balances> {
        let index = self.load_markets(false).await?;
        let response = self.core.request(&ACCOUNTS, params).await?;
        Ok(parsers::parse_balance(&response, &self.context(&index)))
    }

    async fn fetch_order_book(
        &self,
        symbol: &str,
        _limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<OrderBook> {
        let index = self.load_markets(false).await?;
        let request = into_params(json!({ "symbol": index.market_id(symbol)? }));
        let response = self.core.request(&ORDER_BOOK, extend(request, params)).await?;
        Ok(parsers::parse_order_book(&response, symbol))
    }

    async fn fetch_ticker(&self, symbol: &str, params: Params) -> ExchangeResult<Ticker> {
        let index = self.load_markets(false).await?;
        let market = index.market(symbol)?;
        let request = into_params(json!({ "symbol": market.id }));
        let response = self.core.request(&PRICE, extend(request, params)).await?;
        parsers::parse_ticker(&response, Some(market), &self.context(&index))
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
        params: Params,
    ) -> ExchangeResult<Vec<Ticker>> {
        let index = self.load_markets(false).await?;
        let response = self.core.request(&PRICES, params).await?;
        let ctx = self.context(&index);
        let tickers = as_slice(&response)
            .iter()
            .map(|entry| parsers::parse_ticker(entry, None, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?;
        Ok(match symbols {
            Some(wanted) => tickers
                .into_iter()
                .filter(|ticker| wanted.iter().any(|s| *s == ticker.symbol))
                .collect(),
            None => tickers,
        })
    }

    async fn fetch_trades(
        &self,
        symbol: &str,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        let index = self.load_markets(false).await?;
        let market = index.market(symbol)?;
        let request = into_params(json!({ "symbol": market.id }));
        let response = self.core.request(&TICKS, extend(request, params)).await?;
        let trades = as_slice(&response)
            .iter()
            .map(|tick| parsers::parse_tick(tick, &market.symbol))
            .collect();
        Ok(sort_and_filter(trades, since, limit))
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let response = self
            .core
            .request(&CLEARINGS, extend(Self::symbol_request(market), params))
            .await?;
        self.parse_matches(&response, market, &index, since, limit)
    }

    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Params,
    ) -> ExchangeResult<Order> {
        let index = self.load_markets(false).await?;
        let market = index.market(symbol)?;
        let mut request = into_params(json!({
            "symbol": market.id,
            "type": common::order_type_param(side, order_type),
            "quantity": index.amount_to_precision(symbol, amount)?,
        }));
        if order_type == OrderType::Limit {
            let price = price.ok_or_else(|| ExchangeError::InvalidOrder {
                exchange: self.id().to_string(),
                reason: "limit orders require a price".to_string(),
            })?;
            request.insert(
                "price".to_string(),
                Value::from(index.price_to_precision(symbol, price)?),
            );
        }
        let response = self.core.request(&CREATE_ORDER, extend(request, params)).await?;
        parsers::parse_order(&response, Some(market), &self.context(&index))
    }

    async fn cancel_order(
        &self,
        id: &str,
        _symbol: Option<&str>,
        params: Params,
    ) -> ExchangeResult<Value> {
        self.load_markets(false).await?;
        let request = into_params(json!({ "orderId": id }));
        self.core.request(&CANCEL_ORDER, extend(request, params)).await
    }

    async fn fetch_order(
        &self,
        id: &str,
        symbol: Option<&str>,
        params: Params,
    ) -> ExchangeResult<Order> {
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let request = into_params(json!({ "orderId": id }));
        let response = self.core.request(&ORDER, extend(request, params)).await?;
        if !response.is_object() {
            return Err(ExchangeError::OrderNotFound {
                exchange: self.id().to_string(),
                detail: format!("the order {} not found", id),
            });
        }
        parsers::parse_order(&response, market, &self.context(&index))
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        self.order_list(&OPEN_ORDERS, symbol, since, limit, params)
            .await
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        self.order_list(&CLOSED_ORDERS, symbol, since, limit, params)
            .await
    }

    async fn fetch_order_trades(
        &self,
        id: &str,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let request = into_params(json!({ "id": id }));
        let response = self.core.request(&ORDER_MATCHES, extend(request, params)).await?;
        self.parse_matches(&response, market, &index, since, limit)
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Candle>> {
        let index = self.load_markets(false).await?;
        let mut request = into_params(json!({
            "symbol": index.market_id(symbol)?,
            "type": common::timeframe_param(timeframe),
        }));
        if let Some(since) = since {
            request.insert("from".to_string(), Value::from(since));
        }
        if let Some(limit) = limit {
            request.insert("limit".to_string(), Value::from(limit));
        }
        let response = self.core.request(&BARS, extend(request, params)).await?;
        let candles: Vec<Candle> = as_slice(&response)
            .iter()
            .map(parsers::parse_candle)
            .collect();
        Ok(sort_and_filter(candles, since, limit))
    }

    async fn fetch_time(&self, params: Params) -> ExchangeResult<i64> {
        let response = self.core.request(&SERVER_TIME, params).await?;
        safe_integer(&response, "timestamp")
            .ok_or_else(|| ExchangeError::bad_response(self.id(), "server time without timestamp"))
    }
}
