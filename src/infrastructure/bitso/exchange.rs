use super::common::{
    self, AVAILABLE_BOOKS, BALANCE, CANCEL_ORDER, CAPABILITIES, CREATE_ORDER, EXCHANGE_ID,
    FUNDING_DESTINATION, HISTORY_DEFAULT_LIMIT, MARKET_ID_DELIMITER, OPEN_ORDERS, ORDER,
    ORDER_BOOK, ORDER_TRADES, TICKER, TRADES, USER_TRADES,
};
use super::errors::{BitsoClassifier, ensure_success};
use super::parsers;
use crate::config::{ConfigLayer, Credentials, ExchangeConfig};
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Market, MarketCache, MarketIndex};
use crate::domain::ports::{Capabilities, Exchange, HttpMethod, Transport};
use crate::domain::trading::types::{
    Balances, DepositAddress, Order, OrderBook, OrderSide, OrderType, Ticker, Trade,
    WithdrawalReceipt,
};
use crate::domain::values::{FromJson, Params, extend, into_params, safe_array, safe_string};
use crate::infrastructure::core::exchange_core::{AdapterParts, ExchangeCore};
use crate::infrastructure::core::normalize::{ParseContext, check_address, sort_and_filter};
use crate::infrastructure::core::request_builder::{ApiKind, Route};
use crate::infrastructure::signing::{NonceHmacSigner, NonceSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// Bitso adapter. Private calls are signed with the nonce-concatenation scheme.
pub struct BitsoExchange {
    core: ExchangeCore,
}

impl BitsoExchange {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        overrides: Option<ConfigLayer>,
    ) -> anyhow::Result<Self> {
        let config = ExchangeConfig::resolve(ConfigLayer::base(), common::describe(), overrides)?;
        let parts = AdapterParts {
            routes: common::ROUTES,
            public_prefix: "/v3/",
            private_prefix: "/v3/",
            signer: Box::new(NonceHmacSigner::new(EXCHANGE_ID, "Bitso")),
            classifier: Box::new(BitsoClassifier),
        };
        info!("BitsoExchange: using {}", config.api_url);
        Ok(Self {
            core: ExchangeCore::new(config, credentials, transport, parts),
        })
    }

    pub fn with_nonce_source(mut self, nonce: Arc<NonceSource>) -> Self {
        self.core = self.core.with_nonce_source(nonce);
        self
    }

    /// Every Bitso response must carry a truthy `success` flag.
    async fn request(&self, route: &Route, params: Params) -> ExchangeResult<Value> {
        let response = self.core.request(route, params).await?;
        ensure_success(self.id(), &response)?;
        Ok(response)
    }

    fn context<'a>(&'a self, index: &'a MarketIndex) -> ParseContext<'a> {
        ParseContext {
            exchange: self.id(),
            codes: self.core.codes(),
            index: Some(index),
            delimiter: MARKET_ID_DELIMITER,
        }
    }

    /// History endpoints page by an integer `marker`; a bare `since` cannot be
    /// honored and is refused before anything is sent.
    fn apply_marker(
        &self,
        operation: &str,
        since: Option<i64>,
        params: &mut Params,
    ) -> ExchangeResult<()> {
        let Some(marker) = params.get("marker") else {
            if since.is_some() {
                return Err(ExchangeError::ParameterUnsupported {
                    exchange: self.id().to_string(),
                    operation: operation.to_string(),
                    reason: "filtering by `since` is not supported, pass the integer `marker` param instead".to_string(),
                });
            }
            return Ok(());
        };
        let marker = i64::from_json(marker).ok_or_else(|| ExchangeError::BadRequest {
            exchange: self.id().to_string(),
            reason: format!("marker must be an integer, got {}", marker),
        })?;
        params.insert("marker".to_string(), Value::from(marker));
        Ok(())
    }

    fn history_request(market: Option<&Market>, limit: Option<u32>) -> Params {
        let mut request = Params::new();
        if let Some(market) = market {
            request.insert("book".to_string(), Value::from(market.id.clone()));
        }
        request.insert(
            "limit".to_string(),
            Value::from(limit.unwrap_or(HISTORY_DEFAULT_LIMIT)),
        );
        request
    }

    fn parse_trades(
        &self,
        payload: &Value,
        market: Option<&Market>,
        index: &MarketIndex,
        since: Option<i64>,
        limit: Option<u32>,
    ) -> ExchangeResult<Vec<Trade>> {
        let ctx = self.context(index);
        let trades = payload
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .map(|trade| parsers::parse_trade(trade, market, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?;
        Ok(sort_and_filter(trades, since, limit))
    }
}

#[async_trait]
impl Exchange for BitsoExchange {
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
        let response = self.request(&AVAILABLE_BOOKS, params).await?;
        safe_array(&response, "payload")
            .iter()
            .map(|entry| parsers::parse_market(entry, self.core.config(), self.core.codes()))
            .collect()
    }

    async fn fetch_balance(&self, params: Params) -> ExchangeResult<Balances> {
        let index = self.load_markets(false).await?;
        let response = self.request(&BALANCE, params).await?;
        Ok(parsers::parse_balance(&response, &self.context(&index)))
    }

    async fn fetch_order_book(
        &self,
        symbol: &str,
        _limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<OrderBook> {
        let index = self.load_markets(false).await?;
        let request = into_params(json!({ "book": index.market_id(symbol)? }));
        let response = self.request(&ORDER_BOOK, extend(request, params)).await?;
        let payload = response.get("payload").unwrap_or(&Value::Null);
        Ok(parsers::parse_order_book(payload, symbol))
    }

    async fn fetch_ticker(&self, symbol: &str, params: Params) -> ExchangeResult<Ticker> {
        let index = self.load_markets(false).await?;
        let request = into_params(json!({ "book": index.market_id(symbol)? }));
        let response = self.request(&TICKER, extend(request, params)).await?;
        let payload = response.get("payload").unwrap_or(&Value::Null);
        Ok(parsers::parse_ticker(payload, symbol))
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
        let request = into_params(json!({ "book": market.id }));
        let response = self.request(&TRADES, extend(request, params)).await?;
        self.parse_trades(
            response.get("payload").unwrap_or(&Value::Null),
            Some(market),
            &index,
            since,
            limit,
        )
    }

    async fn fetch_my_trades(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        mut params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        self.apply_marker("fetchMyTrades", since, &mut params)?;
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let request = Self::history_request(market, limit);
        let response = self.request(&USER_TRADES, extend(request, params)).await?;
        self.parse_trades(
            response.get("payload").unwrap_or(&Value::Null),
            market,
            &index,
            since,
            Some(limit.unwrap_or(HISTORY_DEFAULT_LIMIT)),
        )
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
            "book": market.id,
            "side": side.as_str(),
            "type": order_type.as_str(),
            "major": index.amount_to_precision(symbol, amount)?,
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

        let response = self.request(&CREATE_ORDER, extend(request, params)).await?;
        let payload = response.get("payload").unwrap_or(&Value::Null);
        let mut order = Order::from_info(response.clone());
        order.id = safe_string(payload, "oid");
        order.symbol = Some(market.symbol.clone());
        order.order_type = Some(order_type);
        order.side = Some(side);
        order.amount = Some(amount);
        order.price = price;
        Ok(order)
    }

    async fn cancel_order(
        &self,
        id: &str,
        _symbol: Option<&str>,
        params: Params,
    ) -> ExchangeResult<Value> {
        self.load_markets(false).await?;
        let request = into_params(json!({ "oid": id }));
        self.request(&CANCEL_ORDER, extend(request, params)).await
    }

    /// Bitso answers with a list; exactly one element means the order exists.
    async fn fetch_order(
        &self,
        id: &str,
        _symbol: Option<&str>,
        params: Params,
    ) -> ExchangeResult<Order> {
        let index = self.load_markets(false).await?;
        let request = into_params(json!({ "oid": id }));
        let response = self.request(&ORDER, extend(request, params)).await?;
        match response.get("payload").and_then(Value::as_array) {
            Some(orders) if orders.len() == 1 => {
                parsers::parse_order(&orders[0], None, &self.context(&index))
            }
            _ => Err(ExchangeError::OrderNotFound {
                exchange: self.id().to_string(),
                detail: format!("the order {} not found", id),
            }),
        }
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        mut params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        self.apply_marker("fetchOpenOrders", since, &mut params)?;
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let request = Self::history_request(market, limit);
        let response = self.request(&OPEN_ORDERS, extend(request, params)).await?;
        let ctx = self.context(&index);
        let orders = safe_array(&response, "payload")
            .iter()
            .map(|order| parsers::parse_order(order, market, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?;
        Ok(sort_and_filter(
            orders,
            since,
            Some(limit.unwrap_or(HISTORY_DEFAULT_LIMIT)),
        ))
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
        let request = into_params(json!({ "oid": id }));
        let response = self.request(&ORDER_TRADES, extend(request, params)).await?;
        self.parse_trades(
            response.get("payload").unwrap_or(&Value::Null),
            market,
            &index,
            since,
            limit,
        )
    }

    async fn fetch_deposit_address(
        &self,
        code: &str,
        params: Params,
    ) -> ExchangeResult<DepositAddress> {
        let index = self.load_markets(false).await?;
        let currency = index.currency(code)?;
        let request = into_params(json!({ "fund_currency": currency.id }));
        let response = self
            .request(&FUNDING_DESTINATION, extend(request, params))
            .await?;
        parsers::parse_deposit_address(code, &response, self.id())
    }

    async fn withdraw(
        &self,
        code: &str,
        amount: Decimal,
        address: &str,
        tag: Option<&str>,
        params: Params,
    ) -> ExchangeResult<WithdrawalReceipt> {
        check_address(self.id(), Some(address))?;
        self.load_markets(false).await?;
        let path = common::withdrawal_endpoint(code).ok_or_else(|| ExchangeError::BadRequest {
            exchange: self.id().to_string(),
            reason: format!("not valid withdraw coin: {}", code),
        })?;

        let mut request = into_params(json!({
            "amount": amount.normalize().to_string(),
            "address": address,
        }));
        if let Some(tag) = tag {
            request.insert("destination_tag".to_string(), Value::from(tag));
        }
        let response = self
            .core
            .call(ApiKind::Private, HttpMethod::Post, path, extend(request, params))
            .await?;
        ensure_success(self.id(), &response)?;
        let id = response
            .get("payload")
            .and_then(|payload| safe_string(payload, "wid"));
        Ok(WithdrawalReceipt { id, info: response })
    }
}
