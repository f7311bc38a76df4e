use super::common::{
    self, BALANCES_ALL, CANCEL_ORDER, CAPABILITIES, CURRENCIES, DEPOSIT_ADDRESS, DEPOSITS,
    EXCHANGE_ID, MARKET_ID_DELIMITER, MARKETS, OHLCV, ORDER, ORDER_BOOK, ORDERS, TICKER, TICKERS,
    TRADES, USER_TRADES, WITHDRAW, WITHDRAWALS,
};
use super::errors::QtradeClassifier;
use super::parsers;
use crate::config::{ConfigLayer, Credentials, ExchangeConfig};
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Currency, Market, MarketCache, MarketIndex, Timeframe};
use crate::domain::ports::{Capabilities, Exchange, Transport};
use crate::domain::trading::types::{
    Balances, Candle, DepositAddress, Order, OrderBook, OrderSide, OrderType, Ticker, Trade,
    Transaction, TransactionKind, WithdrawalReceipt,
};
use crate::domain::values::{Params, extend, into_params, safe_array, safe_string};
use crate::infrastructure::core::exchange_core::{AdapterParts, ExchangeCore};
use crate::infrastructure::core::normalize::{ParseContext, check_address, sort_and_filter};
use crate::infrastructure::core::request_builder::Route;
use crate::infrastructure::signing::{DigestAuthSigner, NonceSource};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

/// Everything qTrade returns is wrapped in `data`.
fn data(response: &Value) -> &Value {
    response.get("data").unwrap_or(&Value::Null)
}

/// qTrade adapter. Private calls carry a timestamped SHA-256 digest that
/// includes the secret.
pub struct QtradeExchange {
    core: ExchangeCore,
}

impl QtradeExchange {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        overrides: Option<ConfigLayer>,
    ) -> anyhow::Result<Self> {
        let config = ExchangeConfig::resolve(ConfigLayer::base(), common::describe(), overrides)?;
        let parts = AdapterParts {
            routes: common::ROUTES,
            public_prefix: "/v1/",
            private_prefix: "/v1/user/",
            signer: Box::new(DigestAuthSigner::new(EXCHANGE_ID)),
            classifier: Box::new(QtradeClassifier),
        };
        info!("QtradeExchange: using {}", config.api_url);
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

    /// Lists every order, optionally restricted by the `open` flag, then
    /// filters by symbol and time client-side. The exchange's own order is
    /// kept and `limit` takes the first entries.
    async fn order_list(
        &self,
        open: Option<bool>,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        let index = self.load_markets(false).await?;
        let market = symbol.map(|s| index.market(s)).transpose()?;
        let mut request = Params::new();
        if let Some(open) = open {
            request.insert("open".to_string(), Value::from(open));
        }
        let response = self.core.request(&ORDERS, extend(request, params)).await?;
        let ctx = self.context(&index);
        let orders = safe_array(data(&response), "orders")
            .iter()
            .map(|order| parsers::parse_order(order, None, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?
            .into_iter()
            .filter(|order| market.is_none_or(|m| order.symbol.as_deref() == Some(m.symbol.as_str())))
            .filter(|order| since.is_none_or(|since| order.timestamp.is_some_and(|ts| ts >= since)))
            .take(limit.map_or(usize::MAX, |limit| limit as usize))
            .collect();
        Ok(orders)
    }

    async fn transactions(
        &self,
        route: &Route,
        key: &str,
        kind: TransactionKind,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        let index = self.load_markets(false).await?;
        let response = self.core.request(route, params).await?;
        let ctx = self.context(&index);
        let rows = safe_array(data(&response), key)
            .iter()
            .map(|row| parsers::parse_transaction(row, kind, &ctx))
            .filter(|tx| code.is_none_or(|code| tx.currency.as_deref() == Some(code)))
            .collect();
        Ok(sort_and_filter(rows, since, limit))
    }
}

#[async_trait]
impl Exchange for QtradeExchange {
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
        let response = self.core.request(&MARKETS, params).await?;
        safe_array(data(&response), "markets")
            .iter()
            .map(|entry| parsers::parse_market(entry, self.core.config(), self.core.codes()))
            .collect()
    }

    async fn fetch_currencies(&self, params: Params) -> ExchangeResult<Vec<Currency>> {
        let response = self.core.request(&CURRENCIES, params).await?;
        Ok(safe_array(data(&response), "currencies")
            .iter()
            .filter_map(|entry| parsers::parse_currency(entry, self.core.codes()))
            .collect())
    }

    async fn fetch_balance(&self, params: Params) -> ExchangeResult<Balances> {
        let index = self.load_markets(false).await?;
        let response = self.core.request(&BALANCES_ALL, params).await?;
        Ok(parsers::parse_balance(&response, &self.context(&index)))
    }

    async fn fetch_order_book(
        &self,
        symbol: &str,
        _limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<OrderBook> {
        let index = self.load_markets(false).await?;
        let request = into_params(json!({ "market_string": index.market_id(symbol)? }));
        let response = self.core.request(&ORDER_BOOK, extend(request, params)).await?;
        Ok(parsers::parse_order_book(data(&response), symbol))
    }

    async fn fetch_ticker(&self, symbol: &str, params: Params) -> ExchangeResult<Ticker> {
        let index = self.load_markets(false).await?;
        let market = index.market(symbol)?;
        let request = into_params(json!({ "market_string": market.id }));
        let response = self.core.request(&TICKER, extend(request, params)).await?;
        parsers::parse_ticker(data(&response), Some(market), &self.context(&index))
    }

    async fn fetch_tickers(
        &self,
        symbols: Option<&[String]>,
        params: Params,
    ) -> ExchangeResult<Vec<Ticker>> {
        let index = self.load_markets(false).await?;
        let response = self.core.request(&TICKERS, params).await?;
        let ctx = self.context(&index);
        let tickers = safe_array(data(&response), "markets")
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
        let request = into_params(json!({ "market_string": market.id }));
        let response = self.core.request(&TRADES, extend(request, params)).await?;
        let ctx = self.context(&index);
        let trades = safe_array(data(&response), "trades")
            .iter()
            .map(|trade| parsers::parse_trade(trade, Some(market), &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?;
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
        let response = self.core.request(&USER_TRADES, params).await?;
        let ctx = self.context(&index);
        let trades = safe_array(data(&response), "trades")
            .iter()
            .map(|trade| parsers::parse_trade(trade, None, &ctx))
            .collect::<ExchangeResult<Vec<_>>>()?
            .into_iter()
            .filter(|trade| market.is_none_or(|m| trade.symbol.as_deref() == Some(m.symbol.as_str())))
            .collect();
        Ok(sort_and_filter(trades, since, limit))
    }

    /// Only limit orders exist; the side picks the endpoint.
    async fn create_order(
        &self,
        symbol: &str,
        order_type: OrderType,
        side: OrderSide,
        amount: Decimal,
        price: Option<Decimal>,
        params: Params,
    ) -> ExchangeResult<Order> {
        if order_type != OrderType::Limit {
            return Err(ExchangeError::InvalidOrder {
                exchange: self.id().to_string(),
                reason: "createOrder() allows limit orders only".to_string(),
            });
        }
        let price = price.ok_or_else(|| ExchangeError::InvalidOrder {
            exchange: self.id().to_string(),
            reason: "limit orders require a price".to_string(),
        })?;
        let index = self.load_markets(false).await?;
        let market = index.market(symbol)?;
        let market_id = market.numeric_id.ok_or_else(|| ExchangeError::BadSymbol {
            exchange: self.id().to_string(),
            symbol: symbol.to_string(),
        })?;
        let request = into_params(json!({
            "amount": index.amount_to_precision(symbol, amount)?,
            "market_id": market_id,
            "price": index.price_to_precision(symbol, price)?,
        }));
        let response = self
            .core
            .request(&common::limit_route(side), extend(request, params))
            .await?;
        let order = data(&response).get("order").unwrap_or(&Value::Null);
        parsers::parse_order(order, Some(market), &self.context(&index))
    }

    /// A successful cancel is an empty 200, surfaced as `null`.
    async fn cancel_order(
        &self,
        id: &str,
        _symbol: Option<&str>,
        params: Params,
    ) -> ExchangeResult<Value> {
        self.load_markets(false).await?;
        let id: i64 = id.trim().parse().map_err(|_| ExchangeError::BadRequest {
            exchange: self.id().to_string(),
            reason: format!("order id must be an integer, got {}", id),
        })?;
        let request = into_params(json!({ "id": id }));
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
        let request = into_params(json!({ "order_id": id }));
        let response = self.core.request(&ORDER, extend(request, params)).await?;
        match data(&response).get("order").filter(|order| order.is_object()) {
            Some(order) => parsers::parse_order(order, market, &self.context(&index)),
            None => Err(ExchangeError::OrderNotFound {
                exchange: self.id().to_string(),
                detail: format!("the order {} not found", id),
            }),
        }
    }

    async fn fetch_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        self.order_list(None, symbol, since, limit, params).await
    }

    async fn fetch_open_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        self.order_list(Some(true), symbol, since, limit, params).await
    }

    async fn fetch_closed_orders(
        &self,
        symbol: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        self.order_list(Some(false), symbol, since, limit, params).await
    }

    async fn fetch_deposit_address(
        &self,
        code: &str,
        params: Params,
    ) -> ExchangeResult<DepositAddress> {
        let index = self.load_markets(false).await?;
        let currency_id = index
            .currency(code)
            .map(|currency| currency.id.clone())
            .unwrap_or_else(|_| code.to_string());
        let request = into_params(json!({ "currency": currency_id }));
        let response = self
            .core
            .request(&DEPOSIT_ADDRESS, extend(request, params))
            .await?;
        parsers::parse_deposit_address(code, &response, self.id())
    }

    /// A destination tag travels inside the address as `address:tag`.
    async fn withdraw(
        &self,
        code: &str,
        amount: Decimal,
        address: &str,
        tag: Option<&str>,
        params: Params,
    ) -> ExchangeResult<WithdrawalReceipt> {
        check_address(self.id(), Some(address))?;
        let index = self.load_markets(false).await?;
        let currency_id = index
            .currency(code)
            .map(|currency| currency.id.clone())
            .unwrap_or_else(|_| code.to_string());
        let address = match tag {
            Some(tag) => format!("{}:{}", address, tag),
            None => address.to_string(),
        };
        let request = into_params(json!({
            "address": address,
            "amount": amount.normalize().to_string(),
            "currency": currency_id,
        }));
        let response = self.core.request(&WITHDRAW, extend(request, params)).await?;
        let id = safe_string(data(&response), "id");
        Ok(WithdrawalReceipt { id, info: response })
    }

    async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Candle>> {
        let interval =
            common::timeframe_param(timeframe).ok_or_else(|| ExchangeError::ParameterUnsupported {
                exchange: self.id().to_string(),
                operation: "fetchOHLCV".to_string(),
                reason: format!("timeframe {} is not available", timeframe),
            })?;
        let index = self.load_markets(false).await?;
        let request = into_params(json!({
            "market_string": index.market_id(symbol)?,
            "interval": interval,
        }));
        let response = self.core.request(&OHLCV, extend(request, params)).await?;
        let candles: Vec<Candle> = safe_array(data(&response), "slices")
            .iter()
            .map(parsers::parse_candle)
            .collect();
        Ok(sort_and_filter(candles, since, limit))
    }

    async fn fetch_deposits(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        self.transactions(&DEPOSITS, "deposits", TransactionKind::Deposit, code, since, limit, params)
            .await
    }

    async fn fetch_withdrawals(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        self.transactions(
            &WITHDRAWALS,
            "withdraws",
            TransactionKind::Withdrawal,
            code,
            since,
            limit,
            params,
        )
        .await
    }

    async fn fetch_transactions(
        &self,
        code: Option<&str>,
        since: Option<i64>,
        limit: Option<u32>,
        params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        let mut merged = self.fetch_deposits(code, since, None, params.clone()).await?;
        merged.extend(self.fetch_withdrawals(code, since, None, params).await?);
        Ok(sort_and_filter(merged, since, limit))
    }
}
