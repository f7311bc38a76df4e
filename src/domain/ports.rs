use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{Currency, Market, MarketCache, MarketIndex, Timeframe};
use crate::domain::trading::types::{
    Balances, Candle, DepositAddress, Order, OrderBook, OrderSide, OrderType, Ticker, Trade,
    Transaction, WithdrawalReceipt,
};
use crate::domain::values::Params;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready for the wire: absolute URL, final headers and body.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Whole-request deadline; the client default applies when unset.
    pub timeout: Option<Duration>,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("could not read response body: {0}")]
    Body(String),
}

/// Executes HTTP requests. Retries, timeouts and rate limiting belong here,
/// never in the adapters.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, TransportError>;
}

/// Which unified operations an adapter implements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub fetch_markets: bool,
    pub fetch_currencies: bool,
    pub fetch_balance: bool,
    pub fetch_order_book: bool,
    pub fetch_ticker: bool,
    pub fetch_tickers: bool,
    pub fetch_trades: bool,
    pub fetch_my_trades: bool,
    pub create_order: bool,
    pub cancel_order: bool,
    pub fetch_order: bool,
    pub fetch_orders: bool,
    pub fetch_open_orders: bool,
    pub fetch_closed_orders: bool,
    pub fetch_order_trades: bool,
    pub fetch_deposit_address: bool,
    pub withdraw: bool,
    pub fetch_ohlcv: bool,
    pub fetch_deposits: bool,
    pub fetch_withdrawals: bool,
    pub fetch_transactions: bool,
    pub fetch_time: bool,
}

/// The unified operation set of one exchange.
///
/// Every operation takes an open-ended `params` map; keys the adapter does not
/// consume are forwarded to the wire request verbatim. Operations an exchange
/// lacks keep the default body and fail with [`ExchangeError::NotSupported`].
#[async_trait]
pub trait Exchange: Send + Sync {
    fn id(&self) -> &str;

    fn capabilities(&self) -> &Capabilities;

    fn market_cache(&self) -> &MarketCache;

    /// Loads market (and, where listed, currency) metadata once and serves it
    /// from the cache afterwards. `reload` forces a refresh.
    async fn load_markets(&self, reload: bool) -> ExchangeResult<Arc<MarketIndex>> {
        let cache = self.market_cache();
        if !reload && let Some(index) = cache.current().await {
            return Ok(index);
        }
        let _loading = cache.begin_load().await;
        if !reload && let Some(index) = cache.current().await {
            return Ok(index);
        }

        let markets = self.fetch_markets(Params::new()).await?;
        let currencies = if self.capabilities().fetch_currencies {
            Some(self.fetch_currencies(Params::new()).await?)
        } else {
            None
        };
        let index = Arc::new(MarketIndex::new(self.id(), markets, currencies));
        info!(
            "{}: loaded {} markets",
            self.id(),
            index.markets().len()
        );
        cache.store(index.clone()).await;
        Ok(index)
    }

    async fn fetch_markets(&self, _params: Params) -> ExchangeResult<Vec<Market>> {
        Err(ExchangeError::not_supported(self.id(), "fetchMarkets"))
    }

    async fn fetch_currencies(&self, _params: Params) -> ExchangeResult<Vec<Currency>> {
        Err(ExchangeError::not_supported(self.id(), "fetchCurrencies"))
    }

    async fn fetch_balance(&self, _params: Params) -> ExchangeResult<Balances> {
        Err(ExchangeError::not_supported(self.id(), "fetchBalance"))
    }

    async fn fetch_order_book(
        &self,
        _symbol: &str,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<OrderBook> {
        Err(ExchangeError::not_supported(self.id(), "fetchOrderBook"))
    }

    async fn fetch_ticker(&self, _symbol: &str, _params: Params) -> ExchangeResult<Ticker> {
        Err(ExchangeError::not_supported(self.id(), "fetchTicker"))
    }

    async fn fetch_tickers(
        &self,
        _symbols: Option<&[String]>,
        _params: Params,
    ) -> ExchangeResult<Vec<Ticker>> {
        Err(ExchangeError::not_supported(self.id(), "fetchTickers"))
    }

    async fn fetch_trades(
        &self,
        _symbol: &str,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        Err(ExchangeError::not_supported(self.id(), "fetchTrades"))
    }

    async fn fetch_my_trades(
        &self,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        Err(ExchangeError::not_supported(self.id(), "fetchMyTrades"))
    }

    async fn create_order(
        &self,
        _symbol: &str,
        _order_type: OrderType,
        _side: OrderSide,
        _amount: Decimal,
        _price: Option<Decimal>,
        _params: Params,
    ) -> ExchangeResult<Order> {
        Err(ExchangeError::not_supported(self.id(), "createOrder"))
    }

    /// Returns the exchange's raw acknowledgement.
    async fn cancel_order(
        &self,
        _id: &str,
        _symbol: Option<&str>,
        _params: Params,
    ) -> ExchangeResult<Value> {
        Err(ExchangeError::not_supported(self.id(), "cancelOrder"))
    }

    async fn fetch_order(
        &self,
        _id: &str,
        _symbol: Option<&str>,
        _params: Params,
    ) -> ExchangeResult<Order> {
        Err(ExchangeError::not_supported(self.id(), "fetchOrder"))
    }

    async fn fetch_orders(
        &self,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        Err(ExchangeError::not_supported(self.id(), "fetchOrders"))
    }

    async fn fetch_open_orders(
        &self,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        Err(ExchangeError::not_supported(self.id(), "fetchOpenOrders"))
    }

    async fn fetch_closed_orders(
        &self,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Order>> {
        Err(ExchangeError::not_supported(self.id(), "fetchClosedOrders"))
    }

    async fn fetch_order_trades(
        &self,
        _id: &str,
        _symbol: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Trade>> {
        Err(ExchangeError::not_supported(self.id(), "fetchOrderTrades"))
    }

    async fn fetch_deposit_address(
        &self,
        _code: &str,
        _params: Params,
    ) -> ExchangeResult<DepositAddress> {
        Err(ExchangeError::not_supported(self.id(), "fetchDepositAddress"))
    }

    async fn withdraw(
        &self,
        _code: &str,
        _amount: Decimal,
        _address: &str,
        _tag: Option<&str>,
        _params: Params,
    ) -> ExchangeResult<WithdrawalReceipt> {
        Err(ExchangeError::not_supported(self.id(), "withdraw"))
    }

    async fn fetch_ohlcv(
        &self,
        _symbol: &str,
        _timeframe: Timeframe,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Candle>> {
        Err(ExchangeError::not_supported(self.id(), "fetchOHLCV"))
    }

    async fn fetch_deposits(
        &self,
        _code: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        Err(ExchangeError::not_supported(self.id(), "fetchDeposits"))
    }

    async fn fetch_withdrawals(
        &self,
        _code: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        Err(ExchangeError::not_supported(self.id(), "fetchWithdrawals"))
    }

    /// Deposits and withdrawals in one timeline.
    async fn fetch_transactions(
        &self,
        _code: Option<&str>,
        _since: Option<i64>,
        _limit: Option<u32>,
        _params: Params,
    ) -> ExchangeResult<Vec<Transaction>> {
        Err(ExchangeError::not_supported(self.id(), "fetchTransactions"))
    }

    /// Server time in epoch milliseconds.
    async fn fetch_time(&self, _params: Params) -> ExchangeResult<i64> {
        Err(ExchangeError::not_supported(self.id(), "fetchTime"))
    }
}
