//! Shared request pipeline of every adapter: build, sign, send, parse, classify.

use super::classifier::{ErrorClassifier, ResponseContext};
use super::request_builder::{ApiKind, RequestBuilder, Route};
use crate::config::{Credentials, ExchangeConfig};
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::market::{MarketCache, MarketIndex};
use crate::domain::ports::{HttpMethod, Transport};
use crate::domain::trading::symbols::CurrencyCodes;
use crate::domain::values::Params;
use crate::infrastructure::signing::{NonceSource, RequestSigner, SigningContext, unsigned};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

/// Exchange-specific pieces plugged into an [`ExchangeCore`].
pub struct AdapterParts {
    /// Every endpoint the exchange exposes.
    pub routes: &'static [Route],
    pub public_prefix: &'static str,
    pub private_prefix: &'static str,
    pub signer: Box<dyn RequestSigner>,
    pub classifier: Box<dyn ErrorClassifier>,
}

pub struct ExchangeCore {
    config: ExchangeConfig,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
    nonce: Arc<NonceSource>,
    builder: RequestBuilder,
    routes: &'static [Route],
    signer: Box<dyn RequestSigner>,
    classifier: Box<dyn ErrorClassifier>,
    codes: CurrencyCodes,
    markets: MarketCache,
}

impl ExchangeCore {
    pub fn new(
        config: ExchangeConfig,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
        parts: AdapterParts,
    ) -> Self {
        let builder = RequestBuilder::new(
            &config.id,
            config.api_url.as_str(),
            parts.public_prefix,
            parts.private_prefix,
        );
        let codes = CurrencyCodes::new(config.common_currencies.clone());
        Self {
            config,
            credentials,
            transport,
            nonce: Arc::new(NonceSource::new()),
            builder,
            routes: parts.routes,
            signer: parts.signer,
            classifier: parts.classifier,
            codes,
            markets: MarketCache::new(),
        }
    }

    /// Shares a nonce source with other adapters signing with the same key.
    pub fn with_nonce_source(mut self, nonce: Arc<NonceSource>) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    pub fn codes(&self) -> &CurrencyCodes {
        &self.codes
    }

    pub fn market_cache(&self) -> &MarketCache {
        &self.markets
    }

    /// The loaded market index. Callers load markets first.
    pub async fn index(&self) -> Option<Arc<MarketIndex>> {
        self.markets.current().await
    }

    /// Generic entry point: looks the endpoint up in the exchange's route table.
    pub async fn call(
        &self,
        api: ApiKind,
        method: HttpMethod,
        path: &str,
        params: Params,
    ) -> ExchangeResult<Value> {
        let route = self
            .routes
            .iter()
            .find(|r| r.api == api && r.method == method && r.path == path)
            .copied()
            .ok_or_else(|| ExchangeError::BadRequest {
                exchange: self.id().to_string(),
                reason: format!("unknown endpoint {} {}", method, path),
            })?;
        self.request(&route, params).await
    }

    pub async fn request(&self, route: &Route, params: Params) -> ExchangeResult<Value> {
        let built = self.builder.build(route, params)?;
        let mut signed = if route.is_private() {
            self.credentials.require(self.id())?;
            let context = SigningContext {
                nonce: self.nonce.next(),
                unique_id: Uuid::new_v4().to_string(),
            };
            self.signer.sign(built, &self.credentials, &context)?
        } else {
            unsigned(built)
        };
        signed.timeout = Some(Duration::from_millis(self.config.timeout_ms));

        debug!("{}: {} {}", self.id(), signed.method, signed.url);
        let response = self
            .transport
            .send(&signed)
            .await
            .map_err(|e| ExchangeError::Network {
                exchange: self.id().to_string(),
                reason: e.to_string(),
            })?;

        let body = if response.body.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str::<Value>(&response.body) {
                Ok(body) => body,
                Err(_) if response.status >= 400 => {
                    warn!("{}: HTTP {} with non-JSON body", self.id(), response.status);
                    return Err(ExchangeError::Exchange {
                        exchange: self.id().to_string(),
                        feedback: format!("{} {}", self.id(), response.body),
                    });
                }
                Err(e) => return Err(ExchangeError::bad_response(self.id(), e.to_string())),
            }
        };

        let context = ResponseContext {
            exchange: self.id(),
            status: response.status,
            body: &body,
            raw: &response.body,
        };
        if let Some(error) = self.classifier.classify(&context) {
            warn!("{}: {} {} failed: {}", self.id(), route.method, route.path, error);
            return Err(error);
        }
        if response.status >= 400 {
            warn!("{}: HTTP {} on {}", self.id(), response.status, route.path);
            return Err(ExchangeError::Exchange {
                exchange: self.id().to_string(),
                feedback: context.feedback(),
            });
        }
        Ok(body)
    }
}
