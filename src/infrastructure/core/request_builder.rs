//! Turns a route template plus parameters into a concrete HTTP request.

use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::ports::HttpMethod;
use crate::domain::values::{Params, param_to_string};
use serde_json::Value;
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiKind {
    Public,
    Private,
}

/// One endpoint of an exchange API, e.g. `GET private orders/{oid}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub api: ApiKind,
    pub method: HttpMethod,
    pub path: &'static str,
}

impl Route {
    pub const fn public(method: HttpMethod, path: &'static str) -> Self {
        Self {
            api: ApiKind::Public,
            method,
            path,
        }
    }

    pub const fn private(method: HttpMethod, path: &'static str) -> Self {
        Self {
            api: ApiKind::Private,
            method,
            path,
        }
    }

    pub fn is_private(&self) -> bool {
        self.api == ApiKind::Private
    }
}

/// A built but unsigned request.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltRequest {
    pub api: ApiKind,
    pub method: HttpMethod,
    /// Scheme and authority, without a trailing slash.
    pub origin: String,
    /// Absolute path including the version prefix, e.g. `/v3/orders/123`.
    pub path: String,
    /// Url-encoded query string without the leading `?`.
    pub query: Option<String>,
    /// Serialized JSON body.
    pub body: Option<String>,
}

impl BuiltRequest {
    pub fn path_and_query(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.origin, self.path_and_query())
    }

    /// Host portion of the origin.
    pub fn host(&self) -> &str {
        let without_scheme = self
            .origin
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.origin);
        without_scheme.split('/').next().unwrap_or(without_scheme)
    }
}

/// Substitutes every `{name}` in `template` with the matching parameter and
/// removes it from `params`. An unbound placeholder fails the whole call.
pub fn implode_params(exchange: &str, template: &str, params: &mut Params) -> ExchangeResult<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        path.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            path.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let name = &after[..close];
        let value = params
            .shift_remove(name)
            .as_ref()
            .and_then(param_to_string)
            .ok_or_else(|| ExchangeError::ParameterMissing {
                exchange: exchange.to_string(),
                route: template.to_string(),
                name: name.to_string(),
            })?;
        path.push_str(&value);
        rest = &after[close + 1..];
    }
    path.push_str(rest);
    Ok(path)
}

/// Url-encodes the non-null parameters in insertion order.
pub fn urlencode(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if let Some(text) = param_to_string(value) {
            serializer.append_pair(key, &text);
        }
    }
    serializer.finish()
}

/// Builds requests against one exchange base URL.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    exchange: String,
    origin: String,
    public_prefix: String,
    private_prefix: String,
}

impl RequestBuilder {
    /// `public_prefix` and `private_prefix` are prepended to route paths, e.g.
    /// `/v1/` and `/v1/user/`.
    pub fn new(exchange: &str, origin: &str, public_prefix: &str, private_prefix: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            origin: origin.trim_end_matches('/').to_string(),
            public_prefix: public_prefix.to_string(),
            private_prefix: private_prefix.to_string(),
        }
    }

    /// Leftover parameters go to the query string for GET and to a JSON body
    /// otherwise. Nothing is emitted when no parameters are left.
    pub fn build(&self, route: &Route, mut params: Params) -> ExchangeResult<BuiltRequest> {
        let path = implode_params(&self.exchange, route.path, &mut params)?;
        let prefix = match route.api {
            ApiKind::Public => &self.public_prefix,
            ApiKind::Private => &self.private_prefix,
        };
        params.retain(|_, value| !value.is_null());

        let (query, body) = if params.is_empty() {
            (None, None)
        } else if route.method == HttpMethod::Get {
            (Some(urlencode(&params)), None)
        } else {
            let body = serde_json::to_string(&Value::Object(params)).map_err(|e| {
                ExchangeError::BadRequest {
                    exchange: self.exchange.clone(),
                    reason: e.to_string(),
                }
            })?;
            (None, Some(body))
        };

        Ok(BuiltRequest {
            api: route.api,
            method: route.method,
            origin: self.origin.clone(),
            path: format!("{}{}", prefix, path),
            query,
            body,
        })
    }
}
