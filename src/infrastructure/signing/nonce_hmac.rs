//! Nonce-concatenation HMAC.
//!
//! The signed payload is `nonce ++ METHOD ++ path[?query] [++ body]` and the
//! hex digest travels in `Authorization: <scheme> <key>:<nonce>:<signature>`.

use super::{RequestSigner, SigningContext, hmac_sha256};
use crate::config::Credentials;
use crate::domain::errors::ExchangeResult;
use crate::domain::ports::{HttpMethod, SignedRequest};
use crate::infrastructure::core::request_builder::BuiltRequest;

pub struct NonceHmacSigner {
    exchange: String,
    scheme: String,
}

impl NonceHmacSigner {
    pub fn new(exchange: &str, scheme: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
            scheme: scheme.to_string(),
        }
    }

    /// The exact string that gets signed.
    pub fn payload(request: &BuiltRequest, nonce: i64) -> String {
        let mut payload = format!(
            "{}{}{}",
            nonce,
            request.method.as_str(),
            request.path_and_query()
        );
        if request.method != HttpMethod::Get
            && let Some(body) = &request.body
        {
            payload.push_str(body);
        }
        payload
    }
}

impl RequestSigner for NonceHmacSigner {
    fn sign(
        &self,
        request: BuiltRequest,
        credentials: &Credentials,
        context: &SigningContext,
    ) -> ExchangeResult<SignedRequest> {
        let (api_key, secret) = credentials.require(&self.exchange)?;
        let payload = Self::payload(&request, context.nonce);
        let signature = hex::encode(hmac_sha256(&self.exchange, secret, &payload)?);

        let headers = vec![
            (
                "Authorization".to_string(),
                format!("{} {}:{}:{}", self.scheme, api_key, context.nonce, signature),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];

        Ok(SignedRequest {
            method: request.method,
            url: request.url(),
            headers,
            body: request.body,
            timeout: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::core::request_builder::ApiKind;

    fn request(method: HttpMethod, path: &str, query: Option<&str>, body: Option<&str>) -> BuiltRequest {
        BuiltRequest {
            api: ApiKind::Private,
            method,
            origin: "https://api.bitso.com".to_string(),
            path: path.to_string(),
            query: query.map(str::to_string),
            body: body.map(str::to_string),
        }
    }

    fn context(nonce: i64) -> SigningContext {
        SigningContext {
            nonce,
            unique_id: String::new(),
        }
    }

    #[test]
    fn test_payload_layout() {
        let get = request(HttpMethod::Get, "/v3/balance", Some("book=btc_mxn"), None);
        assert_eq!(NonceHmacSigner::payload(&get, 1000), "1000GET/v3/balance?book=btc_mxn");

        let post = request(HttpMethod::Post, "/v3/orders", None, Some(r#"{"book":"btc_mxn"}"#));
        assert_eq!(
            NonceHmacSigner::payload(&post, 1001),
            r#"1001POST/v3/orders{"book":"btc_mxn"}"#
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = NonceHmacSigner::new("bitso", "Bitso");
        let creds = Credentials::new("key", "secret");
        let a = signer
            .sign(request(HttpMethod::Get, "/v3/balance", None, None), &creds, &context(1))
            .unwrap();
        let b = signer
            .sign(request(HttpMethod::Get, "/v3/balance", None, None), &creds, &context(1))
            .unwrap();
        assert_eq!(a, b);

        let auth = a.header("Authorization").unwrap();
        assert!(auth.starts_with("Bitso key:1:"));
        let expected = hex::encode(hmac_sha256("bitso", "secret", "1GET/v3/balance").unwrap());
        assert_eq!(auth, format!("Bitso key:1:{}", expected));
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn test_signature_changes_with_nonce() {
        let signer = NonceHmacSigner::new("bitso", "Bitso");
        let creds = Credentials::new("key", "secret");
        let a = signer
            .sign(request(HttpMethod::Get, "/v3/balance", None, None), &creds, &context(1))
            .unwrap();
        let b = signer
            .sign(request(HttpMethod::Get, "/v3/balance", None, None), &creds, &context(2))
            .unwrap();
        assert_ne!(a.header("Authorization"), b.header("Authorization"));
    }

    #[test]
    fn test_missing_secret_fails_fast() {
        let signer = NonceHmacSigner::new("bitso", "Bitso");
        let result = signer.sign(
            request(HttpMethod::Get, "/v3/balance", None, None),
            &Credentials::new("key", ""),
            &context(1),
        );
        assert!(result.is_err());
    }
}
