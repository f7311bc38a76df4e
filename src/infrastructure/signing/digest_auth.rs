//! Timestamped SHA-256 digest over the request and the secret itself.
//!
//! `hash = base64(sha256(METHOD \n path[?query] \n timestamp \n body \n secret))`,
//! sent as `Authorization: HMAC-SHA256 <key>:<hash>` plus `HMAC-Timestamp`.
//! Only POST bodies are covered; a POST without parameters carries `{}`.

use super::{RequestSigner, SigningContext};
use crate::config::Credentials;
use crate::domain::errors::ExchangeResult;
use crate::domain::ports::{HttpMethod, SignedRequest};
use crate::infrastructure::core::request_builder::BuiltRequest;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

pub struct DigestAuthSigner {
    exchange: String,
}

impl DigestAuthSigner {
    pub fn new(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
        }
    }

    pub fn digest(request: &BuiltRequest, timestamp: i64, secret: &str) -> String {
        let body = match request.method {
            HttpMethod::Post => request.body.as_deref().unwrap_or(""),
            _ => "",
        };
        let auth = [
            request.method.as_str(),
            &request.path_and_query(),
            &timestamp.to_string(),
            body,
            secret,
        ]
        .join("\n");
        STANDARD.encode(Sha256::digest(auth.as_bytes()))
    }
}

impl RequestSigner for DigestAuthSigner {
    fn sign(
        &self,
        mut request: BuiltRequest,
        credentials: &Credentials,
        context: &SigningContext,
    ) -> ExchangeResult<SignedRequest> {
        let (api_key, secret) = credentials.require(&self.exchange)?;
        if request.method == HttpMethod::Post && request.body.is_none() {
            request.body = Some("{}".to_string());
        }
        let hash = Self::digest(&request, context.nonce, secret);

        let mut headers = vec![
            (
                "Authorization".to_string(),
                format!("HMAC-SHA256 {}:{}", api_key, hash),
            ),
            ("HMAC-Timestamp".to_string(), context.nonce.to_string()),
        ];
        if request.method == HttpMethod::Post {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }

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

    fn balances() -> BuiltRequest {
        BuiltRequest {
            api: ApiKind::Private,
            method: HttpMethod::Get,
            origin: "https://api.qtrade.io".to_string(),
            path: "/v1/user/balances".to_string(),
            query: None,
            body: None,
        }
    }

    #[test]
    fn test_digest_matches_manual_computation() {
        let expected = STANDARD.encode(Sha256::digest(
            "GET\n/v1/user/balances\n1000\n\nsecret".as_bytes(),
        ));
        assert_eq!(DigestAuthSigner::digest(&balances(), 1000, "secret"), expected);
    }

    #[test]
    fn test_headers() {
        let signer = DigestAuthSigner::new("qtrade");
        let context = SigningContext {
            nonce: 1000,
            unique_id: String::new(),
        };
        let signed = signer
            .sign(balances(), &Credentials::new("7", "secret"), &context)
            .unwrap();
        assert!(signed.header("Authorization").unwrap().starts_with("HMAC-SHA256 7:"));
        assert_eq!(signed.header("HMAC-Timestamp"), Some("1000"));
        assert_eq!(signed.header("Content-Type"), None);
        assert_eq!(signed.url, "https://api.qtrade.io/v1/user/balances");
        assert_eq!(signed.body, None);
    }

    #[test]
    fn test_empty_post_signs_and_sends_empty_object() {
        let request = BuiltRequest {
            method: HttpMethod::Post,
            path: "/v1/user/cancel_all".to_string(),
            ..balances()
        };
        let signer = DigestAuthSigner::new("qtrade");
        let context = SigningContext {
            nonce: 1000,
            unique_id: String::new(),
        };
        let signed = signer
            .sign(request, &Credentials::new("7", "secret"), &context)
            .unwrap();
        let expected = STANDARD.encode(Sha256::digest(
            "POST\n/v1/user/cancel_all\n1000\n{}\nsecret".as_bytes(),
        ));
        assert_eq!(signed.body.as_deref(), Some("{}"));
        assert_eq!(
            signed.header("Authorization"),
            Some(format!("HMAC-SHA256 7:{}", expected).as_str())
        );
        assert_eq!(signed.header("Content-Type"), Some("application/json"));
    }
}
