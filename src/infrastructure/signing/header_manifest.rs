//! Header-manifest HMAC.
//!
//! Every `API-*` header except the signature itself is rendered as an
//! upper-cased `KEY: VALUE` line, sorted, and signed together with the method,
//! host, path and body. The per-request unique id is generated by the caller
//! and used both in the manifest and on the wire.

use super::{RequestSigner, SigningContext, hmac_sha256};
use crate::config::Credentials;
use crate::domain::errors::ExchangeResult;
use crate::domain::ports::SignedRequest;
use crate::infrastructure::core::request_builder::BuiltRequest;

pub struct HeaderManifestSigner {
    exchange: String,
}

impl HeaderManifestSigner {
    pub fn new(exchange: &str) -> Self {
        Self {
            exchange: exchange.to_string(),
        }
    }

    /// Headers covered by the signature, in wire spelling.
    pub fn signed_headers(api_key: &str, context: &SigningContext) -> Vec<(String, String)> {
        vec![
            ("API-Key".to_string(), api_key.to_string()),
            ("API-Signature-Method".to_string(), "HmacSHA256".to_string()),
            ("API-Signature-Version".to_string(), "1".to_string()),
            ("API-Timestamp".to_string(), context.nonce.to_string()),
            ("API-Unique-ID".to_string(), context.unique_id.clone()),
        ]
    }

    /// Newline-joined manifest: method, host, path[?query], sorted header lines, body.
    pub fn manifest(request: &BuiltRequest, headers: &[(String, String)]) -> String {
        let mut lines: Vec<String> = headers
            .iter()
            .map(|(key, value)| format!("{}: {}", key.to_uppercase(), value))
            .collect();
        lines.sort();

        let mut parts = vec![
            request.method.as_str().to_string(),
            request.host().to_string(),
            request.path_and_query(),
        ];
        parts.extend(lines);
        parts.push(request.body.clone().unwrap_or_default());
        parts.join("\n")
    }
}

impl RequestSigner for HeaderManifestSigner {
    fn sign(
        &self,
        request: BuiltRequest,
        credentials: &Credentials,
        context: &SigningContext,
    ) -> ExchangeResult<SignedRequest> {
        let (api_key, secret) = credentials.require(&self.exchange)?;
        let mut headers = Self::signed_headers(api_key, context);
        let manifest = Self::manifest(&request, &headers);
        let signature = hex::encode(hmac_sha256(&self.exchange, secret, &manifest)?);

        headers.push(("API-Signature".to_string(), signature));
        if request.body.is_some() {
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
    use crate::domain::ports::HttpMethod;
    use crate::infrastructure::core::request_builder::ApiKind;

    fn order_request() -> BuiltRequest {
        BuiltRequest {
            api: ApiKind::Private,
            method: HttpMethod::Post,
            origin: "https://api.876ex.com".to_string(),
            path: "/v1/spots/orders".to_string(),
            query: None,
            body: Some(r#"{"symbol":"BTC_USDT"}"#.to_string()),
        }
    }

    fn context() -> SigningContext {
        SigningContext {
            nonce: 1_560_000_000_000,
            unique_id: "c0ffee".to_string(),
        }
    }

    #[test]
    fn test_manifest_layout() {
        let headers = HeaderManifestSigner::signed_headers("key", &context());
        let manifest = HeaderManifestSigner::manifest(&order_request(), &headers);
        let expected = [
            "POST",
            "api.876ex.com",
            "/v1/spots/orders",
            "API-KEY: key",
            "API-SIGNATURE-METHOD: HmacSHA256",
            "API-SIGNATURE-VERSION: 1",
            "API-TIMESTAMP: 1560000000000",
            "API-UNIQUE-ID: c0ffee",
            r#"{"symbol":"BTC_USDT"}"#,
        ]
        .join("\n");
        assert_eq!(manifest, expected);
    }

    #[test]
    fn test_unique_id_reused_on_the_wire() {
        let signer = HeaderManifestSigner::new("ex876");
        let signed = signer
            .sign(order_request(), &Credentials::new("key", "secret"), &context())
            .unwrap();
        assert_eq!(signed.header("API-Unique-ID"), Some("c0ffee"));
        assert_eq!(signed.header("API-Timestamp"), Some("1560000000000"));
        assert_eq!(signed.header("API-Signature").map(str::len), Some(64));
        assert_eq!(signed.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_unique_id_changes_signature() {
        let signer = HeaderManifestSigner::new("ex876");
        let creds = Credentials::new("key", "secret");
        let a = signer.sign(order_request(), &creds, &context()).unwrap();
        let mut other = context();
        other.unique_id = "deadbeef".to_string();
        let b = signer.sign(order_request(), &creds, &other).unwrap();
        assert_ne!(a.header("API-Signature"), b.header("API-Signature"));
    }
}
