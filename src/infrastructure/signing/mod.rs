//! Signature Engine: pluggable request-signing strategies.

pub mod digest_auth;
pub mod header_manifest;
pub mod nonce;
pub mod nonce_hmac;

pub use digest_auth::DigestAuthSigner;
pub use header_manifest::HeaderManifestSigner;
pub use nonce::NonceSource;
pub use nonce_hmac::NonceHmacSigner;

use crate::config::Credentials;
use crate::domain::errors::{ExchangeError, ExchangeResult};
use crate::domain::ports::SignedRequest;
use crate::infrastructure::core::request_builder::BuiltRequest;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Per-call values generated fresh before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// Strictly increasing across calls sharing a [`NonceSource`]; epoch millis.
    pub nonce: i64,
    /// Random id for schemes that sign a per-request unique header.
    pub unique_id: String,
}

/// Signs private requests of one exchange.
pub trait RequestSigner: Send + Sync {
    fn sign(
        &self,
        request: BuiltRequest,
        credentials: &Credentials,
        context: &SigningContext,
    ) -> ExchangeResult<SignedRequest>;
}

/// Raw HMAC-SHA256 of `payload` keyed by `secret`.
pub(crate) fn hmac_sha256(exchange: &str, secret: &str, payload: &str) -> ExchangeResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
        ExchangeError::BadRequest {
            exchange: exchange.to_string(),
            reason: format!("unusable secret: {}", e),
        }
    })?;
    mac.update(payload.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Unsigned passthrough used for public endpoints.
pub fn unsigned(request: BuiltRequest) -> SignedRequest {
    let mut headers = Vec::new();
    if request.body.is_some() {
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
    }
    SignedRequest {
        method: request.method,
        url: request.url(),
        headers,
        body: request.body,
        timeout: None,
    }
}
