//! Ex876 failures are `{"error": CODE, "message": ...}`, usually with a 4xx status.

use crate::domain::errors::{ErrorKind, ExchangeError};
use crate::domain::values::safe_string;
use crate::infrastructure::core::classifier::{ErrorClassifier, ExceptionTable, ResponseContext};

pub const EXCEPTIONS: ExceptionTable = ExceptionTable::new(&[
    ("AUTH_SIGNATURE_INVALID", ErrorKind::Authentication),
    ("AUTH_APIKEY_INVALID", ErrorKind::Authentication),
    ("AUTH_APIKEY_DISABLED", ErrorKind::Authentication),
    ("AUTH_IP_FORBIDDEN", ErrorKind::Authentication),
    ("AUTH_AUTHORIZATION_INVALID", ErrorKind::Authentication),
    ("AUTH_SIGNIN_REQUIRED", ErrorKind::Authentication),
    ("AUTH_TIMESTAMP_INVALID", ErrorKind::InvalidNonce),
    ("ORDER_NOT_FOUND", ErrorKind::OrderNotFound),
    ("INSUFFICIENT_BALANCE", ErrorKind::InsufficientFunds),
    ("ORDER_INVALID_QUANTITY", ErrorKind::InvalidOrder),
    ("ORDER_INVALID_PRICE", ErrorKind::InvalidOrder),
    ("PARAMETER_INVALID", ErrorKind::BadRequest),
    ("SYMBOL_NOT_FOUND", ErrorKind::BadRequest),
]);

pub struct Ex876Classifier;

impl ErrorClassifier for Ex876Classifier {
    fn classify(&self, response: &ResponseContext<'_>) -> Option<ExchangeError> {
        let code = safe_string(response.body, "error")?;
        Some(EXCEPTIONS.error_for(&code, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn classify(status: u16, body: Value) -> Option<ExchangeError> {
        let raw = body.to_string();
        Ex876Classifier.classify(&ResponseContext {
            exchange: "ex876",
            status,
            body: &body,
            raw: &raw,
        })
    }

    #[test]
    fn test_codes() {
        assert!(matches!(
            classify(401, json!({"error": "AUTH_APIKEY_INVALID", "message": "bad key"})),
            Some(ExchangeError::Authentication { .. })
        ));
        assert!(matches!(
            classify(400, json!({"error": "AUTH_TIMESTAMP_INVALID"})),
            Some(ExchangeError::InvalidNonce { .. })
        ));
        assert!(matches!(
            classify(400, json!({"error": "INSUFFICIENT_BALANCE"})),
            Some(ExchangeError::InsufficientFunds { .. })
        ));
        assert!(matches!(
            classify(400, json!({"error": "SOMETHING_NEW"})),
            Some(ExchangeError::Exchange { .. })
        ));
    }

    #[test]
    fn test_payloads_pass() {
        assert!(classify(200, json!([{"symbol": "BTC_USDT"}])).is_none());
        assert!(classify(200, json!({"id": "1", "error": null})).is_none());
    }
}
