//! Bitso responses carry `success`; failures add `error.code`.

use crate::domain::errors::{ErrorKind, ExchangeError, ExchangeResult};
use crate::infrastructure::core::classifier::{ErrorClassifier, ExceptionTable, ResponseContext};
use serde_json::Value;

/// `0201` covers both bad credentials and stale nonces; `104` is the explicit
/// nonce-too-low code. They stay distinct.
pub const EXCEPTIONS: ExceptionTable = ExceptionTable::new(&[
    ("0201", ErrorKind::Authentication),
    ("104", ErrorKind::InvalidNonce),
]);

/// Boolean or its `"true"`/`"1"` aliases.
pub fn is_truthy(flag: &Value) -> bool {
    match flag {
        Value::Bool(b) => *b,
        Value::String(s) => s == "true" || s == "1",
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

pub struct BitsoClassifier;

impl ErrorClassifier for BitsoClassifier {
    fn classify(&self, response: &ResponseContext<'_>) -> Option<ExchangeError> {
        let flag = response.body.get("success")?;
        if is_truthy(flag) {
            return None;
        }
        let code = response
            .body
            .get("error")
            .filter(|error| !error.is_null())
            .and_then(|error| crate::domain::values::safe_string(error, "code"));
        Some(match code {
            Some(code) => EXCEPTIONS.error_for(&code, response),
            None => ErrorKind::Exchange.into_error(response.exchange, response.feedback()),
        })
    }
}

/// Applied to every response after classification: an absent or false
/// `success` flag is a generic failure.
pub fn ensure_success(exchange: &str, response: &Value) -> ExchangeResult<()> {
    if response.get("success").is_some_and(is_truthy) {
        return Ok(());
    }
    Err(ExchangeError::Exchange {
        exchange: exchange.to_string(),
        feedback: format!("{} {}", exchange, response),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify(body: Value) -> Option<ExchangeError> {
        let raw = body.to_string();
        BitsoClassifier.classify(&ResponseContext {
            exchange: "bitso",
            status: 200,
            body: &body,
            raw: &raw,
        })
    }

    #[test]
    fn test_success_aliases() {
        assert!(classify(json!({"success": true})).is_none());
        assert!(classify(json!({"success": "true"})).is_none());
        assert!(classify(json!({"success": "1"})).is_none());
        assert!(classify(json!({"payload": []})).is_none());
    }

    #[test]
    fn test_code_table() {
        let auth = classify(json!({"success": false, "error": {"code": "0201", "message": "Invalid Nonce or Invalid Credentials"}}));
        assert!(matches!(auth, Some(ExchangeError::Authentication { .. })));

        let nonce = classify(json!({"success": "false", "error": {"code": 104, "message": "nonce must be higher"}}));
        assert!(matches!(nonce, Some(ExchangeError::InvalidNonce { .. })));

        let other = classify(json!({"success": false, "error": {"code": "0301"}}));
        match other {
            Some(ExchangeError::Exchange { feedback, .. }) => {
                assert!(feedback.starts_with("bitso "));
                assert!(feedback.contains("0301"));
            }
            unexpected => panic!("unexpected {unexpected:?}"),
        }
    }

    #[test]
    fn test_missing_error_object_is_generic() {
        assert!(matches!(
            classify(json!({"success": false})),
            Some(ExchangeError::Exchange { .. })
        ));
    }

    #[test]
    fn test_secondary_check() {
        assert!(ensure_success("bitso", &json!({"success": true, "payload": {}})).is_ok());
        assert!(ensure_success("bitso", &json!({"payload": {}})).is_err());
        assert!(ensure_success("bitso", &json!({"success": false})).is_err());
    }
}
