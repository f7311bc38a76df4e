//! qTrade reports failures as `{"errors": [{"code": ..., "title": ...}]}`.

use crate::domain::errors::{ErrorKind, ExchangeError};
use crate::domain::values::{safe_array, safe_string};
use crate::infrastructure::core::classifier::{ErrorClassifier, ExceptionTable, ResponseContext};

pub const EXCEPTIONS: ExceptionTable = ExceptionTable::new(&[
    ("invalid_auth", ErrorKind::Authentication),
    ("insuff_funds", ErrorKind::InsufficientFunds),
]);

pub struct QtradeClassifier;

impl ErrorClassifier for QtradeClassifier {
    /// The first mapped code wins; a non-empty list without one is generic.
    fn classify(&self, response: &ResponseContext<'_>) -> Option<ExchangeError> {
        let errors = safe_array(response.body, "errors");
        if errors.is_empty() {
            return None;
        }
        let mapped = errors
            .iter()
            .filter_map(|error| safe_string(error, "code"))
            .find_map(|code| EXCEPTIONS.lookup(&code));
        Some(
            mapped
                .unwrap_or(ErrorKind::Exchange)
                .into_error(response.exchange, response.feedback()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn classify(body: Value) -> Option<ExchangeError> {
        let raw = body.to_string();
        QtradeClassifier.classify(&ResponseContext {
            exchange: "qtrade",
            status: 400,
            body: &body,
            raw: &raw,
        })
    }

    #[test]
    fn test_error_list() {
        assert!(matches!(
            classify(json!({"errors": [{"code": "invalid_auth", "title": "Invalid HMAC signature"}]})),
            Some(ExchangeError::Authentication { .. })
        ));
        assert!(matches!(
            classify(json!({"errors": [{"code": "odd"}, {"code": "insuff_funds"}]})),
            Some(ExchangeError::InsufficientFunds { .. })
        ));
        match classify(json!({"errors": [{"code": "odd"}]})) {
            Some(ExchangeError::Exchange { feedback, .. }) => assert!(feedback.starts_with("qtrade ")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_no_errors_passes() {
        assert!(classify(json!({"data": {}})).is_none());
        assert!(classify(json!({"errors": []})).is_none());
    }
}
