use thiserror::Error;

/// Errors surfaced by exchange adapters.
///
/// Every variant names the adapter that raised it. Variants derived from an
/// exchange response carry `feedback`: the adapter id followed by the
/// serialized response body.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("Authentication failed: {feedback}")]
    Authentication { exchange: String, feedback: String },

    #[error("Invalid nonce: {feedback}")]
    InvalidNonce { exchange: String, feedback: String },

    #[error("{exchange}: order not found: {detail}")]
    OrderNotFound { exchange: String, detail: String },

    #[error("Insufficient funds: {feedback}")]
    InsufficientFunds { exchange: String, feedback: String },

    #[error("{exchange}: invalid order: {reason}")]
    InvalidOrder { exchange: String, reason: String },

    #[error("{exchange}: invalid address {address:?}")]
    InvalidAddress { exchange: String, address: String },

    #[error("Exchange error: {feedback}")]
    Exchange { exchange: String, feedback: String },

    #[error("{exchange} {operation}: {reason}")]
    ParameterUnsupported {
        exchange: String,
        operation: String,
        reason: String,
    },

    #[error("{exchange}: route {route} requires parameter {name:?}")]
    ParameterMissing {
        exchange: String,
        route: String,
        name: String,
    },

    #[error("{exchange}: bad request: {reason}")]
    BadRequest { exchange: String, reason: String },

    #[error("{exchange}: {field} is required for private endpoints")]
    MissingCredentials { exchange: String, field: &'static str },

    #[error("{exchange}: unknown symbol {symbol}")]
    BadSymbol { exchange: String, symbol: String },

    #[error("{exchange}: malformed response: {reason}")]
    BadResponse { exchange: String, reason: String },

    #[error("{exchange} does not support {feature}")]
    NotSupported { exchange: String, feature: String },

    #[error("{exchange}: network failure: {reason}")]
    Network { exchange: String, reason: String },
}

pub type ExchangeResult<T> = Result<T, ExchangeError>;

impl ExchangeError {
    /// The adapter id the error originated from.
    pub fn exchange(&self) -> &str {
        match self {
            ExchangeError::Authentication { exchange, .. }
            | ExchangeError::InvalidNonce { exchange, .. }
            | ExchangeError::OrderNotFound { exchange, .. }
            | ExchangeError::InsufficientFunds { exchange, .. }
            | ExchangeError::InvalidOrder { exchange, .. }
            | ExchangeError::InvalidAddress { exchange, .. }
            | ExchangeError::Exchange { exchange, .. }
            | ExchangeError::ParameterUnsupported { exchange, .. }
            | ExchangeError::ParameterMissing { exchange, .. }
            | ExchangeError::BadRequest { exchange, .. }
            | ExchangeError::MissingCredentials { exchange, .. }
            | ExchangeError::BadSymbol { exchange, .. }
            | ExchangeError::BadResponse { exchange, .. }
            | ExchangeError::NotSupported { exchange, .. }
            | ExchangeError::Network { exchange, .. } => exchange,
        }
    }

    pub fn not_supported(exchange: &str, feature: &str) -> Self {
        ExchangeError::NotSupported {
            exchange: exchange.to_string(),
            feature: feature.to_string(),
        }
    }

    pub fn bad_response(exchange: &str, reason: impl Into<String>) -> Self {
        ExchangeError::BadResponse {
            exchange: exchange.to_string(),
            reason: reason.into(),
        }
    }
}

/// Data-only error category used by the static code tables of each adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    InvalidNonce,
    InsufficientFunds,
    InvalidOrder,
    OrderNotFound,
    BadRequest,
    Exchange,
}

impl ErrorKind {
    /// Builds the error for this category. `feedback` is the adapter id plus the
    /// serialized response that triggered it.
    pub fn into_error(self, exchange: &str, feedback: String) -> ExchangeError {
        let exchange = exchange.to_string();
        match self {
            ErrorKind::Authentication => ExchangeError::Authentication { exchange, feedback },
            ErrorKind::InvalidNonce => ExchangeError::InvalidNonce { exchange, feedback },
            ErrorKind::InsufficientFunds => ExchangeError::InsufficientFunds { exchange, feedback },
            ErrorKind::InvalidOrder => ExchangeError::InvalidOrder {
                exchange,
                reason: feedback,
            },
            ErrorKind::OrderNotFound => ExchangeError::OrderNotFound {
                exchange,
                detail: feedback,
            },
            ErrorKind::BadRequest => ExchangeError::BadRequest {
                exchange,
                reason: feedback,
            },
            ErrorKind::Exchange => ExchangeError::Exchange { exchange, feedback },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_materializes_matching_variant() {
        let err = ErrorKind::InvalidNonce.into_error("bitso", "bitso {\"success\":false}".into());
        assert!(matches!(err, ExchangeError::InvalidNonce { .. }));
        assert_eq!(err.exchange(), "bitso");
        assert!(err.to_string().contains("success"));
    }

    #[test]
    fn test_parameter_unsupported_formatting() {
        let err = ExchangeError::ParameterUnsupported {
            exchange: "bitso".to_string(),
            operation: "fetchMyTrades".to_string(),
            reason: "use the marker param".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("bitso"));
        assert!(msg.contains("fetchMyTrades"));
    }
}
