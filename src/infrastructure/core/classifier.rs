//! Error Classifier seam and the code-table helper adapters build on.

use crate::domain::errors::{ErrorKind, ExchangeError};
use serde_json::Value;

/// What a classifier gets to look at.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    pub exchange: &'a str,
    pub status: u16,
    pub body: &'a Value,
    pub raw: &'a str,
}

impl ResponseContext<'_> {
    /// `"<exchange> <raw body>"`, attached to every response-derived error.
    pub fn feedback(&self) -> String {
        format!("{} {}", self.exchange, self.raw)
    }
}

/// Maps a response onto the error taxonomy. `None` lets it through.
pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, response: &ResponseContext<'_>) -> Option<ExchangeError>;
}

/// Static exact-match table of exchange error codes.
#[derive(Debug, Clone, Copy)]
pub struct ExceptionTable {
    exact: &'static [(&'static str, ErrorKind)],
}

impl ExceptionTable {
    pub const fn new(exact: &'static [(&'static str, ErrorKind)]) -> Self {
        Self { exact }
    }

    pub fn lookup(&self, code: &str) -> Option<ErrorKind> {
        self.exact
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, kind)| *kind)
    }

    /// The mapped error, or the generic exchange error for unknown codes.
    pub fn error_for(&self, code: &str, response: &ResponseContext<'_>) -> ExchangeError {
        self.lookup(code)
            .unwrap_or(ErrorKind::Exchange)
            .into_error(response.exchange, response.feedback())
    }
}
