//! Configuration for unitrade.
//!
//! Exchange descriptions are layered structs resolved once per adapter;
//! credentials and HTTP client settings come from environment variables.

mod credentials;
mod exchange_config;

pub use credentials::{Credentials, HttpSettings};
pub use exchange_config::{ConfigLayer, ExchangeConfig, FeeLayer, TradingFees};
