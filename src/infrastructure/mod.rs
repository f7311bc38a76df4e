pub mod bitso;
pub mod core;
pub mod ex876;
pub mod factory;
pub mod mock;
pub mod qtrade;
pub mod signing;

pub use factory::{ExchangeFactory, ExchangeKind};
pub use mock::MockTransport;
