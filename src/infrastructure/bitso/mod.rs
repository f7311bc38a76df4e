pub mod common;
pub mod errors;
pub mod exchange;
pub mod parsers;

pub use exchange::BitsoExchange;
