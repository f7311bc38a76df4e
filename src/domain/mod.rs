// Market metadata domain
pub mod market;

// Port interfaces
pub mod ports;

// Core trading domain
pub mod trading;

// Loosely-typed JSON accessors
pub mod values;

// Domain-specific error types
pub mod errors;
