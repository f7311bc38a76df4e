pub mod classifier;
pub mod exchange_core;
pub mod http_client_factory;
pub mod normalize;
pub mod request_builder;
pub mod transport;

pub use classifier::{ErrorClassifier, ExceptionTable, ResponseContext};
pub use exchange_core::{AdapterParts, ExchangeCore};
pub use http_client_factory::HttpClientFactory;
pub use normalize::ParseContext;
pub use request_builder::{ApiKind, BuiltRequest, RequestBuilder, Route};
pub use transport::HttpTransport;
