use crate::config::{ConfigLayer, Credentials};
use crate::domain::ports::{Exchange, Transport};
use crate::infrastructure::bitso::BitsoExchange;
use crate::infrastructure::ex876::Ex876Exchange;
use crate::infrastructure::qtrade::QtradeExchange;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Exchanges this crate ships an adapter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    Bitso,
    Ex876,
    Qtrade,
}

impl ExchangeKind {
    pub const ALL: [ExchangeKind; 3] = [ExchangeKind::Bitso, ExchangeKind::Ex876, ExchangeKind::Qtrade];

    pub fn id(&self) -> &'static str {
        match self {
            ExchangeKind::Bitso => "bitso",
            ExchangeKind::Ex876 => "ex876",
            ExchangeKind::Qtrade => "qtrade",
        }
    }
}

impl fmt::Display for ExchangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExchangeKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitso" => Ok(ExchangeKind::Bitso),
            "ex876" | "876ex" => Ok(ExchangeKind::Ex876),
            "qtrade" => Ok(ExchangeKind::Qtrade),
            _ => anyhow::bail!(
                "Unknown exchange: {}. Must be one of 'bitso', 'ex876', 'qtrade'",
                s
            ),
        }
    }
}

pub struct ExchangeFactory;

impl ExchangeFactory {
    /// Builds the adapter for `kind` over `transport`. `overrides` is the
    /// user layer merged on top of the adapter's own description.
    pub fn create(
        kind: ExchangeKind,
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        overrides: Option<ConfigLayer>,
    ) -> anyhow::Result<Arc<dyn Exchange>> {
        info!(
            "ExchangeFactory: creating {} adapter (credentials configured: {})",
            kind,
            credentials.is_configured()
        );
        let exchange: Arc<dyn Exchange> = match kind {
            ExchangeKind::Bitso => Arc::new(BitsoExchange::new(transport, credentials, overrides)?),
            ExchangeKind::Ex876 => Arc::new(Ex876Exchange::new(transport, credentials, overrides)?),
            ExchangeKind::Qtrade => {
                Arc::new(QtradeExchange::new(transport, credentials, overrides)?)
            }
        };
        Ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockTransport;

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Bitso".parse::<ExchangeKind>().unwrap(), ExchangeKind::Bitso);
        assert_eq!("876ex".parse::<ExchangeKind>().unwrap(), ExchangeKind::Ex876);
        assert!("kraken".parse::<ExchangeKind>().is_err());
    }

    #[test]
    fn test_create_every_kind() {
        for kind in ExchangeKind::ALL {
            let exchange = ExchangeFactory::create(
                kind,
                Arc::new(MockTransport::new()),
                Credentials::default(),
                None,
            )
            .unwrap();
            assert_eq!(exchange.id(), kind.id());
            assert!(exchange.capabilities().fetch_markets);
        }
    }
}
