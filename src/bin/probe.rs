use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;
use unitrade::config::{ConfigLayer, Credentials, HttpSettings};
use unitrade::domain::market::Timeframe;
use unitrade::domain::ports::Exchange;
use unitrade::domain::values::Params;
use unitrade::infrastructure::core::HttpTransport;
use unitrade::infrastructure::{ExchangeFactory, ExchangeKind};

/// Queries one exchange through the unified interface and prints the
/// normalized result as JSON.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// bitso, ex876 or qtrade
    #[arg(short, long, default_value = "bitso")]
    exchange: ExchangeKind,

    /// TOML file layered over the exchange description
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List markets
    Markets,
    /// Print the adapter's capability flags
    Capabilities,
    /// Server time in epoch milliseconds
    Time,
    Ticker {
        symbol: String,
    },
    Book {
        symbol: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    Trades {
        symbol: String,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    Ohlcv {
        symbol: String,
        #[arg(short, long, default_value = "1h")]
        timeframe: Timeframe,
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Account balances (needs <EXCHANGE>_API_KEY and <EXCHANGE>_SECRET)
    Balance,
    /// Open orders (needs credentials)
    Orders {
        symbol: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli, exchange: Arc<dyn Exchange>) -> anyhow::Result<()> {
    match cli.command {
        Command::Markets => {
            let index = exchange.load_markets(false).await?;
            print_json(&index.markets())?;
        }
        Command::Capabilities => print_json(exchange.capabilities())?,
        Command::Time => print_json(&exchange.fetch_time(Params::new()).await?)?,
        Command::Ticker { symbol } => {
            print_json(&exchange.fetch_ticker(&symbol, Params::new()).await?)?
        }
        Command::Book { symbol, limit } => {
            print_json(&exchange.fetch_order_book(&symbol, limit, Params::new()).await?)?
        }
        Command::Trades { symbol, limit } => print_json(
            &exchange
                .fetch_trades(&symbol, None, limit, Params::new())
                .await?,
        )?,
        Command::Ohlcv {
            symbol,
            timeframe,
            limit,
        } => print_json(
            &exchange
                .fetch_ohlcv(&symbol, timeframe, None, limit, Params::new())
                .await?,
        )?,
        Command::Balance => print_json(&exchange.fetch_balance(Params::new()).await?)?,
        Command::Orders { symbol } => print_json(
            &exchange
                .fetch_open_orders(symbol.as_deref(), None, None, Params::new())
                .await?,
        )?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let overrides = cli
        .config
        .as_deref()
        .map(ConfigLayer::from_file)
        .transpose()
        .context("Failed to load config override file")?;
    let transport = Arc::new(HttpTransport::new(&HttpSettings::from_env()));
    let credentials = Credentials::from_env(cli.exchange.id());
    let exchange = ExchangeFactory::create(cli.exchange, transport, credentials, overrides)?;

    info!("Probing {}", exchange.id());
    run(cli, exchange).await
}
