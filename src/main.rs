//! Paradex command line
//!
//! Credentials and environment come from `PARADEX_*` variables (or `.env`).
//!
//! Example: `paradex subscribe order_book market=ETH-USD-PERP depth=15 refresh_rate=100ms`

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use paradex_sdk::api::{callback, ChannelParams};
use paradex_sdk::config::logging::init_logging;
use paradex_sdk::{ClientConfig, Paradex, ParadexAccount, ParadexApiClient, ParadexWebsocketChannel};
use tokio::signal;
use tracing::info;

#[derive(Parser)]
#[command(name = "paradex")]
#[command(about = "Paradex account tools and WebSocket streaming", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive the L2 account address from PARADEX_* credentials
    Address,
    /// Print the venue's system config
    Config,
    /// Stream a WebSocket channel until Ctrl+C
    Subscribe {
        /// Channel kind (e.g. "bbo", "order_book", "fills")
        channel: ParadexWebsocketChannel,
        /// Channel parameters as key=value (e.g. market=BTC-USD-PERP)
        #[arg(value_parser = parse_key_val)]
        params: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = ClientConfig::from_env().context("Failed to load configuration")?;

    match cli.command {
        Command::Address => print_address(&config).await,
        Command::Config => print_system_config(&config).await,
        Command::Subscribe { channel, params } => {
            subscribe(config, channel, params.into_iter().collect()).await
        }
    }
}

fn parse_key_val(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

async fn print_address(config: &ClientConfig) -> anyhow::Result<()> {
    if config.credentials.is_empty() {
        bail!("Set PARADEX_L1_ADDRESS with PARADEX_L1_PRIVATE_KEY or PARADEX_L2_PRIVATE_KEY");
    }

    let api = ParadexApiClient::new(config);
    let system_config = api.fetch_system_config().await?;
    let account = ParadexAccount::from_credentials(&system_config, &config.credentials)?;

    println!("env:        {}", config.env);
    println!("address:    {}", account.address_hex());
    println!("public key: {}", account.public_key_hex());
    if let Some(l1_address) = account.l1_address() {
        println!("l1 address: {}", l1_address);
    }
    Ok(())
}

async fn print_system_config(config: &ClientConfig) -> anyhow::Result<()> {
    let api = ParadexApiClient::new(config);
    let system_config = api.fetch_system_config().await?;
    println!("{}", serde_json::to_string_pretty(&system_config)?);
    Ok(())
}

async fn subscribe(
    config: ClientConfig,
    channel: ParadexWebsocketChannel,
    params: ChannelParams,
) -> anyhow::Result<()> {
    let paradex = Paradex::with_config(config).await?;
    if channel.is_private() && paradex.account().is_none() {
        bail!("Channel '{}' is private and needs account credentials", channel);
    }

    let ws = paradex.ws_client();
    ws.connect().await?;

    let printer = callback(|_channel, message| async move {
        println!("{}", message["params"]["data"]);
    });
    let name = ws.subscribe(channel, &params, printer).await?;
    info!(channel = %name, "Streaming, press Ctrl+C to stop");

    signal::ctrl_c().await?;
    info!("[SHUTDOWN] Graceful shutdown initiated");
    ws.close().await;
    Ok(())
}
