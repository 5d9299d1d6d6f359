use std::net::SocketAddr;
use anyhow::{Context, Result};
use clap::Parser;
use game_protocol::enums::Framing;
use game_protocol::{Console, GameProtocolClient, ProtocolConfig, DEFAULT_ADDRESS};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Joins a tic-tac-toe server and plays O from this terminal.
#[derive(Parser, Debug)]
#[command(name = "game_client", version)]
struct Cli {
    /// Server address to connect to
    #[arg(long, env = "TICTACTOE_ADDR", default_value = DEFAULT_ADDRESS)]
    server: SocketAddr,

    /// Wire framing, `legacy` or `tagged`. Must match the server
    #[arg(long, env = "TICTACTOE_FRAMING", default_value_t = Framing::Legacy)]
    framing: Framing,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut client = GameProtocolClient::new(ProtocolConfig::new(cli.server, cli.framing));
    let result = client
        .start(Console::stdio())
        .with_context(|| format!("game with server {} failed", cli.server))?;

    info!(?result, "Client exiting");
    Ok(())
}
