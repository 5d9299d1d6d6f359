use std::net::SocketAddr;
use anyhow::{Context, Result};
use clap::Parser;
use game_protocol::enums::Framing;
use game_protocol::{Console, GameProtocolServer, ProtocolConfig, DEFAULT_ADDRESS};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hosts one game of tic-tac-toe, playing X from this terminal.
#[derive(Parser, Debug)]
#[command(name = "game_server", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "TICTACTOE_ADDR", default_value = DEFAULT_ADDRESS)]
    bind: SocketAddr,

    /// Wire framing, `legacy` or `tagged`. The client must use the same one
    #[arg(long, env = "TICTACTOE_FRAMING", default_value_t = Framing::Legacy)]
    framing: Framing,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut server = GameProtocolServer::new(ProtocolConfig::new(cli.bind, cli.framing));
    let result = server
        .start(Console::stdio())
        .with_context(|| format!("game hosted on {} failed", cli.bind))?;

    info!(?result, "Server exiting");
    Ok(())
}
