mod client;

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use burnlink_server::{seal, ProtocolError, Reveal};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use zeroize::Zeroizing;

use crate::client::HttpChannel;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "burnlink", about = "Share a secret through a link that works once", version)]
struct Cli {
    /// API server URL (default: http://localhost:3001 or $BURNLINK_SERVER)
    #[arg(long, env = "BURNLINK_SERVER", default_value = "http://localhost:3001")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (default: $BURNLINK_PORT or 3001)
        #[arg(long, env = "BURNLINK_PORT", default_value = "3001")]
        port: u16,
        /// Host to bind (default: $BURNLINK_HOST or 0.0.0.0)
        #[arg(long, env = "BURNLINK_HOST", default_value = "0.0.0.0")]
        host: String,
    },
    /// Encrypt a secret, store it, and print the one-time link
    Send {
        /// The secret; read from stdin when omitted
        secret: Option<String>,
        /// Base URL for the printed link (default: the server URL or $BURNLINK_ORIGIN)
        #[arg(long, env = "BURNLINK_ORIGIN")]
        origin: Option<String>,
    },
    /// Fetch and decrypt the secret behind a link. Works once.
    Open {
        /// The full link, including the part after '#'
        link: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("BURNLINK_LOG_LEVEL")
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Serve { port, host } => cmd_serve(host, port).await,
        Commands::Send { secret, origin } => {
            let origin = origin.unwrap_or_else(|| cli.server.clone());
            cmd_send(&cli.server, &origin, secret).await
        }
        Commands::Open { link } => cmd_open(&cli.server, &link).await,
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_serve(host: String, port: u16) -> Result<()> {
    let cfg = burnlink_server::ServerConfig {
        host,
        port,
        ..Default::default()
    };
    burnlink_server::run(cfg).await
}

async fn cmd_send(server: &str, origin: &str, secret: Option<String>) -> Result<()> {
    let secret = Zeroizing::new(match secret {
        Some(s) => s,
        None => read_stdin()?,
    });

    let channel = HttpChannel::new(server)?;
    let link = seal(&secret, origin, &channel)
        .await
        .map_err(user_facing)?;
    println!("{link}");
    Ok(())
}

async fn cmd_open(server: &str, link: &str) -> Result<()> {
    let channel = HttpChannel::new(server)?;
    let mut reveal = Reveal::new();
    let plaintext = reveal.open(link.trim(), &channel).await.map_err(user_facing)?;
    println!("{plaintext}");
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn read_stdin() -> Result<String> {
    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter the secret, then press Ctrl-D:");
    }
    let mut buf = String::new();
    stdin.read_to_string(&mut buf).context("read secret from stdin")?;
    // Drop exactly one trailing newline added by `echo` or the terminal.
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(buf)
}

/// Log the precise failure, show the person the safe version.
fn user_facing(e: ProtocolError) -> anyhow::Error {
    tracing::debug!(error = %e, "operation failed");
    anyhow::anyhow!(e.user_message())
}
