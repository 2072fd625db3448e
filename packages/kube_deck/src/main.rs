//! Minimal terminal console around `deck_session`.
//!
//! Reads requests for the cluster agent from stdin, prints replies and
//! connection-state changes. The real UI is a browser; this binary is the
//! operational harness for the session layer.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use deck_session::{ConnectionState, LogEvent, Session, SessionConfig};

#[derive(Parser)]
#[command(name = "deck", about = "Chat console for the cluster agent backend")]
struct Cli {
    /// Backend base URL (overrides DECK_SERVER_URL)
    #[arg(long)]
    server: Option<String>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = SessionConfig::load()?;
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    eprintln!("kube_deck console — {}", config.server_url);
    eprintln!("Ask the cluster agent anything; /status for agent status, /quit to exit.");

    let session = Session::spawn(config);
    let mut store = session.store();
    let mut updates = session.subscribe();
    let mut last_state = store.snapshot().connection_state;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                match line {
                    "/quit" => break,
                    "/status" => {
                        if let Err(e) = session.request_status().await {
                            eprintln!("[status unavailable: {e}]");
                        }
                    }
                    // Empty input is dropped by the session without a turn.
                    _ => {
                        session.submit(line).await;
                    }
                }
            }

            changed = store.changed() => {
                if !changed {
                    break;
                }
                let state = store.snapshot().connection_state;
                if state != last_state {
                    last_state = state;
                    eprintln!("[{}]", state_label(state));
                }
            }

            update = updates.recv() => {
                if let Ok(LogEvent::Resolved { assistant, .. }) = update {
                    let turns = session.turns().await;
                    if let Some(turn) = turns.into_iter().find(|t| t.id == assistant) {
                        println!("agent> {}", turn.content);
                    }
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

fn state_label(state: ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "disconnected",
        ConnectionState::Connecting => "connecting",
        ConnectionState::Connected => "connected",
        ConnectionState::Reconnecting => "reconnecting",
    }
}
