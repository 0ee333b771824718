//! StarKey Session CLI
//!
//! Drives a wallet session against a backend from the terminal, using a
//! local ed25519 wallet in place of the browser extension.

use clap::{Parser, Subcommand};
use starkey_session::config::PRIVATE_KEY_ENV;
use starkey_session::{
    Error, EventBus, HttpBackend, LocalWallet, ProviderSlot, Result, SessionConfig, WalletProvider,
    WalletSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "starkey-session")]
#[command(about = "StarKey wallet session manager")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect the local wallet and log in to the backend
    Login,

    /// Log in, then like a box
    Like {
        /// Box identifier
        box_id: String,
    },

    /// Log in, then apply wallet events read from stdin (one JSON message per line)
    Watch,

    /// Sign a message with the local wallet and verify it
    Sign {
        message: String,

        /// Nonce passed to the wallet
        #[arg(long, default_value = "12345")]
        nonce: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = match cli.config {
        Some(path) => SessionConfig::from_file(&path)?,
        None => SessionConfig::from_env(),
    };

    match cli.command {
        Commands::Login => {
            let session = start_session(config).await?;
            print_json(&session.state().await)?;
        }
        Commands::Like { box_id } => {
            let session = start_session(config).await?;
            let response = session.like_box(&box_id).await?;
            print_json(&response)?;
        }
        Commands::Watch => {
            let session = start_session(config).await?;
            run_watch(session).await?;
        }
        Commands::Sign { message, nonce } => {
            let wallet = LocalWallet::from_env(PRIVATE_KEY_ENV, &config.required_chain_id)?;
            wallet.connect().await?;
            let session = build_session(config, wallet)?;
            session.detect_extension().await;
            let signed = session
                .sign_message(&message, &nonce, None, true)
                .await?
                .ok_or(Error::NotConnected)?;
            print_json(&signed)?;
        }
        Commands::Config => {
            print_json(&config)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_session(config: SessionConfig, wallet: LocalWallet) -> Result<WalletSession> {
    tracing::info!(address = %wallet.address(), "Loaded local wallet");
    let backend = HttpBackend::new(config.backend.clone())?;
    let slot = ProviderSlot::with_provider(Arc::new(wallet));
    Ok(WalletSession::new(config, Arc::new(slot), Arc::new(backend)))
}

/// Build a session around the local wallet and log in
async fn start_session(config: SessionConfig) -> Result<WalletSession> {
    let wallet = LocalWallet::from_env(PRIVATE_KEY_ENV, &config.required_chain_id)?;
    let session = build_session(config, wallet)?;
    session.detect_extension().await;
    session.connect_wallet().await?;
    Ok(session)
}

async fn run_watch(session: WalletSession) -> Result<()> {
    let bus = EventBus::new();
    let listener = session.spawn_event_listener(&bus);
    let revalidation = session.spawn_revalidation();

    let mut notices = session.subscribe_notices();
    let printer = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            match serde_json::to_string(&notice) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode notice"),
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| Error::InvalidArgument(format!("stdin: {e}")))?
    {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(message) => {
                if bus.publish_message(&message).is_none() {
                    tracing::debug!(line = %line, "Not a StarKey event");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed event line"),
        }
    }

    drop(bus);
    if let Err(e) = listener.await {
        tracing::warn!(error = %e, "Event listener panicked");
    }
    revalidation.abort();
    let _ = revalidation.await;
    // Last handle: dropping it closes the notice channel and ends the printer
    drop(session);
    let _ = printer.await;
    Ok(())
}
