//! Touchpoint client: entry point.
//!
//! Reads local input events, classifies touch gestures and keyboard commands,
//! and drives a remote pointer receiver over a WebSocket control channel.
//!
//! # Usage
//!
//! ```text
//! touchpoint [OPTIONS]
//!
//! Options:
//!   --config     <PATH>   Config file [default: platform config dir]
//!   --host       <HOST>   Receiver hostname or IP
//!   --port       <PORT>   Receiver WebSocket port
//!   --path       <PATH>   Receiver WebSocket path
//!   --start-key  <CODE>   Key that starts a keyboard session (e.g. KeyE)
//!   --log-level  <LEVEL>  Log level when RUST_LOG is unset
//!   --keyboard-start      Start a keyboard session right away
//!   --write-config        Write the effective config to --config and exit
//! ```
//!
//! Input events are read from stdin as JSON lines, one event per line:
//!
//! ```text
//! {"type":"KeyDown","code":"KeyE"}
//! {"type":"TouchStart","x":10,"y":10}
//! ```
//!
//! # Precedence
//!
//! CLI flags (or their `TOUCHPOINT_*` environment variables) override the
//! config file, which overrides the built-in defaults.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use touchpoint_client::application::{Activation, InputSession};
use touchpoint_client::infrastructure::storage::config::{
    config_file_path, load_config, load_config_from, save_config, AppConfig,
};
use touchpoint_client::infrastructure::{LogDisplay, StdinInputSource, WsConnector};
use touchpoint_core::KeyCode;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Touch and keyboard remote pointer client.
#[derive(Debug, Parser)]
#[command(
    name = "touchpoint",
    about = "Turns touch gestures and keys into remote pointer control messages",
    version
)]
struct Cli {
    /// Path to the TOML config file.
    ///
    /// Defaults to `config.toml` in the platform config directory.  A missing
    /// file is not an error; built-in defaults apply.
    #[arg(long, env = "TOUCHPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Receiver hostname or IP address.
    #[arg(long, env = "TOUCHPOINT_HOST")]
    host: Option<String>,

    /// Receiver WebSocket port.
    #[arg(long, env = "TOUCHPOINT_PORT")]
    port: Option<u16>,

    /// Receiver WebSocket endpoint path.
    #[arg(long, env = "TOUCHPOINT_PATH")]
    path: Option<String>,

    /// Key code that starts a keyboard session.
    #[arg(long, env = "TOUCHPOINT_START_KEY")]
    start_key: Option<KeyCode>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "TOUCHPOINT_LOG_LEVEL")]
    log_level: Option<String>,

    /// Start a keyboard session immediately, as if the start key was pressed.
    #[arg(long, env = "TOUCHPOINT_KEYBOARD_START")]
    keyboard_start: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    /// Loads the config file named by `--config`, or the default one.
    fn load(&self) -> anyhow::Result<AppConfig> {
        match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => load_config().context("failed to load the default config file"),
        }
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("cannot locate the config directory"),
        }
    }

    /// Applies CLI overrides on top of a loaded config.
    fn apply_to(&self, mut config: AppConfig) -> AppConfig {
        if let Some(host) = &self.host {
            config.network.host = host.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
        if let Some(path) = &self.path {
            config.network.path = path.clone();
        }
        if let Some(code) = self.start_key {
            config.input.start_shortcut = code;
        }
        if let Some(level) = &self.log_level {
            config.client.log_level = level.clone();
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Parse the CLI and load the config file (defaults if absent).
/// 2. Initialise `tracing`; `RUST_LOG` wins over the configured level.
/// 3. Spawn a Ctrl+C handler that clears the shared `running` flag.
/// 4. Run the input session on stdin until EOF or Ctrl+C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.apply_to(cli.load()?);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .init();

    if cli.write_config {
        let path = cli.config_path()?;
        save_config(&config, &path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!("wrote config to {}", path.display());
        return Ok(());
    }

    let url = config.network.url();
    info!("touchpoint client starting: receiver={url}");

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    let mut session = InputSession::new(
        config.input,
        Box::new(WsConnector::new(url)),
        Box::new(LogDisplay),
    );
    if cli.keyboard_start {
        session.start(Activation::Keyboard)?;
    }
    let source = StdinInputSource::new();
    session.run(&source, running).await?;

    info!("touchpoint client stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
