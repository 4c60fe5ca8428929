mod config;
mod controller;
mod server;
mod utils;

use async_std::channel::{Sender, bounded};
use async_std::task;
use clap::Parser;
use config::DaemonConfig;
use controller::SharedController;
use controller::session::SessionController;
use futures::StreamExt;
use server::commands::init_commands;
use server::server::CommandServer;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook_async_std::Signals;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// qpremoted - remote-control daemon for the qtplot viewer
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Configuration file (defaults to ~/.config/qpremote/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Append logs to this file in addition to stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    verbose: bool,

    /// Data file to open at startup
    file: Option<PathBuf>,
}

#[async_std::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match args.config.clone().or_else(DaemonConfig::default_path) {
        Some(path) => DaemonConfig::load(&path)?,
        None => DaemonConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(log_file) = args.log_file.clone() {
        config.log_file = Some(log_file);
    }

    let level = if args.verbose { "debug" } else { "info" };
    utils::tracing::setup_tracing(config.log_file.as_deref(), level)?;
    debug!("Configuration: {:?}", config);

    let session = Arc::new(Mutex::new(SessionController::new()));
    if let Some(file) = &args.file {
        open_initial_file(&session, file);
    }
    let shared: SharedController = session.clone();

    let (shutdown_tx, shutdown_rx) = bounded(1);
    let signals = Signals::new([SIGINT, SIGTERM])?;
    let signals_handle = signals.handle();
    let signal_task = task::spawn(forward_signals(signals, shutdown_tx));

    let registry = init_commands();
    debug!("Registered commands:\n{}", registry.list_commands());

    match CommandServer::start(&config, registry, shared).await {
        Some(mut server) => server.run(shutdown_rx).await?,
        None => {
            // The session keeps running without remote control.
            let _ = shutdown_rx.recv().await;
        }
    }

    signals_handle.close();
    signal_task.await;
    log_session_summary(&session);
    Ok(())
}

/// Forward the first termination signal to the server's shutdown channel
async fn forward_signals(mut signals: Signals, shutdown_tx: Sender<()>) {
    if let Some(signal) = signals.next().await {
        info!("Received signal {}, shutting down", signal);
        let _ = shutdown_tx.send(()).await;
    }
}

fn open_initial_file(session: &Mutex<SessionController>, file: &Path) {
    use controller::Controller;

    let mut session = session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if !file.is_file() {
        warn!("Startup file {} does not exist", file.display());
        return;
    }
    match session.load_file(file) {
        Ok(true) => {}
        Ok(false) => warn!("Startup file {} is not a supported dataset", file.display()),
        Err(e) => warn!("Could not open {}: {}", file.display(), e),
    }
}

fn log_session_summary(session: &Mutex<SessionController>) {
    let session = session
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    match session.loaded_file() {
        Some(loaded) => info!(
            "Session ended with {} (loaded {}), axes {}, window {:?}, tab {:?}",
            loaded.path.display(),
            loaded.loaded_at.format("%Y-%m-%d %H:%M:%S"),
            session.axes(),
            session.window_state(),
            session.active_tab()
        ),
        None => info!("Session ended with no file open"),
    }
    info!(
        "{} data refreshes, {} export redraws",
        session.data_refreshes(),
        session.export_refreshes()
    );
}
