use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use darkserve::{routes, AppState, Config};

#[derive(Parser, Debug)]
#[command(name = "darkserve")]
#[command(about = "Dark mode file server with bounded request concurrency")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "DARKSERVE_PORT", default_value = "3333")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "DARKSERVE_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Root directory to serve files from
    #[arg(short, long, env = "DARKSERVE_ROOT", default_value = ".")]
    root: PathBuf,

    /// Maximum concurrent requests (overrides the config file)
    #[arg(short = 'n', long, env = "DARKSERVE_MAX_CONCURRENT")]
    max_concurrent: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, env = "DARKSERVE_VERBOSE")]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, env = "DARKSERVE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "darkserve=debug,tower_http=debug"
    } else {
        "darkserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load config from file if provided, otherwise use defaults
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        Config::default()
    };

    if let Some(max_concurrent) = cli.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if config.max_concurrent == 0 {
        return Err("max_concurrent must be at least 1".into());
    }

    // Resolve root directory to absolute path
    let root_dir = cli.root.canonicalize().unwrap_or_else(|_| cli.root.clone());

    if !root_dir.exists() {
        return Err(format!("Root directory does not exist: {}", root_dir.display()).into());
    }

    if !root_dir.is_dir() {
        return Err(format!("Root path is not a directory: {}", root_dir.display()).into());
    }

    info!("Serving files from: {}", root_dir.display());
    info!("Admitting up to {} concurrent requests", config.max_concurrent);

    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let state = AppState::new(root_dir, config);
    let app = routes::router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", cli.bind, cli.port).parse()?;
    info!("Starting darkserve on {}", addr);
    info!("Available endpoints:");
    info!("  /tcpstates - status endpoint");
    info!("  /          - dark mode file browser");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // One watch channel drives both the accept-loop drain and the grace
    // deadline below.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, draining in-flight requests");
        let _ = shutdown_tx.send(true);
    });

    let mut serve_rx = shutdown_rx.clone();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = serve_rx.changed().await;
    });

    tokio::select! {
        result = async { server.await } => result?,
        _ = drain_deadline(shutdown_rx, grace) => {
            warn!("Grace period elapsed, closing remaining connections");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolves once the shutdown broadcast has fired and the grace period has
/// passed; in-flight requests still running by then are abandoned.
async fn drain_deadline(mut shutdown_rx: watch::Receiver<bool>, grace: Duration) {
    let _ = shutdown_rx.changed().await;
    tokio::time::sleep(grace).await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
