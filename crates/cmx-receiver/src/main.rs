//! CMX Receiver - Location push endpoint and map API.
//!
//! Run with: `cargo run -p cmx-receiver -- --secret s1 --validator <token>`

use std::path::PathBuf;

use axum::Router;
use axum::http::Method;
use clap::Parser;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use cmx_receiver::{AppState, Config, api};
use cmx_store::Store;

/// CMX Receiver - Location push endpoint and map API.
#[derive(Parser, Debug)]
#[command(name = "cmx-receiver")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Shared secret pushes must carry (overrides config).
    #[arg(short, long)]
    secret: Option<String>,

    /// Validator token for the dashboard handshake (overrides config).
    #[arg(short, long)]
    validator: Option<String>,

    /// Database path (overrides config).
    #[arg(short, long, env = "CMX_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cmx_receiver=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_else(|e| {
            warn!("Ignoring default config: {}", e);
            Config::default()
        }),
    };

    // Override config with CLI args
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(secret) = args.secret {
        config.receiver.secret = secret;
    }
    if let Some(validator) = args.validator {
        config.receiver.validator = validator;
    }
    if let Some(db_path) = args.database {
        config.storage.path = db_path;
    }

    config.validate()?;

    // Open the database
    let store = Store::open(&config.storage.path)?;

    let addr = config.server.bind_addr();
    let state = AppState::new(store, config);

    // The map frontend only reads.
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        )
        .with_state(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
