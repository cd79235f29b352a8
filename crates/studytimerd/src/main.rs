//! studytimerd - the studytimer REST service
//!
//! Wires together:
//! - Configuration loading
//! - Store initialization
//! - Token issuance
//! - The HTTP router

use anyhow::{Context, Result};
use clap::Parser;
use rand::{RngCore, rngs::OsRng};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use studytimer_config::{load_config_or_default, validate_jwt_secret};
use studytimer_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use studytimer_util::default_config_path;
use studytimerd::{AppState, TokenManager, app_router};
use tokio::net::TcpListener;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How long an idle login throttle bucket is kept
const LIMITER_STALE_AFTER: Duration = Duration::from_secs(600);

/// studytimerd - accounts and goals for the study timer
#[derive(Parser, Debug)]
#[command(name = "studytimerd")]
#[command(about = "Accounts and goals service for the study timer", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/studytimer/config.toml)
    #[arg(short, long, env = "STUDYTIMER_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Listen address override
    #[arg(long, env = "STUDYTIMER_LISTEN")]
    listen: Option<SocketAddr>,

    /// Data directory override (or set STUDYTIMER_DATA_DIR env var)
    #[arg(short, long, env = "STUDYTIMER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Token signing secret (at least 32 bytes)
    #[arg(long, env = "STUDYTIMER_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn signing_secret(args: &Args, configured: Option<&str>) -> Result<Vec<u8>> {
    match args.jwt_secret.as_deref().or(configured) {
        Some(secret) => {
            validate_jwt_secret(secret)?;
            Ok(secret.as_bytes().to_vec())
        }
        None => {
            warn!("No JWT secret configured; generated one, tokens will not survive a restart");
            let mut secret = vec![0u8; 32];
            OsRng.fill_bytes(&mut secret);
            Ok(secret)
        }
    }
}

async fn shutdown_signal() {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            warn!(error = %e, "Failed to install signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "studytimerd starting");

    let settings = load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    let listen_addr = args.listen.unwrap_or(settings.server.listen_addr);
    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| settings.server.data_dir.clone());

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join("studytimerd.db");
    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?,
    );
    info!(db_path = %db_path.display(), "Store initialized");

    let secret = signing_secret(&args, settings.auth.jwt_secret.as_deref())?;
    let tokens = TokenManager::new(&secret, settings.auth.token_ttl);

    let state = Arc::new(AppState::new(
        store.clone(),
        tokens,
        settings.auth.login_attempts_per_minute,
    ));

    // Drop idle login throttle buckets
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(LIMITER_STALE_AFTER);
        loop {
            interval.tick().await;
            cleanup_state
                .login_limiter
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .cleanup(LIMITER_STALE_AFTER);
        }
    });

    let app = app_router(state, &settings.server.cors_allow_origins);

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;

    store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;
    info!(listen_addr = %listen_addr, "Service running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    let _ = store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped));
    info!("studytimerd stopped");

    Ok(())
}
