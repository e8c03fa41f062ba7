use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

mod app;
mod http;

/// HTTP gateway for the clinic duty roster service.
#[derive(Debug, Parser)]
#[command(name = "clinic-gateway", version)]
struct Cli {
    /// Config file path (falls back to CLINIC_CONFIG, then ~/.clinic/clinic.toml).
    #[arg(long)]
    config: Option<String>,

    /// SQLite database path, overriding `database.path` from the config.
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "clinic_gateway=info,clinic_roster=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = resolve_config(Cli::parse());

    let db_path = &config.database.path;
    ensure_parent_dir(db_path)?;
    info!(path = %db_path, "opening SQLite database");

    let conn = clinic_roster::db::open(
        db_path,
        Duration::from_millis(config.database.busy_timeout_ms),
    )?;
    // schema migration runs inside the store constructor (idempotent)
    let store = clinic_roster::SqliteRosterStore::new(conn)?;
    info!("database migrations complete");

    let state = Arc::new(app::AppState::new(clinic_roster::RosterService::new(store)));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    info!("Clinic gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Clinic gateway stopped");
    Ok(())
}

/// Load the config (--config > CLINIC_CONFIG env > ~/.clinic/clinic.toml)
/// and apply CLI overrides on top.
fn resolve_config(cli: Cli) -> clinic_core::ClinicConfig {
    let config_path = cli.config.or_else(|| std::env::var("CLINIC_CONFIG").ok());
    let mut config = clinic_core::ClinicConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        clinic_core::ClinicConfig::default()
    });
    if let Some(db) = cli.db {
        config.database.path = db;
    }
    config
}

fn ensure_parent_dir(path: &str) -> clinic_core::Result<()> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
