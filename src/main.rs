//! Kira - project management backend
//! Mission: Serve the auth core and project APIs over HTTP

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kira_backend::{
    api::{build_router, AppState},
    config::AppConfig,
    store::Database,
};

#[derive(Parser, Debug)]
#[command(name = "kira")]
#[command(about = "Kira project management API server")]
struct Args {
    /// Listen port (overrides PORT)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, env = "DATABASE_PATH")]
    database_path: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    let args = Args::parse();
    init_tracing();

    let mut config = AppConfig::from_env().context("Invalid configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.database_path {
        config.database_path = path;
    }

    info!(
        port = config.port,
        database = %config.database_path,
        development = config.auth.development,
        "Starting Kira backend"
    );

    let db = Database::open(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path))?;

    let state = AppState::new(&config, db).context("Invalid configuration")?;
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kira_backend=debug,kira=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate root when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
