use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use backend::{
    api::{demo_logs, ApiContext},
    build_router,
    config::{load_settings, DEFAULT_CONFIG_FILE},
    AppState,
};
use clap::Parser;
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Reference engagement backend")]
struct Args {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Insert a few sample rows when the database is empty.
    #[arg(long)]
    seed_demo: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.config);
    let storage = Storage::new(&settings.database_url)
        .await
        .map_err(|error| {
            error!(
                database_url = %settings.database_url,
                %error,
                "failed to open SQLite database; verify parent directory exists and permissions are correct"
            );
            error
        })?;

    if args.seed_demo && storage.count_logs().await? == 0 {
        let seeded = storage
            .insert_logs(&demo_logs())
            .await
            .context("failed to seed demo data")?;
        info!(seeded, "seeded empty database with demo rows");
    }

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_upload_bytes);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "engagement backend listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
