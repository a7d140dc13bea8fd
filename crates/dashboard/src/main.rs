use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use dashboard::{
    build_router,
    config::{load_settings, DEFAULT_CONFIG_FILE},
    AppState,
};
use engagement_client::EngagementClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config_path = std::env::var_os("DASHBOARD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let settings = load_settings(&config_path);

    let client = EngagementClient::from_config(&settings.client_config())
        .context("failed to build engagement API client")?;
    info!(
        api_base_url = %client.base_url(),
        reset_policy = ?settings.upload_reset_policy,
        "engagement API client ready"
    );

    let state = AppState {
        api: Arc::new(client),
        upload_reset_policy: settings.upload_reset_policy,
    };
    let app = build_router(Arc::new(state), settings.max_upload_bytes);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "dashboard listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
