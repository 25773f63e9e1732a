use anyhow::Context;
use tracing_subscriber::EnvFilter;

use skillmatch::{
    api::{create_router, AppState, RequestSettings},
    config::Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        normalizer = %config.normalizer,
        max_features = config.max_features,
        "Configuration loaded"
    );

    let state = AppState::new(RequestSettings::from(&config));

    // Indices must be ready before the listener accepts requests
    let build_state = state.clone();
    let build_config = config.clone();
    tokio::task::spawn_blocking(move || build_state.build_indices(&build_config))
        .await
        .context("Index build task panicked")?
        .context("Failed to build recommendation indices")?;

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
