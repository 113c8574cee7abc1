//! store-server entry point

use store_server::{api, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "store_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Starting store-server (env: {})", config.environment);

    let state = AppState::new(&config)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let app = api::create_router(state);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("store-server HTTP listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
