use anyhow::Context;
use tokio::net::TcpListener;

use stockspro_backend::app;
use stockspro_backend::config::AppConfig;
use stockspro_backend::logging::{init_logging, LoggingConfig};
use stockspro_backend::services::news_service::NewsConfig;
use stockspro_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config, NewsConfig::from_env())?;
    let app = app::create_app(state);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("🚀 StocksPro backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
