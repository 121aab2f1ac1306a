use tracing::info;
use tracing_subscriber::EnvFilter;

use market_info_api::{config::Config, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set subscriber: {}", e))?;

    // Load configuration
    let config = Config::from_env()?;
    info!(
        env = ?config.app_env,
        backend = %config.backend_url,
        fallback = %config.quote_fallback,
        "Configuration loaded"
    );

    // Build our application with routes
    let app = router::create_router(&config)?;

    // Run our application
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
