// Blog API Server

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use blog_api::{api, app_state::AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let addr = config.server_address();

    // Initialize application state
    let app_state = AppState::new(config).await?;

    let app = api::app(app_state);

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Blog API listening on http://{}{}", addr, api::API_PREFIX);

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .await?;

    Ok(())
}
