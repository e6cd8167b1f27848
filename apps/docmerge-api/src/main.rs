//! DocMerge API server

use anyhow::Result;
use tracing::info;

use docmerge_api::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docmerge_api=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing DocMerge API...");
    let config = Config::from_env()?;
    let state = AppState::from_config(&config).await?;

    let addr = config.addr();
    info!("Starting DocMerge API on http://{}", addr);
    info!(
        "Templates from bucket '{}', output to bucket '{}'",
        config.template_bucket, config.output_bucket
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
