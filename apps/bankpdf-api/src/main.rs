//! Bank statement conversion API server

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use bankpdf_api::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bankpdf_api=info".parse()?)
                .add_directive("bankpdf_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let config = ServerConfig::from_env();
    info!(
        version = %config.backend_version,
        max_upload_bytes = config.max_upload_bytes,
        "Initializing conversion API..."
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(Arc::new(AppState::new(config)));

    info!("Starting conversion API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
