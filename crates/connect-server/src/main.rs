mod config;
mod error;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use connect_client::SessionHub;
use connect_rest::{RestBackend, RestConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{BackendConfig, Config};
use crate::state::{AppStateInner, SharedBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "connect=debug,connect_client=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let backend = match &config.backend {
        BackendConfig::Rest { url, anon_key } => {
            info!("Using hosted backend at {}", url);
            SharedBackend::Rest(RestBackend::new(RestConfig::new(url, anon_key.clone())?))
        }
        BackendConfig::Local { db_path } => {
            info!("Using local backend; bearer tokens are user ids");
            SharedBackend::Local(Arc::new(connect_db::Database::open(db_path)?))
        }
    };

    let state = Arc::new(AppStateInner {
        backend,
        hub: SessionHub::new(),
    });

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Connect server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
