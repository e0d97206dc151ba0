use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use soapbox_api::auth::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soapbox=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("SOAPBOX_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let admin_email = std::env::var("SOAPBOX_ADMIN_EMAIL").ok();
    let db_path = std::env::var("SOAPBOX_DB_PATH").unwrap_or_else(|_| "soapbox.db".into());
    let host = std::env::var("SOAPBOX_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("SOAPBOX_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = soapbox_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        admin_email,
    });

    let app = soapbox_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Soapbox server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
