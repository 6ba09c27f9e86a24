// src/main.rs

use std::env;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use ooh_dashboard_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize DB pool
    let pool = db::connect().await?;
    let state = AppState::new(pool);

    let app = build_router(state);

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3000);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    println!("✅ PORT={port}, using {addr}");
    println!("🚀 API listening on http://127.0.0.1:{port}");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
