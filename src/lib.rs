// src/lib.rs

use axum::{routing::get, Router};
use sqlx::{Pool, Postgres};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod db;
pub mod error;
pub mod models;
pub mod params;
pub mod routes;
pub mod schema;
pub mod series;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
    pub traffic_schema: schema::TrafficSchemaCache,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>) -> Self {
        AppState {
            pool,
            traffic_schema: schema::TrafficSchemaCache::new(),
        }
    }
}

/// Build the full router. Exposed so integration tests can drive the app
/// with `tower::ServiceExt::oneshot` instead of binding a socket.
pub fn build_router(state: AppState) -> Router {
    // Very permissive CORS for local dev (tighten for prod)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // health & diagnostics
        .route("/health", get(routes::health::health))
        .route("/api/dashboard/__ping", get(routes::health::ping))
        .route("/api/dashboard/__dbcheck", get(routes::dbcheck::db_check))
        // per-metric endpoints
        .route("/api/dashboard/filters", get(routes::filters::get_filters))
        .route("/api/dashboard/kpi", get(routes::kpi::get_kpi))
        .route("/api/dashboard/traffic", get(routes::traffic::get_traffic))
        .route(
            "/api/dashboard/demography",
            get(routes::demography::get_demography),
        )
        .route(
            "/api/dashboard/overview",
            get(routes::overview::get_overview),
        )
        // aggregation gateway
        .route("/api/dashboard/all", get(routes::all::get_all))
        // state & middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
