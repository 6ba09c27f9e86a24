// src/routes/health.rs

use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn ping() -> Json<Value> {
    Json(json!({ "ok": true, "from": "dashboard" }))
}
