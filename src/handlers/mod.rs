pub mod clients;
pub mod employees;
pub mod products;
pub mod sales;
pub mod seed;

use axum::{http::StatusCode, Json};
use serde_json::json;

pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok", "service": "pos-service" })))
}
