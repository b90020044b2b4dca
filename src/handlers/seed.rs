use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::{error::AppResult, seed, AppState};

#[derive(Debug, Deserialize)]
pub struct SeedParams {
    /// Number of random products to seed (default: 50, max: 5 000)
    pub count: Option<usize>,
}

// ── POST /api/seed ────────────────────────────────────────────────────────────

pub async fn seed_data(
    State(state): State<AppState>,
    Query(params): Query<SeedParams>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let count = params.count.unwrap_or(50).min(5_000);

    let start = Instant::now();
    let summary = seed::seed_demo(&state.db, count).await?;
    let elapsed = start.elapsed();

    info!(
        products = summary.products,
        clients = summary.clients,
        employees = summary.employees,
        seed_ms = elapsed.as_millis(),
        "Seed endpoint complete"
    );

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "seeded": summary,
            "seed_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}
