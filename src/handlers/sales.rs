use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    db,
    error::AppResult,
    ledger,
    models::CreateSale,
    policy::{self, Action},
    AppState,
};

#[derive(Debug, Deserialize, Default)]
pub struct SaleFilters {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ── List (sales history) ─────────────────────────────────────────────────────

pub async fn list_sales(
    State(state): State<AppState>,
    Query(filters): Query<SaleFilters>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let sales = db::fetch_all_sales(
        &state.db,
        filters.limit.unwrap_or(1000),
        filters.offset.unwrap_or(0),
    )
    .await?;
    let elapsed = start.elapsed();

    info!(count = sales.len(), "Listed sales");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": sales,
            "count": sales.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Checkout ──────────────────────────────────────────────────────────────────

pub async fn checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateSale>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = policy::authorize(&state.db, &headers, Action::OperateRegister).await?;

    let start = Instant::now();
    let sale = ledger::commit_sale(&state.db, employee.id, &payload).await?;
    let elapsed = start.elapsed();

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": sale,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let sale = db::fetch_sale_by_id(&state.db, id).await?;
    let elapsed = start.elapsed();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": sale,
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Return ────────────────────────────────────────────────────────────────────

pub async fn return_sale(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = policy::authorize(&state.db, &headers, Action::OperateRegister).await?;

    let start = Instant::now();
    let sale = ledger::reverse_sale(&state.db, id).await?;
    let elapsed = start.elapsed();

    info!(sale_id = %id, by = %employee.id, "Processed return");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": sale,
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}
