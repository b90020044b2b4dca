use std::time::Instant;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    db,
    error::{AppError, AppResult},
    models::{CreateClient, UpdateClient},
    policy::{self, Action},
    AppState,
};

pub async fn list_clients(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let clients = db::fetch_all_clients(&state.db).await?;
    let elapsed = start.elapsed();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": clients,
            "count": clients.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn create_client(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateClient>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    policy::authorize(&state.db, &headers, Action::ManagePeople).await?;
    payload.validate().map_err(AppError::BadRequest)?;

    let client = db::insert_client(&state.db, &payload).await?;

    info!(id = %client.id, name = %client.name, "Created client");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": client })),
    ))
}

pub async fn get_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let client = db::fetch_client_by_id(&state.db, id).await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": client }))))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateClient>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    policy::authorize(&state.db, &headers, Action::ManagePeople).await?;

    let client = db::update_client(&state.db, id, &payload).await?;

    info!(id = %id, "Updated client");

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": client }))))
}

pub async fn delete_client(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    policy::authorize(&state.db, &headers, Action::ManagePeople).await?;

    db::delete_client(&state.db, id).await?;

    info!(id = %id, "Deleted client");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Client deleted", "id": id })),
    ))
}
