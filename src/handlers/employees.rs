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
    models::{employee::validate_pin, CreateEmployee, PinLogin, UpdateEmployee},
    policy::{self, Action},
    AppState,
};

// ── PIN login ─────────────────────────────────────────────────────────────────

/// Quick-access lookup: a 4-digit pin selects the acting employee. This is a
/// placeholder for real authentication, kept deliberately simple.
pub async fn pin_login(
    State(state): State<AppState>,
    Json(payload): Json<PinLogin>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    validate_pin(&payload.pin).map_err(AppError::BadRequest)?;

    let employee = db::fetch_employee_by_pin(&state.db, &payload.pin).await?;

    info!(id = %employee.id, role = ?employee.role, "Employee signed in by pin");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "data": employee })),
    ))
}

// ── CRUD ──────────────────────────────────────────────────────────────────────

pub async fn list_employees(
    State(state): State<AppState>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let employees = db::fetch_all_employees(&state.db).await?;
    let elapsed = start.elapsed();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": employees,
            "count": employees.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

pub async fn create_employee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateEmployee>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    policy::authorize(&state.db, &headers, Action::ManagePeople).await?;
    payload.validate().map_err(AppError::BadRequest)?;

    let employee = db::insert_employee(&state.db, &payload).await?;

    info!(id = %employee.id, role = ?employee.role, "Created employee");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": employee })),
    ))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = db::fetch_employee_by_id(&state.db, id).await?;

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": employee }))))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<UpdateEmployee>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    policy::authorize(&state.db, &headers, Action::ManagePeople).await?;

    if let Some(pin) = &payload.pin {
        validate_pin(pin).map_err(AppError::BadRequest)?;
    }

    let employee = db::update_employee(&state.db, id, &payload).await?;

    info!(id = %id, "Updated employee");

    Ok((StatusCode::OK, Json(serde_json::json!({ "data": employee }))))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    policy::authorize(&state.db, &headers, Action::ManagePeople).await?;

    db::delete_employee(&state.db, id).await?;

    info!(id = %id, "Deleted employee");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "Employee deleted", "id": id })),
    ))
}
