use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    db,
    error::{AppError, AppResult},
    import, ledger,
    models::{CreateProduct, Product, ProductFilters, StockLevel},
    policy::{self, Action},
    AppState,
};

/// Product plus the derived stock fields the catalog view renders.
#[derive(Serialize)]
struct ProductView<'a> {
    #[serde(flatten)]
    product: &'a Product,
    total_stock: i64,
    stock_level: StockLevel,
}

fn view(product: &Product) -> ProductView<'_> {
    ProductView {
        product,
        total_stock: product.total_stock(),
        stock_level: product.stock_level(),
    }
}

// ── List ──────────────────────────────────────────────────────────────────────

pub async fn list_products(
    State(state): State<AppState>,
    Query(filters): Query<ProductFilters>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let products = db::fetch_all_products(&state.db, &filters).await?;
    let elapsed = start.elapsed();

    info!(
        count = products.len(),
        elapsed_ms = elapsed.as_millis(),
        "Listed products"
    );

    let views: Vec<ProductView> = products.iter().map(view).collect();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": views,
            "count": views.len(),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Create ────────────────────────────────────────────────────────────────────

pub async fn create_product(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = policy::authorize(&state.db, &headers, Action::ManageCatalog).await?;
    payload.validate().map_err(AppError::BadRequest)?;

    let start = Instant::now();
    let product = db::insert_product(&state.db, &payload).await?;
    let elapsed = start.elapsed();

    info!(
        id = %product.id,
        name = %product.name,
        variants = product.variants.len(),
        by = %employee.id,
        "Created product"
    );

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": view(&product),
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Get by ID ─────────────────────────────────────────────────────────────────

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let product = db::fetch_product_by_id(&state.db, id).await?;
    let elapsed = start.elapsed();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": view(&product),
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Update ────────────────────────────────────────────────────────────────────

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = policy::authorize(&state.db, &headers, Action::ManageCatalog).await?;
    payload.validate().map_err(AppError::BadRequest)?;

    let start = Instant::now();
    let product = db::update_product(&state.db, id, &payload).await?;
    let elapsed = start.elapsed();

    info!(id = %id, by = %employee.id, "Updated product");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": view(&product),
            "db_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Delete ────────────────────────────────────────────────────────────────────

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = policy::authorize(&state.db, &headers, Action::ManageCatalog).await?;

    db::delete_product(&state.db, id).await?;

    info!(id = %id, by = %employee.id, "Deleted product");

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Product deleted",
            "id": id,
        })),
    ))
}

// ── Bulk CSV import ───────────────────────────────────────────────────────────

pub async fn import_products(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let employee = policy::authorize(&state.db, &headers, Action::ManageCatalog).await?;

    let start = Instant::now();
    let drafts = import::parse_catalog(body.as_bytes())?;
    let products = ledger::bulk_import(&state.db, &drafts).await?;
    let elapsed = start.elapsed();

    let variant_count: usize = products.iter().map(|p| p.variants.len()).sum();

    info!(
        products = products.len(),
        variants = variant_count,
        by = %employee.id,
        elapsed_ms = elapsed.as_millis(),
        "Imported catalog"
    );

    let views: Vec<ProductView> = products.iter().map(view).collect();

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": views,
            "imported_products": views.len(),
            "imported_variants": variant_count,
            "import_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}

// ── Restock suggestion ────────────────────────────────────────────────────────

pub async fn restock_suggestion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let start = Instant::now();
    let (product, suggestion) = ledger::restock_suggestion(&state.db, id).await?;
    let elapsed = start.elapsed();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": {
                "product_id": product.id,
                "product_name": product.name,
                "current_stock": product.total_stock(),
                "recommended_quantity": suggestion.recommended_quantity,
                "rationale": suggestion.rationale,
            },
            "query_time_ms": elapsed.as_secs_f64() * 1000.0,
        })),
    ))
}
