use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod config;
mod db;
mod error;
mod handlers;
mod import;
mod ledger;
mod models;
mod policy;
mod restock;
mod seed;

use crate::config::Config;

/// Shared application state — cheap to clone (the pool is an Arc internally).
#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (ignored in production where env vars are injected)
    dotenv::dotenv().ok();

    // Structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,pos_service=debug".parse().unwrap()),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    info!("POS service — catalog, register, returns");

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_db_connections)
        .connect(&config.database_url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    let state = AppState { db: pool };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("Listening on http://{}", addr);
    info!("Quick-start: POST http://{}/api/seed  →  then POST http://{}/api/auth/pin with {{\"pin\":\"1234\"}}", addr, addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        // ── Health ──────────────────────────────────────────────────────────
        .route("/health", get(handlers::health))

        // ── PIN login ───────────────────────────────────────────────────────
        .route("/api/auth/pin", post(handlers::employees::pin_login))

        // ── Products & catalog ──────────────────────────────────────────────
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route("/api/products/import", post(handlers::products::import_products))
        .route(
            "/api/products/:id/restock-suggestion",
            get(handlers::products::restock_suggestion),
        )

        // ── Clients ─────────────────────────────────────────────────────────
        .route(
            "/api/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/api/clients/:id",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )

        // ── Employees ───────────────────────────────────────────────────────
        .route(
            "/api/employees",
            get(handlers::employees::list_employees).post(handlers::employees::create_employee),
        )
        .route(
            "/api/employees/:id",
            get(handlers::employees::get_employee)
                .put(handlers::employees::update_employee)
                .delete(handlers::employees::delete_employee),
        )

        // ── Sales register ──────────────────────────────────────────────────
        .route(
            "/api/sales",
            get(handlers::sales::list_sales).post(handlers::sales::checkout),
        )
        .route("/api/sales/:id", get(handlers::sales::get_sale))
        .route("/api/sales/:id/return", post(handlers::sales::return_sale))

        // ── Seed ────────────────────────────────────────────────────────────
        .route("/api/seed", post(handlers::seed::seed_data))

        // ── Middleware ──────────────────────────────────────────────────────
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
