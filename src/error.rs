use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error taxonomy. Every failure carries enough context (row
/// number, sku, sale id) for the caller to show an actionable message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input — never partially applied.
    #[error("{0}")]
    BadRequest(String),

    /// Referenced product/variant/sale/client/employee does not exist
    /// (or a sale was already returned).
    #[error("{0}")]
    NotFound(String),

    /// Duplicate sku, insufficient stock, or another state conflict,
    /// surfaced before anything is persisted.
    #[error("{0}")]
    Conflict(String),

    /// Acting employee's role does not allow the operation.
    #[error("{0}")]
    Forbidden(String),

    /// Underlying store failure; the whole operation rolled back and is
    /// safe to retry.
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations (catalog-wide sku, employee pin) are conflicts the
        // caller can fix, not infrastructure failures.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Conflict(format!("unique constraint violated: {}", db_err));
            }
        }
        AppError::Database(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Database(err) => {
                error!(error = %err, "database failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal database error".to_string(),
                )
            }
            AppError::Internal(err) => {
                error!(error = %err, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(serde_json::json!({ "error": message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_displays_message() {
        let err = AppError::BadRequest("row 3: quantity must be a number".to_string());
        assert_eq!(err.to_string(), "row 3: quantity must be a number");
    }

    #[test]
    fn not_found_displays_message() {
        let err = AppError::NotFound("Sale abc not found or already returned".to_string());
        assert!(err.to_string().contains("already returned"));
    }
}
