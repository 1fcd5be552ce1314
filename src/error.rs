// ABOUTME: Centralized error taxonomy for repository and route failures
// ABOUTME: Maps NotFound/Validation/Conflict/Database errors to HTTP responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Target row does not exist; message is the entity-specific
    /// "<Entity> not found" text callers surface verbatim.
    NotFound(String),
    /// Missing or invalid required input.
    Validation(String),
    /// Unique-key collision (duplicate tag name).
    Conflict(String),
    Database(sqlx::Error),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "{}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Conflict(msg) => write!(f, "{}", msg),
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Rewrites unclassified storage failures as "Failed to <action>",
    /// leaving NotFound/Validation/Conflict untouched so their specific
    /// messages and status codes survive to the response.
    pub fn action(self, what: &str) -> AppError {
        match self {
            AppError::Database(err) => {
                tracing::error!("Failed to {}: {}", what, err);
                AppError::Internal(format!("Failed to {}", what))
            }
            AppError::Internal(msg) => {
                tracing::error!("Failed to {}: {}", what, msg);
                AppError::Internal(format!("Failed to {}", what))
            }
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => {
                tracing::info!("Resource not found: {}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::Validation(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }
            AppError::Database(_) => {
                tracing::error!("Database error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = Json(json!({ "error": error_message }));

        (status, body).into_response()
    }
}

// Conversion implementations
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("I/O error: {}", err))
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Validation(format!("Invalid multipart request: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
