//! Error types for the admission server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Stable error codes returned to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchRequest = 4,
    BadValue = 5,
    IllegalState = 6,
    EligibilityDenied = 7,
    CapacityExceeded = 8,
    SequenceExhausted = 9,
    Conflict = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The request's current status does not allow the operation
    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Eligibility denied: {0}")]
    EligibilityDenied(String),

    #[error("Capacity exceeded for {category} on {date}: requested {requested}, available {available}")]
    CapacityExceeded {
        date: NaiveDate,
        category: String,
        requested: i32,
        available: i32,
    },

    #[error("Ticket sequence exhausted for {0}")]
    SequenceExhausted(NaiveDate),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Numeric code and HTTP status for this error
    pub fn classify(&self) -> (StatusCode, ErrorCode) {
        match self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchRequest),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue),
            AppError::IllegalState(_) => (StatusCode::CONFLICT, ErrorCode::IllegalState),
            AppError::EligibilityDenied(_) => (StatusCode::FORBIDDEN, ErrorCode::EligibilityDenied),
            AppError::CapacityExceeded { .. } => (StatusCode::CONFLICT, ErrorCode::CapacityExceeded),
            AppError::SequenceExhausted(_) => (StatusCode::CONFLICT, ErrorCode::SequenceExhausted),
            AppError::Conflict(_) => (StatusCode::CONFLICT, ErrorCode::Conflict),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::DbFailure),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorCode::Failure),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Authentication(msg)
            | AppError::Authorization(msg)
            | AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::IllegalState(msg)
            | AppError::EligibilityDenied(msg)
            | AppError::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
