use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde_json::json;

use crate::store::StoreError;
use crate::validation::FieldViolation;

/// Application-level error type for HTTP handlers.
///
/// Every handler failure ends up here, so status codes and the JSON error body
/// are decided in one place.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Payload failed validation. Carries every violation found.
    #[error("validation failed")]
    Validation {
        status: StatusCode,
        violations: Vec<FieldViolation>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// 422, used for JSON bodies.
    pub fn unprocessable(violations: Vec<FieldViolation>) -> Self {
        AppError::Validation {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            violations,
        }
    }

    /// 400, used for the multipart client intake.
    pub fn invalid_request(violations: Vec<FieldViolation>) -> Self {
        AppError::Validation {
            status: StatusCode::BAD_REQUEST,
            violations,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Store(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { status, .. } => *status,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::Validation { violations, .. } => json!({
                "error": self.to_string(),
                "code": self.code(),
                "details": violations,
            }),
            AppError::Store(_) | AppError::Internal(_) => {
                error!("Request failed: {}", self);
                json!({ "error": "internal server error!", "code": self.code() })
            }
            _ => json!({ "error": self.to_string(), "code": self.code() }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
