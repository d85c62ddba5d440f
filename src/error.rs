// error.rs
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::color::ValidationError;
use crate::devices::DriverError;
use crate::models::ErrorBody;

/// Request-level failure. Only these change the response status.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidColor(#[from] ValidationError),
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidColor(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Failure confined to one device's slot in a fan-out result.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device not found")]
    NotFound,
    #[error(transparent)]
    Operation(#[from] DriverError),
    #[error("device did not respond within {0} ms")]
    TimedOut(u64),
    #[error("device task failed: {0}")]
    TaskFailed(String),
}
