use crate::model::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shortline_core::{CoreError, ShortenerError};
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

/// A [`ShortenerError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct AppError(pub ShortenerError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShortenerError::InvalidUrl(_) | ShortenerError::InvalidShortCode(_) => {
                StatusCode::BAD_REQUEST
            }
            ShortenerError::NotFound(_) => StatusCode::NOT_FOUND,
            ShortenerError::CapacityTimeout => StatusCode::REQUEST_TIMEOUT,
            ShortenerError::CollisionExhausted { .. } | ShortenerError::Unavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ShortenerError::Generator(_) | ShortenerError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ShortenerError> for AppError {
    fn from(value: ShortenerError) -> Self {
        Self(value)
    }
}

impl From<CoreError> for AppError {
    fn from(value: CoreError) -> Self {
        Self(value.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, status = status.as_u16(), "request failed");
        } else if status == StatusCode::REQUEST_TIMEOUT {
            warn!(error = %self.0, "request timed out waiting for write capacity");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
