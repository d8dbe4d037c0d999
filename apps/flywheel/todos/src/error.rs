use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flywheel::FlywheelError;
use serde::Serialize;
use thiserror::Error;

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Machine-readable identifier, e.g. `BAD_REQUEST`
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Stored item is malformed: {0}")]
    MalformedItem(String),

    #[error(transparent)]
    Flywheel(#[from] FlywheelError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::MalformedItem(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_ITEM"),
            ApiError::Flywheel(err) => match err {
                FlywheelError::NotRegistered
                | FlywheelError::Config(_)
                | FlywheelError::InvalidConflictMode(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
                }
                FlywheelError::ItemExists(_) => (StatusCode::CONFLICT, "CONFLICT"),
                FlywheelError::Dynamo(_) => (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_ERROR"),
                FlywheelError::NotConnected
                | FlywheelError::UnknownTable(_)
                | FlywheelError::MissingKeyAttribute { .. }
                | FlywheelError::Build(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error_code = code, "Request failed: {}", self);
        } else {
            tracing::info!(error_code = code, "Request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_and_code().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(FlywheelError::ItemExists("todos".into()))
                .status_and_code()
                .0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(FlywheelError::NotRegistered).status_and_code().1,
            "CONFIGURATION_ERROR"
        );
    }
}
