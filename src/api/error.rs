use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

use crate::core::GatewayError;

use super::types::ErrorResponse;

const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

/// Maps gateway errors to HTTP status codes.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.0 {
            GatewayError::AuthFailure(_) => {
                error!("Authentication error: {}", self.0);
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized".to_string())
            }
            GatewayError::ValidationFailure { field, .. } => {
                error!("Invalid request error ({}): {}", field, self.0);
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", self.0.to_string())
            }
            GatewayError::TableNotFound(_) => {
                error!("Table not found error: {}", self.0);
                (StatusCode::NOT_FOUND, "TABLE_NOT_FOUND", self.0.to_string())
            }
            GatewayError::DatabaseError(_) => {
                error!("Database error: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", self.0.to_string())
            }
            GatewayError::QueryExecutionError(_) => {
                error!("Query execution error: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "QUERY_EXECUTION_ERROR", self.0.to_string())
            }
            GatewayError::UnexpectedError(_)
            | GatewayError::IoError(_)
            | GatewayError::ConfigParsingError(_) => {
                error!("Unexpected error: {:?}", self.0);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    UNEXPECTED_MESSAGE.to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
