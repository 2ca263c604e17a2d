use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Unauthorized: {0}")]
    AuthFailure(String),
    #[error("{reason}")]
    ValidationFailure { field: String, reason: String },
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Error executing query: {0}")]
    QueryExecutionError(String),
    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl GatewayError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        GatewayError::ValidationFailure {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::IoError(err.to_string())
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        GatewayError::QueryExecutionError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for GatewayError {
    fn from(err: tokio::task::JoinError) -> Self {
        GatewayError::UnexpectedError(format!("blocking task failed: {err}"))
    }
}
