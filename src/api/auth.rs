use std::fmt;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::core::GatewayError;

use super::error::ApiError;
use super::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Role label of the API key that authenticated the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRole(pub String);

impl fmt::Display for ApiRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejects requests without a configured `X-API-Key` before any handler runs.
pub async fn require_api_key(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| GatewayError::AuthFailure("missing API key".to_string()))?;

    let role = state
        .auth
        .role_for(key)
        .ok_or_else(|| GatewayError::AuthFailure("unknown API key".to_string()))?
        .to_string();

    req.extensions_mut().insert(ApiRole(role));
    Ok(next.run(req).await)
}
