use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, State};
use log::info;

use crate::core::{GatewayError, TableMetadata};
use crate::query::{QueryBody, QueryResult};

use super::auth::ApiRole;
use super::error::ApiError;
use super::state::AppState;
use super::types::HealthResponse;

const SQL_LOG_PREVIEW: usize = 50;

pub async fn health() -> Json<HealthResponse> {
    info!("Health check successful");
    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

pub async fn query(
    State(state): State<AppState>,
    Extension(role): Extension<ApiRole>,
    body: Result<Json<QueryBody>, JsonRejection>,
) -> Result<Json<QueryResult>, ApiError> {
    let Json(body) =
        body.map_err(|e| GatewayError::validation("body", e.body_text()))?;

    let preview: String = body.sql.chars().take(SQL_LOG_PREVIEW).collect();
    info!(
        "Query received from role '{}' - SQL: {}..., {} params",
        role,
        preview,
        body.params.as_ref().map_or(0, |p| p.len())
    );

    let result = state.service.query(body).await?;
    info!("Query executed successfully ({} rows)", result.row_count());
    Ok(Json(result))
}

pub async fn metadata(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<TableMetadata>, ApiError> {
    let metadata = state.service.metadata(&table).await?;
    info!("Metadata retrieved for table: {}", table);
    Ok(Json(TableMetadata::clone(&metadata)))
}
