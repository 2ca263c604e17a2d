mod auth;
mod error;
mod handlers;
mod state;
mod types;

pub use auth::{API_KEY_HEADER, ApiRole};
pub use error::ApiError;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use log::{info, warn};
use tower_http::trace::TraceLayer;

use crate::conf::AuthConfig;
use crate::core::GatewayError;
use crate::service::GatewayService;

pub struct GatewayApi {
    state: AppState,
}

impl GatewayApi {
    pub fn new(service: GatewayService, auth: AuthConfig) -> Self {
        Self {
            state: AppState {
                service: Arc::new(service),
                auth: Arc::new(auth),
            },
        }
    }

    pub fn router(&self) -> Router {
        let protected = Router::new()
            .route("/query", post(handlers::query))
            .route("/metadata/{table}", get(handlers::metadata))
            .route_layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::require_api_key,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .merge(protected)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    pub async fn serve(self, addr: &str) -> Result<(), GatewayError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::IoError(format!("binding to {addr}: {e}")))?;
        info!("listening on {addr}");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::IoError(format!("serving: {e}")))?;
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!("cannot listen for shutdown signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}
