use std::sync::Arc;

use crate::conf::AuthConfig;
use crate::service::GatewayService;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GatewayService>,
    pub auth: Arc<AuthConfig>,
}
