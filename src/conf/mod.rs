mod auth;
mod cache;
mod config;
mod database;
mod logging;
mod server;

pub use auth::AuthConfig;
pub use cache::CacheConfig;
pub use config::Config;
pub use database::{DatabaseConfig, PoolConfig};
pub use logging::LoggingConfig;
pub use server::ServerConfig;
