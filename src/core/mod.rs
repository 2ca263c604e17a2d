mod args;
mod error;
mod logger;
mod schema;

pub use args::CliArgs;
pub use error::GatewayError;
pub use logger::setup_logging;
pub use schema::{ColumnSchema, TableMetadata};
