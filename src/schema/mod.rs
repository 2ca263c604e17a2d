mod cache;
mod introspect;

pub use cache::SchemaCache;
pub use introspect::SqliteIntrospector;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{ColumnSchema, GatewayError, TableMetadata};

/// Reads column definitions straight from the database.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// An empty list means the table does not exist.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnSchema>, GatewayError>;
}

/// Anything that can answer "what columns does this table have".
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn table_metadata(&self, table: &str) -> Result<Arc<TableMetadata>, GatewayError>;
}
