use std::sync::Arc;

use log::info;

use crate::conf::{CacheConfig, Config};
use crate::core::{GatewayError, TableMetadata};
use crate::db::{PoolStatus, SqliteConnector, SqlitePool};
use crate::query::{QueryBody, QueryExecutor, QueryResult, QueryValidator};
use crate::schema::{SchemaCache, SqliteIntrospector};

/// Validation, metadata and execution wired around one connection pool.
pub struct GatewayService {
    validator: QueryValidator,
    executor: QueryExecutor,
    schema: Arc<SchemaCache>,
}

impl GatewayService {
    pub async fn new(config: &Config) -> Result<Self, GatewayError> {
        let connector = SqliteConnector::new(&config.database);
        let pool = SqlitePool::new(connector, config.pool.clone()).await?;
        info!(
            "connected to {} (read_only={}, max {} connections)",
            config.database.path.display(),
            config.database.read_only,
            config.pool.max_size
        );
        Ok(Self::from_pool(pool, &config.cache))
    }

    pub fn from_pool(pool: SqlitePool, cache: &CacheConfig) -> Self {
        let introspector = Arc::new(SqliteIntrospector::new(pool.clone()));
        let schema = Arc::new(SchemaCache::new(introspector, cache));
        Self {
            validator: QueryValidator::new(schema.clone()),
            executor: QueryExecutor::new(pool),
            schema,
        }
    }

    pub async fn query(&self, body: QueryBody) -> Result<QueryResult, GatewayError> {
        let request = self.validator.validate(body).await?;
        let (sql, params) = request.into_parts();
        self.executor.execute(&sql, params).await
    }

    pub async fn metadata(&self, table_name: &str) -> Result<Arc<TableMetadata>, GatewayError> {
        self.schema.get_table_metadata(table_name).await
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.executor.pool().status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestDatabase;
    use serde_json::json;

    fn body(value: serde_json::Value) -> QueryBody {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_query_with_checked_params() {
        let db = TestDatabase::seeded();
        let svc = GatewayService::new(&db.config()).await.unwrap();

        let result = svc
            .query(body(json!({
                "sql": "SELECT name FROM users WHERE age = :age",
                "table": "users",
                "params": {"age": 42}
            })))
            .await
            .unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!([{"name": "bob"}])
        );
    }

    #[tokio::test]
    async fn test_query_rejects_mistyped_param() {
        let db = TestDatabase::seeded();
        let svc = GatewayService::new(&db.config()).await.unwrap();

        let err = svc
            .query(body(json!({
                "sql": "SELECT name FROM users WHERE age = :age",
                "table": "users",
                "params": {"age": "not-a-number"}
            })))
            .await
            .err()
            .unwrap();
        assert_eq!(err, GatewayError::validation("age", "age must be integer"));
    }

    #[tokio::test]
    async fn test_rejected_query_never_touches_pool() {
        let db = TestDatabase::seeded();
        let svc = GatewayService::new(&db.config()).await.unwrap();
        let before = svc.pool_status();

        let err = svc
            .query(body(json!({"sql": "DROP TABLE users"})))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, GatewayError::ValidationFailure { .. }));
        assert_eq!(svc.pool_status(), before);
    }

    #[tokio::test]
    async fn test_metadata_lookup() {
        let db = TestDatabase::seeded();
        let svc = GatewayService::new(&db.config()).await.unwrap();

        let meta = svc.metadata("users").await.unwrap();
        assert_eq!(meta.table_name, "users");
        let names: Vec<&str> = meta.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "age", "score", "active", "avatar"]);

        let err = svc.metadata("unknown_table").await.err().unwrap();
        assert_eq!(err, GatewayError::TableNotFound("unknown_table".to_string()));
    }

    #[tokio::test]
    async fn test_table_created_after_miss_is_found() {
        let db = TestDatabase::seeded();
        let svc = GatewayService::new(&db.config()).await.unwrap();

        assert!(svc.metadata("orders").await.is_err());
        db.execute_batch("CREATE TABLE orders (id INTEGER, total DECIMAL(10,2))");
        let meta = svc.metadata("orders").await.unwrap();
        assert_eq!(meta.columns.len(), 2);
    }

    #[tokio::test]
    async fn test_connections_released_after_queries() {
        let db = TestDatabase::seeded();
        let svc = GatewayService::new(&db.config()).await.unwrap();

        for _ in 0..10 {
            svc.query(body(json!({"sql": "SELECT * FROM users"})))
                .await
                .unwrap();
            let _ = svc.query(body(json!({"sql": "SELECT * FROM ghost"}))).await;
        }
        svc.metadata("users").await.unwrap();
        assert_eq!(svc.pool_status().in_use, 0);
    }
}
