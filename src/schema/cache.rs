use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::conf::CacheConfig;
use crate::core::{GatewayError, TableMetadata};

use super::{MetadataSource, SchemaIntrospector};

/// Bounded LRU cache of table metadata keyed by table name.
///
/// Concurrent misses on one table share a single introspection. Missing
/// tables are never cached, so a table created later is picked up on the
/// next lookup.
pub struct SchemaCache {
    entries: Cache<String, Arc<TableMetadata>>,
    introspector: Arc<dyn SchemaIntrospector>,
}

impl SchemaCache {
    pub fn new(introspector: Arc<dyn SchemaIntrospector>, config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            entries,
            introspector,
        }
    }

    pub async fn get_table_metadata(
        &self,
        table_name: &str,
    ) -> Result<Arc<TableMetadata>, GatewayError> {
        if let Some(hit) = self.entries.get(table_name).await {
            return Ok(hit);
        }

        let introspector = Arc::clone(&self.introspector);
        let name = table_name.to_string();
        self.entries
            .try_get_with(table_name.to_string(), async move {
                let columns = introspector.columns(&name).await?;
                if columns.is_empty() {
                    return Err(GatewayError::TableNotFound(name));
                }
                info!("cached metadata for table '{}' ({} columns)", name, columns.len());
                Ok(Arc::new(TableMetadata {
                    table_name: name,
                    columns,
                }))
            })
            .await
            .map_err(|e: Arc<GatewayError>| (*e).clone())
    }

    pub async fn invalidate(&self, table_name: &str) {
        debug!("invalidating cached metadata for '{}'", table_name);
        self.entries.invalidate(table_name).await;
    }

    /// Approximate until pending maintenance has run.
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }
}

#[async_trait]
impl MetadataSource for SchemaCache {
    async fn table_metadata(&self, table: &str) -> Result<Arc<TableMetadata>, GatewayError> {
        self.get_table_metadata(table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ColumnSchema;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeIntrospector {
        calls: AtomicUsize,
        broken: bool,
    }

    impl FakeIntrospector {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                broken: false,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SchemaIntrospector for FakeIntrospector {
        async fn columns(&self, table: &str) -> Result<Vec<ColumnSchema>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken {
                return Err(GatewayError::DatabaseError("connection refused".to_string()));
            }
            if table.starts_with("missing") {
                return Ok(Vec::new());
            }
            Ok(vec![ColumnSchema {
                name: "age".to_string(),
                sql_type: "int".to_string(),
                nullable: false,
            }])
        }
    }

    fn cache_with(introspector: Arc<FakeIntrospector>, capacity: u64) -> SchemaCache {
        SchemaCache::new(introspector, &CacheConfig { capacity })
    }

    #[tokio::test]
    async fn test_second_lookup_hits_cache() {
        let fake = FakeIntrospector::new();
        let cache = cache_with(fake.clone(), 32);

        let first = cache.get_table_metadata("users").await.unwrap();
        let second = cache.get_table_metadata("users").await.unwrap();

        assert_eq!(fake.calls(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.table_name, "users");
        assert_eq!(first.columns[0].name, "age");
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found_and_not_cached() {
        let fake = FakeIntrospector::new();
        let cache = cache_with(fake.clone(), 32);

        let err = cache.get_table_metadata("missing_table").await.err().unwrap();
        assert_eq!(err, GatewayError::TableNotFound("missing_table".to_string()));

        let _ = cache.get_table_metadata("missing_table").await;
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_introspection_failure_is_database_error() {
        let fake = Arc::new(FakeIntrospector {
            calls: AtomicUsize::new(0),
            broken: true,
        });
        let cache = cache_with(fake, 32);

        let err = cache.get_table_metadata("users").await.err().unwrap();
        assert!(matches!(err, GatewayError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let fake = FakeIntrospector::new();
        let cache = cache_with(fake.clone(), 2);

        for table in ["a", "b", "c", "d"] {
            cache.get_table_metadata(table).await.unwrap();
        }
        cache.run_pending_tasks().await;

        assert!(cache.entry_count() <= 2);
        assert_eq!(fake.calls(), 4);
    }

    #[tokio::test]
    async fn test_eviction_drops_least_recently_used() {
        let fake = FakeIntrospector::new();
        let cache = cache_with(fake.clone(), 2);

        for table in ["a", "b", "a", "c"] {
            cache.get_table_metadata(table).await.unwrap();
            cache.run_pending_tasks().await;
        }
        assert_eq!(fake.calls(), 3);

        // `a` was read after `b`, so `b` is the one evicted for `c`.
        cache.get_table_metadata("a").await.unwrap();
        assert_eq!(fake.calls(), 3);
        cache.get_table_metadata("b").await.unwrap();
        assert_eq!(fake.calls(), 4);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let fake = FakeIntrospector::new();
        let cache = cache_with(fake.clone(), 32);

        cache.get_table_metadata("users").await.unwrap();
        cache.invalidate("users").await;
        cache.get_table_metadata("users").await.unwrap();

        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_lookup() {
        let fake = FakeIntrospector::new();
        let cache = Arc::new(cache_with(fake.clone(), 32));

        let lookups: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get_table_metadata("users").await })
            })
            .collect();
        for lookup in lookups {
            lookup.await.unwrap().unwrap();
        }

        assert_eq!(fake.calls(), 1);
    }
}
