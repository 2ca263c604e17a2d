//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;
use tempfile::TempDir;

use crate::conf::{AuthConfig, Config, DatabaseConfig, PoolConfig};
use crate::db::{SqliteConnector, SqlitePool};

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_ROLE: &str = "read-only";

const SEED_SQL: &str = r#"
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name VARCHAR(50) NOT NULL,
    age INT,
    score REAL,
    active BOOLEAN NOT NULL DEFAULT 1,
    avatar BLOB
);
INSERT INTO users (id, name, age, score, active, avatar) VALUES
    (1, 'alice', 30, 9.5, 1, X'0102'),
    (2, 'bob', 42, NULL, 0, NULL),
    (3, 'carol', NULL, 7.25, 1, NULL);
"#;

/// A SQLite file in a temporary directory, removed on drop.
pub struct TestDatabase {
    _dir: TempDir,
    path: PathBuf,
}

impl TestDatabase {
    pub fn empty() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sqlgate.db");
        Connection::open(&path).unwrap();
        Self { _dir: dir, path }
    }

    /// A database with a `users` table holding three rows.
    pub fn seeded() -> Self {
        let db = Self::empty();
        db.execute_batch(SEED_SQL);
        db
    }

    /// Runs DDL/DML through a separate read-write connection.
    pub fn execute_batch(&self, sql: &str) {
        let conn = Connection::open(&self.path).unwrap();
        conn.execute_batch(sql).unwrap();
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            path: self.path.clone(),
            read_only: true,
            busy_timeout: Duration::from_secs(1),
        }
    }

    pub fn config(&self) -> Config {
        Config {
            database: self.database_config(),
            pool: test_pool_config(),
            auth: AuthConfig {
                api_keys: HashMap::from([(TEST_API_KEY.to_string(), TEST_ROLE.to_string())]),
            },
            ..Config::default()
        }
    }

    pub async fn pool(&self, config: PoolConfig) -> SqlitePool {
        SqlitePool::new(SqliteConnector::new(&self.database_config()), config)
            .await
            .unwrap()
    }
}

pub fn test_pool_config() -> PoolConfig {
    PoolConfig {
        min_idle: 1,
        max_idle: 2,
        max_size: 4,
        acquire_timeout: Some(Duration::from_secs(5)),
    }
}
