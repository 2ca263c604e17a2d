use async_trait::async_trait;
use log::debug;
use rusqlite::Connection;

use crate::core::{ColumnSchema, GatewayError};
use crate::db::SqlitePool;

use super::SchemaIntrospector;

const TABLE_INFO_SQL: &str = r#"SELECT name, type, "notnull" FROM pragma_table_info(?1)"#;

pub struct SqliteIntrospector {
    pool: SqlitePool,
}

impl SqliteIntrospector {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<ColumnSchema>, rusqlite::Error> {
    let mut stmt = conn.prepare(TABLE_INFO_SQL)?;
    let rows = stmt.query_map([table], |row| {
        let not_null: i64 = row.get(2)?;
        Ok(ColumnSchema {
            name: row.get(0)?,
            sql_type: row.get(1)?,
            nullable: not_null == 0,
        })
    })?;
    rows.collect()
}

#[async_trait]
impl SchemaIntrospector for SqliteIntrospector {
    async fn columns(&self, table: &str) -> Result<Vec<ColumnSchema>, GatewayError> {
        let conn = self.pool.acquire().await?;
        let table = table.to_string();
        let columns = tokio::task::spawn_blocking(move || {
            table_columns(&conn, &table).map_err(|e| {
                GatewayError::DatabaseError(format!("Error fetching table metadata: {e}"))
            })
        })
        .await??;
        debug!("introspected {} columns", columns.len());
        Ok(columns)
    }
}
