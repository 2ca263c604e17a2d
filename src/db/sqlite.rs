use std::path::PathBuf;
use std::time::Duration;

use log::error;
use rusqlite::{Connection, ErrorCode, OpenFlags};

use crate::conf::DatabaseConfig;
use crate::core::GatewayError;

use super::{Connector, Pool};

pub type SqlitePool = Pool<SqliteConnector>;

#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    read_only: bool,
    busy_timeout: Duration,
}

impl SqliteConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: config.path.clone(),
            read_only: config.read_only,
            busy_timeout: config.busy_timeout,
        }
    }

    fn open(&self) -> Result<Connection, rusqlite::Error> {
        let flags = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX
        };
        let conn = Connection::open_with_flags(&self.path, flags)?;
        conn.busy_timeout(self.busy_timeout)?;
        if self.read_only {
            conn.execute_batch("PRAGMA query_only = 1")?;
        }
        Ok(conn)
    }
}

impl Connector for SqliteConnector {
    type Connection = Connection;

    fn connect(&self) -> Result<Connection, GatewayError> {
        self.open().map_err(|e| {
            error!("cannot open {}: {e}", self.path.display());
            GatewayError::DatabaseError("Failed to get a database connection".to_string())
        })
    }
}

/// Errors after which the session itself is unusable.
pub fn is_fatal(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(
            ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseCorrupt
        )
    )
}
