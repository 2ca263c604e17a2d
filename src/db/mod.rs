mod pool;
mod sqlite;

pub use pool::{Pool, PoolStatus, PooledConnection};
pub use sqlite::{SqliteConnector, SqlitePool, is_fatal};

use crate::core::GatewayError;

/// Opens new database sessions for a [`Pool`].
///
/// `connect` is called from the blocking thread pool, so it may do
/// synchronous I/O.
pub trait Connector: Send + Sync + 'static {
    type Connection: Send + 'static;

    fn connect(&self) -> Result<Self::Connection, GatewayError>;
}
