use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::conf::PoolConfig;
use crate::core::GatewayError;

use super::Connector;

/// A bounded pool of reusable connections.
///
/// Every live connection handed out is paired with a semaphore permit, so at
/// most `max_size` callers hold one at a time. Further callers wait in FIFO
/// order until a [`PooledConnection`] is dropped.
pub struct Pool<C: Connector> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connector> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct PoolInner<C: Connector> {
    connector: Arc<C>,
    config: PoolConfig,
    idle: Mutex<Vec<C::Connection>>,
    permits: Arc<Semaphore>,
    size: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Open connections, idle or checked out.
    pub size: usize,
    pub idle: usize,
    pub in_use: usize,
    pub max_size: usize,
}

impl<C: Connector> Pool<C> {
    pub async fn new(connector: C, config: PoolConfig) -> Result<Self, GatewayError> {
        config.validate()?;
        let pool = Self {
            inner: Arc::new(PoolInner {
                connector: Arc::new(connector),
                permits: Arc::new(Semaphore::new(config.max_size)),
                idle: Mutex::new(Vec::with_capacity(config.max_idle)),
                size: AtomicUsize::new(0),
                config,
            }),
        };

        for _ in 0..pool.inner.config.min_idle {
            let conn = pool.inner.open().await?;
            pool.inner.idle.lock().push(conn);
        }
        debug!(
            "connection pool ready: {} pre-warmed, max {}",
            pool.inner.config.min_idle, pool.inner.config.max_size
        );

        Ok(pool)
    }

    /// Waits for a free slot, then reuses an idle connection or opens a new one.
    pub async fn acquire(&self) -> Result<PooledConnection<C>, GatewayError> {
        let permit = self.wait_for_permit().await?;

        let idle = self.inner.idle.lock().pop();
        let conn = match idle {
            Some(conn) => conn,
            None => self.inner.open().await?,
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            conn: Some(conn),
            _permit: permit,
        })
    }

    async fn wait_for_permit(&self) -> Result<OwnedSemaphorePermit, GatewayError> {
        let permits = Arc::clone(&self.inner.permits);
        let acquired = match self.inner.config.acquire_timeout {
            Some(limit) => tokio::time::timeout(limit, permits.acquire_owned())
                .await
                .map_err(|_| {
                    GatewayError::DatabaseError(format!(
                        "timed out after {limit:?} waiting for a connection"
                    ))
                })?,
            None => permits.acquire_owned().await,
        };
        acquired.map_err(|_| GatewayError::DatabaseError("connection pool is closed".to_string()))
    }

    pub fn status(&self) -> PoolStatus {
        let idle = self.inner.idle.lock().len();
        let max_size = self.inner.config.max_size;
        PoolStatus {
            size: self.inner.size.load(Ordering::SeqCst),
            idle,
            in_use: max_size - self.inner.permits.available_permits(),
            max_size,
        }
    }
}

impl<C: Connector> PoolInner<C> {
    async fn open(&self) -> Result<C::Connection, GatewayError> {
        let connector = Arc::clone(&self.connector);
        let conn = tokio::task::spawn_blocking(move || connector.connect()).await??;
        self.size.fetch_add(1, Ordering::SeqCst);
        Ok(conn)
    }

    fn release(&self, conn: C::Connection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.config.max_idle {
            idle.push(conn);
        } else {
            drop(idle);
            self.close(conn);
        }
    }

    fn close(&self, conn: C::Connection) {
        drop(conn);
        self.size.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A checked-out connection. Dropping it returns the connection to the pool.
pub struct PooledConnection<C: Connector> {
    pool: Arc<PoolInner<C>>,
    conn: Option<C::Connection>,
    // Released after `conn` is back in the idle list.
    _permit: OwnedSemaphorePermit,
}

impl<C: Connector> PooledConnection<C> {
    /// Closes the connection instead of returning it, e.g. after a fatal driver error.
    pub fn discard(mut self) {
        if let Some(conn) = self.conn.take() {
            warn!("discarding broken database connection");
            self.pool.close(conn);
        }
    }
}

impl<C: Connector> Deref for PooledConnection<C> {
    type Target = C::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn
            .as_ref()
            .expect("pooled connection is present until dropped")
    }
}

impl<C: Connector> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn
            .as_mut()
            .expect("pooled connection is present until dropped")
    }
}

impl<C: Connector> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;

    struct CountingConnector {
        opened: AtomicUsize,
        fail: bool,
    }

    impl CountingConnector {
        fn new() -> Self {
            Self {
                opened: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    impl Connector for CountingConnector {
        type Connection = usize;

        fn connect(&self) -> Result<usize, GatewayError> {
            if self.fail {
                return Err(GatewayError::DatabaseError("login failed".to_string()));
            }
            Ok(self.opened.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn config(min_idle: usize, max_idle: usize, max_size: usize) -> PoolConfig {
        PoolConfig {
            min_idle,
            max_idle,
            max_size,
            acquire_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_prewarms_min_idle() {
        let pool = Pool::new(CountingConnector::new(), config(2, 5, 10))
            .await
            .unwrap();
        let status = pool.status();
        assert_eq!(status.size, 2);
        assert_eq!(status.idle, 2);
        assert_eq!(status.in_use, 0);
    }

    #[tokio::test]
    async fn test_reuses_released_connection() {
        let pool = Pool::new(CountingConnector::new(), config(0, 2, 2))
            .await
            .unwrap();
        let first = pool.acquire().await.unwrap();
        let id = *first;
        drop(first);

        let second = pool.acquire().await.unwrap();
        assert_eq!(*second, id);
        assert_eq!(pool.status().size, 1);
    }

    #[tokio::test]
    async fn test_closes_connections_above_max_idle() {
        let pool = Pool::new(CountingConnector::new(), config(0, 1, 3))
            .await
            .unwrap();
        let a = pool.acquire().await.unwrap();
        let b = pool.acquire().await.unwrap();
        let c = pool.acquire().await.unwrap();
        assert_eq!(pool.status().size, 3);

        drop(a);
        drop(b);
        drop(c);
        let status = pool.status();
        assert_eq!(status.idle, 1);
        assert_eq!(status.size, 1);
        assert_eq!(status.in_use, 0);
    }

    #[tokio::test]
    async fn test_acquire_blocks_until_release() {
        let pool = Pool::new(CountingConnector::new(), config(0, 1, 1))
            .await
            .unwrap();
        let held = pool.acquire().await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { *pool.acquire().await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        let id = *held;
        drop(held);
        let got = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, id);
    }

    #[tokio::test]
    async fn test_acquire_timeout() {
        let mut conf = config(0, 1, 1);
        conf.acquire_timeout = Some(Duration::from_millis(20));
        let pool = Pool::new(CountingConnector::new(), conf).await.unwrap();

        let _held = pool.acquire().await.unwrap();
        let err = pool.acquire().await.err().unwrap();
        assert!(matches!(err, GatewayError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_connect_failure_frees_slot() {
        let connector = CountingConnector {
            opened: AtomicUsize::new(0),
            fail: true,
        };
        let pool = Pool::new(connector, config(0, 1, 1)).await.unwrap();

        let err = pool.acquire().await.err().unwrap();
        assert!(matches!(err, GatewayError::DatabaseError(_)));
        let status = pool.status();
        assert_eq!(status.in_use, 0);
        assert_eq!(status.size, 0);
    }

    #[tokio::test]
    async fn test_prewarm_failure_is_database_error() {
        let connector = CountingConnector {
            opened: AtomicUsize::new(0),
            fail: true,
        };
        let err = Pool::new(connector, config(1, 1, 1)).await.err().unwrap();
        assert!(matches!(err, GatewayError::DatabaseError(_)));
    }

    #[tokio::test]
    async fn test_discard_does_not_return_connection() {
        let pool = Pool::new(CountingConnector::new(), config(0, 2, 2))
            .await
            .unwrap();
        let conn = pool.acquire().await.unwrap();
        let id = *conn;
        conn.discard();

        let status = pool.status();
        assert_eq!(status.size, 0);
        assert_eq!(status.idle, 0);
        let next = pool.acquire().await.unwrap();
        assert_ne!(*next, id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_connection_never_shared() {
        let pool = Pool::new(CountingConnector::new(), config(0, 3, 3))
            .await
            .unwrap();
        let in_use = Arc::new(Mutex::new(HashSet::new()));

        let mut tasks = Vec::new();
        for _ in 0..32 {
            let pool = pool.clone();
            let in_use = Arc::clone(&in_use);
            tasks.push(tokio::spawn(async move {
                let conn = pool.acquire().await.unwrap();
                assert!(in_use.lock().insert(*conn), "connection handed out twice");
                assert!(in_use.lock().len() <= 3);
                tokio::time::sleep(Duration::from_millis(2)).await;
                in_use.lock().remove(&*conn);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert!(pool.status().size <= 3);
    }
}
