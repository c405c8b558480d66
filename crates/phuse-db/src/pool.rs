//! Connection pooling.
//!
//! Best-effort reuse of opened connections: a pre-opened floor, a ceiling,
//! and an acquire loop that waits for a return until the timeout. Guards
//! hand their connection back on drop; a guard holding an open transaction
//! must go through [`PoolGuard::release`] so the rollback can run.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::{DbError, Result};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Opens new driver handles on behalf of the pool.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Driver>>;
}

/// Pool sizing and acquire patience.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub min_connections: usize,
    pub max_connections: usize,
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolOptions {
    pub fn min_connections(mut self, min: usize) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(DbError::config("pool max_connections must be at least 1"));
        }
        if self.min_connections > self.max_connections {
            return Err(DbError::config(
                "pool min_connections exceeds max_connections",
            ));
        }
        Ok(())
    }
}

/// A pool of reusable [`Connection`]s over one connector.
pub struct ConnectionPool {
    options: PoolOptions,
    connector: Arc<dyn Connector>,
    available: Arc<Mutex<VecDeque<Connection>>>,
    total: Arc<AtomicUsize>,
}

impl ConnectionPool {
    /// Validate the options and pre-open the floor of connections.
    pub async fn new(options: PoolOptions, connector: Arc<dyn Connector>) -> Result<Self> {
        options.validate()?;
        let pool = Self {
            options,
            connector,
            available: Arc::new(Mutex::new(VecDeque::new())),
            total: Arc::new(AtomicUsize::new(0)),
        };
        pool.open_floor().await?;
        Ok(pool)
    }

    /// Take a connection, reusing a returned one when possible and opening
    /// a new one while under the ceiling. Waits up to `acquire_timeout` for
    /// a return, then fails with [`DbError::PoolTimeout`].
    pub async fn acquire(&self) -> Result<PoolGuard> {
        let start = Instant::now();
        loop {
            if let Some(connection) = self.available.lock().await.pop_front() {
                trace!("reusing pooled connection");
                return Ok(self.guard(connection));
            }
            if let Some(connection) = self.try_open().await? {
                return Ok(self.guard(connection));
            }
            if start.elapsed() >= self.options.acquire_timeout {
                return Err(DbError::PoolTimeout(self.options.acquire_timeout));
            }
            tokio::time::sleep(RETRY_INTERVAL).await;
        }
    }

    pub async fn stats(&self) -> PoolStats {
        let available = self.available.lock().await.len();
        let total = self.total.load(Ordering::SeqCst);
        PoolStats {
            total_connections: total,
            available_connections: available,
            active_connections: total.saturating_sub(available),
            max_connections: self.options.max_connections,
        }
    }

    fn guard(&self, connection: Connection) -> PoolGuard {
        PoolGuard {
            connection: Some(connection),
            available: Arc::clone(&self.available),
            total: Arc::clone(&self.total),
        }
    }

    /// Open a fresh connection unless the ceiling is reached. Best effort:
    /// concurrent acquires can briefly overshoot the ceiling.
    async fn try_open(&self) -> Result<Option<Connection>> {
        if self.total.load(Ordering::SeqCst) >= self.options.max_connections {
            return Ok(None);
        }
        let driver = self.connector.connect().await?;
        let total = self.total.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(total, "opened pool connection");
        Ok(Some(Connection::new(driver)))
    }

    async fn open_floor(&self) -> Result<()> {
        let mut available = self.available.lock().await;
        while self.total.load(Ordering::SeqCst) < self.options.min_connections {
            let driver = self.connector.connect().await?;
            available.push_back(Connection::new(driver));
            self.total.fetch_add(1, Ordering::SeqCst);
        }
        debug!(connections = available.len(), "pool ready");
        Ok(())
    }
}

/// Pool occupancy counters.
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub total_connections: usize,
    pub available_connections: usize,
    pub active_connections: usize,
    pub max_connections: usize,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} active, {} available, max {}",
            self.active_connections,
            self.total_connections,
            self.available_connections,
            self.max_connections
        )
    }
}

/// A borrowed pool connection. Derefs to [`Connection`].
///
/// Dropping the guard returns the connection when that is possible without
/// awaiting; a guard holding an open transaction is discarded instead, since
/// the rollback cannot run inside `Drop`.
#[derive(Debug)]
pub struct PoolGuard {
    connection: Option<Connection>,
    available: Arc<Mutex<VecDeque<Connection>>>,
    total: Arc<AtomicUsize>,
}

impl PoolGuard {
    /// Return the connection to the pool, rolling back a transaction left
    /// open and clearing any staged statement.
    pub async fn release(mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            if connection.in_transaction() {
                connection.rollback().await?;
            }
            connection.clear();
            self.available.lock().await.push_back(connection);
            trace!("connection returned to pool");
        }
        Ok(())
    }
}

impl Deref for PoolGuard {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.connection
            .as_ref()
            .expect("connection already released")
    }
}

impl DerefMut for PoolGuard {
    fn deref_mut(&mut self) -> &mut Connection {
        self.connection
            .as_mut()
            .expect("connection already released")
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        if connection.in_transaction() {
            warn!("pool guard dropped mid-transaction; discarding the connection");
            self.total.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        connection.clear();
        match self.available.try_lock() {
            Ok(mut available) => available.push_back(connection),
            Err(_) => {
                warn!("pool busy on drop; discarding the connection");
                self.total.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverResult;
    use crate::qb::Bindings;
    use crate::row::Row;

    struct NullDriver;

    #[async_trait]
    impl Driver for NullDriver {
        async fn execute(&mut self, _sql: &str, _bindings: &Bindings) -> DriverResult<u64> {
            Ok(1)
        }

        async fn fetch_all(&mut self, _sql: &str, _bindings: &Bindings) -> DriverResult<Vec<Row>> {
            Ok(Vec::new())
        }

        async fn last_insert_id(&mut self) -> DriverResult<Option<String>> {
            Ok(None)
        }

        async fn begin(&mut self) -> DriverResult<()> {
            Ok(())
        }

        async fn commit(&mut self) -> DriverResult<()> {
            Ok(())
        }

        async fn rollback(&mut self) -> DriverResult<()> {
            Ok(())
        }
    }

    struct NullConnector;

    #[async_trait]
    impl Connector for NullConnector {
        async fn connect(&self) -> Result<Box<dyn Driver>> {
            Ok(Box::new(NullDriver))
        }
    }

    fn small_pool_options() -> PoolOptions {
        PoolOptions::default()
            .min_connections(1)
            .max_connections(2)
            .acquire_timeout(Duration::from_millis(100))
    }

    #[tokio::test]
    async fn pre_opens_the_floor() {
        let options = PoolOptions::default().min_connections(2).max_connections(5);
        let pool = ConnectionPool::new(options, Arc::new(NullConnector))
            .await
            .unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.total_connections, 2);
        assert_eq!(stats.available_connections, 2);
        assert_eq!(stats.active_connections, 0);
    }

    #[tokio::test]
    async fn acquire_release_cycle() {
        let pool = ConnectionPool::new(small_pool_options(), Arc::new(NullConnector))
            .await
            .unwrap();
        let guard = pool.acquire().await.unwrap();
        assert_eq!(pool.stats().await.active_connections, 1);

        guard.release().await.unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.active_connections, 0);
        assert_eq!(stats.available_connections, 1);
    }

    #[tokio::test]
    async fn guard_executes_like_a_connection() {
        let pool = ConnectionPool::new(small_pool_options(), Arc::new(NullConnector))
            .await
            .unwrap();
        let mut guard = pool.acquire().await.unwrap();
        guard.query("DELETE FROM users WHERE id = :id1");
        guard.bind("id1", 1).unwrap();
        assert_eq!(guard.execute().await.unwrap(), 1);
        guard.release().await.unwrap();
    }

    #[tokio::test]
    async fn exhausted_pool_times_out() {
        let options = PoolOptions::default()
            .min_connections(1)
            .max_connections(1)
            .acquire_timeout(Duration::from_millis(50));
        let pool = ConnectionPool::new(options, Arc::new(NullConnector))
            .await
            .unwrap();

        let _held = pool.acquire().await.unwrap();
        let err = pool.acquire().await.unwrap_err();
        assert!(err.is_pool_timeout());
    }

    #[tokio::test]
    async fn dropping_a_guard_returns_the_connection() {
        let pool = ConnectionPool::new(small_pool_options(), Arc::new(NullConnector))
            .await
            .unwrap();
        {
            let _guard = pool.acquire().await.unwrap();
            assert_eq!(pool.stats().await.available_connections, 0);
        }
        let stats = pool.stats().await;
        assert_eq!(stats.available_connections, 1);
        assert_eq!(stats.total_connections, 1);
    }

    #[tokio::test]
    async fn transactional_guard_dropped_is_discarded() {
        let pool = ConnectionPool::new(small_pool_options(), Arc::new(NullConnector))
            .await
            .unwrap();
        {
            let mut guard = pool.acquire().await.unwrap();
            guard.begin().await.unwrap();
        }
        let stats = pool.stats().await;
        assert_eq!(stats.total_connections, 0);
        assert_eq!(stats.available_connections, 0);
    }

    #[tokio::test]
    async fn release_rolls_back_open_transactions() {
        let pool = ConnectionPool::new(small_pool_options(), Arc::new(NullConnector))
            .await
            .unwrap();
        let mut guard = pool.acquire().await.unwrap();
        guard.begin().await.unwrap();
        guard.release().await.unwrap();

        let guard = pool.acquire().await.unwrap();
        assert!(!guard.in_transaction());
    }

    #[test]
    fn options_validation() {
        let err = PoolOptions::default()
            .max_connections(0)
            .validate()
            .unwrap_err();
        assert!(err.is_config());

        let err = PoolOptions::default()
            .min_connections(9)
            .max_connections(3)
            .validate()
            .unwrap_err();
        assert!(err.is_config());

        assert!(PoolOptions::default().validate().is_ok());
    }
}
