//! Statement execution over a driver handle.

use tracing::{debug, trace};

use crate::driver::Driver;
use crate::error::{DbError, Result};
use crate::qb::Bindings;
use crate::row::Row;
use crate::value::Value;

/// One statement staged for execution.
#[derive(Debug, Clone, Default)]
struct Staged {
    sql: String,
    bindings: Bindings,
}

/// Wraps one driver handle and stages one statement at a time.
///
/// [`query`](Self::query) stages SQL, [`bind`](Self::bind) and
/// [`bind_many`](Self::bind_many) attach values, and the execute/fetch
/// methods hand the staged pair to the driver. The staged statement stays in
/// place after execution, so it can be re-bound and re-run; staging a new
/// statement discards the previous one together with its binds.
pub struct Connection {
    driver: Box<dyn Driver>,
    staged: Option<Staged>,
    in_transaction: bool,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("staged", &self.staged)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}

impl Connection {
    pub fn new(driver: Box<dyn Driver>) -> Self {
        Self {
            driver,
            staged: None,
            in_transaction: false,
        }
    }

    /// Stage a statement, discarding any previously staged one.
    pub fn query(&mut self, sql: impl Into<String>) -> &mut Self {
        let sql = sql.into();
        trace!(%sql, "staging statement");
        self.staged = Some(Staged {
            sql,
            bindings: Bindings::new(),
        });
        self
    }

    /// SQL of the currently staged statement.
    pub fn staged_sql(&self) -> Option<&str> {
        self.staged.as_ref().map(|staged| staged.sql.as_str())
    }

    /// Attach one value to the staged statement by placeholder name.
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let Some(staged) = &mut self.staged else {
            return Err(Self::nothing_staged());
        };
        staged.bindings.set(name, value);
        Ok(self)
    }

    /// Attach a whole registry, typically taken from a builder. Same-named
    /// entries are replaced.
    pub fn bind_many(&mut self, bindings: Bindings) -> Result<&mut Self> {
        let Some(staged) = &mut self.staged else {
            return Err(Self::nothing_staged());
        };
        staged.bindings.merge(bindings);
        Ok(self)
    }

    /// Drop the staged statement without executing it.
    pub fn clear(&mut self) {
        self.staged = None;
    }

    /// Run the staged statement and return the affected row count.
    pub async fn execute(&mut self) -> Result<u64> {
        let Some(staged) = &self.staged else {
            return Err(Self::nothing_staged());
        };
        let affected = self.driver.execute(&staged.sql, &staged.bindings).await?;
        debug!(sql = %staged.sql, affected, "executed statement");
        Ok(affected)
    }

    /// Run the staged statement and fetch every row.
    pub async fn result(&mut self) -> Result<Vec<Row>> {
        let Some(staged) = &self.staged else {
            return Err(Self::nothing_staged());
        };
        let rows = self.driver.fetch_all(&staged.sql, &staged.bindings).await?;
        trace!(sql = %staged.sql, rows = rows.len(), "fetched result set");
        Ok(rows)
    }

    /// Run the staged statement and fetch the first row, if any.
    pub async fn single(&mut self) -> Result<Option<Row>> {
        let Some(staged) = &self.staged else {
            return Err(Self::nothing_staged());
        };
        Ok(self.driver.fetch_one(&staged.sql, &staged.bindings).await?)
    }

    /// First column of the first row, the scalar fetch mode.
    pub async fn scalar(&mut self) -> Result<Option<Value>> {
        let row = self.single().await?;
        Ok(row.and_then(|row| row.value_at(0).cloned()))
    }

    /// Identifier generated by the last insert on this handle.
    pub async fn last_insert_id(&mut self) -> Result<Option<String>> {
        Ok(self.driver.last_insert_id().await?)
    }

    /// Open a transaction on the underlying handle. Pure pass-through, no
    /// nesting bookkeeping.
    pub async fn begin(&mut self) -> Result<()> {
        self.driver.begin().await?;
        self.in_transaction = true;
        debug!("transaction started");
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<()> {
        self.driver.commit().await?;
        self.in_transaction = false;
        debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<()> {
        self.driver.rollback().await?;
        self.in_transaction = false;
        debug!("transaction rolled back");
        Ok(())
    }

    /// Whether `begin` was called without a matching `commit`/`rollback`.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    fn nothing_staged() -> DbError {
        DbError::validation("no statement staged; call query() first")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::driver::{DriverError, DriverResult};
    use crate::qb;

    #[derive(Default)]
    struct MockDriver {
        log: Arc<Mutex<Vec<String>>>,
        rows: Vec<Row>,
        fail_code: Option<&'static str>,
    }

    impl MockDriver {
        fn with_log() -> (Self, Arc<Mutex<Vec<String>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    log: Arc::clone(&log),
                    ..Default::default()
                },
                log,
            )
        }
    }

    #[async_trait]
    impl Driver for MockDriver {
        async fn execute(&mut self, sql: &str, bindings: &Bindings) -> DriverResult<u64> {
            if let Some(code) = self.fail_code {
                return Err(DriverError::with_code("rejected by mock", code));
            }
            let names: Vec<&str> = bindings.names().collect();
            self.log
                .lock()
                .unwrap()
                .push(format!("execute {sql} [{}]", names.join(",")));
            Ok(1)
        }

        async fn fetch_all(&mut self, sql: &str, _bindings: &Bindings) -> DriverResult<Vec<Row>> {
            self.log.lock().unwrap().push(format!("fetch {sql}"));
            Ok(self.rows.clone())
        }

        async fn last_insert_id(&mut self) -> DriverResult<Option<String>> {
            Ok(Some("42".into()))
        }

        async fn begin(&mut self) -> DriverResult<()> {
            self.log.lock().unwrap().push("begin".into());
            Ok(())
        }

        async fn commit(&mut self) -> DriverResult<()> {
            self.log.lock().unwrap().push("commit".into());
            Ok(())
        }

        async fn rollback(&mut self) -> DriverResult<()> {
            self.log.lock().unwrap().push("rollback".into());
            Ok(())
        }
    }

    #[tokio::test]
    async fn stages_binds_and_executes() {
        let (driver, log) = MockDriver::with_log();
        let mut conn = Connection::new(Box::new(driver));
        conn.query("UPDATE users SET name = :name1 WHERE id = :id2");
        conn.bind("name1", "kai").unwrap();
        conn.bind("id2", 7).unwrap();
        assert_eq!(conn.execute().await.unwrap(), 1);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["execute UPDATE users SET name = :name1 WHERE id = :id2 [name1,id2]"]
        );
    }

    #[tokio::test]
    async fn runs_a_compiled_statement() {
        let (driver, log) = MockDriver::with_log();
        let mut conn = Connection::new(Box::new(driver));

        let mut builder = qb::mysql("users").delete().where_eq("id", 5);
        let sql = builder.compile();
        conn.query(sql);
        conn.bind_many(builder.take_bindings()).unwrap();
        conn.execute().await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["execute DELETE FROM users WHERE id = :id1 [id1]"]
        );
    }

    #[tokio::test]
    async fn execution_failures_keep_the_driver_code() {
        let driver = MockDriver {
            fail_code: Some("1062"),
            ..Default::default()
        };
        let mut conn = Connection::new(Box::new(driver));
        conn.query("INSERT INTO users (email) VALUES (:email1)");
        let err = conn.execute().await.unwrap_err();
        assert_eq!(err.driver_code(), Some("1062"));
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn result_single_and_scalar() {
        let first: Row = [("id", Value::Int(1)), ("name", Value::Text("ada".into()))]
            .into_iter()
            .collect();
        let second: Row = [("id", Value::Int(2)), ("name", Value::Text("kai".into()))]
            .into_iter()
            .collect();
        let driver = MockDriver {
            rows: vec![first.clone(), second],
            ..Default::default()
        };
        let mut conn = Connection::new(Box::new(driver));
        conn.query("SELECT id, name FROM users");

        assert_eq!(conn.result().await.unwrap().len(), 2);
        assert_eq!(conn.single().await.unwrap(), Some(first));
        assert_eq!(conn.scalar().await.unwrap(), Some(Value::Int(1)));
    }

    #[tokio::test]
    async fn nothing_staged_is_a_validation_error() {
        let (driver, _log) = MockDriver::with_log();
        let mut conn = Connection::new(Box::new(driver));
        assert!(conn.execute().await.unwrap_err().is_validation());
        assert!(conn.bind("id1", 1).unwrap_err().is_validation());
        assert!(conn.result().await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn staging_again_replaces_statement_and_binds() {
        let (driver, log) = MockDriver::with_log();
        let mut conn = Connection::new(Box::new(driver));
        conn.query("SELECT 1");
        conn.bind("stale", 1).unwrap();
        conn.query("SELECT 2");
        assert_eq!(conn.staged_sql(), Some("SELECT 2"));
        conn.execute().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["execute SELECT 2 []"]);
    }

    #[tokio::test]
    async fn transaction_passthrough_tracks_state() {
        let (driver, log) = MockDriver::with_log();
        let mut conn = Connection::new(Box::new(driver));
        assert!(!conn.in_transaction());
        conn.begin().await.unwrap();
        assert!(conn.in_transaction());
        conn.commit().await.unwrap();
        assert!(!conn.in_transaction());

        conn.begin().await.unwrap();
        conn.rollback().await.unwrap();
        assert!(!conn.in_transaction());
        assert_eq!(
            *log.lock().unwrap(),
            vec!["begin", "commit", "begin", "rollback"]
        );
    }
}
