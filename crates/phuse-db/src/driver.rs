//! The driver seam.
//!
//! The actual database driver is an external collaborator; this crate ships
//! the interface only. A driver receives named-placeholder SQL together with
//! the bind registry and is responsible for its own wire-level substitution
//! and typed binding.

use async_trait::async_trait;

use crate::qb::Bindings;
use crate::row::Row;

/// Result type for driver calls.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// Failure reported by a driver.
///
/// `code` carries the vendor error code (SQLSTATE or errno) verbatim so the
/// caller can classify the failure after conversion into [`DbError`].
///
/// [`DbError`]: crate::DbError
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    pub message: String,
    pub code: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

/// A database handle able to run one statement at a time.
///
/// Mirrors the prepared-statement verbs of the usual driver interfaces:
/// execute for mutations, fetch for projections, plus last-insert-id and the
/// transaction trio as pass-throughs.
#[async_trait]
pub trait Driver: Send {
    /// Run a statement and return the number of affected rows.
    async fn execute(&mut self, sql: &str, bindings: &Bindings) -> DriverResult<u64>;

    /// Run a statement and fetch every result row.
    async fn fetch_all(&mut self, sql: &str, bindings: &Bindings) -> DriverResult<Vec<Row>>;

    /// Run a statement and fetch the first result row, if any.
    async fn fetch_one(&mut self, sql: &str, bindings: &Bindings) -> DriverResult<Option<Row>> {
        let mut rows = self.fetch_all(sql, bindings).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    /// Identifier generated by the last insert on this handle, if the driver
    /// tracks one.
    async fn last_insert_id(&mut self) -> DriverResult<Option<String>>;

    async fn begin(&mut self) -> DriverResult<()>;

    async fn commit(&mut self) -> DriverResult<()>;

    async fn rollback(&mut self) -> DriverResult<()>;
}
