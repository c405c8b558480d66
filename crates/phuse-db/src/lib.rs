//! # phuse-db
//!
//! A fluent SQL builder with named placeholders, plus the connection layer
//! that runs what it builds.
//!
//! ## Features
//!
//! - **One builder, two dialects**: MySQL and PostgreSQL variants chosen at
//!   construction, each rendering its own function syntax
//! - **Named placeholders**: every bound value becomes `:name`, allocated
//!   uniquely per builder, never spliced into the SQL text
//! - **Typed clause fragments**: statements are serialized once, in fixed
//!   clause order, by a single writer
//! - **Driver-agnostic execution**: [`Connection`] stages SQL plus binds and
//!   talks to any [`Driver`] implementation
//! - **Optional pooling**: best-effort connection reuse behind the `pool`
//!   feature
//!
//! ## Query builder (qb)
//!
//! ```
//! use phuse_db::qb;
//!
//! let mut users = qb::mysql("users");
//!
//! // SELECT
//! users = users
//!     .select("id, name, email")
//!     .where_("status", "active", "=")
//!     .order_by("created_at DESC")
//!     .limit(10);
//! assert_eq!(
//!     users.to_sql(),
//!     "SELECT id, name, email FROM users \
//!      WHERE status = :status1 ORDER BY created_at DESC LIMIT 10"
//! );
//!
//! // INSERT (compile also resets the clauses for the next statement)
//! let sql = qb::mysql("users")
//!     .insert([("name", "alice"), ("email", "a@example.com")])
//!     .compile();
//! assert_eq!(sql, "INSERT INTO users (name, email) VALUES (:name1, :email2)");
//! ```
//!
//! ## Execution
//!
//! ```ignore
//! let mut qb = qb::pgsql("users").delete().where_eq("id", user_id);
//! let sql = qb.compile();
//!
//! let mut conn = pool.acquire().await?;
//! conn.query(sql);
//! conn.bind_many(qb.take_bindings())?;
//! conn.execute().await?;
//! conn.release().await?;
//! ```

pub mod config;
pub mod connection;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod qb;
pub mod row;
pub mod value;

pub use config::{DbConfig, DriverKind};
pub use connection::Connection;
pub use dialect::Dialect;
pub use driver::{Driver, DriverError, DriverResult};
pub use error::{DbError, Result};
pub use row::Row;
pub use value::Value;

// Re-export the builder entry points for easy access
pub use qb::{Bindings, QueryBuilder};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{ConnectionPool, Connector, PoolGuard, PoolOptions, PoolStats};
