//! Fluent SQL construction with named placeholders.
//!
//! One [`QueryBuilder`] accumulates typed clause fragments and a
//! [`Bindings`] registry; [`QueryBuilder::compile`] serializes them into a
//! single statement in fixed clause order. Placeholder names are allocated
//! per builder (`:id1`, `:id2`, …) so the same column, or the same value,
//! can be bound any number of times without collision.
//!
//! ```
//! use phuse_db::qb;
//!
//! let sql = qb::mysql("users")
//!     .select("id, name")
//!     .where_("age", 18, ">=")
//!     .order_by("name ASC")
//!     .limit(10)
//!     .compile();
//! assert_eq!(
//!     sql,
//!     "SELECT id, name FROM users WHERE age >= :age1 ORDER BY name ASC LIMIT 10"
//! );
//! ```

mod bind;
mod builder;
mod clause;
mod operator;

pub use bind::Bindings;
pub use builder::QueryBuilder;

use crate::dialect::Dialect;

/// A builder speaking MySQL against `table`.
pub fn mysql(table: &str) -> QueryBuilder {
    QueryBuilder::new(Dialect::MySql, table)
}

/// A builder speaking PostgreSQL against `table`.
pub fn pgsql(table: &str) -> QueryBuilder {
    QueryBuilder::new(Dialect::PgSql, table)
}
