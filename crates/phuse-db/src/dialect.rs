//! Database dialects.
//!
//! A builder is pinned to one dialect at construction. Everything the two
//! databases render differently goes through a method here, so each dialect's
//! syntax set is checked at compile time instead of probed at runtime.

use std::fmt;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    MySql,
    PgSql,
}

impl Dialect {
    /// Aggregate that joins grouped values into one string.
    pub fn group_concat(&self, field: &str) -> String {
        match self {
            Self::MySql => format!("GROUP_CONCAT({field})"),
            Self::PgSql => format!("STRING_AGG({field}, ',')"),
        }
    }

    /// Predicate testing containment of a JSON document bound at `placeholder`.
    pub fn json_contains(&self, column: &str, placeholder: &str) -> String {
        match self {
            Self::MySql => format!("JSON_CONTAINS({column}, {placeholder})"),
            Self::PgSql => format!("{column} @> {placeholder}::jsonb"),
        }
    }

    /// Predicate matching `column` against a regular expression bound at
    /// `placeholder`.
    pub fn regexp(&self, column: &str, placeholder: &str) -> String {
        match self {
            Self::MySql => format!("{column} REGEXP {placeholder}"),
            Self::PgSql => format!("{column} ~ {placeholder}"),
        }
    }

    /// Statement head for a duplicate-tolerant insert.
    pub fn insert_ignore_prefix(&self) -> &'static str {
        match self {
            Self::MySql => "INSERT IGNORE INTO",
            Self::PgSql => "INSERT INTO",
        }
    }

    /// Statement tail for a duplicate-tolerant insert, where the dialect
    /// expresses it as a suffix clause.
    pub fn insert_ignore_suffix(&self) -> Option<&'static str> {
        match self {
            Self::MySql => None,
            Self::PgSql => Some(" ON CONFLICT DO NOTHING"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MySql => f.write_str("mysql"),
            Self::PgSql => f.write_str("pgsql"),
        }
    }
}
