//! Error types for phuse-db

use thiserror::Error;

use crate::driver::DriverError;

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DbError>;

/// Error types for query building and execution
#[derive(Debug, Error)]
pub enum DbError {
    /// Configuration error (unsupported driver, malformed DSN, bad pool sizing)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Statement execution error surfaced by the driver, original code preserved
    #[error("Execution error: {message}")]
    Execution {
        message: String,
        /// Driver-reported SQLSTATE or vendor error code, if any.
        code: Option<String>,
    },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pool acquire timeout
    #[cfg(feature = "pool")]
    #[error("Pool acquire timeout after {0:?}")]
    PoolTimeout(std::time::Duration),
}

impl DbError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an execution error without a driver code
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
            code: None,
        }
    }

    /// The driver-reported error code, if this is an execution error that carries one
    pub fn driver_code(&self) -> Option<&str> {
        match self {
            Self::Execution { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if the driver reported a unique/duplicate-key violation.
    ///
    /// Matches SQLSTATE 23505 (PostgreSQL) and errno 1062 (MySQL).
    pub fn is_unique_violation(&self) -> bool {
        matches!(self.driver_code(), Some("23505") | Some("1062"))
    }

    /// Check if the driver reported a foreign key violation.
    ///
    /// Matches SQLSTATE 23503 (PostgreSQL) and errnos 1451/1452 (MySQL).
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.driver_code(), Some("23503") | Some("1451") | Some("1452"))
    }

    /// Check if this is a pool acquire timeout
    #[cfg(feature = "pool")]
    pub fn is_pool_timeout(&self) -> bool {
        matches!(self, Self::PoolTimeout(_))
    }
}

impl From<DriverError> for DbError {
    fn from(err: DriverError) -> Self {
        Self::Execution {
            message: err.message,
            code: err.code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_code_is_preserved() {
        let err = DbError::from(DriverError::with_code("duplicate entry", "1062"));
        assert_eq!(err.driver_code(), Some("1062"));
        assert!(err.is_unique_violation());
        assert!(!err.is_foreign_key_violation());
    }

    #[test]
    fn execution_without_code() {
        let err = DbError::execution("server has gone away");
        assert_eq!(err.driver_code(), None);
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn foreign_key_codes() {
        for code in ["23503", "1451", "1452"] {
            let err = DbError::from(DriverError::with_code("fk violation", code));
            assert!(err.is_foreign_key_violation(), "code {code}");
        }
    }

    #[test]
    fn predicates() {
        assert!(DbError::validation("empty SET").is_validation());
        assert!(DbError::config("unsupported driver").is_config());
        assert!(!DbError::config("x").is_validation());
    }
}
