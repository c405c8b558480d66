//! Connection configuration.
//!
//! The `driver` field selects the dialect; the remaining fields assemble the
//! DSN string handed to the external driver.

use std::fmt;
use std::str::FromStr;

use crate::dialect::Dialect;
use crate::error::{DbError, Result};

/// Which database driver the configuration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    MySql,
    PgSql,
}

impl DriverKind {
    /// The dialect a builder should use for this driver.
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::MySql => Dialect::MySql,
            Self::PgSql => Dialect::PgSql,
        }
    }

    /// Conventional port for the driver.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::MySql => 3306,
            Self::PgSql => 5432,
        }
    }

    /// DSN scheme prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PgSql => "pgsql",
        }
    }
}

impl FromStr for DriverKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mysql" => Ok(Self::MySql),
            "pgsql" => Ok(Self::PgSql),
            other => Err(DbError::config(format!(
                "unsupported database driver: {other}"
            ))),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub driver: DriverKind,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Extra driver options appended to the DSN as `key=value` pairs.
    pub options: Vec<(String, String)>,
}

impl DbConfig {
    /// Create a configuration with the driver's conventional defaults.
    pub fn new(driver: DriverKind) -> Self {
        Self {
            driver,
            host: "localhost".to_string(),
            port: driver.default_port(),
            dbname: String::new(),
            user: String::new(),
            password: String::new(),
            options: Vec::new(),
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn dbname(mut self, dbname: &str) -> Self {
        self.dbname = dbname.to_string();
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = user.to_string();
        self
    }

    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// Append a driver option.
    pub fn option(mut self, key: &str, value: &str) -> Self {
        self.options.push((key.to_string(), value.to_string()));
        self
    }

    /// The dialect matching the configured driver.
    pub fn dialect(&self) -> Dialect {
        self.driver.dialect()
    }

    /// Assemble the DSN string:
    /// `driver:host=…;port=…;dbname=…;user=…;password=…[;extra=…]`.
    pub fn dsn(&self) -> String {
        let mut dsn = format!(
            "{}:host={};port={};dbname={};user={};password={}",
            self.driver, self.host, self.port, self.dbname, self.user, self.password
        );
        for (key, value) in &self.options {
            dsn.push(';');
            dsn.push_str(key);
            dsn.push('=');
            dsn.push_str(value);
        }
        dsn
    }

    /// Parse a DSN string produced by [`DbConfig::dsn`] (or written by hand
    /// in the same shape).
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let (scheme, rest) = dsn
            .split_once(':')
            .ok_or_else(|| DbError::config("DSN is missing the driver prefix"))?;
        let driver = DriverKind::from_str(scheme)?;
        let mut config = Self::new(driver);

        for segment in rest.split(';').filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                DbError::config(format!("malformed DSN segment: {segment}"))
            })?;
            match key {
                "host" => config.host = value.to_string(),
                "port" => {
                    config.port = value
                        .parse()
                        .map_err(|_| DbError::config(format!("invalid port: {value}")))?;
                }
                "dbname" => config.dbname = value.to_string(),
                "user" => config.user = value.to_string(),
                "password" => config.password = value.to_string(),
                _ => config.options.push((key.to_string(), value.to_string())),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Eager structural checks.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(DbError::config("host cannot be empty"));
        }
        if self.dbname.is_empty() {
            return Err(DbError::config("dbname cannot be empty"));
        }
        Ok(())
    }
}
