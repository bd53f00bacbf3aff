//! # Config Module
//!
//! [`PoolConfig`] carries the options recognised by `create_pool`. It
//! deserializes from any serde source with every key optional, and can be
//! read from `DB_*` environment variables.

use serde::Deserialize;
use url::Url;

use crate::{database::Drivers, error::ConfigError};

/// Connection pool options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub driver: Drivers,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub db: Option<String>,
    pub charset: String,
    pub autocommit: bool,
    pub minsize: u32,
    pub maxsize: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            driver: Drivers::MySQL,
            host: "localhost".to_string(),
            port: 3306,
            user: None,
            password: None,
            db: None,
            charset: "utf8".to_string(),
            autocommit: true,
            minsize: 1,
            maxsize: 10,
        }
    }
}

impl PoolConfig {
    /// Defaults plus the three required options.
    pub fn new(user: impl Into<String>, password: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            password: Some(password.into()),
            db: Some(db.into()),
            ..Self::default()
        }
    }

    /// Reads `DB_DRIVER`, `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD`,
    /// `DB_NAME`, `DB_CHARSET`, `DB_AUTOCOMMIT`, `DB_MINSIZE` and `DB_MAXSIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PoolConfig::from_env`] with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(driver) = lookup("DB_DRIVER") {
            config.driver = match driver.to_ascii_lowercase().as_str() {
                "mysql" => Drivers::MySQL,
                "postgres" | "postgresql" => Drivers::Postgres,
                "sqlite" => Drivers::SQLite,
                _ => return Err(ConfigError::InvalidOption { key: "driver", value: driver }),
            };
        }
        if let Some(host) = lookup("DB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            config.port = parse("port", port)?;
        }
        config.user = lookup("DB_USER");
        config.password = lookup("DB_PASSWORD");
        config.db = lookup("DB_NAME");
        if let Some(charset) = lookup("DB_CHARSET") {
            config.charset = charset;
        }
        if let Some(autocommit) = lookup("DB_AUTOCOMMIT") {
            config.autocommit = parse("autocommit", autocommit)?;
        }
        if let Some(minsize) = lookup("DB_MINSIZE") {
            config.minsize = parse("minsize", minsize)?;
        }
        if let Some(maxsize) = lookup("DB_MAXSIZE") {
            config.maxsize = parse("maxsize", maxsize)?;
        }

        Ok(config)
    }

    /// Checks the required options and pool bounds.
    ///
    /// `user`, `password` and `db` are required for server databases; SQLite
    /// only needs `db` (a file path or `:memory:`).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.driver != Drivers::SQLite {
            if self.user.is_none() {
                return Err(ConfigError::MissingOption("user"));
            }
            if self.password.is_none() {
                return Err(ConfigError::MissingOption("password"));
            }
        }
        if self.db.is_none() {
            return Err(ConfigError::MissingOption("db"));
        }
        if self.maxsize == 0 || self.minsize > self.maxsize {
            return Err(ConfigError::InvalidOption {
                key: "maxsize",
                value: format!("minsize {} / maxsize {}", self.minsize, self.maxsize),
            });
        }
        Ok(())
    }

    /// Builds the connection URL after validating.
    pub fn url(&self) -> Result<String, ConfigError> {
        self.validate()?;
        let db = self.db.as_deref().unwrap_or_default();

        if self.driver == Drivers::SQLite {
            return Ok(if db == ":memory:" { "sqlite::memory:".to_string() } else { format!("sqlite://{}", db) });
        }

        let invalid = |key: &'static str, value: &str| ConfigError::InvalidOption { key, value: value.to_string() };

        let mut url = Url::parse(&format!("{}://{}", self.driver.scheme(), self.host))
            .map_err(|_| invalid("host", &self.host))?;
        url.set_port(Some(self.port)).map_err(|_| invalid("port", &self.port.to_string()))?;
        url.set_username(self.user.as_deref().unwrap_or_default()).map_err(|_| invalid("user", ""))?;
        url.set_password(self.password.as_deref()).map_err(|_| invalid("password", ""))?;
        url.set_path(&format!("/{}", db));

        if self.driver == Drivers::MySQL {
            url.query_pairs_mut().append_pair("charset", &self.charset);
        }

        Ok(url.to_string())
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidOption { key, value })
}
