//! # Error Module
//!
//! Every fallible operation in awesome-orm returns [`Error`]. Model registry and
//! pool configuration problems are grouped under [`ConfigError`], which is
//! `Clone` so it can be cached next to a model's metadata.

use thiserror::Error as ThisError;

/// Problems detected while registering a model or validating pool options.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConfigError {
    #[error("primary key not found for table `{table}`")]
    MissingPrimaryKey { table: String },

    #[error("duplicate primary key for field `{field}` in table `{table}`")]
    DuplicatePrimaryKey { table: String, field: String },

    #[error("duplicate field `{field}` in table `{table}`")]
    DuplicateField { table: String, field: String },

    #[error("missing required pool option `{0}`")]
    MissingOption(&'static str),

    #[error("invalid value for pool option `{key}`: {value}")]
    InvalidOption { key: &'static str, value: String },
}

/// The error type returned by awesome-orm.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("database error: {0}")]
    Execution(#[from] sqlx::Error),

    #[error("cannot decode column `{column}`: {reason}")]
    Decode { column: String, reason: String },

    #[error("cannot bind argument: {0}")]
    Encode(String),
}

impl Error {
    /// A decode failure not yet attributed to a column.
    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Error::Decode { column: String::new(), reason: reason.into() }
    }

    /// Attaches a column name to a [`Error::Decode`]; other variants pass through.
    pub fn in_column(self, column: &str) -> Self {
        match self {
            Error::Decode { reason, .. } => Error::Decode { column: column.to_string(), reason },
            other => other,
        }
    }
}
