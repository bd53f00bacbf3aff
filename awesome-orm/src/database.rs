//! # Database Module
//!
//! This module owns the connection pool and the two primitives every model
//! operation is built on: [`Executor::select`] and [`Executor::execute`].
//! Statements are written with `?` placeholders and backtick-quoted
//! identifiers and translated to the driver's native syntax before they run.

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{borrow::Cow, time::Duration};

use futures::{future::BoxFuture, StreamExt, TryStreamExt};
use serde::Deserialize;
use sqlx::{
    any::{AnyArguments, AnyPoolOptions},
    sqlite::{SqliteArguments, SqlitePoolOptions},
    AnyPool, Arguments, Encode, SqlitePool, Type,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{config::PoolConfig, Error, FieldKind, Row, Value};

// ============================================================================
// Database Driver Enum
// ============================================================================

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Drivers {
    /// PostgreSQL driver
    Postgres,
    /// MySQL driver
    #[default]
    MySQL,
    /// SQLite driver
    SQLite,
}

impl Drivers {
    /// Detects the driver from a connection URL scheme.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            Drivers::Postgres
        } else if url.starts_with("mysql") {
            Drivers::MySQL
        } else {
            Drivers::SQLite
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            Drivers::Postgres => "postgres",
            Drivers::MySQL => "mysql",
            Drivers::SQLite => "sqlite",
        }
    }

    /// Rewrites a statement for this driver.
    ///
    /// MySQL and SQLite accept `?` and backticks as written. PostgreSQL gets
    /// numbered `$n` parameters and double-quoted identifiers. Text inside
    /// single-quoted literals is left untouched.
    pub fn native_sql(self, sql: &str) -> Cow<'_, str> {
        if self != Drivers::Postgres {
            return Cow::Borrowed(sql);
        }

        let mut out = String::with_capacity(sql.len() + 8);
        let mut counter = 1;
        let mut in_literal = false;

        for c in sql.chars() {
            match c {
                '\'' => {
                    in_literal = !in_literal;
                    out.push(c);
                }
                '?' if !in_literal => {
                    out.push('$');
                    out.push_str(&counter.to_string());
                    counter += 1;
                }
                '`' if !in_literal => out.push('"'),
                _ => out.push(c),
            }
        }

        Cow::Owned(out)
    }
}

// ============================================================================
// Executor Trait
// ============================================================================

/// The query primitives used by models.
///
/// [`Database`] is the real implementation; tests can provide their own.
pub trait Executor: Send + Sync {
    /// Runs a query and returns at most `size` rows (all rows when `None` or
    /// `Some(0)`).
    fn select<'a>(&'a self, sql: &'a str, args: &'a [Value], size: Option<usize>) -> BoxFuture<'a, Result<Vec<Row>, Error>>;

    /// Runs a statement and returns the affected-row count.
    ///
    /// With `autocommit == false` the statement runs in its own transaction,
    /// committed on success and rolled back on failure.
    fn execute<'a>(&'a self, sql: &'a str, args: &'a [Value], autocommit: bool) -> BoxFuture<'a, Result<u64, Error>>;

    /// Commit mode used by model mutators.
    fn autocommit(&self) -> bool {
        true
    }
}

// ============================================================================
// Database Struct
// ============================================================================

/// The sqlx pool behind a [`Database`].
///
/// SQLite runs on its native driver; MySQL and PostgreSQL go through the
/// `Any` driver.
#[derive(Debug, Clone)]
pub enum Pool {
    Any(AnyPool),
    Sqlite(SqlitePool),
}

/// A handle to the connection pool.
///
/// Cheap to clone; every clone shares the same pool. Each `select`/`execute`
/// leases one connection for its own duration and returns it on every exit
/// path, including cancellation.
#[derive(Debug, Clone)]
pub struct Database {
    pub(crate) pool: Pool,
    pub(crate) driver: Drivers,
    pub(crate) autocommit: bool,
}

/// Creates the pool described by `config`.
///
/// Required options are checked before any connection is attempted.
///
/// ```rust,ignore
/// let config = PoolConfig::new("www-data", "www-data", "awesome");
/// let db = awesome_orm::create_pool(&config).await?;
/// ```
pub async fn create_pool(config: &PoolConfig) -> Result<Database, Error> {
    let url = config.url()?;
    log::info!("create {} connection pool for `{}@{}`", config.driver.scheme(), config.db.as_deref().unwrap_or(""), config.host);

    Database::builder()
        .min_connections(config.minsize)
        .max_connections(config.maxsize)
        .autocommit(config.autocommit)
        .connect(&url)
        .await
}

impl Database {
    /// Creates a new DatabaseBuilder for configuring the connection.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Connects to a database using the provided connection string.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        DatabaseBuilder::new().connect(url).await
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Closes every connection; waits for leased ones to be returned.
    pub async fn close(&self) {
        match &self.pool {
            Pool::Any(pool) => pool.close().await,
            Pool::Sqlite(pool) => pool.close().await,
        }
    }
}

/// Runs a query on a concrete pool and converts the fetched rows.
macro_rules! fetch_rows {
    ($pool:expr, $arguments:ty, $sql:expr, $args:expr, $size:expr) => {{
        let query = sqlx::query_with($sql, bind_arguments::<$arguments>($args)?);
        let fetched = match $size {
            Some(n) => query.fetch($pool).take(n).try_collect::<Vec<_>>().await?,
            None => query.fetch_all($pool).await?,
        };
        fetched.iter().map(Row::from_sqlx).collect::<Result<Vec<_>, Error>>()
    }};
}

/// Runs a statement on a concrete pool, inside a transaction unless `autocommit`.
macro_rules! run_statement {
    ($pool:expr, $arguments:ty, $sql:expr, $args:expr, $autocommit:expr) => {{
        let query = sqlx::query_with($sql, bind_arguments::<$arguments>($args)?);
        if $autocommit {
            query.execute($pool).await?.rows_affected()
        } else {
            let mut tx = $pool.begin().await?;
            let result = query.execute(&mut *tx).await;
            match result {
                Ok(done) => {
                    tx.commit().await?;
                    done.rows_affected()
                }
                Err(e) => {
                    if let Err(rollback) = tx.rollback().await {
                        log::error!("rollback failed: {}", rollback);
                    }
                    return Err(e.into());
                }
            }
        }
    }};
}

impl Executor for Database {
    fn select<'a>(&'a self, sql: &'a str, args: &'a [Value], size: Option<usize>) -> BoxFuture<'a, Result<Vec<Row>, Error>> {
        Box::pin(async move {
            log_statement(sql, args);
            let native = self.driver.native_sql(sql);
            // a size of zero fetches everything
            let size = size.filter(|n| *n > 0);

            let rows = match &self.pool {
                Pool::Any(pool) => fetch_rows!(pool, AnyArguments<'_>, &native, args, size),
                Pool::Sqlite(pool) => fetch_rows!(pool, SqliteArguments<'_>, &native, args, size),
            }?;
            log::info!("fetched rows: {}", rows.len());

            Ok(rows)
        })
    }

    fn execute<'a>(&'a self, sql: &'a str, args: &'a [Value], autocommit: bool) -> BoxFuture<'a, Result<u64, Error>> {
        Box::pin(async move {
            log_statement(sql, args);
            let native = self.driver.native_sql(sql);

            let affected = match &self.pool {
                Pool::Any(pool) => run_statement!(pool, AnyArguments<'_>, &native, args, autocommit),
                Pool::Sqlite(pool) => run_statement!(pool, SqliteArguments<'_>, &native, args, autocommit),
            };
            Ok(affected)
        })
    }

    fn autocommit(&self) -> bool {
        self.autocommit
    }
}

/// Binds `args` in order. Typed NULLs keep their SQL type.
fn bind_arguments<'q, A>(args: &'q [Value]) -> Result<A, Error>
where
    A: Arguments<'q>,
    bool: Encode<'q, A::Database> + Type<A::Database>,
    i64: Encode<'q, A::Database> + Type<A::Database>,
    f64: Encode<'q, A::Database> + Type<A::Database>,
    &'q str: Encode<'q, A::Database> + Type<A::Database>,
    Option<bool>: Encode<'q, A::Database> + Type<A::Database>,
    Option<i64>: Encode<'q, A::Database> + Type<A::Database>,
    Option<f64>: Encode<'q, A::Database> + Type<A::Database>,
    Option<String>: Encode<'q, A::Database> + Type<A::Database>,
{
    let mut out = A::default();
    for value in args {
        let added = match value {
            Value::Null => out.add(None::<String>),
            Value::TypedNull(kind) => match kind {
                FieldKind::Boolean => out.add(None::<bool>),
                FieldKind::Integer => out.add(None::<i64>),
                FieldKind::Float => out.add(None::<f64>),
                FieldKind::String | FieldKind::Text => out.add(None::<String>),
            },
            Value::Bool(b) => out.add(*b),
            Value::Int(i) => out.add(*i),
            Value::Float(x) => out.add(*x),
            Value::Text(s) => out.add(s.as_str()),
        };
        added.map_err(|e| Error::Encode(e.to_string()))?;
    }
    Ok(out)
}

/// Statement text with each `?` replaced by its argument, for log output only.
pub(crate) fn display_statement(sql: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut args = args.iter();
    for c in sql.chars() {
        if c == '?' {
            if let Some(arg) = args.next() {
                out.push_str(&arg.to_string());
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn log_statement(sql: &str, args: &[Value]) {
    log::info!("SQL: {}", display_statement(sql, args));
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

// ============================================================================
// DatabaseBuilder Struct
// ============================================================================

pub struct DatabaseBuilder {
    min_connections: u32,
    max_connections: u32,
    autocommit: bool,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { min_connections: 1, max_connections: 10, autocommit: true }
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Commit mode used by model mutators; `false` wraps each write in a transaction.
    pub fn autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }

    /// Opens the pool.
    ///
    /// An in-memory SQLite database is held by a single connection that is
    /// never retired, so its contents last as long as the pool.
    pub async fn connect(self, url: &str) -> Result<Database, Error> {
        let driver = Drivers::from_url(url);
        let in_memory = driver == Drivers::SQLite && is_in_memory(url);
        let max = if in_memory { 1 } else { self.max_connections };
        let min = self.min_connections.min(max);

        let pool = if driver == Drivers::SQLite {
            let mut options = SqlitePoolOptions::new().min_connections(min).max_connections(max);
            if in_memory {
                options = options.idle_timeout(None::<Duration>).max_lifetime(None::<Duration>);
            }
            Pool::Sqlite(options.connect(url).await?)
        } else {
            sqlx::any::install_default_drivers();
            Pool::Any(AnyPoolOptions::new().min_connections(min).max_connections(max).connect(url).await?)
        };

        Ok(Database { pool, driver, autocommit: self.autocommit })
    }
}
