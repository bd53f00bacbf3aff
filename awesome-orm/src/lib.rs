//! # awesome-orm
//!
//! A lightweight async ORM for small web applications, built on top of sqlx.
//!
//! Models are plain structs deriving [`Model`]. Registration happens once per
//! type and pre-computes the select, insert, update and delete statements;
//! finders and mutators then run those statements through a pooled
//! [`Database`] handle that is passed in explicitly.
//!
//! ```rust,ignore
//! use awesome_orm::{create_pool, FindAll, Model, PoolConfig};
//!
//! #[derive(Model, Debug, Clone)]
//! #[orm(table = "users")]
//! struct User {
//!     #[orm(primary_key, ddl = "varchar(50)")]
//!     id: String,
//!     #[orm(ddl = "varchar(50)")]
//!     email: String,
//!     admin: Option<bool>,
//!     name: String,
//! }
//!
//! let db = create_pool(&PoolConfig::new("www-data", "www-data", "awesome")).await?;
//!
//! let mut user = User { id: "u1".into(), email: "test@example.com".into(), admin: None, name: "Test".into() };
//! user.save(&db).await?;
//!
//! let found = User::find(&db, "u1").await?;
//! let admins = User::find_all(&db, FindAll::new().filter("`admin`=?", [true]).limit(10)).await?;
//! let total = User::find_number(&db, "count(`id`)", None, &[]).await?;
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod field;
pub mod model;
pub mod query;
pub mod row;
pub mod value;

pub use awesome_orm_macro::Model;

pub use config::PoolConfig;
pub use database::{create_pool, Database, DatabaseBuilder, Drivers, Executor, Pool};
pub use error::{ConfigError, Error};
pub use field::{Field, FieldDefault, FieldKind};
pub use model::{Model, ModelMeta, NUMBER_ALIAS};
pub use query::{FindAll, Limit};
pub use row::Row;
pub use value::{FromValue, Value};
