//! # Model Module
//!
//! A model is a Rust struct mapped onto one table. Its [`ModelMeta`] is built
//! once per type from the declared [`Field`]s and carries the four statement
//! templates every finder and mutator is built on.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    database::Executor,
    error::ConfigError,
    query::FindAll,
    Error, Field, Row, Value,
};

/// Alias of the column returned by [`Model::find_number`].
pub const NUMBER_ALIAS: &str = "_num_";

/// Wraps an identifier in backticks.
pub(crate) fn escape(ident: &str) -> String {
    format!("`{}`", ident)
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// Table metadata computed once per model type.
#[derive(Debug, Clone)]
pub struct ModelMeta {
    table_name: String,
    mappings: Vec<(&'static str, Field)>,
    fields: Vec<&'static str>,
    primary_key: &'static str,
    select_stmt: String,
    insert_stmt: String,
    update_stmt: String,
    delete_stmt: String,
}

impl ModelMeta {
    /// Registers a model: partitions `declared` into the primary key and the
    /// ordinary fields and synthesizes the statement templates.
    ///
    /// Fails when no field, or more than one, is marked as primary key.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let meta = ModelMeta::build("users", vec![
    ///     ("id", Field::string().ddl("varchar(50)").primary_key()),
    ///     ("email", Field::string()),
    /// ])?;
    /// assert_eq!(meta.select_stmt(), "select `id`,`email` from `users`");
    /// ```
    pub fn build(table_name: impl Into<String>, declared: Vec<(&'static str, Field)>) -> Result<Self, ConfigError> {
        let table_name = table_name.into();
        let mut mappings: Vec<(&'static str, Field)> = Vec::with_capacity(declared.len());
        let mut fields = Vec::new();
        let mut primary_key = None;

        for (attr, mut field) in declared {
            if mappings.iter().any(|(seen, _)| *seen == attr) {
                return Err(ConfigError::DuplicateField { table: table_name, field: attr.to_string() });
            }
            if field.name.is_none() {
                field.name = Some(attr.into());
            }

            if field.primary_key {
                if primary_key.is_some() {
                    return Err(ConfigError::DuplicatePrimaryKey { table: table_name, field: attr.to_string() });
                }
                primary_key = Some(attr);
            } else {
                fields.push(attr);
            }
            mappings.push((attr, field));
        }

        let primary_key = primary_key.ok_or_else(|| ConfigError::MissingPrimaryKey { table: table_name.clone() })?;

        let column = |attr: &str| {
            mappings.iter().find(|(a, _)| *a == attr).map(|(_, f)| escape(f.column())).unwrap_or_default()
        };
        let table = escape(&table_name);
        let pk = column(primary_key);
        let escaped_fields: Vec<String> = fields.iter().map(|f| column(*f)).collect();

        let select_stmt = if escaped_fields.is_empty() {
            format!("select {} from {}", pk, table)
        } else {
            format!("select {},{} from {}", pk, escaped_fields.join(","), table)
        };

        let mut insert_columns = escaped_fields.clone();
        insert_columns.push(pk.clone());
        let insert_stmt = format!(
            "insert into {} ({}) values ({})",
            table,
            insert_columns.join(","),
            placeholders(insert_columns.len())
        );

        // a key-only model assigns the key to itself
        let assignments = if escaped_fields.is_empty() {
            format!("{}={}", pk, pk)
        } else {
            escaped_fields.iter().map(|f| format!("{}=?", f)).collect::<Vec<_>>().join(",")
        };
        let update_stmt = format!("update {} set {} where {}=?", table, assignments, pk);
        let delete_stmt = format!("delete from {} where {}=?", table, pk);

        Ok(Self {
            table_name,
            mappings,
            fields,
            primary_key,
            select_stmt,
            insert_stmt,
            update_stmt,
            delete_stmt,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Every declared field, in declaration order.
    pub fn mappings(&self) -> &[(&'static str, Field)] {
        &self.mappings
    }

    /// Non-primary-key attribute names, in declaration order.
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn primary_key(&self) -> &'static str {
        self.primary_key
    }

    pub fn field(&self, attr: &str) -> Option<&Field> {
        self.mappings.iter().find(|(a, _)| *a == attr).map(|(_, f)| f)
    }

    /// Column name of an attribute.
    pub fn column(&self, attr: &str) -> Option<&str> {
        self.field(attr).map(Field::column)
    }

    pub fn select_stmt(&self) -> &str {
        &self.select_stmt
    }

    pub fn insert_stmt(&self) -> &str {
        &self.insert_stmt
    }

    pub fn update_stmt(&self) -> &str {
        &self.update_stmt
    }

    pub fn delete_stmt(&self) -> &str {
        &self.delete_stmt
    }

    /// NULL typed after the field's kind; untyped for unknown attributes.
    pub(crate) fn null_for(&self, attr: &str) -> Value {
        self.field(attr).map_or(Value::Null, |f| f.kind.null())
    }

    fn pk_column(&self) -> String {
        escape(self.column(self.primary_key).unwrap_or(self.primary_key))
    }
}

/// A struct mapped onto one table.
///
/// The four required methods are generated by `#[derive(Model)]`; the finders
/// and mutators are provided on top of them and run through any [`Executor`].
///
/// # Example
///
/// ```rust,ignore
/// use awesome_orm::{Database, FindAll, Model};
///
/// #[derive(Model, Debug, Clone)]
/// #[orm(table = "users")]
/// struct User {
///     #[orm(primary_key, ddl = "varchar(50)")]
///     id: String,
///     email: String,
///     admin: Option<bool>,
/// }
///
/// let mut user = User { id: "u1".into(), email: "a@b.c".into(), admin: None };
/// user.save(&db).await?;
/// let users = User::find_all(&db, FindAll::new().order_by("`email`").limit(10)).await?;
/// ```
#[async_trait]
pub trait Model: Sized + Send + Sync {
    /// The registered metadata; built on first use and cached.
    fn meta() -> Result<&'static ModelMeta, Error>;

    /// Attribute name → value for every member that is set. Unset (`None`)
    /// optional members are left out.
    fn values(&self) -> HashMap<&'static str, Value>;

    /// Writes a value into the member named `field`.
    fn set_value(&mut self, field: &str, value: Value) -> Result<(), Error>;

    /// Hydrates an instance from a fetched row.
    fn from_row(row: &Row) -> Result<Self, Error>;

    /// Fetches the row whose primary key equals `pk`.
    async fn find<E, V>(db: &E, pk: V) -> Result<Option<Self>, Error>
    where
        E: Executor + ?Sized,
        V: Into<Value> + Send,
    {
        let meta = Self::meta()?;
        let sql = format!("{} where {}=?", meta.select_stmt(), meta.pk_column());
        let rows = db.select(&sql, &[pk.into()], Some(1)).await?;

        rows.first().map(Self::from_row).transpose()
    }

    /// Fetches every row matching `query`.
    async fn find_all<E>(db: &E, query: FindAll) -> Result<Vec<Self>, Error>
    where
        E: Executor + ?Sized,
    {
        let meta = Self::meta()?;
        let sql = query.to_sql(meta.select_stmt())?;
        let rows = db.select(&sql, query.args(), None).await?;

        rows.iter().map(Self::from_row).collect()
    }

    /// Evaluates a single aggregate expression, e.g. `count(id)`.
    ///
    /// Returns `Value::Int(0)` when the query yields no row.
    async fn find_number<E>(db: &E, expr: &str, where_clause: Option<&str>, args: &[Value]) -> Result<Value, Error>
    where
        E: Executor + ?Sized,
    {
        let meta = Self::meta()?;
        let mut sql = format!("select {} as {} from {}", expr, escape(NUMBER_ALIAS), escape(meta.table_name()));
        if let Some(clause) = where_clause {
            sql.push_str(" where ");
            sql.push_str(clause);
        }

        let rows = db.select(&sql, args, Some(1)).await?;
        Ok(rows.first().and_then(|r| r.get(NUMBER_ALIAS).cloned()).unwrap_or(Value::Int(0)))
    }

    /// Inserts this instance.
    ///
    /// Unset members take their field default, which is also written back into
    /// the instance. The primary key is bound last.
    async fn save<E>(&mut self, db: &E) -> Result<u64, Error>
    where
        E: Executor + ?Sized,
    {
        let meta = Self::meta()?;
        let mut values = self.values();
        let mut args = Vec::with_capacity(meta.fields().len() + 1);

        for attr in meta.fields().iter().copied().chain(std::iter::once(meta.primary_key())) {
            let value = match values.remove(attr) {
                Some(v) => v,
                None => match meta.field(attr).and_then(Field::default_value) {
                    Some(default) => {
                        self.set_value(attr, default.clone())?;
                        default
                    }
                    None => meta.null_for(attr),
                },
            };
            args.push(value);
        }

        let rows = db.execute(meta.insert_stmt(), &args, db.autocommit()).await?;
        if rows != 1 {
            log::warn!("failed to insert into table `{}`: affected rows {}, args: {}", meta.table_name(), rows, join(&args));
        }
        Ok(rows)
    }

    /// Writes every field of this instance to the row with its primary key.
    async fn update<E>(&self, db: &E) -> Result<u64, Error>
    where
        E: Executor + ?Sized,
    {
        let meta = Self::meta()?;
        let mut values = self.values();
        let args: Vec<Value> = meta
            .fields()
            .iter()
            .copied()
            .chain(std::iter::once(meta.primary_key()))
            .map(|attr| values.remove(attr).unwrap_or_else(|| meta.null_for(attr)))
            .collect();

        let rows = db.execute(meta.update_stmt(), &args, db.autocommit()).await?;
        if rows != 1 {
            log::warn!("failed to update rows in table `{}`: affected rows {}, args: {}", meta.table_name(), rows, join(&args));
        }
        Ok(rows)
    }

    /// Deletes the row with this instance's primary key.
    async fn remove<E>(&self, db: &E) -> Result<u64, Error>
    where
        E: Executor + ?Sized,
    {
        let meta = Self::meta()?;
        let args = vec![self.values().remove(meta.primary_key()).unwrap_or_else(|| meta.null_for(meta.primary_key()))];

        let rows = db.execute(meta.delete_stmt(), &args, db.autocommit()).await?;
        if rows != 1 {
            log::warn!("failed to delete rows from table `{}`: affected rows {}, args: {}", meta.table_name(), rows, join(&args));
        }
        Ok(rows)
    }
}

pub(crate) fn join(args: &[Value]) -> String {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}
