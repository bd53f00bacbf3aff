//! # Row Module
//!
//! Fetched rows are turned into [`Row`]s: an ordered column name → [`Value`]
//! mapping independent of the driver that produced them.

use sqlx::{Column, ColumnIndex, Decode, Type, ValueRef};

use crate::{value::FromValue, Error, Value};

/// One fetched row, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, replacing an earlier one with the same name.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    /// Decodes a column into `T`. A missing column decodes like `NULL`.
    pub fn decode<T: FromValue>(&self, column: &str) -> Result<T, Error> {
        let value = self.get(column).cloned().unwrap_or(Value::Null);
        T::from_value(value).map_err(|e| e.in_column(column))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, v)| (name.as_str(), v))
    }

    /// Converts a driver row by trying each column against the supported types.
    ///
    /// Works on `AnyRow` (MySQL, PostgreSQL) and `SqliteRow`. Decoding follows the
    /// value actually stored, so SQLite booleans come back as integers.
    pub(crate) fn from_sqlx<R>(row: &R) -> Result<Self, Error>
    where
        R: sqlx::Row,
        usize: ColumnIndex<R>,
        i64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
        f64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
        f32: Type<R::Database> + for<'r> Decode<'r, R::Database>,
        bool: Type<R::Database> + for<'r> Decode<'r, R::Database>,
        String: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    {
        let mut out = Row { columns: Vec::with_capacity(row.len()) };

        for (i, column) in row.columns().iter().enumerate() {
            let value = if row.try_get_raw(i)?.is_null() {
                Value::Null
            } else if let Ok(v) = row.try_get::<i64, _>(i) {
                Value::Int(v)
            } else if let Ok(v) = row.try_get::<f64, _>(i) {
                Value::Float(v)
            } else if let Ok(v) = row.try_get::<f32, _>(i) {
                Value::Float(f64::from(v))
            } else if let Ok(v) = row.try_get::<bool, _>(i) {
                Value::Bool(v)
            } else {
                Value::Text(row.try_get::<String, _>(i)?)
            };
            out.columns.push((column.name().to_string(), value));
        }

        Ok(out)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}
