//! # Field Module
//!
//! A [`Field`] describes one mapped column: its name, SQL type, whether it is
//! the primary key, and the default used to backfill unset values on insert.
//!
//! The five flavor constructors only preset `column_type` and the default; all
//! of them produce the same `Field` shape.
//!
//! ```rust,ignore
//! use awesome_orm::Field;
//!
//! let id = Field::string().ddl("varchar(50)").primary_key();
//! let admin = Field::boolean();
//! let created_at = Field::float().with_default_fn(|| awesome_orm::Value::Float(0.5));
//! ```

use std::{borrow::Cow, fmt};

use crate::Value;

/// The flavor constructor a field was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Boolean,
    Float,
    Text,
}

impl FieldKind {
    pub fn class_name(self) -> &'static str {
        match self {
            FieldKind::String => "StringField",
            FieldKind::Integer => "IntegerField",
            FieldKind::Boolean => "BooleanField",
            FieldKind::Float => "FloatField",
            FieldKind::Text => "TextField",
        }
    }

    /// NULL carrying this kind's SQL type.
    pub fn null(self) -> Value {
        Value::TypedNull(self)
    }
}

/// Default applied on insert when a value is unset.
#[derive(Debug, Clone, Default)]
pub enum FieldDefault {
    #[default]
    None,
    Value(Value),
    Factory(fn() -> Value),
}

/// Declarative description of one mapped column.
#[derive(Debug, Clone)]
pub struct Field {
    pub kind: FieldKind,
    /// Column name. `None` until registration fills in the attribute name.
    pub name: Option<Cow<'static, str>>,
    pub column_type: Cow<'static, str>,
    pub primary_key: bool,
    pub default: FieldDefault,
}

impl Field {
    fn new(kind: FieldKind, column_type: &'static str, default: FieldDefault) -> Self {
        Self { kind, name: None, column_type: Cow::Borrowed(column_type), primary_key: false, default }
    }

    /// `varchar(100)`, no default.
    pub fn string() -> Self {
        Self::new(FieldKind::String, "varchar(100)", FieldDefault::None)
    }

    /// `bigint`, defaults to `0`.
    pub fn integer() -> Self {
        Self::new(FieldKind::Integer, "bigint", FieldDefault::Value(Value::Int(0)))
    }

    /// `boolean`, defaults to `false`.
    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean, "boolean", FieldDefault::Value(Value::Bool(false)))
    }

    /// `real`, defaults to `0.0`.
    pub fn float() -> Self {
        Self::new(FieldKind::Float, "real", FieldDefault::Value(Value::Float(0.0)))
    }

    /// `text`, no default.
    pub fn text() -> Self {
        Self::new(FieldKind::Text, "text", FieldDefault::None)
    }

    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Overrides the SQL type literal.
    pub fn ddl(mut self, column_type: impl Into<Cow<'static, str>>) -> Self {
        self.column_type = column_type.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }

    /// Sets a factory that is called each time a default is needed.
    pub fn with_default_fn(mut self, factory: fn() -> Value) -> Self {
        self.default = FieldDefault::Factory(factory);
        self
    }

    pub fn without_default(mut self) -> Self {
        self.default = FieldDefault::None;
        self
    }

    /// Column name, or an empty string before registration.
    pub fn column(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Resolves the default, invoking the factory if there is one.
    ///
    /// Zero, `false` and the empty string are real defaults and are returned as such.
    pub fn default_value(&self) -> Option<Value> {
        match &self.default {
            FieldDefault::None => None,
            FieldDefault::Value(v) => Some(v.clone()),
            FieldDefault::Factory(f) => Some(f()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}:{}>", self.kind.class_name(), self.column_type, self.column())
    }
}
