//! # Query Module
//!
//! [`FindAll`] collects the optional clauses appended to a model's select
//! template: a raw `where` fragment with its arguments, an `order by`
//! fragment, and a [`Limit`].

use crate::{Error, Value};

/// Row limit for [`FindAll`].
///
/// Only an integer count or an `(offset, count)` pair is valid. Anything else
/// converts into [`Limit::Raw`], which is rejected when the statement is
/// rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    Count(i64),
    Range(i64, i64),
    Raw(String),
}

impl Limit {
    /// Renders the clause body, e.g. `5` or `10,5`.
    pub fn render(&self) -> Result<String, Error> {
        match self {
            Limit::Count(n) => Ok(non_negative(*n, self)?.to_string()),
            Limit::Range(offset, count) => {
                Ok(format!("{},{}", non_negative(*offset, self)?, non_negative(*count, self)?))
            }
            Limit::Raw(_) => Err(invalid(self)),
        }
    }
}

fn non_negative(n: i64, limit: &Limit) -> Result<i64, Error> {
    if n < 0 { Err(invalid(limit)) } else { Ok(n) }
}

fn invalid(limit: &Limit) -> Error {
    Error::InvalidArgument(format!("invalid limit value: {:?}", limit))
}

macro_rules! impl_limit_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Limit {
                fn from(n: $t) -> Self {
                    Limit::Count(i64::from(n))
                }
            }

            impl From<($t, $t)> for Limit {
                fn from((offset, count): ($t, $t)) -> Self {
                    Limit::Range(i64::from(offset), i64::from(count))
                }
            }
        )*
    };
}

impl_limit_from!(i32, i64, u8, u16, u32);

impl From<usize> for Limit {
    fn from(n: usize) -> Self {
        Limit::Count(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<(usize, usize)> for Limit {
    fn from((offset, count): (usize, usize)) -> Self {
        Limit::Range(i64::try_from(offset).unwrap_or(i64::MAX), i64::try_from(count).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Limit {
    fn from(text: &str) -> Self {
        Limit::Raw(text.to_string())
    }
}

impl From<String> for Limit {
    fn from(text: String) -> Self {
        Limit::Raw(text)
    }
}

/// Options for `Model::find_all`.
#[derive(Debug, Clone, Default)]
pub struct FindAll {
    where_clause: Option<String>,
    args: Vec<Value>,
    order_by: Option<String>,
    limit: Option<Limit>,
}

impl FindAll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw condition, e.g. ``"`email`=?"``, with one argument per `?`.
    pub fn filter<I, V>(mut self, clause: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_clause = Some(clause.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Raw ordering, e.g. ``"`created_at` desc"``.
    pub fn order_by(mut self, order: impl Into<String>) -> Self {
        self.order_by = Some(order.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Appends the clauses to `select`. Fails on an invalid limit before any
    /// statement reaches the database.
    pub fn to_sql(&self, select: &str) -> Result<String, Error> {
        let mut sql = vec![select.to_string()];

        if let Some(clause) = self.where_clause.as_deref().filter(|c| !c.is_empty()) {
            sql.push("where".to_string());
            sql.push(clause.to_string());
        }

        if let Some(order) = &self.order_by {
            sql.push("order by".to_string());
            sql.push(order.clone());
        }

        if let Some(limit) = &self.limit {
            sql.push("limit".to_string());
            sql.push(limit.render()?);
        }

        Ok(sql.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SELECT: &str = "select `id`,`name` from `users`";

    #[test]
    fn bare_query_is_the_template() {
        assert_eq!(FindAll::new().to_sql(SELECT).unwrap(), SELECT);
    }

    #[test]
    fn clauses_are_appended_in_order() {
        let query = FindAll::new().filter("`name`=?", ["bob"]).order_by("`id` desc").limit(5);
        assert_eq!(
            query.to_sql(SELECT).unwrap(),
            "select `id`,`name` from `users` where `name`=? order by `id` desc limit 5"
        );
        assert_eq!(query.args(), [Value::from("bob")]);
    }

    #[test]
    fn pair_limit_renders_offset_and_count() {
        let sql = FindAll::new().limit((10, 5)).to_sql(SELECT).unwrap();
        assert!(sql.ends_with("limit 10,5"));
    }

    #[test]
    fn text_limits_are_rejected_even_when_numeric() {
        for text in ["5", "10,5", "x"] {
            let err = FindAll::new().limit(text).to_sql(SELECT).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{text}");
        }
    }

    #[test]
    fn invalid_limits_are_rejected() {
        for limit in [Limit::from("x"), Limit::from("1,2,3"), Limit::from(""), Limit::Count(-1), Limit::Range(0, -5)] {
            let err = FindAll::new().limit(limit).to_sql(SELECT).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)));
        }
    }

    #[test]
    fn empty_where_is_skipped() {
        let sql = FindAll::new().filter("", Vec::<Value>::new()).to_sql(SELECT).unwrap();
        assert_eq!(sql, SELECT);
    }
}
