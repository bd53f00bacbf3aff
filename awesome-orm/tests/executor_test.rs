use std::sync::Mutex;

use awesome_orm::{Error, Executor, FieldKind, FindAll, Model, Row, Value};
use futures::future::BoxFuture;

/// Records every statement and answers selects with canned rows.
#[derive(Default)]
struct Recorder {
    rows: Vec<Row>,
    affected: u64,
    calls: Mutex<Vec<(String, Vec<Value>, Option<bool>)>>,
}

impl Recorder {
    fn with_rows(rows: Vec<Row>) -> Self {
        Self { rows, ..Self::default() }
    }

    fn affecting(affected: u64) -> Self {
        Self { affected, ..Self::default() }
    }

    fn calls(&self) -> Vec<(String, Vec<Value>, Option<bool>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Executor for Recorder {
    fn select<'a>(&'a self, sql: &'a str, args: &'a [Value], size: Option<usize>) -> BoxFuture<'a, Result<Vec<Row>, Error>> {
        self.calls.lock().unwrap().push((sql.to_string(), args.to_vec(), None));
        let rows = self.rows.iter().take(size.unwrap_or(usize::MAX)).cloned().collect();
        Box::pin(async move { Ok(rows) })
    }

    fn execute<'a>(&'a self, sql: &'a str, args: &'a [Value], autocommit: bool) -> BoxFuture<'a, Result<u64, Error>> {
        self.calls.lock().unwrap().push((sql.to_string(), args.to_vec(), Some(autocommit)));
        let affected = self.affected;
        Box::pin(async move { Ok(affected) })
    }
}

#[derive(Model, Debug, Clone, PartialEq)]
#[orm(table = "comments")]
struct Comment {
    #[orm(primary_key, ddl = "varchar(50)", default_fn = next_id)]
    id: Option<String>,
    #[orm(name = "blog_id", ddl = "varchar(50)")]
    blog: String,
    #[orm(text)]
    content: Option<String>,
    #[orm(default = 0.5)]
    score: Option<f64>,
    flagged: Option<bool>,
}

fn next_id() -> String {
    "c-001".to_string()
}

fn comment() -> Comment {
    Comment { id: None, blog: "b1".to_string(), content: None, score: None, flagged: None }
}

#[test]
fn test_statements_use_column_names() {
    let meta = Comment::meta().unwrap();
    assert_eq!(meta.table_name(), "comments");
    assert_eq!(meta.primary_key(), "id");
    assert_eq!(meta.fields(), ["blog", "content", "score", "flagged"]);
    assert_eq!(meta.select_stmt(), "select `id`,`blog_id`,`content`,`score`,`flagged` from `comments`");
    assert_eq!(
        meta.insert_stmt(),
        "insert into `comments` (`blog_id`,`content`,`score`,`flagged`,`id`) values (?,?,?,?,?)"
    );
    assert_eq!(meta.update_stmt(), "update `comments` set `blog_id`=?,`content`=?,`score`=?,`flagged`=? where `id`=?");
    assert_eq!(meta.delete_stmt(), "delete from `comments` where `id`=?");
}

#[tokio::test]
async fn test_save_binds_defaults_with_primary_key_last() -> Result<(), Box<dyn std::error::Error>> {
    let db = Recorder::affecting(1);
    let mut c = comment();

    assert_eq!(c.save(&db).await?, 1);

    let calls = db.calls();
    assert_eq!(calls.len(), 1);
    let (sql, args, autocommit) = &calls[0];
    assert!(sql.starts_with("insert into `comments`"));
    assert_eq!(
        args,
        &vec![Value::from("b1"), FieldKind::Text.null(), Value::Float(0.5), Value::Bool(false), Value::from("c-001")]
    );
    assert_eq!(*autocommit, Some(true));

    assert_eq!(c.id.as_deref(), Some("c-001"));
    assert_eq!(c.score, Some(0.5));
    assert_eq!(c.flagged, Some(false));
    // text fields have no default
    assert_eq!(c.content, None);

    Ok(())
}

#[tokio::test]
async fn test_explicit_values_are_not_overwritten() -> Result<(), Box<dyn std::error::Error>> {
    let db = Recorder::affecting(1);
    let mut c = Comment { id: Some("mine".into()), score: Some(0.0), flagged: Some(true), ..comment() };

    c.save(&db).await?;

    let (_, args, _) = &db.calls()[0];
    assert_eq!(args[2], Value::Float(0.0));
    assert_eq!(args[3], Value::Bool(true));
    assert_eq!(args[4], Value::from("mine"));

    Ok(())
}

#[tokio::test]
async fn test_row_count_mismatch_is_returned_not_raised() -> Result<(), Box<dyn std::error::Error>> {
    let db = Recorder::affecting(0);
    let c = Comment { id: Some("gone".into()), ..comment() };

    assert_eq!(c.update(&db).await?, 0);
    assert_eq!(c.remove(&db).await?, 0);

    let calls = db.calls();
    assert_eq!(calls[0].1.last(), Some(&Value::from("gone")));
    assert_eq!(calls[1].1, vec![Value::from("gone")]);

    Ok(())
}

#[tokio::test]
async fn test_unset_members_bind_typed_nulls() -> Result<(), Box<dyn std::error::Error>> {
    let db = Recorder::affecting(1);
    let c = Comment { id: Some("c-2".into()), ..comment() };

    c.update(&db).await?;

    let (sql, args, _) = &db.calls()[0];
    assert!(sql.starts_with("update `comments` set"));
    assert_eq!(
        args,
        &vec![
            Value::from("b1"),
            Value::TypedNull(FieldKind::Text),
            Value::TypedNull(FieldKind::Float),
            Value::TypedNull(FieldKind::Boolean),
            Value::from("c-2"),
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_find_appends_primary_key_condition() -> Result<(), Box<dyn std::error::Error>> {
    let row: Row = [
        ("id", Value::from("c-9")),
        ("blog_id", Value::from("b1")),
        ("content", Value::Null),
        ("score", Value::Int(2)),
        ("flagged", Value::Int(1)),
    ]
    .into_iter()
    .collect();
    let db = Recorder::with_rows(vec![row.clone(), row]);

    let found = Comment::find(&db, "c-9").await?.expect("comment found");
    assert_eq!(found.score, Some(2.0));
    assert_eq!(found.flagged, Some(true));
    assert_eq!(found.blog, "b1");

    let (sql, args, _) = &db.calls()[0];
    assert!(sql.ends_with("from `comments` where `id`=?"));
    assert_eq!(args, &vec![Value::from("c-9")]);

    Ok(())
}

#[tokio::test]
async fn test_find_without_rows() -> Result<(), Box<dyn std::error::Error>> {
    let db = Recorder::default();

    assert_eq!(Comment::find(&db, "missing").await?, None);
    assert!(Comment::find_all(&db, FindAll::new()).await?.is_empty());
    assert_eq!(Comment::find_number(&db, "max(`score`)", None, &[]).await?, Value::Int(0));

    let (sql, _, _) = &db.calls()[2];
    assert_eq!(sql, "select max(`score`) as `_num_` from `comments`");

    Ok(())
}

#[tokio::test]
async fn test_find_all_builds_clauses() -> Result<(), Box<dyn std::error::Error>> {
    let db = Recorder::default();

    let query = FindAll::new().filter("`blog_id`=?", ["b1"]).order_by("`score` desc").limit((10, 5));
    Comment::find_all(&db, query).await?;

    let (sql, args, _) = &db.calls()[0];
    assert_eq!(
        sql,
        "select `id`,`blog_id`,`content`,`score`,`flagged` from `comments` where `blog_id`=? order by `score` desc limit 10,5"
    );
    assert_eq!(args, &vec![Value::from("b1")]);

    Ok(())
}

#[tokio::test]
async fn test_invalid_limit_fails_before_querying() {
    let db = Recorder::default();

    let err = Comment::find_all(&db, FindAll::new().limit(-1)).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    let err = Comment::find_all(&db, FindAll::new().limit("ten")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));

    assert!(db.calls().is_empty());
}

#[tokio::test]
async fn test_bad_column_value_is_a_decode_error() {
    let row: Row = [("id", "c-1"), ("blog_id", "b1"), ("flagged", "nope")].into_iter().collect();
    let db = Recorder::with_rows(vec![row]);

    let err = Comment::find(&db, "c-1").await.unwrap_err();
    assert!(matches!(err, Error::Decode { ref column, .. } if column == "flagged"));
}
