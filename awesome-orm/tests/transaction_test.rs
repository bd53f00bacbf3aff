use awesome_orm::{Database, Error, Executor, Model, Value};

#[derive(Model, Debug, Clone, PartialEq)]
#[orm(table = "blogs")]
struct Blog {
    #[orm(primary_key, ddl = "varchar(50)")]
    id: String,
    #[orm(ddl = "varchar(50)")]
    name: String,
    #[orm(text)]
    content: String,
    views: Option<i64>,
}

fn blog(id: &str) -> Blog {
    Blog { id: id.to_string(), name: format!("Blog {}", id), content: "lorem ipsum".to_string(), views: None }
}

async fn setup(autocommit: bool) -> Result<Database, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::builder().max_connections(1).autocommit(autocommit).connect("sqlite::memory:").await?;
    db.execute(
        "create table `blogs` (`id` varchar(50) not null primary key, `name` varchar(50) not null, \
         `content` text not null, `views` bigint not null)",
        &[],
        true,
    )
    .await?;
    Ok(db)
}

async fn count(db: &Database) -> Result<Value, Error> {
    Blog::find_number(db, "count(`id`)", None, &[]).await
}

#[tokio::test]
async fn test_manual_commit_persists_successful_writes() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(false).await?;
    assert!(!db.autocommit());

    let mut first = blog("b1");
    assert_eq!(first.save(&db).await?, 1);
    assert_eq!(first.views, Some(0));

    first.views = Some(42);
    assert_eq!(first.update(&db).await?, 1);

    assert_eq!(count(&db).await?, Value::Int(1));
    assert_eq!(Blog::find(&db, "b1").await?, Some(first));

    Ok(())
}

#[tokio::test]
async fn test_failed_write_is_rolled_back() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(false).await?;

    blog("b1").save(&db).await?;

    let err = blog("b1").save(&db).await.unwrap_err();
    assert!(matches!(err, Error::Execution(_)));

    // the connection is usable again
    assert_eq!(count(&db).await?, Value::Int(1));
    blog("b2").save(&db).await?;
    assert_eq!(count(&db).await?, Value::Int(2));

    Ok(())
}

// `or fail` keeps the rows written before the conflicting one, so only a
// transaction rollback can remove them.
const PARTIAL_INSERT: &str = "insert or fail into `blogs` (`id`,`name`,`content`,`views`) \
     values ('fresh','Fresh','body',0),('b1','Dup','body',0)";

#[tokio::test]
async fn test_rollback_discards_partial_writes() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(true).await?;
    blog("b1").save(&db).await?;

    assert!(db.execute(PARTIAL_INSERT, &[], false).await.is_err());
    assert_eq!(Blog::find(&db, "fresh").await?, None);
    assert_eq!(count(&db).await?, Value::Int(1));

    Ok(())
}

#[tokio::test]
async fn test_autocommit_keeps_partial_writes() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(true).await?;
    blog("b1").save(&db).await?;

    assert!(db.execute(PARTIAL_INSERT, &[], true).await.is_err());
    assert!(Blog::find(&db, "fresh").await?.is_some());
    assert_eq!(count(&db).await?, Value::Int(2));

    Ok(())
}

#[tokio::test]
async fn test_execute_with_explicit_commit_mode() -> Result<(), Box<dyn std::error::Error>> {
    let db = setup(true).await?;

    let insert = Blog::meta()?.insert_stmt();
    let args = [Value::from("raw"), Value::from("Raw"), Value::from("body"), Value::from(3)];

    assert_eq!(db.execute(insert, &args, false).await?, 1);
    assert!(db.execute(insert, &args, false).await.is_err());
    assert_eq!(count(&db).await?, Value::Int(1));

    let raw = Blog::find(&db, "raw").await?.expect("raw blog exists");
    assert_eq!(raw.views, Some(3));

    db.close().await;
    Ok(())
}
