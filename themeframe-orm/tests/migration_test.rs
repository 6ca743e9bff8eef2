use themeframe_orm::{CustomModel, Database, Error, Property, ddl};

fn widget_v1() -> Result<CustomModel, Error> {
    CustomModel::new("widget")?
        .supports_meta(true)
        .with_property(Property::builder("title", "varchar(20)").indexable(true).build()?)
}

fn widget_v2() -> Result<CustomModel, Error> {
    widget_v1()?
        .with_property(Property::builder("price", "bigint(20)").build()?)?
        .with_property(Property::builder("note", "varchar(80)").nullable(true).build()?)
}

fn gadget() -> Result<CustomModel, Error> {
    CustomModel::new("gadget")?.with_property(Property::builder("label", "varchar(40)").build()?)
}

async fn memory_db() -> Result<Database, Error> {
    let _ = env_logger::builder().is_test(true).try_init();
    Database::builder().max_connections(1).connect("sqlite::memory:").await
}

#[tokio::test]
async fn creates_model_and_meta_tables() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;

    let report = db.migrator().register_model(widget_v1()?).run().await?;
    assert_eq!(report.created, vec!["wp_tf_widgets".to_string(), "wp_tf_widgetmeta".to_string()]);
    assert!(report.altered.is_empty());

    assert!(db.table_exists("wp_tf_widgets").await?);
    assert!(db.table_exists("wp_tf_widgetmeta").await?);
    assert_eq!(db.get_table_columns("wp_tf_widgets").await?, vec!["widget_id", "widget_title"]);
    assert_eq!(db.get_table_columns("wp_tf_widgetmeta").await?, vec!["meta_id", "widget_id", "meta_key", "meta_value"]);

    let again = db.migrator().register_model(widget_v1()?).run().await?;
    assert!(again.is_noop());
    Ok(())
}

#[tokio::test]
async fn adds_missing_columns_to_existing_table() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.migrator().register_model(widget_v1()?).run().await?;
    db.raw("INSERT INTO wp_tf_widgets (widget_title) VALUES ('Lamp')").execute().await?;

    let report = db.migrator().register_model(widget_v2()?).run().await?;
    assert!(report.created.is_empty());
    assert_eq!(report.altered.len(), 2);
    assert!(report.altered[0].starts_with("ALTER TABLE wp_tf_widgets ADD COLUMN widget_price"));

    let columns = db.get_table_columns("wp_tf_widgets").await?;
    assert!(columns.contains(&"widget_price".to_string()));
    assert!(columns.contains(&"widget_note".to_string()));

    // existing rows pick up the zero default of the new NOT NULL column
    let row = db.raw("SELECT widget_price, widget_note FROM wp_tf_widgets").fetch_optional().await?.ok_or("row missing")?;
    assert_eq!(row["widget_price"], serde_json::json!(0));
    assert!(row["widget_note"].is_null());
    Ok(())
}

#[tokio::test]
async fn orphaned_tables_are_kept_unless_opted_in() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.migrator().register_model(widget_v1()?).register_model(gadget()?).run().await?;
    assert_eq!(db.list_prefixed_tables().await?, vec!["wp_tf_gadgets", "wp_tf_widgetmeta", "wp_tf_widgets"]);

    let kept = db.migrator().register_model(widget_v1()?).run().await?;
    assert!(kept.dropped.is_empty());
    assert!(db.table_exists("wp_tf_gadgets").await?);

    let existing = db.list_prefixed_tables().await?;
    let preview = ddl::orphaned_tables(&existing, &[widget_v1()?], db.context())?;
    assert_eq!(preview, vec!["wp_tf_gadgets"]);

    let report = db.migrator().register_model(widget_v1()?).drop_orphaned_tables().run().await?;
    assert_eq!(report.dropped, vec!["wp_tf_gadgets".to_string()]);
    assert!(!db.table_exists("wp_tf_gadgets").await?);
    assert!(db.table_exists("wp_tf_widgets").await?);
    assert!(db.table_exists("wp_tf_widgetmeta").await?);
    Ok(())
}

#[tokio::test]
async fn unprefixed_tables_are_never_dropped() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    db.raw("CREATE TABLE wp_posts (ID INTEGER PRIMARY KEY)").execute().await?;

    let dropped = db.drop_orphaned_tables(&[]).await?;
    assert!(dropped.is_empty());
    assert!(db.table_exists("wp_posts").await?);
    Ok(())
}

#[tokio::test]
async fn failed_ddl_reports_the_statement() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;
    // a table already holds the name the title index wants
    db.raw("CREATE TABLE wp_tf_widgets_title (x INTEGER)").execute().await?;

    let result = db.migrator().register_model(widget_v1()?).run().await;
    match result {
        Err(Error::Migration { statement, reason }) => {
            assert_eq!(statement, "CREATE INDEX IF NOT EXISTS wp_tf_widgets_title ON wp_tf_widgets (widget_title)");
            assert!(!reason.is_empty());
        }
        other => panic!("expected a migration error, got {:?}", other),
    }

    // the table statement ran before the failing index
    assert!(db.table_exists("wp_tf_widgets").await?);
    assert!(!db.table_exists("wp_tf_widgetmeta").await?);
    Ok(())
}

#[tokio::test]
async fn overlapping_prefix_refuses_to_drop_host_tables() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let overlapping = themeframe_orm::SchemaContext { prefix: "wp".to_string(), ..Default::default() };
    let db = Database::builder().max_connections(1).context(overlapping).connect("sqlite::memory:").await?;
    db.raw("CREATE TABLE wp_posts (ID INTEGER PRIMARY KEY)").execute().await?;

    assert!(matches!(db.drop_orphaned_tables(&[]).await, Err(Error::Config(_))));
    assert!(db.table_exists("wp_posts").await?);
    Ok(())
}

#[tokio::test]
async fn concurrent_runs_create_tables_once()-> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;

    let (a, b) = (widget_v2()?, widget_v2()?);
    let (first, second) = tokio::join!(db.migrator().register_model(a).run(), db.migrator().register_model(b).run());
    let (first, second) = (first?, second?);
    assert_eq!(first.created.len() + second.created.len(), 2);
    assert!(first.is_noop() || second.is_noop());
    Ok(())
}

#[tokio::test]
async fn invalid_definition_aborts_before_any_sql() -> Result<(), Box<dyn std::error::Error>> {
    let db = memory_db().await?;

    let result = db
        .migrator()
        .register_model(gadget()?)
        .register::<BrokenModel>()
        .run()
        .await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert!(db.list_prefixed_tables().await?.is_empty());
    Ok(())
}

struct BrokenModel;

impl themeframe_orm::Model for BrokenModel {
    fn model_name() -> &'static str {
        "broken"
    }

    fn definition() -> Result<CustomModel, Error> {
        CustomModel::new("broken")?.with_property(Property::builder("body", "blob").build()?)
    }
}
