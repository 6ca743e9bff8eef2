use serde_json::json;
use themeframe_orm::{CustomModel, Database, Delete, Error, Filter, Insert, Order, Property, Select, SqlValue, Table, Update};

fn widget() -> Result<CustomModel, Error> {
    CustomModel::new("widget")?
        .with_property(Property::builder("title", "varchar(20)").indexable(true).build()?)?
        .with_property(Property::builder("price", "bigint(20)").default_value("0").build()?)?
        .with_property(Property::builder("note", "varchar(80)").nullable(true).build()?)?
        .with_property(Property::status("state", &["draft", "published"])?)
}

async fn setup() -> Result<(Database, Table), Error> {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    let model = widget()?;
    db.migrator().register_model(model.clone()).run().await?;
    let table = Table::custom(&model, db.context())?;
    Ok((db, table))
}

async fn seed(db: &Database, table: &Table) -> Result<Vec<i64>, Error> {
    let widgets = db.table(table);
    let mut ids = Vec::new();
    for (title, price, note) in [("Lamp", 12, Some("warm light")), ("Desk Lamp", 30, None), ("Chair", 45, Some("oak"))] {
        let id = widgets
            .insert_row(&[("widget_title", title.into()), ("widget_price", price.into()), ("widget_note", note.into())])
            .await?;
        ids.push(id);
    }
    Ok(ids)
}

#[tokio::test]
async fn insert_returns_generated_ids() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;
    assert_eq!(seed(&db, &table).await?, vec![1, 2, 3]);

    let id = Insert::new(&table, &["widget_title", "widget_price"])?
        .values([SqlValue::from("Stool"), SqlValue::from(8)])?
        .execute(&db)
        .await?;
    assert_eq!(id, 4);
    Ok(())
}

#[tokio::test]
async fn row_accessors() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;
    let widgets = db.table(&table);
    assert!(widgets.get_rows().await?.is_none());

    seed(&db, &table).await?;
    assert_eq!(widgets.get_rows().await?.map(|rows| rows.len()), Some(3));

    let row = widgets.get_row(2).await?.ok_or("row 2 missing")?;
    assert_eq!(row["widget_title"], json!("Desk Lamp"));
    assert_eq!(row["widget_state"], json!("draft"));
    assert!(row["widget_note"].is_null());
    assert!(widgets.get_row(99).await?.is_none());

    assert_eq!(widgets.get_field("widget_price", 1).await?, Some(json!(12)));
    assert_eq!(widgets.get_field("widget_note", 2).await?, Some(serde_json::Value::Null));
    assert_eq!(widgets.get_field("widget_price", 99).await?, None);
    Ok(())
}

#[tokio::test]
async fn search_matches_any_column() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;
    seed(&db, &table).await?;
    let widgets = db.table(&table);

    let lamps = widgets.get_rows_by_search("lamp", &["widget_title"]).await?;
    assert_eq!(lamps.len(), 2);

    let hits = widgets.get_rows_by_search("oak", &["widget_title", "widget_note"]).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["widget_title"], json!("Chair"));

    assert!(matches!(widgets.get_rows_by_search("oak", &[]).await, Err(Error::Validation(_))));
    assert!(matches!(widgets.get_rows_by_search("o'ak", &["widget_title"]).await, Err(Error::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn update_changes_rows_in_place() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;
    seed(&db, &table).await?;
    let widgets = db.table(&table);

    let affected = widgets.update_row(1, &[("widget_price", 15.into()), ("widget_state", "published".into())]).await?;
    assert_eq!(affected, 1);
    assert_eq!(widgets.get_field("widget_price", 1).await?, Some(json!(15)));
    assert_eq!(widgets.get_field("widget_state", 1).await?, Some(json!("published")));
    assert_eq!(widgets.get_rows().await?.map(|rows| rows.len()), Some(3));

    let affected = Update::new(&table)?
        .set("widget_note", SqlValue::Null)?
        .where_greater_or_equal("widget_price", 30)?
        .execute(&db)
        .await?;
    assert_eq!(affected, 2);
    assert_eq!(widgets.get_field("widget_note", 3).await?, Some(serde_json::Value::Null));
    Ok(())
}

#[tokio::test]
async fn delete_requires_a_condition() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;
    seed(&db, &table).await?;
    let widgets = db.table(&table);

    assert_eq!(widgets.delete_row(3).await?, 1);
    assert!(widgets.get_row(3).await?.is_none());

    assert!(Delete::new(&table)?.execute(&db).await.is_err());
    assert_eq!(widgets.get_rows().await?.map(|rows| rows.len()), Some(2));

    Delete::new(&table)?.where_greater_than("widget_id", 0)?.execute(&db).await?;
    assert!(widgets.get_rows().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn select_with_filters_order_and_paging() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;
    seed(&db, &table).await?;

    let rows = Select::new(&table, &["widget_title", "widget_price"])?
        .where_between("widget_price", 10, 40)?
        .or()?
        .where_equals("widget_note", "oak")?
        .order_by("widget_price", Order::Desc)?
        .limit(2)
        .scan(&db)
        .await?;
    let titles: Vec<_> = rows.iter().map(|row| row["widget_title"].clone()).collect();
    assert_eq!(titles, vec![json!("Chair"), json!("Desk Lamp")]);

    let second = Select::all(&table)?.order_by("widget_id", Order::Asc)?.offset(1).first(&db).await?;
    assert_eq!(second.map(|row| row["widget_id"].clone()), Some(json!(2)));

    let missing = Select::all(&table)?.where_in("widget_id", [7, 8])?.scan(&db).await?;
    assert!(missing.is_empty());
    Ok(())
}

#[tokio::test]
async fn transaction_commit_and_rollback() -> Result<(), Box<dyn std::error::Error>> {
    let (db, table) = setup().await?;

    let tx = db.begin().await?;
    tx.table(&table).insert_row(&[("widget_title", "Lamp".into()), ("widget_price", 12.into())]).await?;
    tx.rollback().await?;
    assert!(db.table(&table).get_rows().await?.is_none());

    let tx = db.begin().await?;
    let id = tx.table(&table).insert_row(&[("widget_title", "Lamp".into()), ("widget_price", 12.into())]).await?;
    tx.table(&table).update_row(id, &[("widget_price", 14.into())]).await?;
    tx.commit().await?;
    assert_eq!(db.table(&table).get_field("widget_price", id).await?, Some(json!(14)));
    Ok(())
}

#[tokio::test]
async fn builtin_tables_use_host_id_columns() -> Result<(), Box<dyn std::error::Error>> {
    let (db, _) = setup().await?;
    db.raw("CREATE TABLE wp_posts (ID INTEGER PRIMARY KEY AUTOINCREMENT, post_title TEXT NOT NULL)").execute().await?;

    let posts = Table::buildin("posts", db.context())?;
    let id = db.table(&posts).insert_row(&[("post_title", "Hello".into())]).await?;
    assert_eq!(db.table(&posts).get_field("post_title", id).await?, Some(json!("Hello")));

    let count = db.raw("SELECT COUNT(*) AS total FROM wp_posts").fetch_optional().await?.ok_or("no count")?;
    assert_eq!(count["total"], json!(1));
    Ok(())
}
