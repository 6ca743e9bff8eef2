use chrono::NaiveDateTime;
use themeframe_orm::{Database, Model, StatusValues, Table};

#[derive(StatusValues, Debug, Clone, Copy, PartialEq)]
enum ReviewState {
    Draft,
    Published,
    InReview,
}

#[allow(dead_code)]
#[derive(Model)]
#[model(name = "review", singular = "Review", plural = "Reviews", hierarchical, types, meta)]
struct Review {
    id: i64,
    #[property(size = 20, index, primary)]
    headline: String,
    rating: i32,
    #[property(status = ReviewState)]
    state: ReviewState,
    published: Option<NaiveDateTime>,
    #[property(sql_type = "longtext")]
    body: String,
    #[property(skip)]
    cached_html: Vec<u8>,
}

#[allow(dead_code)]
#[derive(Model)]
struct ProductReview {
    #[property(default = "5")]
    stars: u64,
}

#[test]
fn status_values_follow_variants() {
    assert_eq!(ReviewState::values(), vec!["draft", "published", "in_review"]);
    assert_eq!(ReviewState::InReview.to_string(), "in_review");
    assert_eq!("published".parse::<ReviewState>(), Ok(ReviewState::Published));
    assert!("Published".parse::<ReviewState>().is_err());
}

#[test]
fn model_definition_from_struct() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(Review::model_name(), "review");

    let model = Review::definition()?;
    let keys: Vec<_> = model.properties().iter().map(|p| p.key()).collect();
    assert_eq!(keys, vec!["headline", "rating", "state", "published", "body"]);
    assert_eq!(model.primary_property().map(|p| p.key()), Some("headline"));
    assert!(model.is_hierarchical() && model.has_types() && model.has_meta());

    let headline = model.property("headline").ok_or("headline missing")?;
    assert_eq!(headline.data_type().to_string(), "varchar(20)");
    assert!(headline.is_indexable());

    let rating = model.property("rating").ok_or("rating missing")?;
    assert_eq!(rating.data_type().to_string(), "int(11)");

    let state = model.property("state").ok_or("state missing")?;
    assert_eq!(state.status_values(), ["draft", "published", "in_review"]);
    assert_eq!(state.default_value(), Some("draft"));

    assert!(model.property("published").ok_or("published missing")?.is_nullable());
    assert!(model.property("cached_html").is_none());
    Ok(())
}

#[test]
fn model_name_defaults_to_snake_case_struct_name() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(ProductReview::model_name(), "product_review");
    let model = ProductReview::definition()?;
    let stars = model.property("stars").ok_or("stars missing")?;
    assert_eq!(stars.data_type().to_string(), "bigint(20) unsigned");
    assert_eq!(stars.default_value(), Some("5"));
    Ok(())
}

#[tokio::test]
async fn derived_models_migrate() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::builder().max_connections(1).connect("sqlite::memory:").await?;
    let report = db.migrator().register::<Review>().register::<ProductReview>().run().await?;
    assert_eq!(report.created, vec!["wp_tf_reviews", "wp_tf_reviewmeta", "wp_tf_product_reviews"]);

    let columns = db.get_table_columns("wp_tf_reviews").await?;
    assert_eq!(
        columns,
        vec![
            "review_id",
            "review_headline",
            "review_rating",
            "review_state",
            "review_published",
            "review_body",
            "review_type",
            "review_parent"
        ]
    );

    let reviews = Table::custom(&Review::definition()?, db.context())?;
    let id = db.table(&reviews).insert_row(&[("review_headline", "Solid".into()), ("review_rating", 4.into()), ("review_body", "".into())]).await?;
    let state = db.table(&reviews).get_field("review_state", id).await?;
    assert_eq!(state, Some(serde_json::json!(ReviewState::Draft.to_string())));
    Ok(())
}
