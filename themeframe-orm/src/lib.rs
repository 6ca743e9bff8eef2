//! # themeframe-orm
//!
//! Declarative model registration, schema (DDL) generation and a validated SQL
//! statement builder for CMS-hosted themes and plugins.
//!
//! A [`CustomModel`] aggregates typed [`Property`] definitions. The
//! [`Migrator`] turns registered models into `CREATE TABLE` statements (plus an
//! optional key/value meta table) and adds missing columns to existing tables.
//! At runtime a [`Table`] bound to a [`Database`] or [`Transaction`] reads and
//! writes rows through the [`Select`], [`Insert`], [`Update`] and [`Delete`]
//! builders, which check every identifier and literal before it reaches SQL
//! text.
//!
//! ```rust,ignore
//! use themeframe_orm::{Database, Model, Table, SqlValue};
//!
//! #[derive(Model)]
//! #[model(name = "widget", meta)]
//! struct Widget {
//!     #[property(size = 20, index)]
//!     title: String,
//!     price: i64,
//! }
//!
//! let db = Database::builder().connect("sqlite::memory:").await?;
//! db.migrator().register::<Widget>().run().await?;
//!
//! let widgets = Table::custom(&Widget::definition()?, db.context())?;
//! let id = db.table(&widgets).insert_row(&[("widget_title", "Lamp".into()), ("widget_price", 12.into())]).await?;
//! ```

pub mod config;
pub mod database;
pub mod ddl;
pub mod error;
pub mod migration;
pub mod model;
pub mod property;
pub mod query;
pub mod row;
pub mod syntax;
pub mod table;
pub mod transaction;
pub mod value;

pub use themeframe_orm_macro::{Model, StatusValues};

pub use config::{SchemaContext, SchemaContextBuilder};
pub use database::{Connection, Database, DatabaseBuilder, Drivers, RawQuery};
pub use error::{ClauseError, Error, ValidationError};
pub use migration::{MigrationReport, Migrator};
pub use model::{CustomModel, Model};
pub use property::{ControlKind, FormControl, Property, PropertyBuilder, PropertyKind, StatusValues, ValueKind};
pub use query::{Delete, Filter, Insert, Order, Select, Update, WhereClause};
pub use row::Row;
pub use table::{BoundTable, Table, TableKind};
pub use transaction::Transaction;
pub use value::SqlValue;
