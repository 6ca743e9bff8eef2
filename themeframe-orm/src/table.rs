//! # Tables
//!
//! A [`Table`] names a physical table and its identity column. Custom tables
//! are derived from a [`CustomModel`]; built-in tables belong to the host CMS
//! and third-party tables are described by hand.
//!
//! Binding a table to a connection gives a [`BoundTable`] with row accessors
//! built on the statement builders.

use heck::ToTitleCase;
use serde_json::Value;

use crate::{
    config::SchemaContext,
    database::Connection,
    error::{Error, ValidationError},
    model::CustomModel,
    query::{Delete, Filter, Insert, Select, Update},
    row::Row,
    syntax,
    value::SqlValue,
};

/// Where a table comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Backs a registered model (or its meta table).
    Custom,
    /// Shipped by the host CMS, e.g. `wp_posts`.
    Buildin,
    /// Owned by another plugin; the id column is given explicitly.
    ThirdParty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: String,
    id_column: String,
    label: String,
    kind: TableKind,
}

impl Table {
    /// Table backing `model`; the id column is `{model}_id`.
    pub fn custom(model: &CustomModel, ctx: &SchemaContext) -> Result<Self, Error> {
        Ok(Self {
            name: model.table_name(ctx)?,
            id_column: model.id_column_name(),
            label: model.singular_name().to_string(),
            kind: TableKind::Custom,
        })
    }

    /// Meta table of `model`; the id column is `meta_id`.
    pub fn custom_meta(model: &CustomModel, ctx: &SchemaContext) -> Result<Self, Error> {
        Ok(Self {
            name: model.meta_table_name(ctx)?,
            id_column: "meta_id".to_string(),
            label: format!("{} Meta", model.singular_name()),
            kind: TableKind::Custom,
        })
    }

    /// Host table. `name` may be given with or without the host prefix.
    ///
    /// ```rust,ignore
    /// let posts = Table::buildin("posts", db.context())?;
    /// assert_eq!(posts.name(), "wp_posts");
    /// assert_eq!(posts.id_column_name(), "ID");
    /// ```
    pub fn buildin(name: &str, ctx: &SchemaContext) -> Result<Self, Error> {
        let name = if name.starts_with(&ctx.host_prefix) { name.to_string() } else { format!("{}{}", ctx.host_prefix, name) };
        syntax::check_table_name(&name)?;

        let bare = &name[ctx.host_prefix.len()..];
        Ok(Self {
            id_column: buildin_id_column(bare),
            label: singular(bare).to_title_case(),
            name,
            kind: TableKind::Buildin,
        })
    }

    pub fn third_party(name: &str, id_column: &str) -> Result<Self, Error> {
        syntax::check_table_name(name)?;
        syntax::check_column_name(id_column)?;
        Ok(Self {
            name: name.to_string(),
            id_column: id_column.to_string(),
            label: singular(name).to_title_case(),
            kind: TableKind::ThirdParty,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id_column_name(&self) -> &str {
        &self.id_column
    }

    /// Human readable singular name, e.g. `Post` for `wp_posts`.
    pub fn singular_label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }
}

fn singular(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

fn buildin_id_column(bare: &str) -> String {
    match bare {
        "posts" | "users" => "ID".to_string(),
        "term_relationships" => "object_id".to_string(),
        "usermeta" => "umeta_id".to_string(),
        _ if bare.ends_with("meta") => "meta_id".to_string(),
        _ => format!("{}_id", singular(bare)),
    }
}

/// A [`Table`] bound to a [`Connection`].
///
/// Obtained from [`Database::table`](crate::Database::table) or
/// [`Transaction::table`](crate::Transaction::table).
pub struct BoundTable<C> {
    conn: C,
    table: Table,
}

impl<C: Connection> BoundTable<C> {
    pub fn new(conn: C, table: Table) -> Self {
        Self { conn, table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Starts a `SELECT` of `columns` on this table.
    pub fn select(&self, columns: &[&str]) -> Result<Select, Error> {
        Select::new(&self.table, columns)
    }

    /// Every row, or `None` when the table is empty.
    pub async fn get_rows(&self) -> Result<Option<Vec<Row>>, Error> {
        let rows = Select::all(&self.table)?.scan(&self.conn).await?;
        Ok(if rows.is_empty() { None } else { Some(rows) })
    }

    /// Rows where any of `columns` contains `term`.
    pub async fn get_rows_by_search(&self, term: &str, columns: &[&str]) -> Result<Vec<Row>, Error> {
        let (first, rest) = columns.split_first().ok_or_else(|| ValidationError::EmptyColumnList(self.table.name.clone()))?;
        let pattern = format!("%{}%", term);

        let mut select = Select::all(&self.table)?.where_like(first, &pattern)?;
        for column in rest {
            select = select.or()?.where_like(column, &pattern)?;
        }
        select.scan(&self.conn).await
    }

    pub async fn get_row(&self, id: i64) -> Result<Option<Row>, Error> {
        Select::all(&self.table)?.where_equals(&self.table.id_column, id)?.limit(1).first(&self.conn).await
    }

    /// Single column of the row with `id`. `Some(Value::Null)` when the row
    /// exists but the field is NULL.
    pub async fn get_field(&self, column: &str, id: i64) -> Result<Option<Value>, Error> {
        let row = Select::new(&self.table, &[column])?
            .where_equals(&self.table.id_column, id)?
            .limit(1)
            .first(&self.conn)
            .await?;
        Ok(row.and_then(|mut row| row.remove(column)))
    }

    /// Inserts one row and returns its id.
    pub async fn insert_row(&self, fields: &[(&str, SqlValue)]) -> Result<i64, Error> {
        let columns: Vec<&str> = fields.iter().map(|(column, _)| *column).collect();
        Insert::new(&self.table, &columns)?
            .values(fields.iter().map(|(_, value)| value.clone()))?
            .execute(&self.conn)
            .await
    }

    /// Updates the row with `id`; returns the number of rows affected.
    pub async fn update_row(&self, id: i64, fields: &[(&str, SqlValue)]) -> Result<u64, Error> {
        let mut update = Update::new(&self.table)?;
        for (column, value) in fields {
            update = update.set(column, value.clone())?;
        }
        update.where_equals(&self.table.id_column, id)?.execute(&self.conn).await
    }

    pub async fn delete_row(&self, id: i64) -> Result<u64, Error> {
        Delete::new(&self.table)?.where_equals(&self.table.id_column, id)?.execute(&self.conn).await
    }
}
