//! # DDL Module
//!
//! Translates a [`CustomModel`] into `CREATE TABLE` statements.
//!
//! [`create_table`] and [`create_meta_table`] produce the canonical MySQL text
//! in the shape the host's `dbDelta` expects (two spaces after `PRIMARY KEY`,
//! inline `KEY` definitions, charset clause). The `*_statements` variants adapt
//! the same schema to the connected driver so it can be applied directly.
//! Output is deterministic: the same model always yields the same text.

use std::collections::HashSet;

use crate::{
    config::SchemaContext,
    database::Drivers,
    error::Error,
    model::CustomModel,
    property::{Property, ValueKind},
    syntax::DataType,
};

/// Prefix length of the `meta_key` index, the host's historical key ceiling.
pub const META_KEY_INDEX_LENGTH: u32 = 19;

const MAX_INDEX_NAME_LEN: usize = 64;

struct ColumnDef {
    name: String,
    data_type: DataType,
    nullable: bool,
    default: Option<String>,
}

impl ColumnDef {
    fn from_property(model: &CustomModel, property: &Property) -> Self {
        let default = property.default_value().map(|value| match property.value_kind() {
            ValueKind::Int => value.to_string(),
            ValueKind::Text => format!("'{}'", value),
        });
        Self {
            name: model.column_name(property.key()),
            data_type: property.data_type().clone(),
            nullable: property.is_nullable(),
            default,
        }
    }

    fn structural(name: String, data_type: DataType, default: &str) -> Self {
        Self { name, data_type, nullable: false, default: Some(default.to_string()) }
    }

    fn render(&self, driver: Drivers) -> String {
        let mut def = format!("{} {}", self.name, render_type(&self.data_type, driver));
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            def.push_str(" default ");
            def.push_str(default);
        }
        def
    }

    /// Definition used by `ALTER TABLE ... ADD COLUMN`; a NOT NULL column
    /// without default gets a zero value so existing rows stay valid.
    fn render_added(&self, driver: Drivers) -> String {
        let mut def = self.render(driver);
        if !self.nullable && self.default.is_none() {
            def.push_str(if self.data_type.is_integer() { " default 0" } else { " default ''" });
        }
        def
    }
}

struct IndexDef {
    name: String,
    columns: Vec<String>,
}

fn unsigned_bigint() -> DataType {
    DataType { name: "bigint".to_string(), size: Some(20), unsigned: true }
}

fn render_type(data_type: &DataType, driver: Drivers) -> String {
    match driver {
        Drivers::MySQL => data_type.to_string(),
        Drivers::SQLite => match data_type.size {
            Some(size) => format!("{}({})", data_type.name, size),
            None => data_type.name.clone(),
        },
        Drivers::Postgres => match (data_type.name.as_str(), data_type.size) {
            ("bigint", _) => "BIGINT".to_string(),
            ("int", _) => "INTEGER".to_string(),
            ("varchar", Some(size)) => format!("VARCHAR({})", size),
            ("datetime", _) => "TIMESTAMP".to_string(),
            _ => "TEXT".to_string(),
        },
    }
}

fn primary_key_column(name: &str, driver: Drivers) -> String {
    match driver {
        Drivers::MySQL => format!("{} bigint(20) unsigned NOT NULL auto_increment", name),
        Drivers::SQLite => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name),
        Drivers::Postgres => format!("{} BIGSERIAL PRIMARY KEY", name),
    }
}

/// Non-key columns of the model table, in DDL order.
fn model_columns(model: &CustomModel) -> Vec<ColumnDef> {
    let mut columns: Vec<ColumnDef> = model.properties().iter().map(|p| ColumnDef::from_property(model, p)).collect();
    if model.has_types() {
        columns.push(ColumnDef::structural(
            model.type_column_name(),
            DataType { name: "varchar".to_string(), size: Some(20), unsigned: false },
            "''",
        ));
    }
    if model.owner_name().is_some() {
        columns.push(ColumnDef::structural(model.owner_column_name(), unsigned_bigint(), "0"));
    }
    if model.is_hierarchical() {
        columns.push(ColumnDef::structural(model.parent_column_name(), unsigned_bigint(), "0"));
    }
    columns
}

fn model_indexes(model: &CustomModel) -> Vec<IndexDef> {
    let mut indexes = Vec::new();
    if model.is_hierarchical() {
        indexes.push(IndexDef { name: "parent".to_string(), columns: vec![model.parent_column_name()] });
    }
    if model.owner_name().is_some() {
        indexes.push(IndexDef { name: "owner".to_string(), columns: vec![model.owner_column_name()] });
    }
    if model.has_types() {
        indexes.push(IndexDef { name: "type".to_string(), columns: vec![model.type_column_name()] });
    }

    let indexables = model.get_properties(true);
    if !indexables.is_empty() {
        let mut name = indexables.iter().map(|p| p.key()).collect::<Vec<_>>().join("_");
        name.truncate(MAX_INDEX_NAME_LEN);
        let columns = indexables.iter().map(|p| model.column_name(p.key())).collect();
        indexes.push(IndexDef { name, columns });
    }
    indexes
}

fn mysql_table(table: &str, lines: Vec<String>, ctx: &SchemaContext) -> String {
    let mut sql = format!("CREATE TABLE {} (\n", table);
    sql.push_str(&lines.iter().map(|l| format!("  {}", l)).collect::<Vec<_>>().join(",\n"));
    sql.push_str("\n)");
    let charset = ctx.charset_collate();
    if !charset.is_empty() {
        sql.push(' ');
        sql.push_str(&charset);
    }
    sql.push(';');
    sql
}

fn portable_statements(table: &str, lines: Vec<String>, indexes: Vec<IndexDef>) -> Vec<String> {
    let body = lines.iter().map(|l| format!("  {}", l)).collect::<Vec<_>>().join(",\n");
    let mut statements = vec![format!("CREATE TABLE IF NOT EXISTS {} (\n{}\n)", table, body)];
    for index in indexes {
        let mut name = format!("{}_{}", table, index.name);
        name.truncate(MAX_INDEX_NAME_LEN);
        statements.push(format!("CREATE INDEX IF NOT EXISTS {} ON {} ({})", name, table, index.columns.join(", ")));
    }
    statements
}

/// Canonical MySQL `CREATE TABLE` for the model table.
///
/// Columns: `{m}_id` auto-increment key, one column per property in
/// registration order, then the type, owner and parent columns when enabled.
/// Keys: primary key, parent/owner/type keys, and one composite key over all
/// indexable properties named by their underscore-joined keys.
pub fn create_table(model: &CustomModel, ctx: &SchemaContext) -> Result<String, Error> {
    let table = model.table_name(ctx)?;
    let id = model.id_column_name();

    let mut lines = vec![primary_key_column(&id, Drivers::MySQL)];
    lines.extend(model_columns(model).iter().map(|c| c.render(Drivers::MySQL)));
    lines.push(format!("PRIMARY KEY  ({})", id));
    for index in model_indexes(model) {
        lines.push(format!("KEY {} ({})", index.name, index.columns.join(", ")));
    }

    let sql = mysql_table(&table, lines, ctx);
    log::debug!("generated DDL for `{}`:\n{}", table, sql);
    Ok(sql)
}

/// Canonical MySQL `CREATE TABLE` for the model's meta table.
pub fn create_meta_table(model: &CustomModel, ctx: &SchemaContext) -> Result<String, Error> {
    let table = model.meta_table_name(ctx)?;
    let id = model.id_column_name();
    let lines = vec![
        primary_key_column("meta_id", Drivers::MySQL),
        format!("{} bigint(20) unsigned NOT NULL default 0", id),
        "meta_key varchar(255) default NULL".to_string(),
        "meta_value longtext".to_string(),
        "PRIMARY KEY  (meta_id)".to_string(),
        format!("KEY {} ({})", id, id),
        format!("KEY meta_key (meta_key({}))", META_KEY_INDEX_LENGTH),
    ];

    let sql = mysql_table(&table, lines, ctx);
    log::debug!("generated DDL for `{}`:\n{}", table, sql);
    Ok(sql)
}

/// Statements creating the model table on `driver`.
pub fn create_table_statements(model: &CustomModel, ctx: &SchemaContext, driver: Drivers) -> Result<Vec<String>, Error> {
    if driver == Drivers::MySQL {
        return Ok(vec![create_table(model, ctx)?]);
    }
    let table = model.table_name(ctx)?;
    let mut lines = vec![primary_key_column(&model.id_column_name(), driver)];
    lines.extend(model_columns(model).iter().map(|c| c.render(driver)));
    Ok(portable_statements(&table, lines, model_indexes(model)))
}

/// Statements creating the meta table on `driver`.
pub fn create_meta_table_statements(model: &CustomModel, ctx: &SchemaContext, driver: Drivers) -> Result<Vec<String>, Error> {
    if driver == Drivers::MySQL {
        return Ok(vec![create_meta_table(model, ctx)?]);
    }
    let table = model.meta_table_name(ctx)?;
    let id = model.id_column_name();
    let lines = vec![
        primary_key_column("meta_id", driver),
        ColumnDef::structural(id.clone(), unsigned_bigint(), "0").render(driver),
        format!("meta_key {} default NULL", render_type(&DataType { name: "varchar".into(), size: Some(255), unsigned: false }, driver)),
        format!("meta_value {}", render_type(&DataType { name: "longtext".into(), size: None, unsigned: false }, driver)),
    ];
    let indexes = vec![
        IndexDef { name: id.clone(), columns: vec![id] },
        IndexDef { name: "meta_key".to_string(), columns: vec!["meta_key".to_string()] },
    ];
    Ok(portable_statements(&table, lines, indexes))
}

/// `ALTER TABLE ... ADD COLUMN` statements for model columns missing from
/// `existing`. Indexes are not altered.
pub fn add_column_statements(
    model: &CustomModel,
    existing: &[String],
    ctx: &SchemaContext,
    driver: Drivers,
) -> Result<Vec<String>, Error> {
    let table = model.table_name(ctx)?;
    let existing: HashSet<String> = existing.iter().map(|c| c.to_lowercase()).collect();
    Ok(model_columns(model)
        .iter()
        .filter(|c| !existing.contains(&c.name.to_lowercase()))
        .map(|c| format!("ALTER TABLE {} ADD COLUMN {}", table, c.render_added(driver)))
        .collect())
}

/// `DROP TABLE` statement for a framework table.
pub fn drop_table(table: &str) -> String {
    format!("DROP TABLE {}", table)
}

/// Framework-prefixed tables in `existing` that back none of `models`.
///
/// A table is framework-owned when it starts with `{prefix}_`. Model tables
/// and, for meta-enabled models, their meta tables are kept.
pub fn orphaned_tables(existing: &[String], models: &[CustomModel], ctx: &SchemaContext) -> Result<Vec<String>, Error> {
    if ctx.claims_host_tables() {
        return Err(Error::Config(format!(
            "prefix `{}` overlaps host prefix `{}`; refusing to pick orphaned tables",
            ctx.prefix, ctx.host_prefix
        )));
    }
    let mut backed = HashSet::new();
    for model in models {
        backed.insert(model.table_name(ctx)?);
        if model.has_meta() {
            backed.insert(model.meta_table_name(ctx)?);
        }
    }
    let marker = ctx.table_marker();
    Ok(existing.iter().filter(|t| t.starts_with(&marker) && !backed.contains(*t)).cloned().collect())
}
