//! # Statement Builders
//!
//! `SELECT`, `INSERT`, `UPDATE` and `DELETE` builders producing literal SQL.
//! Every identifier is checked with [`syntax`](crate::syntax) and every text
//! literal with `is_safe_value` before it is concatenated. Each builder can be
//! rendered with `to_sql()` without touching a database.

mod delete;
mod insert;
mod select;
mod update;
mod where_clause;

pub use delete::Delete;
pub use insert::Insert;
pub use select::{Order, Select};
pub use update::Update;
pub use where_clause::{Filter, WhereClause};

use crate::{error::ValidationError, syntax, table::Table};

/// Anything naming the target table of a statement.
pub trait TableName {
    fn table_name(&self) -> Result<String, ValidationError>;
}

impl TableName for &str {
    fn table_name(&self) -> Result<String, ValidationError> {
        syntax::check_table_name(self)?;
        Ok(self.to_string())
    }
}

impl TableName for String {
    fn table_name(&self) -> Result<String, ValidationError> {
        self.as_str().table_name()
    }
}

impl TableName for &Table {
    fn table_name(&self) -> Result<String, ValidationError> {
        Ok(self.name().to_string())
    }
}

pub(crate) fn check_columns(table: &str, columns: &[&str]) -> Result<Vec<String>, ValidationError> {
    if columns.is_empty() {
        return Err(ValidationError::EmptyColumnList(table.to_string()));
    }
    columns
        .iter()
        .map(|c| {
            syntax::check_column_name(c)?;
            Ok(c.to_string())
        })
        .collect()
}
