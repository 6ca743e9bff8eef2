use crate::{
    database::Connection,
    error::{ClauseError, Error},
    query::{Filter, TableName, WhereClause},
    syntax,
    value::SqlValue,
};

/// `UPDATE ... SET ... WHERE ...` builder. A complete WHERE condition is
/// required.
#[derive(Debug, Clone)]
pub struct Update {
    table: String,
    assignments: Vec<String>,
    where_clause: WhereClause,
}

impl Update {
    pub fn new(table: impl TableName) -> Result<Self, Error> {
        Ok(Self { table: table.table_name()?, assignments: Vec::new(), where_clause: WhereClause::new() })
    }

    /// Appends `column = value` to the SET list.
    pub fn set(mut self, column: &str, value: impl Into<SqlValue>) -> Result<Self, Error> {
        syntax::check_column_name(column)?;
        let literal = value.into().to_literal()?;
        self.assignments.push(format!("{} = {}", column, literal));
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<String, Error> {
        if self.assignments.is_empty() {
            return Err(ClauseError::MissingSet.into());
        }
        let where_sql = self.where_clause.render_required()?;
        Ok(format!("UPDATE {} SET {}{}", self.table, self.assignments.join(", "), where_sql))
    }

    /// Returns the number of rows affected.
    pub async fn execute<C: Connection + ?Sized>(&self, conn: &C) -> Result<u64, Error> {
        let sql = self.to_sql()?;
        log::debug!("{}", sql);
        Ok(conn.execute(&sql).await?)
    }
}

impl Filter for Update {
    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}
