use crate::{
    database::Connection,
    error::Error,
    query::{Filter, TableName, WhereClause},
};

/// `DELETE FROM ... WHERE ...` builder. A complete WHERE condition is
/// required, so a whole table can never be emptied by accident.
#[derive(Debug, Clone)]
pub struct Delete {
    table: String,
    where_clause: WhereClause,
}

impl Delete {
    pub fn new(table: impl TableName) -> Result<Self, Error> {
        Ok(Self { table: table.table_name()?, where_clause: WhereClause::new() })
    }

    pub fn to_sql(&self) -> Result<String, Error> {
        Ok(format!("DELETE FROM {}{}", self.table, self.where_clause.render_required()?))
    }

    /// Returns the number of rows deleted.
    pub async fn execute<C: Connection + ?Sized>(&self, conn: &C) -> Result<u64, Error> {
        let sql = self.to_sql()?;
        log::debug!("{}", sql);
        Ok(conn.execute(&sql).await?)
    }
}

impl Filter for Delete {
    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}
