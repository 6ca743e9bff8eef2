use crate::{
    database::Connection,
    error::{ClauseError, Error, ValidationError},
    query::{TableName, check_columns},
    value::SqlValue,
};

/// `INSERT` builder with a single-use VALUES clause.
///
/// # Example
///
/// ```rust,ignore
/// let id = Insert::new("wp_tf_widgets", &["widget_title", "widget_price"])?
///     .values([SqlValue::from("Lamp"), SqlValue::from(12)])?
///     .execute(&db)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
    values: Option<Vec<String>>,
}

impl Insert {
    pub fn new(table: impl TableName, columns: &[&str]) -> Result<Self, Error> {
        let table = table.table_name()?;
        let columns = check_columns(&table, columns)?;
        Ok(Self { table, columns, values: None })
    }

    /// Sets the row to insert, one value per column. Can be called once.
    pub fn values<I>(mut self, values: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = SqlValue>,
    {
        if self.values.is_some() {
            return Err(ClauseError::ValuesAlreadySet.into());
        }
        let literals = values.into_iter().map(|v| v.to_literal()).collect::<Result<Vec<_>, _>>()?;
        if literals.len() != self.columns.len() {
            return Err(ValidationError::ValueCountMismatch { expected: self.columns.len(), actual: literals.len() }.into());
        }
        self.values = Some(literals);
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<String, Error> {
        let values = self.values.as_ref().ok_or(ClauseError::MissingValues)?;
        Ok(format!("INSERT INTO {} ({}) VALUES ({})", self.table, self.columns.join(", "), values.join(", ")))
    }

    /// Runs the INSERT and returns the generated id.
    ///
    /// The id is read with a second query on the same connection; it is only
    /// as isolated as the driver's session-level last-insert-id.
    pub async fn execute<C: Connection + ?Sized>(&self, conn: &C) -> Result<i64, Error> {
        let sql = self.to_sql()?;
        log::debug!("{}", sql);
        Ok(conn.insert_returning_id(&sql).await?)
    }
}
