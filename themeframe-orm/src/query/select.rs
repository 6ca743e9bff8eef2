use crate::{
    database::Connection,
    error::Error,
    query::{Filter, TableName, WhereClause, check_columns},
    row::{self, Row},
    syntax,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

/// `SELECT` builder.
///
/// # Example
///
/// ```rust,ignore
/// let rows = Select::new("wp_tf_widgets", &["widget_id", "widget_title"])?
///     .where_greater_than("widget_price", 10)?
///     .and()?
///     .where_like("widget_title", "%lamp%")?
///     .limit(5)
///     .scan(&db)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    columns: Vec<String>,
    where_clause: WhereClause,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    pub fn new(table: impl TableName, columns: &[&str]) -> Result<Self, Error> {
        let table = table.table_name()?;
        let columns = check_columns(&table, columns)?;
        Ok(Self::with_columns(table, columns))
    }

    /// `SELECT *`.
    pub fn all(table: impl TableName) -> Result<Self, Error> {
        Ok(Self::with_columns(table.table_name()?, vec!["*".to_string()]))
    }

    fn with_columns(table: String, columns: Vec<String>) -> Self {
        Self { table, columns, where_clause: WhereClause::new(), order: Vec::new(), limit: None, offset: None }
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn order_by(mut self, column: &str, order: Order) -> Result<Self, Error> {
        syntax::check_column_name(column)?;
        self.order.push((column.to_string(), order));
        Ok(self)
    }

    pub fn to_sql(&self) -> Result<String, Error> {
        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        sql.push_str(&self.where_clause.render()?);

        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(column, order)| match order {
                    Order::Asc => format!("{} ASC", column),
                    Order::Desc => format!("{} DESC", column),
                })
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {}", limit)),
            // OFFSET alone is not valid SQL on MySQL or SQLite.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT {} OFFSET {}", i64::MAX, offset)),
            (None, None) => {}
        }
        Ok(sql)
    }

    /// Executes the query and returns every row.
    pub async fn scan<C: Connection + ?Sized>(&self, conn: &C) -> Result<Vec<Row>, Error> {
        let sql = self.to_sql()?;
        log::debug!("{}", sql);
        let rows = conn.fetch_all(&sql).await?;
        Ok(row::decode_rows(&rows)?)
    }

    /// Executes the query and returns the first row, if any.
    pub async fn first<C: Connection + ?Sized>(&self, conn: &C) -> Result<Option<Row>, Error> {
        let sql = self.to_sql()?;
        log::debug!("{}", sql);
        let found = conn.fetch_optional(&sql).await?;
        Ok(found.as_ref().map(row::decode_row).transpose()?)
    }
}

impl Filter for Select {
    fn where_clause_mut(&mut self) -> &mut WhereClause {
        &mut self.where_clause
    }
}
