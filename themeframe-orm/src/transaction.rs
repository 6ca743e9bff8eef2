use futures::future::BoxFuture;
use sqlx::{Row as _, any::AnyRow};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    config::SchemaContext,
    database::{Connection, Drivers},
    error::Error,
    table::{BoundTable, Table},
};

type AnyTransaction = sqlx::Transaction<'static, sqlx::Any>;

/// A wrapper around a SQLx transaction.
///
/// Statement builders and bound tables accept `&Transaction` wherever they
/// accept a [`Database`](crate::Database), so several statements can be
/// committed or rolled back together. Dropping it without committing rolls
/// back.
#[derive(Debug, Clone)]
pub struct Transaction {
    tx: Arc<Mutex<Option<AnyTransaction>>>,
    driver: Drivers,
    context: SchemaContext,
}

fn finished() -> sqlx::Error {
    sqlx::Error::Protocol("transaction already committed or rolled back".to_string())
}

impl Transaction {
    pub(crate) fn new(tx: AnyTransaction, driver: Drivers, context: SchemaContext) -> Self {
        Self { tx: Arc::new(Mutex::new(Some(tx))), driver, context }
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    /// Binds a table to this transaction for row access.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let tx = db.begin().await?;
    /// let widgets = Table::custom(&widget, db.context())?;
    ///
    /// tx.table(&widgets).insert_row(&[("widget_title", "Lamp".into())]).await?;
    /// tx.table(&widgets).delete_row(7).await?;
    ///
    /// tx.commit().await?;
    /// ```
    pub fn table(&self, table: &Table) -> BoundTable<&Self> {
        BoundTable::new(self, table.clone())
    }

    /// Commits the transaction.
    pub async fn commit(self) -> Result<(), Error> {
        let tx = self.tx.lock().await.take().ok_or_else(finished)?;
        tx.commit().await?;
        Ok(())
    }

    /// Rolls back the transaction.
    pub async fn rollback(self) -> Result<(), Error> {
        let tx = self.tx.lock().await.take().ok_or_else(finished)?;
        tx.rollback().await?;
        Ok(())
    }
}

impl Connection for Transaction {
    fn driver(&self) -> Drivers {
        self.driver
    }

    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<u64, sqlx::Error>> {
        Box::pin(async move {
            let mut guard = self.tx.lock().await;
            let tx = guard.as_mut().ok_or_else(finished)?;
            Ok(sqlx::query(sql).execute(&mut **tx).await?.rows_affected())
        })
    }

    fn fetch_all<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Vec<AnyRow>, sqlx::Error>> {
        Box::pin(async move {
            let mut guard = self.tx.lock().await;
            let tx = guard.as_mut().ok_or_else(finished)?;
            sqlx::query(sql).fetch_all(&mut **tx).await
        })
    }

    fn fetch_optional<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Option<AnyRow>, sqlx::Error>> {
        Box::pin(async move {
            let mut guard = self.tx.lock().await;
            let tx = guard.as_mut().ok_or_else(finished)?;
            sqlx::query(sql).fetch_optional(&mut **tx).await
        })
    }

    fn insert_returning_id<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<i64, sqlx::Error>> {
        Box::pin(async move {
            let mut guard = self.tx.lock().await;
            let tx = guard.as_mut().ok_or_else(finished)?;
            sqlx::query(sql).execute(&mut **tx).await?;
            let row = sqlx::query(self.driver.last_insert_id_sql()).fetch_one(&mut **tx).await?;
            row.try_get::<i64, _>(0)
        })
    }
}
