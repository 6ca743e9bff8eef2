//! # Database Module
//!
//! This module provides the connection pool, driver detection, schema
//! introspection and migration primitives for themeframe-orm. MySQL is the
//! canonical dialect; SQLite and PostgreSQL are supported for execution.
//!
//! Statements are literal SQL built by the [`query`](crate::query) builders and
//! executed through the [`Connection`] trait, implemented by [`Database`] and
//! [`Transaction`].

// ============================================================================
// External Crate Imports
// ============================================================================

use futures::future::BoxFuture;
use sqlx::{AnyPool, Row as _, any::AnyRow};
use std::{env, sync::Arc};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    config::SchemaContext,
    ddl,
    error::Error,
    migration::{MigrationReport, Migrator},
    model::CustomModel,
    row::{self, Row},
    table::{BoundTable, Table},
    transaction::Transaction,
};

// ============================================================================
// Database Driver Enum
// ============================================================================

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drivers {
    /// PostgreSQL driver
    Postgres,
    /// MySQL / MariaDB driver
    MySQL,
    /// SQLite driver
    SQLite,
}

impl Drivers {
    /// Detects the driver from a connection URL scheme.
    pub fn from_url(url: &str) -> Self {
        if url.starts_with("postgres") {
            Drivers::Postgres
        } else if url.starts_with("mysql") || url.starts_with("mariadb") {
            Drivers::MySQL
        } else {
            Drivers::SQLite
        }
    }

    /// Query returning the id generated by the last INSERT on the same session.
    pub fn last_insert_id_sql(self) -> &'static str {
        match self {
            Drivers::MySQL => "SELECT CAST(LAST_INSERT_ID() AS SIGNED)",
            Drivers::SQLite => "SELECT last_insert_rowid()",
            Drivers::Postgres => "SELECT lastval()",
        }
    }
}

// ============================================================================
// Database Struct
// ============================================================================

/// The main entry point for database operations.
///
/// `Database` owns a connection pool and the [`SchemaContext`] used to name
/// tables. It is cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Database {
    /// The underlying SQLx connection pool
    pub(crate) pool: AnyPool,
    /// The detected database driver
    pub(crate) driver: Drivers,
    pub(crate) context: SchemaContext,
    /// Serializes schema changes issued through this handle.
    pub(crate) migration_lock: Arc<tokio::sync::Mutex<()>>,
}

// ============================================================================
// Database Implementation
// ============================================================================

impl Database {
    /// Creates a new DatabaseBuilder for configuring the connection.
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Connects with default settings.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        DatabaseBuilder::new().connect(url).await
    }

    pub fn driver(&self) -> Drivers {
        self.driver
    }

    pub fn context(&self) -> &SchemaContext {
        &self.context
    }

    /// Returns a new Migrator for creating and reconciling model tables.
    pub fn migrator(&self) -> Migrator<'_> {
        Migrator::new(self)
    }

    /// Binds a table to this database for row access.
    pub fn table(&self, table: &Table) -> BoundTable<Self> {
        BoundTable::new(self.clone(), table.clone())
    }

    /// Creates a raw SQL query; the text is executed as given.
    pub fn raw<'a>(&self, sql: &'a str) -> RawQuery<'a, Self> {
        RawQuery::new(self.clone(), sql)
    }

    /// Starts a new database transaction.
    pub async fn begin(&self) -> Result<Transaction, Error> {
        let tx = self.pool.begin().await?;
        Ok(Transaction::new(tx, self.driver, self.context.clone()))
    }

    /// Closes the pool, waiting for open connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Checks if a table exists in the database.
    pub async fn table_exists(&self, table_name: &str) -> Result<bool, Error> {
        let query = match self.driver {
            Drivers::Postgres => {
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = $1 AND table_schema = 'public'"
            }
            Drivers::MySQL => {
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ? AND table_schema = DATABASE()"
            }
            Drivers::SQLite => "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
        };

        let row = sqlx::query(query).bind(table_name).fetch_one(&self.pool).await?;
        let count: i64 = row.try_get(0)?;
        Ok(count > 0)
    }

    /// Returns the current columns of a table.
    pub async fn get_table_columns(&self, table_name: &str) -> Result<Vec<String>, Error> {
        let query = match self.driver {
            Drivers::Postgres => "SELECT column_name::TEXT FROM information_schema.columns WHERE table_name = $1 AND table_schema = 'public'".to_string(),
            Drivers::MySQL => "SELECT column_name FROM information_schema.columns WHERE table_name = ? AND table_schema = DATABASE()".to_string(),
            Drivers::SQLite => format!("PRAGMA table_info(\"{}\")", table_name),
        };

        let rows = if let Drivers::SQLite = self.driver {
            sqlx::query(&query).fetch_all(&self.pool).await?
        } else {
            sqlx::query(&query).bind(table_name).fetch_all(&self.pool).await?
        };

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let col_name: String = if let Drivers::SQLite = self.driver { row.try_get("name")? } else { row.try_get(0)? };
            columns.push(col_name);
        }
        Ok(columns)
    }

    /// Lists every table whose name starts with the framework prefix.
    pub async fn list_prefixed_tables(&self) -> Result<Vec<String>, Error> {
        let query = match self.driver {
            Drivers::Postgres => "SELECT table_name::TEXT FROM information_schema.tables WHERE table_schema = 'public'",
            Drivers::MySQL => "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE()",
            Drivers::SQLite => "SELECT name FROM sqlite_master WHERE type='table'",
        };

        let marker = self.context.table_marker();
        let mut tables = Vec::new();
        for row in sqlx::query(query).fetch_all(&self.pool).await? {
            let name: String = row.try_get(0)?;
            if name.starts_with(&marker) {
                tables.push(name);
            }
        }
        tables.sort();
        Ok(tables)
    }

    /// Creates the tables (and meta tables) of `models` that do not exist and
    /// adds missing columns to those that do.
    pub async fn create_model_tables(&self, models: &[CustomModel]) -> Result<MigrationReport, Error> {
        let _guard = self.migration_lock.lock().await;
        self.apply_models(models).await
    }

    /// Drops every framework-prefixed table that backs none of `models`.
    ///
    /// # Danger
    ///
    /// This is irreversible: there is no backup, dry run or confirmation and
    /// all rows of the dropped tables are lost. Use
    /// [`ddl::orphaned_tables`] to preview, and only expose this behind an
    /// explicit opt-in such as [`Migrator::drop_orphaned_tables`].
    pub async fn drop_orphaned_tables(&self, models: &[CustomModel]) -> Result<Vec<String>, Error> {
        let _guard = self.migration_lock.lock().await;
        self.drop_orphans(models).await
    }

    pub(crate) async fn apply_models(&self, models: &[CustomModel]) -> Result<MigrationReport, Error> {
        let mut report = MigrationReport::default();
        for model in models {
            let table = model.table_name(&self.context)?;
            if self.table_exists(&table).await? {
                let existing = self.get_table_columns(&table).await?;
                for statement in ddl::add_column_statements(model, &existing, &self.context, self.driver)? {
                    self.apply(&statement).await?;
                    report.altered.push(statement);
                }
            } else {
                for statement in ddl::create_table_statements(model, &self.context, self.driver)? {
                    self.apply(&statement).await?;
                }
                log::info!("created table `{}`", table);
                report.created.push(table);
            }

            if model.has_meta() {
                let meta = model.meta_table_name(&self.context)?;
                if !self.table_exists(&meta).await? {
                    for statement in ddl::create_meta_table_statements(model, &self.context, self.driver)? {
                        self.apply(&statement).await?;
                    }
                    log::info!("created table `{}`", meta);
                    report.created.push(meta);
                }
            }
        }
        Ok(report)
    }

    pub(crate) async fn drop_orphans(&self, models: &[CustomModel]) -> Result<Vec<String>, Error> {
        let existing = self.list_prefixed_tables().await?;
        let orphans = ddl::orphaned_tables(&existing, models, &self.context)?;

        let mut dropped = Vec::with_capacity(orphans.len());
        for table in orphans {
            let statement = ddl::drop_table(&table);
            log::warn!("dropping orphaned table `{}` and all of its rows", table);
            self.apply(&statement).await?;
            if self.table_exists(&table).await? {
                return Err(Error::migration(statement, "table still exists after DROP TABLE"));
            }
            dropped.push(table);
        }
        Ok(dropped)
    }

    async fn apply(&self, statement: &str) -> Result<(), Error> {
        log::debug!("applying: {}", statement);
        sqlx::query(statement).execute(&self.pool).await.map_err(|e| Error::migration(statement, e))?;
        Ok(())
    }
}

// ============================================================================
// DatabaseBuilder Struct
// ============================================================================

pub struct DatabaseBuilder {
    max_connections: u32,
    context: SchemaContext,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self { max_connections: 5, context: SchemaContext::default() }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn context(mut self, context: SchemaContext) -> Self {
        self.context = context;
        self
    }

    pub async fn connect(self, url: &str) -> Result<Database, Error> {
        sqlx::any::install_default_drivers();
        let pool = sqlx::any::AnyPoolOptions::new().max_connections(self.max_connections).connect(url).await?;
        let driver = Drivers::from_url(url);
        log::debug!("connected with {:?} driver", driver);
        Ok(Database { pool, driver, context: self.context, migration_lock: Arc::new(tokio::sync::Mutex::new(())) })
    }

    /// Loads `.env` if present and connects to `DATABASE_URL`.
    pub async fn connect_from_env(self) -> Result<Database, Error> {
        dotenvy::dotenv().ok();
        let url = env::var("DATABASE_URL").map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;
        self.connect(&url).await
    }
}

// ============================================================================
// Connection Trait
// ============================================================================

/// Executes literal SQL text.
pub trait Connection: Send + Sync {
    fn driver(&self) -> Drivers;
    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<u64, sqlx::Error>>;
    fn fetch_all<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Vec<AnyRow>, sqlx::Error>>;
    fn fetch_optional<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Option<AnyRow>, sqlx::Error>>;
    /// Runs an INSERT and reads the generated id on the same session.
    fn insert_returning_id<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<i64, sqlx::Error>>;
}

impl Connection for Database {
    fn driver(&self) -> Drivers {
        self.driver
    }
    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<u64, sqlx::Error>> {
        Box::pin(async move { Ok(sqlx::query(sql).execute(&self.pool).await?.rows_affected()) })
    }
    fn fetch_all<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Vec<AnyRow>, sqlx::Error>> {
        Box::pin(async move { sqlx::query(sql).fetch_all(&self.pool).await })
    }
    fn fetch_optional<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Option<AnyRow>, sqlx::Error>> {
        Box::pin(async move { sqlx::query(sql).fetch_optional(&self.pool).await })
    }
    fn insert_returning_id<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<i64, sqlx::Error>> {
        Box::pin(async move {
            let mut conn = self.pool.acquire().await?;
            sqlx::query(sql).execute(&mut *conn).await?;
            let row = sqlx::query(self.driver.last_insert_id_sql()).fetch_one(&mut *conn).await?;
            row.try_get::<i64, _>(0)
        })
    }
}

impl<T: Connection + ?Sized> Connection for &T {
    fn driver(&self) -> Drivers {
        (**self).driver()
    }
    fn execute<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<u64, sqlx::Error>> {
        (**self).execute(sql)
    }
    fn fetch_all<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Vec<AnyRow>, sqlx::Error>> {
        (**self).fetch_all(sql)
    }
    fn fetch_optional<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<Option<AnyRow>, sqlx::Error>> {
        (**self).fetch_optional(sql)
    }
    fn insert_returning_id<'a>(&'a self, sql: &'a str) -> BoxFuture<'a, Result<i64, sqlx::Error>> {
        (**self).insert_returning_id(sql)
    }
}

// ============================================================================
// Raw SQL Query
// ============================================================================

/// A literal SQL statement bound to a connection.
pub struct RawQuery<'a, C> {
    conn: C,
    sql: &'a str,
}

impl<'a, C> RawQuery<'a, C>
where
    C: Connection,
{
    pub(crate) fn new(conn: C, sql: &'a str) -> Self {
        Self { conn, sql }
    }

    pub async fn fetch_all(self) -> Result<Vec<Row>, Error> {
        let rows = self.conn.fetch_all(self.sql).await?;
        Ok(row::decode_rows(&rows)?)
    }

    pub async fn fetch_optional(self) -> Result<Option<Row>, Error> {
        let found = self.conn.fetch_optional(self.sql).await?;
        Ok(found.as_ref().map(row::decode_row).transpose()?)
    }

    pub async fn execute(self) -> Result<u64, Error> {
        Ok(self.conn.execute(self.sql).await?)
    }
}
