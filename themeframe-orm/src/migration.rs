use crate::{
    database::Database,
    error::Error,
    model::{CustomModel, Model},
};

/// Deferred model definition, built when the migration runs.
pub type DefinitionTask = Box<dyn Fn() -> Result<CustomModel, Error> + Send + Sync>;

/// What a migration run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Tables created, in creation order.
    pub created: Vec<String>,
    /// `ALTER TABLE` statements applied to existing tables.
    pub altered: Vec<String>,
    /// Orphaned tables dropped.
    pub dropped: Vec<String>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.altered.is_empty() && self.dropped.is_empty()
    }
}

/// Schema migration manager.
///
/// Collects model definitions, then creates their tables and meta tables and
/// adds missing columns. Dropping orphaned tables is opt-in.
pub struct Migrator<'a> {
    pub(crate) db: &'a Database,
    pub(crate) tasks: Vec<DefinitionTask>,
    pub(crate) drop_orphans: bool,
}

impl<'a> Migrator<'a> {
    /// Creates a new Migrator instance associated with a Database.
    pub fn new(db: &'a Database) -> Self {
        Self { db, tasks: Vec::new(), drop_orphans: false }
    }

    /// Registers a Model for migration.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// db.migrator()
    ///   .register::<Widget>()
    ///   .register::<Review>()
    ///   .run()
    ///   .await?;
    /// ```
    pub fn register<T>(mut self) -> Self
    where
        T: Model + 'static,
    {
        self.tasks.push(Box::new(T::definition));
        self
    }

    /// Registers an already built model definition.
    pub fn register_model(mut self, model: CustomModel) -> Self {
        self.tasks.push(Box::new(move || Ok(model.clone())));
        self
    }

    /// Opts in to dropping every prefixed table no registered model backs.
    ///
    /// This deletes data irreversibly. See [`Database::drop_orphaned_tables`].
    pub fn drop_orphaned_tables(mut self) -> Self {
        self.drop_orphans = true;
        self
    }

    /// Executes the migration.
    ///
    /// 1. Builds every definition; any invalid identifier aborts before SQL is sent.
    /// 2. Creates missing tables and adds missing columns.
    /// 3. Drops orphaned tables, when opted in.
    ///
    /// Runs are serialized per `Database` handle.
    pub async fn run(self) -> Result<MigrationReport, Error> {
        let models = self.tasks.iter().map(|task| task()).collect::<Result<Vec<_>, _>>()?;

        let _guard = self.db.migration_lock.lock().await;
        log::info!("migrating {} model(s)", models.len());
        let mut report = self.db.apply_models(&models).await?;
        if self.drop_orphans {
            report.dropped = self.db.drop_orphans(&models).await?;
        }
        Ok(report)
    }
}
