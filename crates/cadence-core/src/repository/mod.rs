use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{CompletionResult, NewTaskData, SchedulerConfig, Task, TaskFilter, TaskStatus};
use crate::timezone::DateKey;
use async_trait::async_trait;
use uuid::Uuid;

pub mod instances;
pub mod tasks;

/// Result of attempting to insert a new instance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The `(series, date key)` slot was already taken by another writer
    Duplicate,
}

/// The storage operations the scheduling core depends on.
///
/// Uniqueness of `(series id, instance date)` must be enforced by the store
/// itself; it is the only guard against concurrent double creation.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_recurring_tasks(&self) -> Result<Vec<Task>, CoreError>;
    async fn instance_exists(&self, series_id: &str, instance_date: DateKey) -> Result<bool, CoreError>;
    async fn insert_instance(&self, task: &Task) -> Result<InsertOutcome, CoreError>;
    /// Fill in series metadata on a row. Fields that are already set are kept.
    async fn update_series_metadata(
        &self,
        task_id: Uuid,
        series_id: &str,
        instance_date: Option<DateKey>,
    ) -> Result<(), CoreError>;
}

/// Task operations exposed to the front-end
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn find_tasks_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Task>, CoreError>;
    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError>;
    /// Change a task's status. The first transition of a recurring instance
    /// into `completed` schedules the next occurrence.
    async fn update_status(&self, id: Uuid, status: TaskStatus) -> Result<CompletionResult, CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository: TaskRepository + TaskStore {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
    config: SchedulerConfig,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, config: SchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }
}

impl Repository for SqliteRepository {}
