use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::Task;
use crate::repository::{InsertOutcome, SqliteRepository, TaskStore};
use crate::timezone::DateKey;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl TaskStore for SqliteRepository {
    async fn find_recurring_tasks(&self) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            "SELECT * FROM tasks WHERE is_recurring = 1 ORDER BY created_at",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn instance_exists(&self, series_id: &str, instance_date: DateKey) -> Result<bool, CoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"SELECT EXISTS(
                SELECT 1 FROM tasks
                WHERE recurrence_series_id = $1 AND recurrence_instance_date = $2
            )"#,
        )
        .bind(series_id)
        .bind(instance_date)
        .fetch_one(self.pool())
        .await?;
        Ok(exists)
    }

    async fn insert_instance(&self, task: &Task) -> Result<InsertOutcome, CoreError> {
        match Self::insert_task_row(self.pool(), task).await {
            Ok(()) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                tracing::debug!(
                    series_id = task.recurrence_series_id.as_deref().unwrap_or_default(),
                    instance_date = ?task.recurrence_instance_date,
                    "Instance already exists, insert skipped"
                );
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_series_metadata(
        &self,
        task_id: Uuid,
        series_id: &str,
        instance_date: Option<DateKey>,
    ) -> Result<(), CoreError> {
        let result = sqlx::query(
            r#"UPDATE tasks
            SET recurrence_series_id = CASE
                    WHEN recurrence_series_id IS NULL OR trim(recurrence_series_id) = '' THEN $1
                    ELSE recurrence_series_id
                END,
                recurrence_instance_date = COALESCE(recurrence_instance_date, $2),
                updated_at = $3
            WHERE id = $4"#,
        )
        .bind(series_id)
        .bind(instance_date)
        .bind(Utc::now())
        .bind(task_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(task_id.to_string()));
        }
        Ok(())
    }
}

impl SqliteRepository {
    /// Insert a complete task row. Shared by task creation and instance
    /// materialization so both write the same column set.
    pub(crate) async fn insert_task_row(pool: &DbPool, task: &Task) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO tasks (
                id, title, description, assignee, client, space, campaign, priority, status,
                due_date, completed_at, created_at, updated_at, is_recurring, recurring_pattern,
                recurring_interval, recurring_end_date, schedule_from, recurrence_series_id,
                recurrence_instance_date, checklist
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21)"#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(&task.assignee)
        .bind(&task.client)
        .bind(&task.space)
        .bind(&task.campaign)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.is_recurring)
        .bind(&task.recurring_pattern)
        .bind(task.recurring_interval)
        .bind(task.recurring_end_date)
        .bind(&task.schedule_from)
        .bind(&task.recurrence_series_id)
        .bind(task.recurrence_instance_date)
        .bind(&task.checklist)
        .execute(pool)
        .await?;
        Ok(())
    }
}
