use crate::cascade::CompletionCascade;
use crate::error::CoreError;
use crate::models::{
    ChecklistItem, CompletionResult, NewTaskData, Task, TaskFilter, TaskPriority, TaskStatus,
};
use crate::repository::{SqliteRepository, TaskRepository};
use crate::series::assign_series_id;
use crate::timezone::{date_key_in_zone, end_of_day_utc};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::QueryBuilder;
use uuid::Uuid;

#[async_trait]
impl TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        if data.title.trim().is_empty() {
            return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
        }

        let now = Utc::now();
        let tz = self.config().timezone;
        let checklist: Vec<ChecklistItem> = data.checklist.into_iter().map(ChecklistItem::new).collect();

        let mut task = Task {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            assignee: data.assignee,
            client: data.client,
            space: data.space,
            campaign: data.campaign,
            priority: data.priority.unwrap_or(TaskPriority::None),
            status: TaskStatus::Todo,
            due_date: data.due_date,
            completed_at: None,
            created_at: now,
            updated_at: now,
            checklist: Json(checklist),
            ..Default::default()
        };

        // A recurring task is the first instance of a brand new series
        if let Some(recurrence) = data.recurrence {
            let instance_date = date_key_in_zone(data.due_date.unwrap_or(now), &tz);
            let due_date = end_of_day_utc(instance_date, &tz);
            if recurrence.end_date.is_some_and(|end| end < due_date) {
                return Err(CoreError::InvalidInput(
                    "Recurrence end date is before the first occurrence".to_string(),
                ));
            }

            task.is_recurring = true;
            task.recurring_pattern = Some(recurrence.pattern.to_string());
            task.recurring_interval = Some(i64::from(recurrence.interval.max(1)));
            task.recurring_end_date = recurrence.end_date;
            task.schedule_from = Some(recurrence.schedule_from.to_string());
            task.recurrence_series_id = Some(assign_series_id());
            task.recurrence_instance_date = Some(instance_date);
            task.due_date = Some(due_date);
        }

        Self::insert_task_row(self.pool(), &task).await?;
        tracing::debug!(task_id = %task.id, recurring = task.is_recurring, "Task created");
        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_by_short_id_prefix(&self, short_id: &str) -> Result<Vec<Task>, CoreError> {
        // Ids are stored as blobs; match against their hex form. Only hex
        // digits survive, so no LIKE wildcard can reach the pattern.
        let mut pattern: String = short_id
            .chars()
            .filter(char::is_ascii_hexdigit)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if pattern.is_empty() {
            return Ok(Vec::new());
        }
        pattern.push('%');

        let tasks: Vec<Task> = sqlx::query_as("SELECT * FROM tasks WHERE lower(hex(id)) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(tasks)
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError> {
        let mut query_builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT * FROM tasks WHERE 1 = 1");

        if let Some(series_id) = &filter.series_id {
            query_builder.push(" AND recurrence_series_id = ");
            query_builder.push_bind(series_id.clone());
        }
        if !filter.include_completed {
            query_builder.push(" AND status != ");
            query_builder.push_bind(TaskStatus::Completed);
        }
        query_builder.push(" ORDER BY due_date IS NULL, due_date, created_at");

        let tasks = query_builder.build_query_as().fetch_all(self.pool()).await?;
        Ok(tasks)
    }

    async fn update_status(&self, id: Uuid, status: TaskStatus) -> Result<CompletionResult, CoreError> {
        let current = self
            .find_task_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if status != TaskStatus::Completed {
            let updated: Task = sqlx::query_as(
                r#"UPDATE tasks
                SET status = $1, completed_at = NULL, updated_at = $2
                WHERE id = $3
                RETURNING *
                "#,
            )
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_one(self.pool())
            .await?;

            if current.status == TaskStatus::Completed && current.is_recurring {
                // Reopening never retracts an occurrence the cascade already created
                tracing::debug!(task_id = %id, "Recurring instance reopened; next occurrence kept");
            }
            return Ok(CompletionResult::Single(updated));
        }

        // The status guard makes only the first completion win, even when two
        // requests race on the same task.
        let now = Utc::now();
        let completed: Option<Task> = sqlx::query_as(
            r#"UPDATE tasks
            SET status = $1, completed_at = $2, updated_at = $2
            WHERE id = $3 AND status != $1
            RETURNING *
            "#,
        )
        .bind(TaskStatus::Completed)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        let Some(completed) = completed else {
            tracing::debug!(task_id = %id, "Task already completed, nothing to schedule");
            return Ok(CompletionResult::Single(current));
        };

        if !CompletionCascade::should_fire(current.status, &completed) {
            return Ok(CompletionResult::Single(completed));
        }

        let outcome = CompletionCascade::new(self.config().timezone)
            .on_completed(self, &completed)
            .await?;

        Ok(CompletionResult::SeriesInstance {
            completed,
            series_id: outcome.series_id,
            next_occurrence: outcome.next_occurrence,
            next: outcome.next,
        })
    }
}
