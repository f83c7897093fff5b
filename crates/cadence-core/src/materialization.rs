//! Writing concrete instance rows for a series.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{reset_checklist, RecurringDefinition, Task, TaskStatus};
use crate::repository::{InsertOutcome, TaskStore};
use crate::timezone::{end_of_day_utc, DateKey};

#[derive(Debug)]
pub enum MaterializeOutcome {
    Created(Task),
    /// Another run or request already created this occurrence
    AlreadyExists,
    /// The occurrence would be due after the series end date
    SeriesEnded,
}

/// What materializing a target day would do, decided without touching storage.
#[derive(Debug)]
pub enum MaterializationPlan {
    Insert(Task),
    SeriesEnded { due_date: DateTime<Utc> },
}

#[derive(Debug, Clone, Copy)]
pub struct InstanceMaterializer {
    timezone: Tz,
}

impl InstanceMaterializer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn plan(&self, definition: &RecurringDefinition, target: DateKey) -> MaterializationPlan {
        let due_date = end_of_day_utc(target, &self.timezone);
        if definition.has_ended_by(due_date) {
            return MaterializationPlan::SeriesEnded { due_date };
        }
        MaterializationPlan::Insert(Self::build_instance(definition, target, due_date))
    }

    /// Create the instance for `target` unless the series has ended.
    ///
    /// Losing an insert race on `(series id, instance date)` counts as
    /// success and yields [`MaterializeOutcome::AlreadyExists`].
    pub async fn materialize<S>(
        &self,
        store: &S,
        definition: &RecurringDefinition,
        target: DateKey,
    ) -> Result<MaterializeOutcome, CoreError>
    where
        S: TaskStore + ?Sized,
    {
        let instance = match self.plan(definition, target) {
            MaterializationPlan::Insert(instance) => instance,
            MaterializationPlan::SeriesEnded { due_date } => {
                tracing::debug!(
                    series_id = %definition.series_id,
                    instance_date = %target,
                    due_date = %due_date,
                    "Series has ended, no instance created"
                );
                return Ok(MaterializeOutcome::SeriesEnded);
            }
        };

        match store.insert_instance(&instance).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    series_id = %definition.series_id,
                    instance_date = %target,
                    task_id = %instance.id,
                    "Materialized recurring instance"
                );
                Ok(MaterializeOutcome::Created(instance))
            }
            InsertOutcome::Duplicate => Ok(MaterializeOutcome::AlreadyExists),
        }
    }

    fn build_instance(definition: &RecurringDefinition, target: DateKey, due_date: DateTime<Utc>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::now_v7(),
            title: definition.title.clone(),
            description: definition.description.clone(),
            assignee: definition.assignee.clone(),
            client: definition.client.clone(),
            space: definition.space.clone(),
            campaign: definition.campaign.clone(),
            priority: definition.priority,
            status: TaskStatus::Todo,
            due_date: Some(due_date),
            completed_at: None,
            created_at: now,
            updated_at: now,
            is_recurring: true,
            recurring_pattern: Some(definition.rule.pattern.to_string()),
            recurring_interval: Some(i64::from(definition.rule.interval)),
            recurring_end_date: definition.recurring_end_date,
            schedule_from: Some(definition.schedule_from.to_string()),
            recurrence_series_id: Some(definition.series_id.clone()),
            recurrence_instance_date: Some(target),
            checklist: Json(reset_checklist(&definition.checklist)),
        }
    }
}
