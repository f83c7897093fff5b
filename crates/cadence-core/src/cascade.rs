//! Scheduling the next occurrence when a recurring instance is completed.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::materialization::{InstanceMaterializer, MaterializeOutcome};
use crate::models::{RecurringDefinition, ScheduleFrom, Task, TaskStatus};
use crate::recurrence::next_instance_date_key;
use crate::repository::TaskStore;
use crate::series::resolve_series_id;
use crate::timezone::{date_key_in_zone, DateKey};

#[derive(Debug)]
pub struct CascadeOutcome {
    pub series_id: String,
    /// `None` when the series ended before the next occurrence
    pub next_occurrence: Option<DateKey>,
    /// The row this call created, if any
    pub next: Option<Task>,
}

#[derive(Debug, Clone, Copy)]
pub struct CompletionCascade {
    timezone: Tz,
}

impl CompletionCascade {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Only the first transition of a recurring row into `completed` fires.
    pub fn should_fire(previous: TaskStatus, updated: &Task) -> bool {
        updated.is_recurring
            && previous != TaskStatus::Completed
            && updated.status == TaskStatus::Completed
    }

    /// The instant the next occurrence is counted from.
    pub fn base_date(definition: &RecurringDefinition, completed: &Task, now: DateTime<Utc>) -> DateTime<Utc> {
        match definition.schedule_from {
            ScheduleFrom::CompletionDate => completed.completed_at.unwrap_or(now),
            ScheduleFrom::DueDate => completed.due_date.or(completed.completed_at).unwrap_or(now),
        }
    }

    /// React to `completed` having just entered the completed state.
    ///
    /// Repeated triggers for the same instance compute the same date key, and
    /// the store's uniqueness guard turns every insert after the first into a
    /// no-op.
    pub async fn on_completed<S>(&self, store: &S, completed: &Task) -> Result<CascadeOutcome, CoreError>
    where
        S: TaskStore + ?Sized,
    {
        let series_id = resolve_series_id(completed);
        if completed.recurrence_series_id.as_deref() != Some(series_id.as_str())
            || completed.recurrence_instance_date.is_none()
        {
            let own_key = completed
                .due_date
                .map(|due| date_key_in_zone(due, &self.timezone));
            if let Err(e) = store.update_series_metadata(completed.id, &series_id, own_key).await {
                tracing::warn!(task_id = %completed.id, error = %e, "Failed to persist series metadata");
            }
        }

        let definition = RecurringDefinition::from_task(completed, series_id.clone());
        let base = Self::base_date(&definition, completed, Utc::now());
        let next_key = next_instance_date_key(
            definition.rule.pattern,
            i64::from(definition.rule.interval),
            base,
            &self.timezone,
        );

        let outcome = InstanceMaterializer::new(self.timezone)
            .materialize(store, &definition, next_key)
            .await?;

        let (next_occurrence, next) = match outcome {
            MaterializeOutcome::Created(task) => (Some(next_key), Some(task)),
            MaterializeOutcome::AlreadyExists => (Some(next_key), None),
            MaterializeOutcome::SeriesEnded => {
                tracing::info!(series_id = %series_id, "Recurring series reached its end date");
                (None, None)
            }
        };

        Ok(CascadeOutcome {
            series_id,
            next_occurrence,
            next,
        })
    }
}
