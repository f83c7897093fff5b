//! Backfill: make sure every recurring series has a current open instance.
//!
//! The job is a single pass over all recurring rows and is safe to re-run at
//! any cadence. Each series gets at most one insert per run; a series that
//! fails is logged and skipped without affecting the others.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

use crate::error::CoreError;
use crate::materialization::{InstanceMaterializer, MaterializationPlan, MaterializeOutcome};
use crate::models::{RecurringDefinition, ScheduleFrom, SchedulerConfig, Task};
use crate::recurrence::RecurrencePattern;
use crate::repository::TaskStore;
use crate::series::resolve_series_id;
use crate::timezone::{date_key_in_zone, DateKey};

/// Aggregate counters reported by one reconciliation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationSummary {
    pub success: bool,
    pub dry_run: bool,
    pub today_key: DateKey,
    pub series_processed: usize,
    /// Template rows that had series metadata backfilled
    pub series_updated: usize,
    pub tasks_created: usize,
    pub skipped: usize,
    /// Series left for a later run because of the series limit
    pub deferred: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl ReconciliationSummary {
    fn new(today_key: DateKey, dry_run: bool) -> Self {
        Self {
            success: true,
            dry_run,
            today_key,
            series_processed: 0,
            series_updated: 0,
            tasks_created: 0,
            skipped: 0,
            deferred: 0,
            errors: Vec::new(),
            duration_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesOutcome {
    Created,
    AlreadyCurrent,
    AlreadyExists,
    SeriesEnded,
}

pub struct ReconciliationJob {
    config: SchedulerConfig,
}

impl ReconciliationJob {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    /// Run one reconciliation pass as of `now`.
    ///
    /// With `dry_run` every read and decision happens as usual and the
    /// counters reflect what a real run would do, but nothing is written.
    pub async fn run<S>(&self, store: &S, now: DateTime<Utc>, dry_run: bool) -> Result<ReconciliationSummary, CoreError>
    where
        S: TaskStore + ?Sized,
    {
        let started = Instant::now();
        let today = date_key_in_zone(now, &self.config.timezone);
        let mut summary = ReconciliationSummary::new(today, dry_run);

        let rows = store.find_recurring_tasks().await?;
        let groups = self.stalest_first(group_by_series(rows));
        tracing::info!(
            series = groups.len(),
            today = %today,
            dry_run,
            "Starting recurring task reconciliation"
        );

        if groups.len() > self.config.max_series {
            summary.deferred = groups.len() - self.config.max_series;
            summary.success = false;
            tracing::warn!(
                limit = self.config.max_series,
                deferred = summary.deferred,
                "Series limit reached, stalest series handled first and the rest deferred"
            );
        }

        for (series_id, rows) in groups.iter().take(self.config.max_series) {
            summary.series_processed += 1;

            match self.reconcile_series(store, series_id, rows, today, dry_run, &mut summary).await {
                Ok(SeriesOutcome::Created) => summary.tasks_created += 1,
                Ok(outcome) => {
                    tracing::debug!(series_id = %series_id, ?outcome, "Series skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(series_id = %series_id, error = %e, "Failed to reconcile series, skipping");
                    summary.errors.push(format!("{}: {}", series_id, e));
                    summary.skipped += 1;
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            series_processed = summary.series_processed,
            series_updated = summary.series_updated,
            tasks_created = summary.tasks_created,
            skipped = summary.skipped,
            deferred = summary.deferred,
            errors = summary.errors.len(),
            dry_run,
            "Reconciliation finished"
        );
        Ok(summary)
    }

    async fn reconcile_series<S>(
        &self,
        store: &S,
        series_id: &str,
        rows: &[Task],
        today: DateKey,
        dry_run: bool,
        summary: &mut ReconciliationSummary,
    ) -> Result<SeriesOutcome, CoreError>
    where
        S: TaskStore + ?Sized,
    {
        let template = pick_template(rows)
            .ok_or_else(|| CoreError::InvalidInput(format!("series {} has no rows", series_id)))?;
        let template_key = self.effective_key(template);

        if needs_metadata_backfill(template) {
            summary.series_updated += 1;
            if !dry_run {
                if let Err(e) = store
                    .update_series_metadata(template.id, series_id, Some(template_key))
                    .await
                {
                    tracing::warn!(
                        series_id = %series_id,
                        task_id = %template.id,
                        error = %e,
                        "Failed to backfill series metadata"
                    );
                }
            }
        }

        let definition = RecurringDefinition::from_task(template, series_id);
        let keyed: Vec<(DateKey, &Task)> = rows.iter().map(|t| (self.effective_key(t), t)).collect();

        let Some(target) = self.decide_target(&definition, &keyed, today)? else {
            return Ok(SeriesOutcome::AlreadyCurrent);
        };

        if keyed.iter().any(|(key, _)| *key == target) || store.instance_exists(series_id, target).await? {
            return Ok(SeriesOutcome::AlreadyExists);
        }

        let materializer = InstanceMaterializer::new(self.config.timezone);
        if dry_run {
            return Ok(match materializer.plan(&definition, target) {
                MaterializationPlan::Insert(_) => SeriesOutcome::Created,
                MaterializationPlan::SeriesEnded { .. } => SeriesOutcome::SeriesEnded,
            });
        }

        Ok(match materializer.materialize(store, &definition, target).await? {
            MaterializeOutcome::Created(_) => SeriesOutcome::Created,
            MaterializeOutcome::AlreadyExists => SeriesOutcome::AlreadyExists,
            MaterializeOutcome::SeriesEnded => SeriesOutcome::SeriesEnded,
        })
    }

    /// The occurrence this series should have next, or `None` if it is
    /// already current.
    fn decide_target(
        &self,
        definition: &RecurringDefinition,
        keyed: &[(DateKey, &Task)],
        today: DateKey,
    ) -> Result<Option<DateKey>, CoreError> {
        let rule = definition.rule;

        if rule.pattern == RecurrencePattern::Daily {
            let mut todays = keyed.iter().filter(|(key, _)| *key == today).peekable();
            if todays.peek().is_none() {
                return Ok(Some(today));
            }
            if todays.any(|(_, task)| task.status.is_open()) {
                return Ok(None);
            }
            return Ok(Some(rule.advance(today)));
        }

        if keyed
            .iter()
            .any(|(key, task)| task.status.is_open() && *key >= today)
        {
            return Ok(None);
        }

        let last_known = keyed
            .iter()
            .map(|(key, _)| *key)
            .max()
            .ok_or_else(|| CoreError::InvalidInput(format!("series {} has no rows", definition.series_id)))?;

        let start = match definition.schedule_from {
            ScheduleFrom::CompletionDate => keyed
                .iter()
                .filter(|(_, task)| !task.status.is_open())
                .filter_map(|(_, task)| task.completed_at)
                .max()
                .map(|at| date_key_in_zone(at, &self.config.timezone))
                .unwrap_or(last_known),
            ScheduleFrom::DueDate => last_known,
        };

        rule.next_on_or_after(start, today, self.config.max_forward_steps)
            .map(Some)
    }

    /// Order series by their latest known day, oldest first, so a capped run
    /// reaches the series that have waited longest.
    fn stalest_first(&self, groups: BTreeMap<String, Vec<Task>>) -> Vec<(String, Vec<Task>)> {
        let mut ordered: Vec<(Option<DateKey>, String, Vec<Task>)> = groups
            .into_iter()
            .map(|(series_id, rows)| {
                let latest = rows.iter().map(|t| self.effective_key(t)).max();
                (latest, series_id, rows)
            })
            .collect();
        ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        ordered
            .into_iter()
            .map(|(_, series_id, rows)| (series_id, rows))
            .collect()
    }

    /// The day a row stands for: its stored instance date, else the local day
    /// of its due date, completion time or creation time.
    fn effective_key(&self, task: &Task) -> DateKey {
        let tz = &self.config.timezone;
        task.recurrence_instance_date
            .or_else(|| task.due_date.map(|at| date_key_in_zone(at, tz)))
            .or_else(|| task.completed_at.map(|at| date_key_in_zone(at, tz)))
            .unwrap_or_else(|| date_key_in_zone(task.created_at, tz))
    }
}

fn group_by_series(rows: Vec<Task>) -> BTreeMap<String, Vec<Task>> {
    let mut groups: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for row in rows {
        groups.entry(resolve_series_id(&row)).or_default().push(row);
    }
    groups
}

/// Latest due date wins, then latest creation time.
fn pick_template(rows: &[Task]) -> Option<&Task> {
    rows.iter().max_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.created_at.cmp(&b.created_at))
    })
}

fn needs_metadata_backfill(task: &Task) -> bool {
    let missing_series = task
        .recurrence_series_id
        .as_deref()
        .map_or(true, |id| id.trim().is_empty());
    missing_series || task.recurrence_instance_date.is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use crate::repository::InsertOutcome;
    use crate::timezone::{end_of_day_utc, parse_date_key};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Minimal store with the same uniqueness rule as the SQLite schema.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<Vec<Task>>,
        writes: Mutex<usize>,
        /// Fail every metadata write
        fail_metadata: Mutex<bool>,
        /// Fail inserts for this series with a non-unique database error
        fail_insert_for: Mutex<Option<String>>,
    }

    impl MemoryStore {
        fn with_rows(rows: Vec<Task>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Default::default()
            }
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        fn writes(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl TaskStore for MemoryStore {
        async fn find_recurring_tasks(&self) -> Result<Vec<Task>, CoreError> {
            Ok(self.rows.lock().unwrap().iter().filter(|t| t.is_recurring).cloned().collect())
        }

        async fn instance_exists(&self, series_id: &str, instance_date: DateKey) -> Result<bool, CoreError> {
            Ok(self.rows.lock().unwrap().iter().any(|t| {
                t.recurrence_series_id.as_deref() == Some(series_id)
                    && t.recurrence_instance_date == Some(instance_date)
            }))
        }

        async fn insert_instance(&self, task: &Task) -> Result<InsertOutcome, CoreError> {
            *self.writes.lock().unwrap() += 1;
            let failing = self.fail_insert_for.lock().unwrap().clone();
            if failing.is_some() && failing == task.recurrence_series_id {
                return Err(CoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let mut rows = self.rows.lock().unwrap();
            let taken = rows.iter().any(|t| {
                t.recurrence_series_id.is_some()
                    && t.recurrence_series_id == task.recurrence_series_id
                    && t.recurrence_instance_date == task.recurrence_instance_date
            });
            if taken {
                return Ok(InsertOutcome::Duplicate);
            }
            rows.push(task.clone());
            Ok(InsertOutcome::Inserted)
        }

        async fn update_series_metadata(
            &self,
            task_id: Uuid,
            series_id: &str,
            instance_date: Option<DateKey>,
        ) -> Result<(), CoreError> {
            *self.writes.lock().unwrap() += 1;
            if *self.fail_metadata.lock().unwrap() {
                return Err(CoreError::Database(sqlx::Error::PoolTimedOut));
            }
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| CoreError::NotFound(task_id.to_string()))?;
            row.recurrence_series_id.get_or_insert_with(|| series_id.to_string());
            if row.recurrence_instance_date.is_none() {
                row.recurrence_instance_date = instance_date;
            }
            Ok(())
        }
    }

    fn config() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    fn key(s: &str) -> DateKey {
        parse_date_key(s).unwrap()
    }

    fn noon(day: &str) -> DateTime<Utc> {
        end_of_day_utc(key(day), &config().timezone) - Duration::hours(12)
    }

    fn instance(series: &str, pattern: &str, day: &str, status: TaskStatus) -> Task {
        let tz = config().timezone;
        Task {
            title: format!("{} task", pattern),
            is_recurring: true,
            recurring_pattern: Some(pattern.into()),
            recurring_interval: Some(1),
            schedule_from: Some("due_date".into()),
            recurrence_series_id: Some(series.into()),
            recurrence_instance_date: Some(key(day)),
            due_date: Some(end_of_day_utc(key(day), &tz)),
            completed_at: (status == TaskStatus::Completed).then(|| noon(day)),
            status,
            ..Default::default()
        }
    }

    mod decision_tests {
        use super::*;

        fn decide(rows: &[Task], today: &str) -> Option<DateKey> {
            let job = ReconciliationJob::new(config());
            let template = pick_template(rows).unwrap();
            let definition = RecurringDefinition::from_task(template, "s");
            let keyed: Vec<_> = rows.iter().map(|t| (job.effective_key(t), t)).collect();
            job.decide_target(&definition, &keyed, key(today)).unwrap()
        }

        #[test]
        fn test_daily_open_today_is_current() {
            let rows = vec![instance("s", "daily", "2024-01-10", TaskStatus::InProgress)];
            assert_eq!(decide(&rows, "2024-01-10"), None);
        }

        #[test]
        fn test_daily_completed_today_targets_tomorrow() {
            let rows = vec![instance("s", "daily", "2024-01-10", TaskStatus::Completed)];
            assert_eq!(decide(&rows, "2024-01-10"), Some(key("2024-01-11")));
        }

        #[test]
        fn test_daily_missing_today_targets_today() {
            let rows = vec![instance("s", "daily", "2024-01-07", TaskStatus::Completed)];
            assert_eq!(decide(&rows, "2024-01-10"), Some(key("2024-01-10")));
        }

        #[test]
        fn test_weekly_future_open_is_current() {
            let rows = vec![
                instance("s", "weekly", "2024-01-03", TaskStatus::Completed),
                instance("s", "weekly", "2024-01-10", TaskStatus::Todo),
            ];
            assert_eq!(decide(&rows, "2024-01-08"), None);
        }

        #[test]
        fn test_weekly_catches_up_from_last_key() {
            let rows = vec![instance("s", "weekly", "2023-12-06", TaskStatus::Completed)];
            assert_eq!(decide(&rows, "2024-01-08"), Some(key("2024-01-10")));
        }

        #[test]
        fn test_overdue_open_instance_does_not_block() {
            let rows = vec![instance("s", "monthly", "2023-12-15", TaskStatus::Todo)];
            assert_eq!(decide(&rows, "2024-01-20"), Some(key("2024-02-15")));
        }

        #[test]
        fn test_completion_anchor_uses_latest_completion() {
            let mut done = instance("s", "weekly", "2024-01-01", TaskStatus::Completed);
            done.schedule_from = Some("completion_date".into());
            done.completed_at = Some(noon("2024-01-05"));
            assert_eq!(decide(&[done], "2024-01-09"), Some(key("2024-01-12")));
        }

        #[test]
        fn test_effective_key_fallbacks() {
            let job = ReconciliationJob::new(config());
            let tz = config().timezone;
            let mut legacy = Task {
                is_recurring: true,
                due_date: Some(end_of_day_utc(key("2024-03-02"), &tz)),
                ..Default::default()
            };
            assert_eq!(job.effective_key(&legacy), key("2024-03-02"));

            legacy.due_date = None;
            legacy.completed_at = Some(noon("2024-03-05"));
            assert_eq!(job.effective_key(&legacy), key("2024-03-05"));

            legacy.completed_at = None;
            legacy.created_at = noon("2024-03-07");
            assert_eq!(job.effective_key(&legacy), key("2024-03-07"));
        }

        #[test]
        fn test_template_is_latest_due_then_latest_created() {
            let early = instance("s", "daily", "2024-01-01", TaskStatus::Completed);
            let mut late = instance("s", "daily", "2024-01-02", TaskStatus::Todo);
            let mut twin = late.clone();
            twin.id = Uuid::now_v7();
            late.created_at = noon("2024-01-01");
            twin.created_at = noon("2024-01-02");
            let rows = vec![early, twin.clone(), late];
            assert_eq!(pick_template(&rows).unwrap().id, twin.id);
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_dry_run_counts_without_writing() {
            let store = MemoryStore::with_rows(vec![instance("s", "daily", "2024-01-09", TaskStatus::Completed)]);
            let job = ReconciliationJob::new(config());

            let dry = job.run(&store, noon("2024-01-10"), true).await.unwrap();
            assert!(dry.dry_run);
            assert_eq!(dry.tasks_created, 1);
            assert_eq!(store.len(), 1);
            assert_eq!(store.writes(), 0);

            let real = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(real.tasks_created, dry.tasks_created);
            assert_eq!(real.skipped, dry.skipped);
            assert_eq!(store.len(), 2);
        }

        #[tokio::test]
        async fn test_second_run_is_a_no_op() {
            let store = MemoryStore::with_rows(vec![
                instance("a", "daily", "2024-01-08", TaskStatus::Completed),
                instance("b", "weekly", "2023-12-20", TaskStatus::Completed),
                instance("c", "monthly", "2024-01-31", TaskStatus::Todo),
            ]);
            let job = ReconciliationJob::new(config());

            let first = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(first.series_processed, 3);
            assert_eq!(first.tasks_created, 2);
            assert_eq!(first.skipped, 1);

            let second = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(second.tasks_created, 0);
            assert_eq!(second.skipped, 3);
            assert_eq!(store.len(), 5);
        }

        #[tokio::test]
        async fn test_legacy_rows_are_grouped_and_backfilled() {
            let tz = config().timezone;
            let legacy = |day: &str, status: TaskStatus| Task {
                title: "Invoice review".into(),
                client: Some("acme".into()),
                is_recurring: true,
                recurring_pattern: Some("weekly".into()),
                due_date: Some(end_of_day_utc(key(day), &tz)),
                status,
                ..Default::default()
            };
            let store = MemoryStore::with_rows(vec![
                legacy("2024-01-01", TaskStatus::Completed),
                legacy("2024-01-08", TaskStatus::Completed),
            ]);
            let job = ReconciliationJob::new(config());

            let summary = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(summary.series_processed, 1);
            assert_eq!(summary.series_updated, 1);
            assert_eq!(summary.tasks_created, 1);

            let rows = store.rows.lock().unwrap().clone();
            let created = rows.iter().find(|t| t.status == TaskStatus::Todo).unwrap();
            assert_eq!(created.recurrence_instance_date, Some(key("2024-01-15")));
            let series_id = created.recurrence_series_id.clone().unwrap();
            assert!(series_id.starts_with(crate::series::FINGERPRINT_PREFIX));
            let template = rows
                .iter()
                .find(|t| t.due_date == Some(end_of_day_utc(key("2024-01-08"), &tz)))
                .unwrap();
            assert_eq!(template.recurrence_series_id.as_deref(), Some(series_id.as_str()));

            let again = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(again.series_processed, 1);
            assert_eq!(again.series_updated, 0);
            assert_eq!(again.tasks_created, 0);
        }

        #[tokio::test]
        async fn test_bad_series_does_not_abort_run() {
            let stale = instance("stale", "daily", "2000-01-01", TaskStatus::Completed);
            let stale = Task {
                recurring_pattern: Some("weekly".into()),
                ..stale
            };
            let store = MemoryStore::with_rows(vec![
                stale,
                instance("fine", "daily", "2024-01-09", TaskStatus::Completed),
            ]);
            let job = ReconciliationJob::new(config());

            let summary = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(summary.series_processed, 2);
            assert_eq!(summary.tasks_created, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.errors.len(), 1);
            assert!(summary.errors[0].starts_with("stale"));
        }

        #[tokio::test]
        async fn test_ended_series_is_skipped() {
            let tz = config().timezone;
            let mut done = instance("s", "weekly", "2024-01-18", TaskStatus::Completed);
            done.recurring_end_date = Some(end_of_day_utc(key("2024-01-20"), &tz));
            let store = MemoryStore::with_rows(vec![done]);

            let summary = ReconciliationJob::new(config())
                .run(&store, noon("2024-01-22"), false)
                .await
                .unwrap();
            assert_eq!(summary.tasks_created, 0);
            assert_eq!(summary.skipped, 1);
            assert_eq!(store.len(), 1);
        }

        #[tokio::test]
        async fn test_series_limit_defers_and_rotates() {
            let store = MemoryStore::with_rows(vec![
                instance("a", "daily", "2024-01-09", TaskStatus::Completed),
                instance("b", "daily", "2024-01-09", TaskStatus::Completed),
            ]);
            let job = ReconciliationJob::new(SchedulerConfig {
                max_series: 1,
                ..config()
            });

            let first = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(first.series_processed, 1);
            assert_eq!(first.tasks_created, 1);
            assert_eq!(first.deferred, 1);
            assert!(!first.success);

            // "a" is current now, so "b" has waited longest
            let second = job.run(&store, noon("2024-01-10"), false).await.unwrap();
            assert_eq!(second.series_processed, 1);
            assert_eq!(second.tasks_created, 1);
            assert_eq!(second.deferred, 1);

            let rows = store.rows.lock().unwrap().clone();
            for series in ["a", "b"] {
                assert!(rows.iter().any(|t| {
                    t.recurrence_series_id.as_deref() == Some(series)
                        && t.recurrence_instance_date == Some(key("2024-01-10"))
                }));
            }
        }

        #[tokio::test]
        async fn test_failed_metadata_backfill_still_creates_instance() {
            let tz = config().timezone;
            let legacy = Task {
                title: "Invoice review".into(),
                is_recurring: true,
                recurring_pattern: Some("weekly".into()),
                due_date: Some(end_of_day_utc(key("2024-01-08"), &tz)),
                status: TaskStatus::Completed,
                ..Default::default()
            };
            let store = MemoryStore::with_rows(vec![legacy]);
            *store.fail_metadata.lock().unwrap() = true;

            let summary = ReconciliationJob::new(config())
                .run(&store, noon("2024-01-10"), false)
                .await
                .unwrap();
            assert_eq!(summary.series_updated, 1);
            assert_eq!(summary.tasks_created, 1);
            assert!(summary.errors.is_empty());
            assert!(store
                .rows
                .lock()
                .unwrap()
                .iter()
                .any(|t| t.recurrence_instance_date == Some(key("2024-01-15"))));
        }

        #[tokio::test]
        async fn test_insert_failure_is_isolated_to_its_series() {
            let store = MemoryStore::with_rows(vec![
                instance("broken", "daily", "2024-01-09", TaskStatus::Completed),
                instance("fine", "daily", "2024-01-09", TaskStatus::Completed),
            ]);
            *store.fail_insert_for.lock().unwrap() = Some("broken".to_string());

            let summary = ReconciliationJob::new(config())
                .run(&store, noon("2024-01-10"), false)
                .await
                .unwrap();
            assert_eq!(summary.series_processed, 2);
            assert_eq!(summary.tasks_created, 1);
            assert_eq!(summary.skipped, 1);
            assert_eq!(summary.errors.len(), 1);
            assert!(summary.errors[0].starts_with("broken"));

            let rows = store.rows.lock().unwrap().clone();
            assert!(rows.iter().any(|t| {
                t.recurrence_series_id.as_deref() == Some("fine")
                    && t.recurrence_instance_date == Some(key("2024-01-10"))
            }));
        }

        #[test]
        fn test_summary_json_shape() {
            let summary = ReconciliationSummary::new(key("2024-01-10"), true);
            let json = serde_json::to_value(&summary).unwrap();
            assert_eq!(json["todayKey"], "2024-01-10");
            assert_eq!(json["dryRun"], true);
            assert_eq!(json["success"], true);
            for field in ["seriesProcessed", "seriesUpdated", "tasksCreated", "skipped", "deferred"] {
                assert_eq!(json[field], 0, "{}", field);
            }
            assert!(json.get("errors").is_none());
        }
    }
}
