//! # Cadence Core Library
//!
//! The recurring-task instance scheduler behind the CRM task board. It turns
//! "repeat this every N days/weeks/months" definitions into concrete, uniquely
//! dated task rows, without double-creating or silently dropping occurrences,
//! and can be re-run safely after downtime.
//!
//! ## Core Modules
//!
//! - [`timezone`]: calendar-day keys and end-of-day resolution in the business timezone
//! - [`series`]: series ids and the fingerprint used to regroup legacy rows
//! - [`recurrence`]: next-occurrence arithmetic for each pattern
//! - [`materialization`]: idempotent creation of instance rows
//! - [`reconcile`]: the backfill job keeping one current open instance per series
//! - [`cascade`]: scheduling the next occurrence when an instance is completed
//! - [`repository`]: storage traits and the SQLite implementation
//! - [`db`]: database connection and migration management
//! - [`error`]: error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     db,
//!     models::{NewRecurrence, NewTaskData, ScheduleFrom, SchedulerConfig, TaskStatus},
//!     reconcile::ReconciliationJob,
//!     recurrence::RecurrencePattern,
//!     repository::{SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = db::establish_connection("cadence.db").await?;
//!     let config = SchedulerConfig::default();
//!     let repo = SqliteRepository::new(pool, config.clone());
//!
//!     let task = repo
//!         .add_task(NewTaskData {
//!             title: "Weekly client report".to_string(),
//!             recurrence: Some(NewRecurrence {
//!                 pattern: RecurrencePattern::Weekly,
//!                 interval: 1,
//!                 schedule_from: ScheduleFrom::DueDate,
//!                 end_date: None,
//!             }),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     // Completing an instance schedules the next one
//!     repo.update_status(task.id, TaskStatus::Completed).await?;
//!
//!     // Periodic catch-up after downtime
//!     let summary = ReconciliationJob::new(config).run(&repo, chrono::Utc::now(), false).await?;
//!     println!("created {} instances", summary.tasks_created);
//!     Ok(())
//! }
//! ```

pub mod cascade;
pub mod db;
pub mod error;
pub mod materialization;
pub mod models;
pub mod reconcile;
pub mod recurrence;
pub mod repository;
pub mod series;
pub mod timezone;
