use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::recurrence::{RecurrencePattern, RecurrenceRule};
use crate::timezone::DateKey;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Completed,
}

impl TaskStatus {
    pub fn is_open(self) -> bool {
        self != TaskStatus::Completed
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Review => write!(f, "review"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "completed" | "done" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::None => write!(f, "none"),
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(TaskPriority::None),
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

/// Which date the next occurrence is counted from.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrom {
    #[default]
    DueDate,
    CompletionDate,
}

impl ScheduleFrom {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleFrom::DueDate => "due_date",
            ScheduleFrom::CompletionDate => "completion_date",
        }
    }

    /// Unknown or missing values fall back to `due_date`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for ScheduleFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid schedule anchor: {0} (expected due_date or completion_date)")]
pub struct ParseScheduleFromError(String);

impl FromStr for ScheduleFrom {
    type Err = ParseScheduleFromError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "due_date" | "due" => Ok(ScheduleFrom::DueDate),
            "completion_date" | "completion" => Ok(ScheduleFrom::CompletionDate),
            _ => Err(ParseScheduleFromError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Structural copy of a checklist with every item unticked.
pub fn reset_checklist(items: &[ChecklistItem]) -> Vec<ChecklistItem> {
    items
        .iter()
        .map(|item| ChecklistItem {
            completed: false,
            ..item.clone()
        })
        .collect()
}

/// A task row. Recurring rows double as the definition of their series and as
/// one concrete instance of it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub client: Option<String>,
    pub space: Option<String>,
    pub campaign: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_recurring: bool,
    /// Raw stored pattern; may be missing or unrecognised on legacy rows
    pub recurring_pattern: Option<String>,
    pub recurring_interval: Option<i64>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub schedule_from: Option<String>,
    /// Stable id shared by every instance of one recurring definition
    pub recurrence_series_id: Option<String>,
    /// Calendar day this instance stands for, in the business timezone
    pub recurrence_instance_date: Option<DateKey>,
    pub checklist: Json<Vec<ChecklistItem>>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            title: "".to_string(),
            description: None,
            assignee: None,
            client: None,
            space: None,
            campaign: None,
            priority: TaskPriority::None,
            status: TaskStatus::Todo,
            due_date: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_recurring: false,
            recurring_pattern: None,
            recurring_interval: None,
            recurring_end_date: None,
            schedule_from: None,
            recurrence_series_id: None,
            recurrence_instance_date: None,
            checklist: Json(Vec::new()),
        }
    }
}

/// The recurring definition carried by a template row, with lenient defaults
/// already applied.
#[derive(Debug, Clone)]
pub struct RecurringDefinition {
    pub series_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub client: Option<String>,
    pub space: Option<String>,
    pub campaign: Option<String>,
    pub priority: TaskPriority,
    pub rule: RecurrenceRule,
    pub schedule_from: ScheduleFrom,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub checklist: Vec<ChecklistItem>,
}

impl RecurringDefinition {
    pub fn from_task(task: &Task, series_id: impl Into<String>) -> Self {
        Self {
            series_id: series_id.into(),
            title: task.title.clone(),
            description: task.description.clone(),
            assignee: task.assignee.clone(),
            client: task.client.clone(),
            space: task.space.clone(),
            campaign: task.campaign.clone(),
            priority: task.priority,
            rule: RecurrenceRule::resolve(task.recurring_pattern.as_deref(), task.recurring_interval),
            schedule_from: ScheduleFrom::parse_lenient(task.schedule_from.as_deref()),
            recurring_end_date: task.recurring_end_date,
            checklist: task.checklist.0.clone(),
        }
    }

    /// Whether an occurrence due at `due_date` lies past the end of the series.
    pub fn has_ended_by(&self, due_date: DateTime<Utc>) -> bool {
        self.recurring_end_date.is_some_and(|end| due_date > end)
    }
}

/// Recurrence settings supplied when a definition is created.
#[derive(Debug, Clone)]
pub struct NewRecurrence {
    pub pattern: RecurrencePattern,
    pub interval: u32,
    pub schedule_from: ScheduleFrom,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub client: Option<String>,
    pub space: Option<String>,
    pub campaign: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    /// When present the task becomes the first instance of a new series
    pub recurrence: Option<NewRecurrence>,
    pub checklist: Vec<String>,
}

/// Listing filter for task rows.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub series_id: Option<String>,
    pub include_completed: bool,
}

#[derive(Debug)]
pub enum CompletionResult {
    /// Plain status change; nothing was scheduled
    Single(Task),
    /// First completion of a recurring instance
    SeriesInstance {
        completed: Task,
        series_id: String,
        /// Date key the cascade computed, if the series has not ended
        next_occurrence: Option<DateKey>,
        /// Row created by this call; `None` when it already existed or the series ended
        next: Option<Task>,
    },
}

/// Tunables for the scheduling core.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Process-wide business timezone every date key is computed in
    pub timezone: Tz,
    /// Upper bound on forward steps when catching a schedule up to today
    pub max_forward_steps: usize,
    /// Upper bound on series handled by one reconciliation run
    pub max_series: usize,
}

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            max_forward_steps: crate::recurrence::MAX_FORWARD_STEPS,
            max_series: 10_000,
        }
    }
}
