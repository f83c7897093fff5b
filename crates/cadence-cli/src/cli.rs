use cadence_core::models::{ScheduleFrom, TaskPriority, TaskStatus};
use cadence_core::recurrence::RecurrencePattern;
use clap::{ArgAction, Parser, Subcommand};

/// Cadence: recurring task scheduling for the CRM task board
#[derive(Parser, Debug)]
#[command(name = "cadence", author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a task, optionally as the first instance of a recurring series
    Add(AddCommand),
    /// List tasks
    List(ListCommand),
    /// Change the status of a task
    Status(StatusCommand),
    /// Mark a task as completed
    Do(DoCommand),
    /// Make sure every recurring series has a current open instance
    Backfill(BackfillCommand),
    /// Show upcoming dates for a recurrence pattern
    Preview(PreviewCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[arg(short, long)]
    pub description: Option<String>,
    /// The due date of the task (e.g. "2024-01-10", "tomorrow")
    #[arg(long)]
    pub due: Option<String>,
    /// Repeat the task (daily, weekly, biweekly, monthly, quarterly, yearly)
    #[arg(long)]
    pub every: Option<RecurrencePattern>,
    /// Repeat every N periods
    #[arg(long, default_value_t = 1, requires = "every")]
    pub interval: u32,
    /// Count the next occurrence from the due date or the completion date
    #[arg(long, default_value_t = ScheduleFrom::DueDate, requires = "every")]
    pub schedule_from: ScheduleFrom,
    /// Last day of the series
    #[arg(long, requires = "every")]
    pub until: Option<String>,
    /// Checklist item, repeatable
    #[arg(long = "checklist", value_name = "ITEM")]
    pub checklist: Vec<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub space: Option<String>,
    #[arg(long)]
    pub campaign: Option<String>,
    /// The priority of the task (none, low, medium, high)
    #[arg(long)]
    pub priority: Option<TaskPriority>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Only show instances of this series
    #[arg(long)]
    pub series: Option<String>,
    /// Include completed tasks
    #[arg(short, long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusCommand {
    /// The ID (or unique prefix) of the task
    pub id: String,
    /// todo, in_progress, review or completed
    pub status: TaskStatus,
}

#[derive(Parser, Debug, Clone)]
pub struct DoCommand {
    /// The ID of the task to mark as completed
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct BackfillCommand {
    /// Report what would be created without writing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Reconcile as of this day instead of today
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// The recurrence pattern
    pub pattern: RecurrencePattern,
    /// Day to count from (defaults to today)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    #[arg(long, default_value_t = 1)]
    pub interval: u32,
    /// How many occurrences to show
    #[arg(short = 'n', long, default_value_t = 5)]
    pub count: usize,
}
