use anyhow::Result;
use cadence_core::models::{SchedulerConfig, TaskFilter};
use cadence_core::repository::Repository;

use crate::cli::ListCommand;
use crate::views::table::{display_tasks, ViewTask};

pub async fn list_tasks(repo: &impl Repository, command: ListCommand, config: &SchedulerConfig) -> Result<()> {
    let filter = TaskFilter {
        series_id: command.series,
        include_completed: command.all,
    };

    let tasks = repo.find_tasks(&filter).await?;
    let view_tasks: Vec<ViewTask> = tasks.into_iter().map(ViewTask::from).collect();

    display_tasks(&view_tasks, &config.timezone);

    Ok(())
}
