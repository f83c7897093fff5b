use anyhow::Result;
use cadence_core::models::{SchedulerConfig, TaskStatus};
use cadence_core::repository::Repository;

use crate::cli::DoCommand;
use crate::commands::status::apply_status;
use crate::util::resolve_task_id;

pub async fn do_task(repo: &impl Repository, command: DoCommand, config: &SchedulerConfig) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    apply_status(repo, task_id, TaskStatus::Completed, config).await
}
