use anyhow::Result;
use cadence_core::models::{CompletionResult, SchedulerConfig, TaskStatus};
use cadence_core::repository::Repository;
use cadence_core::timezone::format_with_timezone;
use owo_colors::{OwoColorize, Style};
use uuid::Uuid;

use crate::cli::StatusCommand;
use crate::util::resolve_task_id;

pub async fn set_status(repo: &impl Repository, command: StatusCommand, config: &SchedulerConfig) -> Result<()> {
    let task_id = resolve_task_id(repo, &command.id).await?;
    apply_status(repo, task_id, command.status, config).await
}

pub(crate) async fn apply_status(
    repo: &impl Repository,
    task_id: Uuid,
    status: TaskStatus,
    config: &SchedulerConfig,
) -> Result<()> {
    let result = repo.update_status(task_id, status).await?;
    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    match result {
        CompletionResult::Single(task) if task.status == TaskStatus::Completed => {
            println!("{} Completed task: '{}'", "✓".style(success_style), task.title);
        }
        CompletionResult::Single(task) => {
            println!(
                "{} Task '{}' is now {}",
                "✓".style(success_style),
                task.title,
                task.status.to_string().cyan()
            );
        }
        CompletionResult::SeriesInstance {
            completed,
            series_id,
            next_occurrence,
            next,
        } => {
            println!("{} Completed task: '{}'", "✓".style(success_style), completed.title);
            match (next_occurrence, next) {
                (Some(_), Some(next)) => {
                    let due = next
                        .due_date
                        .map(|due| format_with_timezone(due, &config.timezone, "%Y-%m-%d %H:%M %Z"))
                        .unwrap_or_default();
                    println!(
                        "  {} Scheduled next occurrence {} (due {})",
                        "→".style(info_style),
                        next.id.to_string().yellow(),
                        due.cyan()
                    );
                }
                (Some(key), None) => {
                    println!(
                        "  {} Next occurrence on {} already exists",
                        "→".style(info_style),
                        key.to_string().cyan()
                    );
                }
                (None, _) => {
                    println!("  {} Series {} has ended", "→".style(info_style), series_id.cyan());
                }
            }
        }
    }

    Ok(())
}
