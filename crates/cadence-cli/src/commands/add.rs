use anyhow::Result;
use cadence_core::models::{NewRecurrence, NewTaskData, SchedulerConfig};
use cadence_core::repository::Repository;
use cadence_core::timezone::format_with_timezone;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::parser::parse_due_date;

pub async fn add_task(repo: &impl Repository, command: AddCommand, config: &SchedulerConfig) -> Result<()> {
    let tz = &config.timezone;
    let due_date = command.due.as_deref().map(|d| parse_due_date(d, tz)).transpose()?;
    let end_date = command.until.as_deref().map(|d| parse_due_date(d, tz)).transpose()?;

    let recurrence = command.every.map(|pattern| NewRecurrence {
        pattern,
        interval: command.interval,
        schedule_from: command.schedule_from,
        end_date,
    });

    let new_task_data = NewTaskData {
        title: command.title,
        description: command.description,
        assignee: command.assignee,
        client: command.client,
        space: command.space,
        campaign: command.campaign,
        priority: command.priority,
        due_date,
        recurrence,
        checklist: command.checklist,
    };

    let added_task = repo.add_task(new_task_data).await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    if added_task.is_recurring {
        println!(
            "{} Created recurring task: {}",
            "✓".style(success_style),
            added_task.title.bright_white().bold()
        );
        println!("  {} Task ID: {}", "→".style(info_style), added_task.id.to_string().yellow());
        if let Some(series_id) = &added_task.recurrence_series_id {
            println!("  {} Series: {}", "→".style(info_style), series_id.cyan());
        }
        println!(
            "  {} Repeats: {} (every {})",
            "→".style(info_style),
            added_task.recurring_pattern.as_deref().unwrap_or("daily"),
            added_task.recurring_interval.unwrap_or(1)
        );
        if let Some(instance_date) = added_task.recurrence_instance_date {
            println!("  {} First instance: {}", "→".style(info_style), instance_date.to_string().cyan());
        }
    } else {
        println!(
            "{} Created task: {}",
            "✓".style(success_style),
            added_task.title.bright_white().bold()
        );
        println!("  {} Task ID: {}", "→".style(info_style), added_task.id.to_string().yellow());
        if let Some(due_date) = added_task.due_date {
            println!(
                "  {} Due: {}",
                "→".style(info_style),
                format_with_timezone(due_date, tz, "%Y-%m-%d %H:%M %Z").cyan()
            );
        }
    }

    Ok(())
}
