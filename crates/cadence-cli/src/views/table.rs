use cadence_core::models::{Task, TaskPriority, TaskStatus};
use cadence_core::timezone::{date_key_in_zone, DateKey};
use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ViewTask {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<DateTime<Utc>>,
    pub client: Option<String>,
    pub assignee: Option<String>,
    pub series_id: Option<String>,
    pub instance_date: Option<DateKey>,
    pub checklist_done: usize,
    pub checklist_total: usize,
}

impl From<Task> for ViewTask {
    fn from(task: Task) -> Self {
        let checklist_done = task.checklist.0.iter().filter(|item| item.completed).count();
        Self {
            id: task.id,
            checklist_total: task.checklist.0.len(),
            checklist_done,
            title: task.title,
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            client: task.client,
            assignee: task.assignee,
            series_id: task.recurrence_series_id.filter(|_| task.is_recurring),
            instance_date: task.recurrence_instance_date,
        }
    }
}

pub fn display_tasks(tasks: &[ViewTask], tz: &Tz) {
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Status", "Due", "Instance", "Client", "Assignee", "Checklist"]);

    let now = Utc::now();
    let today = date_key_in_zone(now, tz);

    for task in tasks {
        let mut row = Row::new();
        row.add_cell(Cell::new(task.id.to_string()));

        let mut display_name = String::new();
        if task.series_id.is_some() {
            display_name.push('↻');
            display_name.push(' ');
        }
        display_name.push_str(&task.title);

        let name_cell = match task.status {
            TaskStatus::Completed => Cell::new(display_name)
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey),
            _ => match task.priority {
                TaskPriority::High => Cell::new(display_name).fg(Color::Red).add_attribute(Attribute::Bold),
                TaskPriority::Medium => Cell::new(display_name).fg(Color::Yellow),
                TaskPriority::Low => Cell::new(display_name).fg(Color::Green),
                TaskPriority::None => Cell::new(display_name),
            },
        };
        row.add_cell(name_cell);

        let status_cell = Cell::new(task.status.to_string());
        row.add_cell(match task.status {
            TaskStatus::Completed => status_cell.fg(Color::Green),
            TaskStatus::InProgress => status_cell.fg(Color::Cyan),
            TaskStatus::Review => status_cell.fg(Color::Magenta),
            TaskStatus::Todo => status_cell,
        });

        let due_cell = match task.due_date {
            Some(due) => {
                let due_text = due.humanize();
                if task.status != TaskStatus::Completed && due < now {
                    Cell::new(due_text).fg(Color::Red)
                } else if task.status != TaskStatus::Completed && date_key_in_zone(due, tz) == today {
                    Cell::new(due_text).fg(Color::Yellow)
                } else {
                    Cell::new(due_text)
                }
            }
            None => Cell::new("None"),
        };
        row.add_cell(due_cell);

        row.add_cell(Cell::new(
            task.instance_date.map_or_else(|| "-".to_string(), |key| key.to_string()),
        ));
        row.add_cell(Cell::new(task.client.as_deref().unwrap_or("None")));
        row.add_cell(Cell::new(task.assignee.as_deref().unwrap_or("None")));
        row.add_cell(Cell::new(if task.checklist_total == 0 {
            "-".to_string()
        } else {
            format!("{}/{}", task.checklist_done, task.checklist_total)
        }));
        table.add_row(row);
    }

    println!("{table}");
}
