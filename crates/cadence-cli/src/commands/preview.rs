use anyhow::Result;
use cadence_core::models::SchedulerConfig;
use cadence_core::recurrence::RecurrenceRule;
use cadence_core::timezone::date_key_in_zone;
use chrono::Utc;
use owo_colors::OwoColorize;

use crate::cli::PreviewCommand;
use crate::parser::parse_day;

pub fn preview(command: PreviewCommand, config: &SchedulerConfig) -> Result<()> {
    let start = match command.from.as_deref() {
        Some(day) => parse_day(day, &config.timezone)?,
        None => date_key_in_zone(Utc::now(), &config.timezone),
    };
    let rule = RecurrenceRule::new(command.pattern, i64::from(command.interval));

    println!(
        "Next {} occurrences of {} (every {}) after {}:",
        command.count,
        rule.pattern.bold(),
        rule.interval,
        start
    );
    for key in rule.preview(start, command.count) {
        println!("  {} {}", key.to_string().cyan(), key.format("%a").to_string().dimmed());
    }

    Ok(())
}
