use anyhow::Result;
use cadence_core::models::SchedulerConfig;
use cadence_core::reconcile::ReconciliationJob;
use cadence_core::repository::Repository;
use cadence_core::timezone::end_of_day_utc;
use chrono::{Duration, Utc};

use crate::cli::BackfillCommand;
use crate::parser::parse_day;

pub async fn backfill(repo: &impl Repository, command: BackfillCommand, config: &SchedulerConfig) -> Result<()> {
    let now = match command.as_of.as_deref() {
        // Midday keeps the instant well inside the requested day
        Some(day) => end_of_day_utc(parse_day(day, &config.timezone)?, &config.timezone) - Duration::hours(12),
        None => Utc::now(),
    };

    let summary = ReconciliationJob::new(config.clone())
        .run(repo, now, command.dry_run)
        .await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
