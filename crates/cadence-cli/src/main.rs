use clap::Parser;
use cadence_core::db;
use cadence_core::error::CoreError;
use cadence_core::repository::SqliteRepository;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Failed to load configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, &config.log_level);

    let scheduler_config = match config.scheduler_config() {
        Ok(scheduler_config) => scheduler_config,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            handle_error(e.into());
            std::process::exit(1);
        }
    };
    let repository = SqliteRepository::new(db_pool, scheduler_config.clone());

    let result = match cli.command {
        cli::Commands::Add(command) => {
            commands::add::add_task(&repository, command, &scheduler_config).await
        }
        cli::Commands::List(command) => {
            commands::list::list_tasks(&repository, command, &scheduler_config).await
        }
        cli::Commands::Status(command) => {
            commands::status::set_status(&repository, command, &scheduler_config).await
        }
        cli::Commands::Do(command) => {
            commands::r#do::do_task(&repository, command, &scheduler_config).await
        }
        cli::Commands::Backfill(command) => {
            commands::backfill::backfill(&repository, command, &scheduler_config).await
        }
        cli::Commands::Preview(command) => commands::preview::preview(command, &scheduler_config),
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins, then `-v` flags, then the configured level.
fn init_tracing(verbose: u8, configured: &str) {
    let fallback = match verbose {
        0 => configured.to_string(),
        1 => "cadence_core=info,cadence=info".to_string(),
        2 => "cadence_core=debug,cadence=debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.chain().find_map(|e| e.downcast_ref::<CoreError>()) {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::AmbiguousId(tasks)) => {
            eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
            eprintln!("Did you mean one of these?");
            for (id, title) in tasks {
                eprintln!("  {} ({})", id.yellow(), title);
            }
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidTimezone(tz)) => {
            eprintln!(
                "{} Unknown timezone '{}'. Use an IANA name such as {}",
                "Error:".style(error_style),
                tz.yellow(),
                "America/New_York".cyan()
            );
        }
        Some(CoreError::SchedulingDrift { start, floor, steps }) => {
            eprintln!(
                "{} Could not schedule from {} up to {} within {} steps",
                "Error:".style(error_style),
                start,
                floor,
                steps
            );
        }
        Some(CoreError::Database(e)) => {
            eprintln!("{} Database error: {}", "Error:".style(error_style), e);
        }
        Some(CoreError::Migration(e)) => {
            eprintln!("{} Migration failed: {}", "Error:".style(error_style), e);
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
