use cadence_core::error::CoreError;
use cadence_core::models::SchedulerConfig;
use cadence_core::recurrence::MAX_FORWARD_STEPS;
use cadence_core::timezone::validate_timezone;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Business timezone (IANA name) every date key is computed in
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Default tracing filter when neither `RUST_LOG` nor `-v` is given
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// Limits applied by the scheduling core
#[derive(Deserialize, Debug)]
pub struct SchedulerSettings {
    #[serde(default = "default_max_forward_steps")]
    pub max_forward_steps: usize,
    #[serde(default = "default_max_series")]
    pub max_series: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_forward_steps: default_max_forward_steps(),
            max_series: default_max_series(),
        }
    }
}

fn default_database_path() -> String {
    "cadence.db".to_string()
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_max_forward_steps() -> usize {
    MAX_FORWARD_STEPS
}

fn default_max_series() -> usize {
    10_000
}

impl Config {
    /// `cadence.toml` in the working directory, overridden by `CADENCE_*`
    /// variables (`CADENCE_SCHEDULER__MAX_SERIES` for nested keys).
    pub fn new() -> Result<Self, figment::Error> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed("CADENCE_").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, figment::Error> {
        figment.extract()
    }

    pub fn scheduler_config(&self) -> Result<SchedulerConfig, CoreError> {
        if self.scheduler.max_forward_steps == 0 || self.scheduler.max_series == 0 {
            return Err(CoreError::InvalidInput(
                "scheduler limits must be greater than zero".to_string(),
            ));
        }
        Ok(SchedulerConfig {
            timezone: validate_timezone(&self.timezone)?,
            max_forward_steps: self.scheduler.max_forward_steps,
            max_series: self.scheduler.max_series,
        })
    }
}
