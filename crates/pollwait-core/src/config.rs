use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backoff::{millis, BackoffError, IdleBackoff, Schedule, DEFAULT_ERROR_WAIT};

/// Idle backoff parameters (`[backoff]` section in config.toml).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Idle pauses in milliseconds; entry `i` applies after `i` whole seconds idle.
    #[serde(default = "default_idle_schedule_ms")]
    pub idle_schedule_ms: Vec<u64>,
    /// Pause in milliseconds after a failed poll.
    #[serde(default = "default_error_wait_ms")]
    pub error_wait_ms: u64,
}

fn default_idle_schedule_ms() -> Vec<u64> {
    Schedule::default()
        .as_slice()
        .iter()
        .map(|d| millis(*d))
        .collect()
}

fn default_error_wait_ms() -> u64 {
    millis(DEFAULT_ERROR_WAIT)
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            idle_schedule_ms: default_idle_schedule_ms(),
            error_wait_ms: default_error_wait_ms(),
        }
    }
}

impl BackoffConfig {
    pub fn schedule(&self) -> Result<Schedule, BackoffError> {
        Schedule::new(
            self.idle_schedule_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms)),
        )
    }

    pub fn error_wait(&self) -> Duration {
        Duration::from_millis(self.error_wait_ms)
    }

    /// Validate and build the strategy. An empty schedule is rejected here so
    /// a misconfigured worker fails at startup instead of at its first idle poll.
    pub fn build(&self) -> Result<IdleBackoff, BackoffError> {
        Ok(IdleBackoff::from_schedule(self.schedule()?).with_error_wait(self.error_wait()))
    }
}

/// Global configuration loaded from `~/.config/pollwait/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollwaitConfig {
    #[serde(default)]
    pub backoff: BackoffConfig,
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("pollwait")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PollwaitConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PollwaitConfig::default();
        write_to_path(&default_cfg, &path)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<PollwaitConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: PollwaitConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}

pub fn write_to_path(cfg: &PollwaitConfig, path: &Path) -> Result<()> {
    let toml = toml::to_string_pretty(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml)?;
    Ok(())
}
