//! `pollwait probe` – show the pause selected after a given idle time.

use anyhow::{Context, Result};
use pollwait_core::backoff::{IdleBackoff, ManualClock, ThreadSleeper};
use pollwait_core::config::BackoffConfig;
use std::time::Duration;

/// Index and pause a session idle for `idle_secs` selects, computed by
/// replaying the session on a manual clock.
pub(crate) fn probe(cfg: &BackoffConfig, idle_secs: f64) -> Result<(usize, Duration)> {
    let idle = Duration::try_from_secs_f64(idle_secs)
        .with_context(|| format!("invalid idle time: {}", idle_secs))?;
    let clock = ManualClock::new();
    let strategy = IdleBackoff::with_parts(cfg.schedule()?, clock.clone(), ThreadSleeper);

    strategy.next_idle_delay();
    clock.advance(idle);
    let delay = strategy.next_idle_delay();
    let index = strategy.schedule().index_for_idle_secs(idle.as_secs());
    Ok((index, delay))
}

pub fn run_probe(cfg: &BackoffConfig, idle_secs: f64) -> Result<()> {
    let (index, delay) = probe(cfg, idle_secs)?;
    println!(
        "idle {}s -> schedule[{}] -> pause {:?}",
        idle_secs, index, delay
    );
    Ok(())
}
