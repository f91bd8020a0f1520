//! `pollwait schedule` – print the effective idle schedule.

use anyhow::Result;
use pollwait_core::config::BackoffConfig;

pub fn run_schedule(cfg: &BackoffConfig) -> Result<()> {
    let strategy = cfg.build()?;
    let schedule = strategy.schedule();
    println!("{:<6} {:<10} {}", "INDEX", "IDLE", "PAUSE");
    let last = schedule.len() - 1;
    for (i, delay) in schedule.as_slice().iter().enumerate() {
        let idle = if i == last {
            format!(">= {}s", i)
        } else {
            format!("{}s", i)
        };
        println!("{:<6} {:<10} {:?}", i, idle, delay);
    }
    println!("error wait: {:?}", strategy.error_delay());
    Ok(())
}
