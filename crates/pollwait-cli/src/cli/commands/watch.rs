//! `pollwait watch` – consume files from a directory, backing off while it is empty.

use anyhow::{bail, Context, Result};
use pollwait_core::config::BackoffConfig;
use pollwait_core::worker::{run_polling_loop, LoopStats, MessageSource};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Directory as a message source: each regular file is one message, taken in name order.
pub(crate) struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl MessageSource for DirSource {
    type Message = PathBuf;

    fn poll(&mut self) -> Result<Option<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("reading {}", self.dir.display()))?;
        let mut next: Option<PathBuf> = None;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if next.as_ref().map_or(true, |current| path < *current) {
                next = Some(path);
            }
        }
        Ok(next)
    }
}

/// Remove a consumed file, returning its size.
fn consume(path: &Path) -> Result<u64> {
    let len = fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    fs::remove_file(path).with_context(|| format!("removing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = len, "consumed file");
    Ok(len)
}

pub(crate) fn watch_blocking(
    cfg: &BackoffConfig,
    dir: PathBuf,
    max_messages: Option<u64>,
    stop: &AtomicBool,
) -> Result<LoopStats> {
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }
    let strategy = cfg.build()?;
    if max_messages == Some(0) {
        return Ok(LoopStats::default());
    }
    let mut source = DirSource::new(dir);
    let mut consumed = 0u64;
    let stats = run_polling_loop(
        &mut source,
        &strategy,
        |path| {
            let bytes = consume(&path)?;
            println!("{} ({} bytes)", path.display(), bytes);
            consumed += 1;
            if max_messages.is_some_and(|max| consumed >= max) {
                stop.store(true, Ordering::Relaxed);
            }
            Ok(())
        },
        stop,
    );
    Ok(stats)
}

pub async fn run_watch(cfg: &BackoffConfig, dir: PathBuf, max_messages: Option<u64>) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));

    let interrupt = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received; stopping after the current pause");
            interrupt.store(true, Ordering::Relaxed);
        }
    });

    tracing::info!(dir = %dir.display(), "watching directory");
    let cfg = cfg.clone();
    let loop_stop = Arc::clone(&stop);
    let stats = tokio::task::spawn_blocking(move || {
        watch_blocking(&cfg, dir, max_messages, &loop_stop)
    })
    .await??;

    println!(
        "consumed {} file(s) in {} poll(s); {} idle wait(s), {} error wait(s)",
        stats.handled, stats.polls, stats.idle_waits, stats.error_waits
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dir_source_yields_files_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.msg"), b"second").unwrap();
        fs::write(dir.path().join("a.msg"), b"first").unwrap();
        fs::create_dir(dir.path().join("0-subdir")).unwrap();

        let mut source = DirSource::new(dir.path().to_path_buf());
        let first = source.poll().unwrap().unwrap();
        assert_eq!(first.file_name().unwrap(), "a.msg");
        assert_eq!(consume(&first).unwrap(), 5);

        let second = source.poll().unwrap().unwrap();
        assert_eq!(second.file_name().unwrap(), "b.msg");
        consume(&second).unwrap();

        assert!(source.poll().unwrap().is_none());
    }

    #[test]
    fn dir_source_reports_missing_directory() {
        let dir = tempdir().unwrap();
        let mut source = DirSource::new(dir.path().join("gone"));
        assert!(source.poll().is_err());
    }

    #[test]
    fn watch_stops_after_max_messages() {
        let dir = tempdir().unwrap();
        for name in ["1", "2", "3"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let cfg = BackoffConfig {
            idle_schedule_ms: vec![1],
            error_wait_ms: 1,
        };
        let stop = AtomicBool::new(false);
        let stats = watch_blocking(&cfg, dir.path().to_path_buf(), Some(2), &stop).unwrap();
        assert_eq!(stats.handled, 2);
        assert_eq!(stats.polls, 2);
        assert!(dir.path().join("3").exists());
    }

    #[test]
    fn watch_with_zero_max_consumes_nothing() {
        let dir = tempdir().unwrap();
        for name in ["1", "2"] {
            fs::write(dir.path().join(name), name).unwrap();
        }
        let cfg = BackoffConfig {
            idle_schedule_ms: vec![1],
            error_wait_ms: 1,
        };
        let stop = AtomicBool::new(false);
        let stats = watch_blocking(&cfg, dir.path().to_path_buf(), Some(0), &stop).unwrap();
        assert_eq!(stats, LoopStats::default());
        assert!(dir.path().join("1").exists());
        assert!(dir.path().join("2").exists());
    }

    #[test]
    fn watch_rejects_non_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"x").unwrap();
        let stop = AtomicBool::new(false);
        let err = watch_blocking(&BackoffConfig::default(), file, None, &stop).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn watch_refuses_empty_schedule() {
        let dir = tempdir().unwrap();
        let cfg = BackoffConfig {
            idle_schedule_ms: Vec::new(),
            error_wait_ms: 1,
        };
        let stop = AtomicBool::new(false);
        assert!(watch_blocking(&cfg, dir.path().to_path_buf(), None, &stop).is_err());
    }
}
