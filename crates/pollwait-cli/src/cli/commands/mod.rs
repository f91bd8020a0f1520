//! CLI command handlers, one per file.

mod probe;
mod schedule;
mod watch;

pub use probe::run_probe;
pub use schedule::run_schedule;
pub use watch::run_watch;
