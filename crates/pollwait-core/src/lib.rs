pub mod config;
pub mod logging;

pub mod backoff;
pub mod worker;
