//! Idle backoff for polling workers.
//!
//! A worker that finds no work calls [`BackoffStrategy::wait`], which pauses
//! for an entry of an explicit [`Schedule`] chosen by how many whole seconds
//! the current idle session has lasted. Finding work calls
//! [`BackoffStrategy::reset`], which ends the session so the next idle pause
//! starts again from the first entry. Errors use a separate fixed pause.

mod clock;
mod error;
mod schedule;
mod strategy;

pub use clock::{Clock, ManualClock, Sleeper, SystemClock, ThreadSleeper};
pub use error::BackoffError;
pub(crate) use schedule::millis;
pub use schedule::{Schedule, DEFAULT_ERROR_WAIT};
pub use strategy::{BackoffStrategy, IdleBackoff};
