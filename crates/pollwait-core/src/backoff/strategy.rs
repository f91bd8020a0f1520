//! The idle backoff strategy and the trait worker loops program against.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, Sleeper, SystemClock, ThreadSleeper};
use super::error::BackoffError;
use super::schedule::{millis, Schedule, DEFAULT_ERROR_WAIT};

/// Pause policy used by a polling loop.
///
/// Call [`wait`](Self::wait) after a poll that found nothing,
/// [`wait_error`](Self::wait_error) after a poll that failed, and
/// [`reset`](Self::reset) after a poll that found work.
pub trait BackoffStrategy: Send + Sync {
    /// Block for the idle pause of the current idle session, starting a
    /// session if none is active.
    fn wait(&self);

    /// Block for the fixed error pause. Idle tracking is left untouched.
    fn wait_error(&self);

    /// End the current idle session, if any.
    fn reset(&self);
}

impl<T: BackoffStrategy + ?Sized> BackoffStrategy for Arc<T> {
    fn wait(&self) {
        (**self).wait()
    }

    fn wait_error(&self) {
        (**self).wait_error()
    }

    fn reset(&self) {
        (**self).reset()
    }
}

/// Marker value meaning "no idle session".
const NOT_IDLE: u64 = 0;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Table-driven idle backoff.
///
/// The idle session start is kept in a single atomic, encoded as clock
/// nanoseconds plus one so that zero can mean "not idle". An instance can be
/// shared between threads; concurrent first waits agree on one session start.
#[derive(Debug)]
pub struct IdleBackoff<C = SystemClock, S = ThreadSleeper> {
    schedule: Schedule,
    error_wait: Duration,
    idle_since: AtomicU64,
    clock: C,
    sleeper: S,
}

impl IdleBackoff {
    /// Strategy over the given pauses, using the system clock and thread sleep.
    pub fn new<I>(delays: I) -> Result<Self, BackoffError>
    where
        I: IntoIterator<Item = Duration>,
    {
        Ok(Self::from_schedule(Schedule::new(delays)?))
    }

    pub fn from_schedule(schedule: Schedule) -> Self {
        Self::with_parts(schedule, SystemClock::new(), ThreadSleeper)
    }
}

impl Default for IdleBackoff {
    fn default() -> Self {
        Self::from_schedule(Schedule::default())
    }
}

impl<C: Clock, S: Sleeper> IdleBackoff<C, S> {
    pub fn with_parts(schedule: Schedule, clock: C, sleeper: S) -> Self {
        Self {
            schedule,
            error_wait: DEFAULT_ERROR_WAIT,
            idle_since: AtomicU64::new(NOT_IDLE),
            clock,
            sleeper,
        }
    }

    /// Replace the fixed pause used by [`BackoffStrategy::wait_error`].
    pub fn with_error_wait(mut self, error_wait: Duration) -> Self {
        self.error_wait = error_wait;
        self
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn error_delay(&self) -> Duration {
        self.error_wait
    }

    pub fn is_idle(&self) -> bool {
        self.idle_since.load(Ordering::Acquire) != NOT_IDLE
    }

    /// How long the current idle session has lasted, or `None` outside a session.
    pub fn idle_for(&self) -> Option<Duration> {
        let since = self.idle_since.load(Ordering::Acquire);
        if since == NOT_IDLE {
            return None;
        }
        let now = self.stamp_now();
        Some(Duration::from_nanos(now.saturating_sub(since)))
    }

    /// Choose the next idle pause without sleeping.
    ///
    /// Starts an idle session when none is active. The pause is the schedule
    /// entry for the session's age in whole seconds (truncated), clamped to
    /// the last entry.
    pub fn next_idle_delay(&self) -> Duration {
        let now = self.stamp_now();
        let since = match self.idle_since.compare_exchange(
            NOT_IDLE,
            now,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                tracing::debug!("idle session started");
                now
            }
            Err(existing) => existing,
        };
        let idle_secs = now.saturating_sub(since) / NANOS_PER_SEC;
        self.schedule.delay_for_idle_secs(idle_secs)
    }

    /// Async form of [`BackoffStrategy::wait`] for cooperative hosts.
    pub async fn wait_async(&self) {
        let delay = self.next_idle_delay();
        tokio::time::sleep(delay).await;
    }

    /// Async form of [`BackoffStrategy::wait_error`] for cooperative hosts.
    pub async fn wait_error_async(&self) {
        tokio::time::sleep(self.error_wait).await;
    }

    fn stamp_now(&self) -> u64 {
        let nanos = u64::try_from(self.clock.now().as_nanos()).unwrap_or(u64::MAX - 1);
        nanos.saturating_add(1)
    }
}

impl<C: Clock, S: Sleeper> BackoffStrategy for IdleBackoff<C, S> {
    fn wait(&self) {
        let delay = self.next_idle_delay();
        self.sleeper.sleep(delay);
    }

    fn wait_error(&self) {
        tracing::warn!(delay_ms = millis(self.error_wait), "error backoff");
        self.sleeper.sleep(self.error_wait);
    }

    fn reset(&self) {
        let since = self.idle_since.swap(NOT_IDLE, Ordering::AcqRel);
        if since != NOT_IDLE {
            let idle = Duration::from_nanos(self.stamp_now().saturating_sub(since));
            tracing::debug!(idle_ms = millis(idle), "idle session ended");
        }
    }
}
