use std::iter;
use std::time::Duration;

use super::error::BackoffError;

/// Pause used after a failed receive, unless the host configures another.
pub const DEFAULT_ERROR_WAIT: Duration = Duration::from_secs(5);

/// Whole milliseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Ordered idle pauses, indexed by whole seconds of idle time.
///
/// Entry `i` is used once the idle session has lasted `i` seconds; the last
/// entry covers every longer session. No ordering is enforced between
/// entries, although callers normally pass a non-decreasing sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    delays: Box<[Duration]>,
}

impl Schedule {
    /// Build a schedule from the given pauses. Fails when there are none.
    pub fn new<I>(delays: I) -> Result<Self, BackoffError>
    where
        I: IntoIterator<Item = Duration>,
    {
        let delays: Box<[Duration]> = delays.into_iter().collect();
        if delays.is_empty() {
            return Err(BackoffError::InvalidConfiguration(
                "cannot build an idle backoff schedule without at least one wait time".to_string(),
            ));
        }
        Ok(Self { delays })
    }

    /// Number of entries (always at least one).
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.delays.len()
    }

    pub fn as_slice(&self) -> &[Duration] {
        &self.delays
    }

    /// The last entry, used for every idle session at or past its index.
    pub fn max_delay(&self) -> Duration {
        self.delays[self.delays.len() - 1]
    }

    /// Index selected by a session idle for `idle_secs` whole seconds.
    pub fn index_for_idle_secs(&self, idle_secs: u64) -> usize {
        let last = self.delays.len() - 1;
        usize::try_from(idle_secs).map_or(last, |secs| secs.min(last))
    }

    /// Pause selected by a session idle for `idle_secs` whole seconds.
    pub fn delay_for_idle_secs(&self, idle_secs: u64) -> Duration {
        self.delays[self.index_for_idle_secs(idle_secs)]
    }

    /// Pause selected by a session idle for `idle`; fractional seconds are truncated.
    pub fn delay_for_idle(&self, idle: Duration) -> Duration {
        self.delay_for_idle_secs(idle.as_secs())
    }
}

impl Default for Schedule {
    /// 100ms for the first 10s idle, 250ms for the next 10s, 500ms for the
    /// 10s after that, then 1s.
    fn default() -> Self {
        let delays = iter::repeat(Duration::from_millis(100))
            .take(10)
            .chain(iter::repeat(Duration::from_millis(250)).take(10))
            .chain(iter::repeat(Duration::from_millis(500)).take(10))
            .chain(iter::once(Duration::from_secs(1)))
            .collect();
        Self { delays }
    }
}
