//! Polling loop: poll a source, hand messages to a handler, back off when idle.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backoff::BackoffStrategy;

/// Something that can be polled for the next unit of work.
pub trait MessageSource {
    type Message;

    /// Returns `Ok(None)` when there is currently nothing to do.
    fn poll(&mut self) -> Result<Option<Self::Message>>;
}

/// Counters for one run of [`run_polling_loop`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub polls: u64,
    pub handled: u64,
    pub idle_waits: u64,
    pub error_waits: u64,
}

/// Runs until `stop` is set. The flag is checked before every poll, so a stop
/// requested during a pause takes effect once that pause completes.
///
/// A failed poll and a failed handler both pause via `wait_error`; an empty
/// poll pauses via `wait`; a message resets the idle session before it is handled.
pub fn run_polling_loop<Src, B, H>(
    source: &mut Src,
    strategy: &B,
    mut handler: H,
    stop: &AtomicBool,
) -> LoopStats
where
    Src: MessageSource,
    B: BackoffStrategy + ?Sized,
    H: FnMut(Src::Message) -> Result<()>,
{
    let mut stats = LoopStats::default();
    while !stop.load(Ordering::Relaxed) {
        stats.polls += 1;
        match source.poll() {
            Ok(Some(message)) => {
                strategy.reset();
                match handler(message) {
                    Ok(()) => stats.handled += 1,
                    Err(e) => {
                        tracing::warn!("handler failed: {:#}", e);
                        stats.error_waits += 1;
                        strategy.wait_error();
                    }
                }
            }
            Ok(None) => {
                stats.idle_waits += 1;
                strategy.wait();
            }
            Err(e) => {
                tracing::warn!("poll failed: {:#}", e);
                stats.error_waits += 1;
                strategy.wait_error();
            }
        }
    }
    tracing::info!(
        polls = stats.polls,
        handled = stats.handled,
        idle_waits = stats.idle_waits,
        error_waits = stats.error_waits,
        "polling loop stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Wait,
        WaitError,
        Reset,
    }

    #[derive(Default)]
    struct RecordingStrategy {
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingStrategy {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl BackoffStrategy for RecordingStrategy {
        fn wait(&self) {
            self.calls.lock().unwrap().push(Call::Wait);
        }
        fn wait_error(&self) {
            self.calls.lock().unwrap().push(Call::WaitError);
        }
        fn reset(&self) {
            self.calls.lock().unwrap().push(Call::Reset);
        }
    }

    /// Replays scripted poll outcomes, then raises `stop` once exhausted.
    struct Scripted<'a> {
        outcomes: VecDeque<Result<Option<u32>>>,
        stop: &'a AtomicBool,
    }

    impl MessageSource for Scripted<'_> {
        type Message = u32;

        fn poll(&mut self) -> Result<Option<u32>> {
            let next = self.outcomes.pop_front().unwrap_or(Ok(None));
            if self.outcomes.is_empty() {
                self.stop.store(true, Ordering::Relaxed);
            }
            next
        }
    }

    fn scripted(stop: &AtomicBool, outcomes: Vec<Result<Option<u32>>>) -> Scripted<'_> {
        Scripted {
            outcomes: outcomes.into(),
            stop,
        }
    }

    #[test]
    fn dispatches_outcomes_to_strategy() {
        let stop = AtomicBool::new(false);
        let mut source = scripted(
            &stop,
            vec![
                Ok(None),
                Ok(None),
                Ok(Some(1)),
                Err(anyhow::anyhow!("broker unavailable")),
                Ok(Some(2)),
                Ok(None),
            ],
        );
        let strategy = RecordingStrategy::default();
        let mut seen = Vec::new();
        let stats = run_polling_loop(
            &mut source,
            &strategy,
            |m| {
                seen.push(m);
                Ok(())
            },
            &stop,
        );

        assert_eq!(seen, vec![1, 2]);
        assert_eq!(
            strategy.calls(),
            vec![
                Call::Wait,
                Call::Wait,
                Call::Reset,
                Call::WaitError,
                Call::Reset,
                Call::Wait,
            ]
        );
        assert_eq!(
            stats,
            LoopStats {
                polls: 6,
                handled: 2,
                idle_waits: 3,
                error_waits: 1,
            }
        );
    }

    #[test]
    fn handler_failure_waits_error_after_reset() {
        let stop = AtomicBool::new(false);
        let mut source = scripted(&stop, vec![Ok(Some(7))]);
        let strategy = RecordingStrategy::default();
        let stats = run_polling_loop(
            &mut source,
            &strategy,
            |_| anyhow::bail!("cannot process"),
            &stop,
        );
        assert_eq!(strategy.calls(), vec![Call::Reset, Call::WaitError]);
        assert_eq!(stats.handled, 0);
        assert_eq!(stats.error_waits, 1);
    }

    #[test]
    fn stop_set_before_start_polls_nothing() {
        let stop = AtomicBool::new(true);
        let mut source = scripted(&stop, vec![Ok(Some(1))]);
        let strategy = RecordingStrategy::default();
        let stats = run_polling_loop(&mut source, &strategy, |_| Ok(()), &stop);
        assert_eq!(stats, LoopStats::default());
        assert!(strategy.calls().is_empty());
    }
}
