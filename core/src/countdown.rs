//! Interruptible pre-launch countdown.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::sync::lock;

/// Shared cancellation flag that also wakes a sleeping countdown.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *lock(flag, "countdown token") = true;
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *lock(&self.inner.0, "countdown token")
    }

    /// Sleep for `timeout` or until cancelled. Returns `true` if cancelled.
    pub fn wait(&self, timeout: Duration) -> bool {
        let (flag, cvar) = &*self.inner;
        let guard = lock(flag, "countdown token");
        let (guard, _) = cvar
            .wait_timeout_while(guard, timeout, |cancelled| !*cancelled)
            .unwrap_or_else(|e| {
                tracing::warn!("countdown token mutex poisoned; continuing");
                e.into_inner()
            });
        *guard
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownOutcome {
    Finished,
    Cancelled,
}

/// Emits one tick per interval, from `seconds` down to 1.
#[derive(Debug, Clone, Copy)]
pub struct CountdownScheduler {
    interval: Duration,
}

impl Default for CountdownScheduler {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl CountdownScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Run the countdown on the calling thread.
    ///
    /// Calls `on_tick(remaining)` for `remaining = seconds..=1`, sleeping one
    /// interval after each tick. Stops without further ticks as soon as
    /// `token` is cancelled. A zero-second countdown finishes immediately.
    pub fn run(
        &self,
        seconds: u32,
        token: &CancelToken,
        mut on_tick: impl FnMut(u32),
    ) -> CountdownOutcome {
        for remaining in (1..=seconds).rev() {
            if token.is_cancelled() {
                return CountdownOutcome::Cancelled;
            }
            on_tick(remaining);
            if token.wait(self.interval) {
                return CountdownOutcome::Cancelled;
            }
        }

        if token.is_cancelled() {
            CountdownOutcome::Cancelled
        } else {
            CountdownOutcome::Finished
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_ticks_count_down_then_finish() {
        let scheduler = CountdownScheduler::new(Duration::from_millis(5));
        let mut ticks = Vec::new();
        let outcome = scheduler.run(3, &CancelToken::new(), |r| ticks.push(r));
        assert_eq!(ticks, vec![3, 2, 1]);
        assert_eq!(outcome, CountdownOutcome::Finished);
    }

    #[test]
    fn test_zero_seconds_finishes_without_ticks() {
        let scheduler = CountdownScheduler::new(Duration::from_millis(5));
        let mut ticks = Vec::new();
        let outcome = scheduler.run(0, &CancelToken::new(), |r| ticks.push(r));
        assert!(ticks.is_empty());
        assert_eq!(outcome, CountdownOutcome::Finished);
    }

    #[test]
    fn test_cancel_from_tick_stops_countdown() {
        let scheduler = CountdownScheduler::new(Duration::from_millis(5));
        let token = CancelToken::new();
        let mut ticks = Vec::new();
        let outcome = scheduler.run(3, &token, |r| {
            ticks.push(r);
            if r == 2 {
                token.cancel();
            }
        });
        assert_eq!(ticks, vec![3, 2]);
        assert_eq!(outcome, CountdownOutcome::Cancelled);
    }

    #[test]
    fn test_cancel_wakes_sleeping_countdown() {
        let scheduler = CountdownScheduler::new(Duration::from_secs(30));
        let token = CancelToken::new();
        let canceller = token.clone();

        let started = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            canceller.cancel();
        });

        let outcome = scheduler.run(5, &token, |_| {});
        handle.join().unwrap();

        assert_eq!(outcome, CountdownOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
