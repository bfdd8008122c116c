//! Internal utilities: periodic task driver with failure backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Doubling delay, reset on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    /// Start at `base`; never exceed `max` (or `base`, if larger).
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            current: base,
        }
    }

    /// Delay before the next run.
    pub fn delay(&self) -> Duration {
        self.current
    }

    /// Record a failure; returns the new delay.
    pub fn fail(&mut self) -> Duration {
        self.current = self.current.saturating_mul(2).min(self.max);
        self.current
    }

    /// Record a success.
    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

/// Schedule of a periodic task.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Periodic {
    pub name: &'static str,
    pub interval: Duration,
    pub max_backoff: Duration,
    /// Run once before the first sleep.
    pub immediate: bool,
}

impl Periodic {
    /// Run `tick` on schedule until `cancel` fires.
    ///
    /// Failures are logged and stretch the next delay; they never stop the
    /// loop. Both the sleep and the tick itself are raced against `cancel`.
    pub async fn run<F, Fut, E>(self, cancel: CancellationToken, mut tick: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Display,
    {
        let mut backoff = Backoff::new(self.interval, self.max_backoff);
        let mut first = true;
        tracing::debug!(task = self.name, interval = ?self.interval, "periodic task started");

        loop {
            if !(first && self.immediate) {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(backoff.delay()) => {}
                }
            }
            first = false;

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = tick() => outcome,
            };
            match outcome {
                Ok(()) => backoff.reset(),
                Err(e) => {
                    let retry_in = backoff.fail();
                    tracing::warn!(
                        task = self.name,
                        error = %e,
                        retry_in = ?retry_in,
                        "periodic task failed"
                    );
                }
            }
        }

        tracing::debug!(task = self.name, "periodic task stopped");
    }
}
