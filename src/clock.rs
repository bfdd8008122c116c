//! Wall-clock source.
//!
//! Timestamps (`lastUpdated`, `lastSeen`, trap times) and the Refresher's
//! uptime/counter arithmetic read time through [`Clock`] so behaviour is
//! reproducible under a [`ManualClock`].

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

/// Source of wall-clock time.
pub trait Clock: Send + Sync + std::fmt::Debug + 'static {
    /// Current time.
    fn now(&self) -> SystemTime;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// The default shared clock.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<SystemTime>>,
}

impl ManualClock {
    /// Start at `UNIX_EPOCH + start`.
    pub fn starting_at(start: Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(UNIX_EPOCH + start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }
}

/// Seconds since the Unix epoch, saturating at 0 for pre-epoch times.
pub fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Milliseconds since the Unix epoch, saturating at 0 for pre-epoch times.
pub fn unix_millis(t: SystemTime) -> u128 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_all_handles() {
        let clock = ManualClock::starting_at(Duration::from_secs(1_000));
        let other = clock.clone();
        clock.advance(Duration::from_secs(5));
        assert_eq!(unix_secs(other.now()), 1_005);
    }
}
