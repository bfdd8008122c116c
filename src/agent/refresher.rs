//! Periodic refresh of volatile MIB entries.

use std::sync::Arc;
use std::time::SystemTime;

use crate::clock::{SharedClock, unix_secs};
use crate::error::Result;
use crate::mib::{MibStore, oids};
use crate::oid::Oid;
use crate::value::Value;

/// Keeps `sysUpTime` and the interface traffic counters moving.
#[derive(Debug, Clone)]
pub struct Refresher {
    store: Arc<MibStore>,
    clock: SharedClock,
    started: SystemTime,
}

impl Refresher {
    /// Refresher whose uptime counts from now.
    pub fn new(store: Arc<MibStore>, clock: SharedClock) -> Self {
        let started = clock.now();
        Self {
            store,
            clock,
            started,
        }
    }

    /// Uptime in hundredths of a second at `now`, saturating.
    pub fn uptime_ticks(&self, now: SystemTime) -> u32 {
        let elapsed = now.duration_since(self.started).unwrap_or_default();
        u32::try_from(elapsed.as_millis() / 10).unwrap_or(u32::MAX)
    }

    /// Counter increment applied at `now`; always below 1000.
    pub fn counter_increment(now: SystemTime) -> u32 {
        (unix_secs(now) % 1000) as u32
    }

    /// Apply one refresh round.
    pub fn refresh_once(&self) -> Result<()> {
        let now = self.clock.now();
        let ticks = self.uptime_ticks(now);
        self.store.refresh(&oids::sys_uptime(), |current| {
            // Never move backwards, even if the wall clock does.
            Value::TimeTicks(current.as_u32().unwrap_or(0).max(ticks))
        })?;

        let step = Self::counter_increment(now);
        let bump = |_: &Oid, current: &Value| {
            Value::Counter32(current.as_u32().unwrap_or(0).wrapping_add(step))
        };
        let rows = self.store.refresh_subtree(&oids::if_in_octets(), bump)?
            + self.store.refresh_subtree(&oids::if_out_octets(), bump)?;

        tracing::trace!(snmp.uptime = ticks, snmp.counters = rows, "MIB refreshed");
        Ok(())
    }
}
