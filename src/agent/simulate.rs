//! Periodic simulated traps.

use std::time::SystemTime;

use crate::clock::unix_secs;
use crate::mib::oids;
use crate::trap::{Severity, TrapEvent};
use crate::value::Value;

/// Message carried by simulated traps.
pub const SIMULATED_MESSAGE: &str = "Periodic simulation trap";

/// The trap the simulator sends at `now`.
pub fn simulated_trap(agent_id: &str, now: SystemTime) -> TrapEvent {
    TrapEvent::at(
        agent_id,
        oids::custom_trap(),
        Value::from(format!("Simulated trap {}", unix_secs(now))),
        SIMULATED_MESSAGE,
        Severity::Info,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_simulated_trap_payload() {
        let now = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let trap = simulated_trap("agent-001", now);
        assert_eq!(trap.source_id, "agent-001");
        assert_eq!(trap.oid, oids::custom_trap());
        assert_eq!(trap.value, Value::from("Simulated trap 1700000000"));
        assert_eq!(trap.message, SIMULATED_MESSAGE);
        assert_eq!(trap.timestamp, now);
    }
}
