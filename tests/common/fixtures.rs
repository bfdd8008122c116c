//! Common test fixtures and constants.

use std::sync::Arc;
use std::time::Duration;

use snmp_lab::agent::{AccessPolicy, Agent, AgentConfig, DEFAULT_TRAP_PORT};
use snmp_lab::manager::{Manager, ManagerConfig};
use snmp_lab::{LoopbackEngine, Oid, SnmpDevice, oid};

// =============================================================================
// Standard system MIB OIDs (1.3.6.1.2.1.1.*)
// =============================================================================

pub fn sys_descr() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
}
pub fn sys_contact() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
}
pub fn sys_name() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
}

// =============================================================================
// Subtree roots (for walks)
// =============================================================================

/// System subtree root: 1.3.6.1.2.1.1
pub fn system_subtree() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 1)
}

/// ifIndex column: 1.3.6.1.2.1.2.2.1.1
pub fn if_index_column() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1)
}

/// ifDescr column: 1.3.6.1.2.1.2.2.1.2
pub fn if_descr_column() -> Oid {
    oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)
}

// =============================================================================
// Test OIDs
// =============================================================================

/// Nonexistent OID for testing NoSuchObject
pub fn nonexistent_oid() -> Oid {
    oid!(1, 3, 6, 1, 99, 99, 99, 0)
}

// =============================================================================
// Credentials
// =============================================================================

/// Read-only community
pub const COMMUNITY_RO: &str = "public";
/// Read-write community
pub const COMMUNITY_RW: &str = "private";

/// V3 user with write access
pub const V3_USER: &str = "admin";
/// Its authentication key
pub const V3_AUTH_KEY: &str = "authpass123";

/// Address the lab manager receives traps on
pub const MANAGER_ADDRESS: &str = "manager";

// =============================================================================
// In-process lab
// =============================================================================

/// Agents and a manager connected through one loopback engine.
///
/// Each agent answers on `<id>:161`, sends its traps to the manager and
/// is registered with the manager as a v2c device using the read-only
/// community. Periodic tasks are not started.
pub struct Lab {
    pub engine: LoopbackEngine,
    pub agents: Vec<Agent>,
    pub manager: Manager,
}

impl Lab {
    pub fn start(ids: &[&str]) -> Self {
        let engine = LoopbackEngine::new();
        let agents: Vec<Agent> = ids
            .iter()
            .map(|id| {
                let config = AgentConfig::new(*id)
                    .access(
                        AccessPolicy::new(COMMUNITY_RO, COMMUNITY_RW).user(V3_USER, V3_AUTH_KEY, true),
                    )
                    .trap_interval(None);
                let agent = Agent::new(config, Arc::new(engine.clone()));
                agent.serve_loopback(&engine).unwrap();
                agent.add_trap_destination(MANAGER_ADDRESS, DEFAULT_TRAP_PORT);
                agent
            })
            .collect();

        let manager = Manager::new(
            Arc::new(engine.clone()),
            ManagerConfig::default().timeout(Duration::from_secs(2)),
        );
        for id in ids {
            manager
                .add_device(SnmpDevice::v2c(*id, *id, COMMUNITY_RO))
                .unwrap();
        }

        Self {
            engine,
            agents,
            manager,
        }
    }

    /// Register an extra device entry for an existing agent.
    pub fn add_device(&self, device: SnmpDevice) {
        self.manager.add_device(device).unwrap();
    }

    pub fn agent(&self, id: &str) -> &Agent {
        self.agents
            .iter()
            .find(|a| a.id() == id)
            .expect("no such agent")
    }

    pub async fn shutdown(self) {
        self.manager.shutdown().await;
        for agent in &self.agents {
            agent.shutdown().await;
        }
    }
}
