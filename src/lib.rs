//! # snmp-lab
//!
//! SNMP agent and manager core: an ordered MIB store, subtree walks,
//! device monitoring and best-effort trap fan-out.
//!
//! Wire encoding and transport sit behind the [`ProtocolEngine`] trait.
//! [`LoopbackEngine`] connects agents and managers living in the same
//! process.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use snmp_lab::agent::{Agent, AgentConfig};
//! use snmp_lab::manager::{Manager, ManagerConfig};
//! use snmp_lab::{LoopbackEngine, SnmpDevice, oid};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> snmp_lab::Result<()> {
//!     let engine = LoopbackEngine::new();
//!
//!     let agent = Agent::new(AgentConfig::new("agent-001"), Arc::new(engine.clone()));
//!     agent.serve_loopback(&engine)?;
//!
//!     let manager = Manager::new(Arc::new(engine.clone()), ManagerConfig::default());
//!     manager.add_device(SnmpDevice::v2c("agent-001", "agent-001", "public"))?;
//!
//!     let rows = manager.walk("agent-001", &oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1), None).await;
//!     for row in rows {
//!         println!("{} = {:?}", row.oid, row.value);
//!     }
//!
//!     agent.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Components
//!
//! | Module | Role |
//! |---|---|
//! | [`mib`] | OID-ordered table of managed entries with access control |
//! | [`walk`] | Bounded, subtree-scoped GETNEXT traversal as a `Stream` |
//! | [`dispatch`] | One logical operation against one device, normalized |
//! | [`device`] | Device registry and online/offline state |
//! | [`monitor`] | Periodic reachability probes |
//! | [`trap`] | Trap events and fan-out to destinations |
//! | [`agent`] | MIB served to managers, refresher and trap simulator |
//! | [`manager`] | Device operations, monitoring and trap intake |

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod agent;
pub mod clock;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod handler;
pub mod manager;
pub mod mib;
pub mod monitor;
pub mod oid;
pub mod prelude;
pub mod trap;
pub mod value;
pub mod varbind;
pub mod version;
pub mod walk;

#[cfg(feature = "cli")]
#[cfg_attr(docsrs, doc(cfg(feature = "cli")))]
pub mod cli;

pub(crate) mod util;

pub use device::{Credential, DeviceRegistry, DeviceStatus, SnmpDevice};
pub use engine::{EngineRequest, EngineResponse, LoopbackEngine, Operation, ProtocolEngine, SharedEngine};
pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use mib::{MibEntry, MibStore};
pub use oid::Oid;
pub use trap::{Severity, TrapDispatcher, TrapEvent, TrapSink};
pub use value::{TypeTag, Value};
pub use varbind::VarBind;
pub use version::Version;
pub use walk::Walk;
