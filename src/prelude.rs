//! Commonly used types.
//!
//! ```rust,no_run
//! use snmp_lab::prelude::*;
//! ```
//!
//! This imports:
//! - Services: [`Agent`], [`AgentConfig`], [`Manager`], [`ManagerConfig`]
//! - Core types: [`Oid`], [`Value`], [`VarBind`], [`SnmpDevice`], [`TrapEvent`]
//! - Error handling: [`Error`], [`ErrorKind`], [`Result`]
//! - The [`oid!`] macro

pub use crate::agent::{Agent, AgentConfig};
pub use crate::device::SnmpDevice;
pub use crate::engine::LoopbackEngine;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::manager::{Manager, ManagerConfig, SnmpResult};
pub use crate::oid::Oid;
pub use crate::trap::{Severity, TrapEvent};
pub use crate::value::Value;
pub use crate::varbind::VarBind;
pub use crate::version::Version;

#[doc(no_inline)]
pub use crate::oid;
