//! Protocol engine boundary.
//!
//! Wire encoding, transport and security processing live behind
//! [`ProtocolEngine`]. The manager hands it one [`EngineRequest`] per
//! operation and reads back an [`EngineResponse`]; agents use it to send
//! traps.
//!
//! Two engines ship with the crate:
//!
//! - [`LoopbackEngine`] connects managers, agents and trap receivers that
//!   live in the same process.
//! - `MockEngine` (tests and the `testing` feature) replays scripted
//!   responses and records every request.

mod loopback;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use loopback::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::device::{Credential, SnmpDevice};
use crate::error::{ErrorStatus, Result};
use crate::handler::BoxFuture;
use crate::oid::Oid;
use crate::trap::TrapEvent;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Logical SNMP operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    GetNext,
    Set,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "GET",
            Operation::GetNext => "GETNEXT",
            Operation::Set => "SET",
        })
    }
}

/// One request handed to the engine.
#[derive(Debug, Clone)]
pub struct EngineRequest {
    pub credential: Credential,
    pub version: Version,
    pub address: String,
    pub port: u16,
    pub oid: Oid,
    pub operation: Operation,
    /// Value to write; only meaningful for [`Operation::Set`].
    pub value: Option<Value>,
    pub timeout: Duration,
}

impl EngineRequest {
    /// Request against `device`.
    pub fn for_device(
        device: &SnmpDevice,
        operation: Operation,
        oid: Oid,
        value: Option<Value>,
        timeout: Duration,
    ) -> Self {
        Self {
            credential: device.credential.clone(),
            version: device.version,
            address: device.address.clone(),
            port: device.port,
            oid,
            operation,
            value,
            timeout,
        }
    }

    /// `address:port` of the target.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Engine outcome for one request.
///
/// At most one of `indication_error` and `status_error` is set. A response
/// with neither carries the variable bindings the agent returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResponse {
    /// Local failure: unreachable endpoint, timeout, malformed exchange.
    pub indication_error: Option<String>,
    /// Error status reported by the agent.
    pub status_error: Option<ErrorStatus>,
    /// One-based index of the varbind the status refers to (0 = none).
    pub error_index: u32,
    pub varbinds: Vec<VarBind>,
}

impl EngineResponse {
    /// Successful response carrying `varbinds`.
    pub fn varbinds(varbinds: Vec<VarBind>) -> Self {
        Self {
            varbinds,
            ..Self::default()
        }
    }

    /// Response with an agent error status.
    pub fn status(status: ErrorStatus, error_index: u32, varbinds: Vec<VarBind>) -> Self {
        Self {
            status_error: Some(status),
            error_index,
            varbinds,
            ..Self::default()
        }
    }

    /// Local failure with no agent answer.
    pub fn indication(message: impl Into<String>) -> Self {
        Self {
            indication_error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Indication reported when no answer arrives in time.
    pub fn timed_out() -> Self {
        Self::indication("request timed out")
    }
}

/// The protocol machinery a manager and an agent talk through.
pub trait ProtocolEngine: Send + Sync + 'static {
    /// Issue one request and wait for its outcome.
    ///
    /// Must honor `request.timeout`; failures are reported in the response,
    /// never by panicking.
    fn request(&self, request: EngineRequest) -> BoxFuture<'_, EngineResponse>;

    /// Transmit a trap to a receiver at `address:port`.
    fn notify<'a>(
        &'a self,
        address: &'a str,
        port: u16,
        event: &'a TrapEvent,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Shared engine handle.
pub type SharedEngine = Arc<dyn ProtocolEngine>;

impl<E: ProtocolEngine + ?Sized> ProtocolEngine for Arc<E> {
    fn request(&self, request: EngineRequest) -> BoxFuture<'_, EngineResponse> {
        (**self).request(request)
    }

    fn notify<'a>(
        &'a self,
        address: &'a str,
        port: u16,
        event: &'a TrapEvent,
    ) -> BoxFuture<'a, Result<()>> {
        (**self).notify(address, port, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_request_for_device_copies_credentials() {
        let device = SnmpDevice::v1("sw1", "10.0.0.1", "public").port(1161);
        let req = EngineRequest::for_device(
            &device,
            Operation::GetNext,
            oid!(1, 3, 6, 1),
            None,
            Duration::from_secs(2),
        );
        assert_eq!(req.version, Version::V1);
        assert_eq!(req.credential.security_name(), "public");
        assert_eq!(req.endpoint(), "10.0.0.1:1161");
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::GetNext.to_string(), "GETNEXT");
    }
}
