//! Operation dispatch: one logical operation against one device.

use std::fmt;
use std::time::Duration;

use crate::device::SnmpDevice;
use crate::engine::{EngineRequest, EngineResponse, Operation, SharedEngine};
use crate::error::{Error, ErrorKind, ErrorStatus, Result};
use crate::handler::BoxFuture;
use crate::oid::Oid;
use crate::value::{TypeTag, Value};
use crate::varbind::VarBind;
use crate::walk::NextSource;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure carried by an [`OperationResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl OperationError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl From<&Error> for OperationError {
    fn from(err: &Error) -> Self {
        let detail = match err {
            Error::Snmp { status, .. } => status.to_string(),
            other => other.to_string(),
        };
        Self::new(err.kind(), detail)
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Normalized outcome of one engine exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    pub success: bool,
    /// OID the operation was issued for.
    pub oid: Oid,
    pub value: Option<Value>,
    pub type_tag: Option<TypeTag>,
    pub error: Option<OperationError>,
    /// OID the agent answered with (GETNEXT only).
    pub next_oid: Option<Oid>,
}

impl OperationResult {
    fn ok(operation: Operation, oid: Oid, vb: VarBind) -> Self {
        Self {
            success: true,
            oid,
            type_tag: vb.value.type_tag(),
            value: Some(vb.value),
            error: None,
            next_oid: (operation == Operation::GetNext).then_some(vb.oid),
        }
    }

    /// Failed result for `oid`.
    pub fn failed(oid: Oid, error: OperationError) -> Self {
        Self {
            success: false,
            oid,
            value: None,
            type_tag: None,
            error: Some(error),
            next_oid: None,
        }
    }

    /// Error kind, if the operation failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Translates operations into engine requests and normalizes the answers.
///
/// Exactly one request is issued per operation; nothing is retried.
#[derive(Clone)]
pub struct OperationDispatcher {
    engine: SharedEngine,
    timeout: Duration,
}

impl fmt::Debug for OperationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationDispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OperationDispatcher {
    pub fn new(engine: SharedEngine, timeout: Duration) -> Self {
        Self { engine, timeout }
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `operation` on `device` and normalize the outcome.
    pub async fn execute(
        &self,
        device: &SnmpDevice,
        operation: Operation,
        oid: &Oid,
        value: Option<Value>,
    ) -> OperationResult {
        match self.exchange(device, operation, oid, value).await {
            Ok(vb) => OperationResult::ok(operation, oid.clone(), vb),
            Err(e) => {
                tracing::debug!(
                    snmp.device_id = %device.id,
                    snmp.operation = %operation,
                    snmp.oid = %oid,
                    error = %e,
                    "operation failed"
                );
                OperationResult::failed(oid.clone(), OperationError::from(&e))
            }
        }
    }

    /// Run `operation` on `device`, returning the answering binding.
    pub async fn exchange(
        &self,
        device: &SnmpDevice,
        operation: Operation,
        oid: &Oid,
        value: Option<Value>,
    ) -> Result<VarBind> {
        if operation == Operation::Set && value.is_none() {
            return Err(Error::InvalidValue {
                tag: "set",
                input: String::new(),
            });
        }

        let target = device.endpoint();
        let request = EngineRequest::for_device(device, operation, oid.clone(), value, self.timeout);
        tracing::trace!(
            snmp.target = %target,
            snmp.operation = %operation,
            snmp.oid = %oid,
            "sending request"
        );

        let response = match tokio::time::timeout(self.timeout, self.engine.request(request)).await
        {
            Ok(response) => response,
            Err(_) => {
                return Err(Error::Timeout {
                    target: Some(target),
                    elapsed: self.timeout,
                });
            }
        };
        normalize(operation, oid, target, response)
    }
}

fn normalize(
    operation: Operation,
    oid: &Oid,
    target: String,
    response: EngineResponse,
) -> Result<VarBind> {
    if let Some(message) = response.indication_error {
        return Err(Error::indication(Some(target), message));
    }
    if let Some(status) = response.status_error
        && status != ErrorStatus::NoError
    {
        // SNMPv1 agents signal the end of the MIB this way.
        if operation == Operation::GetNext && status == ErrorStatus::NoSuchName {
            return Err(Error::EndOfMib { oid: oid.clone() });
        }
        return Err(Error::Snmp {
            target: Some(target),
            status,
            oid: Some(oid.clone()),
        });
    }

    let Some(vb) = response.varbinds.into_iter().next() else {
        return Err(Error::indication(Some(target), "response carried no variable bindings"));
    };

    match vb.value {
        Value::NoSuchObject | Value::NoSuchInstance => {
            return Err(Error::NoSuchObject { oid: oid.clone() });
        }
        Value::EndOfMibView => return Err(Error::EndOfMib { oid: oid.clone() }),
        _ => {}
    }

    if operation == Operation::Get && vb.oid != *oid {
        return Err(Error::NoSuchObject { oid: oid.clone() });
    }

    Ok(vb)
}

/// A device walked through a dispatcher.
#[derive(Debug, Clone)]
pub struct DeviceSource {
    dispatcher: OperationDispatcher,
    device: SnmpDevice,
}

impl DeviceSource {
    pub fn new(dispatcher: OperationDispatcher, device: SnmpDevice) -> Self {
        Self { dispatcher, device }
    }

    pub fn device(&self) -> &SnmpDevice {
        &self.device
    }
}

impl NextSource for DeviceSource {
    fn next_after<'a>(&'a self, oid: &'a Oid) -> BoxFuture<'a, Result<VarBind>> {
        Box::pin(
            self.dispatcher
                .exchange(&self.device, Operation::GetNext, oid, None),
        )
    }
}
