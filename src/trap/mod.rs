//! Trap events and best-effort fan-out.
//!
//! A [`TrapDispatcher`] delivers one [`TrapEvent`] to every registered
//! [`TrapSink`], at most once per sink, without retries. Each delivery has
//! its own timeout and a failing sink never affects the others; the
//! outcome for every sink is returned in a [`DispatchReport`].

mod sink;

pub use sink::{ChannelSink, EngineTrapSink, FnSink, TrapSink};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{Error, ErrorKind, Result};
use crate::oid::Oid;
use crate::value::Value;

/// Default bound on a single delivery.
pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Trap severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            _ => Err(Error::InvalidValue {
                tag: "severity",
                input: s.to_string(),
            }),
        }
    }
}

/// An asynchronous notification.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapEvent {
    pub id: Uuid,
    /// Agent or device the trap concerns.
    pub source_id: String,
    pub oid: Oid,
    pub value: Value,
    pub message: String,
    pub severity: Severity,
    pub timestamp: SystemTime,
    /// Extra bindings; always contains `oid -> value`.
    pub variables: BTreeMap<Oid, Value>,
}

impl TrapEvent {
    /// New event stamped with the current time.
    pub fn new(
        source_id: impl Into<String>,
        oid: Oid,
        value: Value,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self::at(source_id, oid, value, message, severity, SystemTime::now())
    }

    /// New event stamped with `timestamp`.
    pub fn at(
        source_id: impl Into<String>,
        oid: Oid,
        value: Value,
        message: impl Into<String>,
        severity: Severity,
        timestamp: SystemTime,
    ) -> Self {
        let mut variables = BTreeMap::new();
        variables.insert(oid.clone(), value.clone());
        Self {
            id: Uuid::new_v4(),
            source_id: source_id.into(),
            oid,
            value,
            message: message.into(),
            severity,
            timestamp,
            variables,
        }
    }

    /// Add an extra variable binding.
    pub fn with_variable(mut self, oid: Oid, value: Value) -> Self {
        self.variables.insert(oid, value);
        self
    }
}

/// Handle identifying a registered destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationId(u64);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dest-{}", self.0)
    }
}

/// Outcome of delivering to one destination.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub destination: String,
    pub result: Result<()>,
}

impl DeliveryOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-destination outcomes of one dispatch, in registration order.
#[derive(Debug)]
pub struct DispatchReport {
    pub event_id: Uuid,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    /// Whether the dispatch found nobody to deliver to.
    pub fn no_destinations(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// [`ErrorKind::NoDestinations`] for an empty dispatch.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.no_destinations().then_some(ErrorKind::NoDestinations)
    }

    /// Number of successful deliveries.
    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Number of failed deliveries.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.delivered()
    }
}

/// Fans trap events out to a set of sinks.
pub struct TrapDispatcher {
    destinations: RwLock<Vec<(DestinationId, Arc<dyn TrapSink>)>>,
    delivery_timeout: Duration,
    next_id: AtomicU64,
}

impl fmt::Debug for TrapDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .destinations
            .read()
            .iter()
            .map(|(_, sink)| sink.name())
            .collect();
        f.debug_struct("TrapDispatcher")
            .field("destinations", &names)
            .field("delivery_timeout", &self.delivery_timeout)
            .finish()
    }
}

impl Default for TrapDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVERY_TIMEOUT)
    }
}

impl TrapDispatcher {
    /// Create a dispatcher bounding each delivery by `delivery_timeout`.
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            destinations: RwLock::new(Vec::new()),
            delivery_timeout,
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a destination.
    pub fn add_destination(&self, sink: Arc<dyn TrapSink>) -> DestinationId {
        let id = DestinationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(snmp.destination = %sink.name(), %id, "trap destination added");
        self.destinations.write().push((id, sink));
        id
    }

    /// Unregister a destination.
    pub fn remove_destination(&self, id: DestinationId) -> bool {
        let mut destinations = self.destinations.write();
        let before = destinations.len();
        destinations.retain(|(d, _)| *d != id);
        destinations.len() != before
    }

    /// Number of registered destinations.
    pub fn destination_count(&self) -> usize {
        self.destinations.read().len()
    }

    /// Deliver `event` to every registered destination.
    pub async fn dispatch(&self, event: &TrapEvent) -> DispatchReport {
        // Snapshot so the lock is not held across deliveries.
        let sinks: Vec<Arc<dyn TrapSink>> = self
            .destinations
            .read()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect();
        self.dispatch_to(event, &sinks).await
    }

    /// Deliver `event` to each of `destinations`.
    pub async fn dispatch_to(
        &self,
        event: &TrapEvent,
        destinations: &[Arc<dyn TrapSink>],
    ) -> DispatchReport {
        if destinations.is_empty() {
            tracing::warn!(
                snmp.trap_id = %event.id,
                snmp.oid = %event.oid,
                "no trap destinations registered"
            );
        }

        let mut outcomes = Vec::with_capacity(destinations.len());
        for sink in destinations {
            let destination = sink.name();
            let result = match tokio::time::timeout(self.delivery_timeout, sink.deliver(event)).await
            {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    target: Some(destination.clone()),
                    elapsed: self.delivery_timeout,
                }),
            };
            match &result {
                Ok(()) => tracing::debug!(
                    snmp.trap_id = %event.id,
                    snmp.destination = %destination,
                    "trap delivered"
                ),
                Err(e) => tracing::warn!(
                    snmp.trap_id = %event.id,
                    snmp.destination = %destination,
                    error = %e,
                    "trap delivery failed"
                ),
            }
            outcomes.push(DeliveryOutcome {
                destination,
                result,
            });
        }

        DispatchReport {
            event_id: event.id,
            outcomes,
        }
    }
}
