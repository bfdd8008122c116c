//! SNMP manager: device registry, operations, monitoring and trap intake.
//!
//! Operations are addressed by device id and never fail with `Err`: every
//! call returns an [`SnmpResult`] whose `error` carries the failure kind
//! and a detail string. An unknown device id yields a failed result of kind
//! [`ErrorKind::NotFound`](crate::ErrorKind::NotFound).

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{SharedClock, system_clock};
use crate::device::{DeviceRegistry, DeviceSummary, SnmpDevice, StatusTransition};
use crate::dispatch::{DeviceSource, OperationDispatcher, OperationError, OperationResult};
use crate::engine::{LoopbackEngine, Operation, SharedEngine};
use crate::error::{Error, Result};
use crate::monitor::{Monitor, MonitorConfig};
use crate::oid::Oid;
use crate::trap::{DestinationId, DispatchReport, FnSink, TrapDispatcher, TrapEvent, TrapSink};
use crate::value::{TypeTag, Value};
use crate::walk::{DEFAULT_MAX_RESULTS, Walk};

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Timeout applied to every request.
    pub timeout: Duration,
    pub monitor: MonitorConfig,
    /// Timeout applied to each trap listener delivery.
    pub delivery_timeout: Duration,
    /// Walk cap used by [`Manager::walk`] callers that pass `None`.
    pub max_walk_results: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            timeout: crate::dispatch::DEFAULT_TIMEOUT,
            monitor: MonitorConfig::default(),
            delivery_timeout: crate::trap::DEFAULT_DELIVERY_TIMEOUT,
            max_walk_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl ManagerConfig {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.monitor.interval = interval;
        self
    }

    pub fn max_walk_results(mut self, max: usize) -> Self {
        self.max_walk_results = max;
        self
    }
}

/// Outcome of one manager operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnmpResult {
    pub success: bool,
    /// For GET/SET the requested OID; for GETNEXT and walk rows the OID
    /// the agent answered with.
    pub oid: Oid,
    pub value: Option<Value>,
    pub type_tag: Option<TypeTag>,
    pub error: Option<OperationError>,
    pub timestamp: SystemTime,
    pub device: Option<DeviceSummary>,
}

impl SnmpResult {
    fn from_operation(result: OperationResult, device: &SnmpDevice, timestamp: SystemTime) -> Self {
        Self {
            success: result.success,
            oid: result.next_oid.unwrap_or(result.oid),
            value: result.value,
            type_tag: result.type_tag,
            error: result.error,
            timestamp,
            device: Some(device.summary()),
        }
    }

    fn failed(oid: Oid, err: &Error, device: Option<&SnmpDevice>, timestamp: SystemTime) -> Self {
        Self {
            success: false,
            oid,
            value: None,
            type_tag: None,
            error: Some(OperationError::from(err)),
            timestamp,
            device: device.map(SnmpDevice::summary),
        }
    }

    /// Error kind, if the operation failed.
    pub fn error_kind(&self) -> Option<crate::ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Polls devices, runs operations against them and fans out traps.
pub struct Manager {
    registry: Arc<DeviceRegistry>,
    dispatcher: OperationDispatcher,
    traps: Arc<TrapDispatcher>,
    monitor: Arc<Monitor>,
    clock: SharedClock,
    max_walk_results: usize,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("devices", &self.registry.len())
            .field("listeners", &self.traps.destination_count())
            .finish_non_exhaustive()
    }
}

impl Manager {
    pub fn new(engine: SharedEngine, config: ManagerConfig) -> Self {
        Self::with_clock(engine, config, system_clock())
    }

    pub fn with_clock(engine: SharedEngine, config: ManagerConfig, clock: SharedClock) -> Self {
        let registry = Arc::new(DeviceRegistry::with_clock(clock.clone()));
        let dispatcher = OperationDispatcher::new(engine, config.timeout);
        let traps = Arc::new(TrapDispatcher::new(config.delivery_timeout));
        let monitor = Arc::new(Monitor::new(
            Arc::clone(&registry),
            dispatcher.clone(),
            Arc::clone(&traps),
            config.monitor,
        ));
        Self {
            registry,
            dispatcher,
            traps,
            monitor,
            clock,
            max_walk_results: config.max_walk_results,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    /// Register a device, replacing any device with the same id.
    pub fn add_device(&self, device: SnmpDevice) -> Result<Option<SnmpDevice>> {
        self.registry.add_device(device)
    }

    pub fn remove_device(&self, id: &str) -> Option<SnmpDevice> {
        self.registry.remove_device(id)
    }

    pub fn device(&self, id: &str) -> Option<SnmpDevice> {
        self.registry.get(id)
    }

    /// All devices, ordered by id.
    pub fn devices(&self) -> Vec<SnmpDevice> {
        self.registry.list()
    }

    fn lookup(&self, id: &str, oid: &Oid) -> std::result::Result<SnmpDevice, SnmpResult> {
        self.registry.get(id).ok_or_else(|| {
            let err = Error::DeviceNotFound { id: id.to_string() };
            SnmpResult::failed(oid.clone(), &err, None, self.clock.now())
        })
    }

    async fn run(&self, id: &str, operation: Operation, oid: &Oid, value: Option<Value>) -> SnmpResult {
        let device = match self.lookup(id, oid) {
            Ok(device) => device,
            Err(result) => return result,
        };
        let result = self.dispatcher.execute(&device, operation, oid, value).await;
        SnmpResult::from_operation(result, &device, self.clock.now())
    }

    /// GET `oid` from a device.
    pub async fn get(&self, device_id: &str, oid: &Oid) -> SnmpResult {
        self.run(device_id, Operation::Get, oid, None).await
    }

    /// GETNEXT after `oid` on a device.
    pub async fn get_next(&self, device_id: &str, oid: &Oid) -> SnmpResult {
        self.run(device_id, Operation::GetNext, oid, None).await
    }

    /// SET `oid` on a device to `value` parsed as `type_tag`
    /// (`integer`, `string`, `oid`, `counter`, `gauge`, `timeticks`).
    pub async fn set(&self, device_id: &str, oid: &Oid, value: &str, type_tag: &str) -> SnmpResult {
        let device = match self.lookup(device_id, oid) {
            Ok(device) => device,
            Err(result) => return result,
        };
        let parsed = type_tag
            .parse::<TypeTag>()
            .and_then(|tag| Value::parse_as(tag, value));
        match parsed {
            Ok(value) => self.set_value(device_id, oid, value).await,
            Err(e) => SnmpResult::failed(oid.clone(), &e, Some(&device), self.clock.now()),
        }
    }

    /// SET `oid` on a device to an already typed value.
    pub async fn set_value(&self, device_id: &str, oid: &Oid, value: Value) -> SnmpResult {
        self.run(device_id, Operation::Set, oid, Some(value)).await
    }

    /// Walk the subtree under `oid` on a device.
    ///
    /// Returns at most `max_results` rows (the configured default when
    /// `None`). If the walk was cut short by a failure, a final failed
    /// row describes it.
    pub async fn walk(&self, device_id: &str, oid: &Oid, max_results: Option<usize>) -> Vec<SnmpResult> {
        let device = match self.lookup(device_id, oid) {
            Ok(device) => device,
            Err(result) => return vec![result],
        };
        let source = Arc::new(DeviceSource::new(self.dispatcher.clone(), device.clone()));
        let mut walk = Walk::new(
            source,
            oid.clone(),
            max_results.unwrap_or(self.max_walk_results),
        );

        let mut rows = Vec::new();
        while let Some(vb) = walk.next_varbind().await {
            rows.push(SnmpResult {
                success: true,
                type_tag: vb.value.type_tag(),
                oid: vb.oid,
                value: Some(vb.value),
                error: None,
                timestamp: self.clock.now(),
                device: Some(device.summary()),
            });
        }
        if let Some(err) = walk.take_error() {
            rows.push(SnmpResult::failed(oid.clone(), &err, Some(&device), self.clock.now()));
        }
        tracing::debug!(snmp.device_id = %device.id, snmp.root = %oid, rows = rows.len(), "walk finished");
        rows
    }

    /// Call `callback` for every trap the manager receives.
    pub fn add_trap_listener<F>(&self, name: impl Into<String>, callback: F) -> DestinationId
    where
        F: Fn(&TrapEvent) -> Result<()> + Send + Sync + 'static,
    {
        self.traps.add_destination(Arc::new(FnSink::new(name, callback)))
    }

    /// Forward every received trap to `sink`.
    pub fn add_trap_sink(&self, sink: Arc<dyn TrapSink>) -> DestinationId {
        self.traps.add_destination(sink)
    }

    pub fn remove_trap_listener(&self, id: DestinationId) -> bool {
        self.traps.remove_destination(id)
    }

    /// Fan a received trap out to the listeners.
    pub async fn handle_trap(&self, event: &TrapEvent) -> DispatchReport {
        tracing::info!(
            snmp.trap_id = %event.id,
            snmp.source = %event.source_id,
            snmp.oid = %event.oid,
            severity = %event.severity,
            "trap received"
        );
        self.traps.dispatch(event).await
    }

    /// Feed traps arriving on `traps` to the listeners until shutdown.
    ///
    /// Must be called from within a tokio runtime.
    pub fn receive_traps(&self, mut traps: mpsc::Receiver<TrapEvent>) {
        let dispatcher = Arc::clone(&self.traps);
        let cancel = self.cancel.child_token();
        self.tasks.lock().push(tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = traps.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                tracing::info!(snmp.trap_id = %event.id, snmp.source = %event.source_id, "trap received");
                dispatcher.dispatch(&event).await;
            }
            tracing::debug!("trap intake stopped");
        }));
    }

    /// Receive traps sent to `address:port` on `engine`.
    pub fn listen_loopback(&self, engine: &LoopbackEngine, address: impl Into<String>, port: u16, capacity: usize) {
        let traps = engine.bind_trap_receiver(address, port, capacity);
        self.receive_traps(traps);
    }

    /// Receive every device status transition.
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusTransition> {
        self.monitor.subscribe()
    }

    /// Run one monitoring round now.
    pub async fn poll_devices(&self) -> Vec<StatusTransition> {
        self.monitor.poll_once().await
    }

    /// Start periodic device monitoring.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let monitor = Arc::clone(&self.monitor);
        let cancel = self.cancel.clone();
        self.tasks
            .lock()
            .push(tokio::spawn(async move { monitor.run(cancel).await }));
        tracing::info!(devices = self.registry.len(), "manager started");
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop monitoring and trap intake.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "manager task ended abnormally");
            }
        }
        tracing::info!("manager stopped");
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineResponse, MockEngine, ResponseBuilder};
    use crate::error::{ErrorKind, ErrorStatus};
    use crate::mib::oids;
    use crate::oid;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn manager() -> (MockEngine, Manager) {
        let engine = MockEngine::new();
        let manager = Manager::new(
            Arc::new(engine.clone()),
            ManagerConfig::default().timeout(Duration::from_secs(1)),
        );
        manager
            .add_device(SnmpDevice::v2c("sw1", "10.0.0.1", "public"))
            .unwrap();
        (engine, manager)
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let (engine, manager) = manager();
        let result = manager.get("nope", &oids::sys_descr()).await;
        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
        assert!(result.device.is_none());
        assert!(engine.requests().is_empty());

        let rows = manager.walk("nope", &oids::system(), None).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].error_kind(), Some(ErrorKind::NotFound));

        // Device lookup comes before value parsing.
        let result = manager.set("nope", &oids::sys_contact(), "x", "bitstring").await;
        assert_eq!(result.error_kind(), Some(ErrorKind::NotFound));
        assert!(engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_carries_device_summary() {
        let (engine, manager) = manager();
        engine.queue_response(
            ResponseBuilder::new()
                .varbind(oids::sys_name(), Value::from("core"))
                .build(),
        );
        let result = manager.get("sw1", &oids::sys_name()).await;
        assert!(result.success);
        assert_eq!(result.value, Some(Value::from("core")));
        assert_eq!(result.type_tag, Some(TypeTag::OctetString));
        assert_eq!(result.device.unwrap().id, "sw1");
    }

    #[tokio::test]
    async fn test_get_next_reports_answered_oid() {
        let (engine, manager) = manager();
        engine.queue_response(
            ResponseBuilder::new()
                .varbind(oids::sys_object_id(), Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 9999)))
                .build(),
        );
        let result = manager.get_next("sw1", &oids::sys_descr()).await;
        assert!(result.success);
        assert_eq!(result.oid, oids::sys_object_id());
    }

    #[tokio::test]
    async fn test_set_parses_typed_text() {
        let (engine, manager) = manager();
        engine.queue_response(
            ResponseBuilder::new()
                .varbind(oids::sys_contact(), Value::from("ops@example.net"))
                .build(),
        );
        let result = manager
            .set("sw1", &oids::sys_contact(), "ops@example.net", "string")
            .await;
        assert!(result.success);
        let sent = engine.requests();
        assert_eq!(sent[0].operation, Operation::Set);
        assert_eq!(sent[0].value, Some(Value::from("ops@example.net")));
    }

    #[tokio::test]
    async fn test_set_rejects_bad_input_without_a_request() {
        let (engine, manager) = manager();
        let result = manager.set("sw1", &oids::sys_contact(), "x", "bitstring").await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));
        let result = manager.set("sw1", &oids::if_number(), "two", "integer").await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidInput));
        assert!(engine.requests().is_empty());
    }

    #[tokio::test]
    async fn test_set_read_only_reports_access_denied() {
        let (engine, manager) = manager();
        engine.queue_response(
            ResponseBuilder::new()
                .varbind(oids::sys_descr(), Value::from("x"))
                .error_status(ErrorStatus::NotWritable, 1)
                .build(),
        );
        let result = manager.set("sw1", &oids::sys_descr(), "x", "string").await;
        assert_eq!(result.error_kind(), Some(ErrorKind::AccessDenied));
        assert_eq!(result.error.unwrap().detail, "notWritable");
    }

    #[tokio::test]
    async fn test_walk_appends_failure_row() {
        let (engine, manager) = manager();
        engine.queue_response(
            ResponseBuilder::new()
                .varbind(oids::sys_descr(), Value::from("Linux"))
                .build(),
        );
        engine.queue_response(EngineResponse::indication("connection refused"));

        let rows = manager.walk("sw1", &oids::system(), None).await;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].success);
        assert_eq!(rows[0].oid, oids::sys_descr());
        assert_eq!(rows[1].error_kind(), Some(ErrorKind::ProtocolError));
    }

    #[tokio::test]
    async fn test_trap_listeners_added_and_removed() {
        let (_engine, manager) = manager();
        let seen = Arc::new(AtomicUsize::new(0));
        let id = manager.add_trap_listener("counter", {
            let seen = seen.clone();
            move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        let event = TrapEvent::new("agent-001", oids::custom_trap(), Value::from("x"), "hi", Default::default());

        assert_eq!(manager.handle_trap(&event).await.delivered(), 1);
        assert!(manager.remove_trap_listener(id));
        assert_eq!(
            manager.handle_trap(&event).await.error_kind(),
            Some(ErrorKind::NoDestinations)
        );
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_receive_traps_pumps_until_shutdown() {
        let (_engine, manager) = manager();
        let (listener_tx, mut listener_rx) = mpsc::channel(4);
        manager.add_trap_sink(Arc::new(crate::trap::ChannelSink::new("out", listener_tx)));

        let (tx, rx) = mpsc::channel(4);
        manager.receive_traps(rx);
        let event = TrapEvent::new("agent-001", oids::custom_trap(), Value::from("x"), "hi", Default::default());
        tx.send(event.clone()).await.unwrap();

        let received = listener_rx.recv().await.unwrap();
        assert_eq!(received.id, event.id);
        manager.shutdown().await;
        assert!(manager.is_shutdown());
    }
}
