//! Device monitoring: periodic reachability probes and status transitions.
//!
//! Each round issues one GET of the probe OID (sysDescr by default) to
//! every registered device. A device moves to `Online` when a probe
//! succeeds and it was not already online, and to `Offline` when a probe
//! fails and it was not already offline. Steady state produces nothing.
//!
//! Every transition is
//!
//! - logged,
//! - broadcast to [`Monitor::subscribe`] receivers,
//! - turned into a `linkUp`/`linkDown` [`TrapEvent`] and dispatched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::device::{DeviceRegistry, DeviceStatus, StatusTransition};
use crate::dispatch::OperationDispatcher;
use crate::engine::Operation;
use crate::error::Error;
use crate::mib::oids;
use crate::oid::Oid;
use crate::trap::{Severity, TrapDispatcher, TrapEvent};
use crate::util::Periodic;
use crate::value::Value;

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between probe rounds.
    pub interval: Duration,
    /// OID fetched to decide reachability.
    pub probe_oid: Oid,
    /// Capacity of the transition broadcast channel.
    pub event_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            probe_oid: oids::sys_descr(),
            event_capacity: 64,
        }
    }
}

impl MonitorConfig {
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn probe_oid(mut self, oid: Oid) -> Self {
        self.probe_oid = oid;
        self
    }
}

/// Probes registered devices and reports status changes.
#[derive(Debug)]
pub struct Monitor {
    registry: Arc<DeviceRegistry>,
    dispatcher: OperationDispatcher,
    traps: Arc<TrapDispatcher>,
    config: MonitorConfig,
    events: broadcast::Sender<StatusTransition>,
}

impl Monitor {
    pub fn new(
        registry: Arc<DeviceRegistry>,
        dispatcher: OperationDispatcher,
        traps: Arc<TrapDispatcher>,
        config: MonitorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            registry,
            dispatcher,
            traps,
            config,
            events,
        }
    }

    /// Receive every future transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusTransition> {
        self.events.subscribe()
    }

    /// Probe every device once.
    ///
    /// Returns the transitions produced, in device id order. The registry
    /// lock is released while a probe is in flight; a device removed or
    /// replaced meanwhile produces no transition.
    pub async fn poll_once(&self) -> Vec<StatusTransition> {
        let mut transitions = Vec::new();
        for (generation, device) in self.registry.probe_targets() {
            let reachable = match self
                .dispatcher
                .exchange(&device, Operation::Get, &self.config.probe_oid, None)
                .await
            {
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(snmp.device_id = %device.id, error = %e, "probe failed");
                    false
                }
            };

            let Some(transition) = self.registry.record_probe(&device.id, generation, reachable) else {
                continue;
            };
            self.publish(&transition).await;
            transitions.push(transition);
        }
        transitions
    }

    async fn publish(&self, transition: &StatusTransition) {
        match transition.to {
            DeviceStatus::Offline => tracing::warn!(
                snmp.device_id = %transition.device_id,
                from = %transition.from,
                "device went offline"
            ),
            _ => tracing::info!(
                snmp.device_id = %transition.device_id,
                from = %transition.from,
                to = %transition.to,
                "device status changed"
            ),
        }

        // No subscribers is fine.
        let _ = self.events.send(transition.clone());

        if self.traps.destination_count() == 0 {
            return;
        }
        let report = self.traps.dispatch(&transition_trap(transition)).await;
        if report.failed() > 0 {
            tracing::debug!(
                snmp.device_id = %transition.device_id,
                failed = report.failed(),
                "status trap not delivered everywhere"
            );
        }
    }

    /// Probe on the configured interval until `cancel` fires.
    ///
    /// The first round runs immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        let schedule = Periodic {
            name: "monitor",
            interval: self.config.interval,
            max_backoff: self.config.interval,
            immediate: true,
        };
        schedule
            .run(cancel, move || async move {
                self.poll_once().await;
                Ok::<(), Error>(())
            })
            .await;
    }
}

/// The trap announcing `transition`.
pub fn transition_trap(transition: &StatusTransition) -> TrapEvent {
    let (oid, severity, word) = match transition.to {
        DeviceStatus::Online => (oids::link_up(), Severity::Info, "online"),
        _ => (oids::link_down(), Severity::Warning, "offline"),
    };
    TrapEvent::at(
        &transition.device_id,
        oid,
        Value::from(transition.device_id.as_str()),
        format!("Device {} is {}", transition.device_id, word),
        severity,
        transition.at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::device::SnmpDevice;
    use crate::engine::{EngineResponse, MockEngine, ResponseBuilder};
    use crate::trap::ChannelSink;
    use tokio::sync::mpsc;

    struct Fixture {
        engine: MockEngine,
        registry: Arc<DeviceRegistry>,
        monitor: Monitor,
        traps: mpsc::Receiver<TrapEvent>,
    }

    fn fixture() -> Fixture {
        let engine = MockEngine::new();
        let clock = ManualClock::starting_at(Duration::from_secs(1_700_000_000));
        let registry = Arc::new(DeviceRegistry::with_clock(Arc::new(clock)));
        registry
            .add_device(SnmpDevice::v2c("sw1", "10.0.0.1", "public"))
            .unwrap();
        let dispatcher = OperationDispatcher::new(Arc::new(engine.clone()), Duration::from_secs(1));
        let dispatcher_traps = Arc::new(TrapDispatcher::default());
        let (tx, traps) = mpsc::channel(16);
        dispatcher_traps.add_destination(Arc::new(ChannelSink::new("test", tx)));
        let monitor = Monitor::new(
            registry.clone(),
            dispatcher,
            dispatcher_traps,
            MonitorConfig::default(),
        );
        Fixture {
            engine,
            registry,
            monitor,
            traps,
        }
    }

    fn up() -> EngineResponse {
        ResponseBuilder::new()
            .varbind(oids::sys_descr(), Value::from("Linux"))
            .build()
    }

    fn down() -> EngineResponse {
        EngineResponse::timed_out()
    }

    #[tokio::test]
    async fn test_probe_sequence_transitions() {
        let mut f = fixture();
        for response in [up(), up(), down(), down(), up()] {
            f.engine.queue_response(response);
        }

        let mut counts = Vec::new();
        for _ in 0..5 {
            counts.push(f.monitor.poll_once().await.len());
        }
        assert_eq!(counts, vec![1, 0, 1, 0, 1]);
        assert_eq!(counts[..4].iter().sum::<usize>(), 2);

        let device = f.registry.get("sw1").unwrap();
        assert_eq!(device.status, DeviceStatus::Online);
        assert!(device.last_seen.is_some());

        let first = f.traps.recv().await.unwrap();
        assert_eq!(first.oid, oids::link_up());
        assert_eq!(first.severity, Severity::Info);
        let second = f.traps.recv().await.unwrap();
        assert_eq!(second.oid, oids::link_down());
        assert_eq!(second.severity, Severity::Warning);
        assert_eq!(second.message, "Device sw1 is offline");
    }

    #[tokio::test]
    async fn test_first_failure_from_unknown_goes_offline() {
        let f = fixture();
        f.engine.queue_response(down());
        let transitions = f.monitor.poll_once().await;
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].from, DeviceStatus::Unknown);
        assert_eq!(transitions[0].to, DeviceStatus::Offline);
        assert!(f.registry.get("sw1").unwrap().last_seen.is_none());
    }

    #[tokio::test]
    async fn test_probes_sysdescr_with_get() {
        let f = fixture();
        f.engine.queue_response(up());
        f.monitor.poll_once().await;
        let requests = f.engine.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].operation, Operation::Get);
        assert_eq!(requests[0].oid, oids::sys_descr());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let f = fixture();
        let mut events = f.monitor.subscribe();
        f.engine.queue_response(up());
        f.monitor.poll_once().await;
        let event = events.recv().await.unwrap();
        assert_eq!(event.device_id, "sw1");
        assert_eq!(event.to, DeviceStatus::Online);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_replaced_during_probe_keeps_unknown_status() {
        let mut f = fixture();
        f.engine.queue_hang();

        let (transitions, _) = tokio::join!(f.monitor.poll_once(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            f.registry
                .add_device(SnmpDevice::v2c("sw1", "10.0.0.99", "public"))
                .unwrap();
        });

        assert!(transitions.is_empty());
        let device = f.registry.get("sw1").unwrap();
        assert_eq!(device.address, "10.0.0.99");
        assert_eq!(device.status, DeviceStatus::Unknown);
        assert!(f.traps.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_probes_immediately_then_on_interval() {
        let f = fixture();
        let monitor = Arc::new(f.monitor);
        let cancel = CancellationToken::new();
        let task = tokio::spawn({
            let monitor = monitor.clone();
            let cancel = cancel.clone();
            async move { monitor.run(cancel).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(f.engine.requests().len(), 1);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.engine.requests().len(), 2);

        cancel.cancel();
        task.await.unwrap();
    }
}
