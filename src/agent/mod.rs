//! SNMP agent: a MIB store served to managers, plus its periodic tasks.
//!
//! An [`Agent`] owns
//!
//! - a [`MibStore`] seeded from [`AgentConfig::seed`],
//! - a [`TrapDispatcher`] whose destinations are remote trap receivers,
//! - the [`Refresher`] and the trap simulator, run on the caller's runtime,
//! - the request listener, run on its own thread.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use snmp_lab::agent::{Agent, AgentConfig};
//! use snmp_lab::engine::LoopbackEngine;
//!
//! # async fn example() -> snmp_lab::Result<()> {
//! let engine = LoopbackEngine::new();
//! let agent = Agent::new(AgentConfig::new("agent-001"), Arc::new(engine.clone()));
//! agent.serve_loopback(&engine)?;
//! agent.add_trap_destination("manager", 162);
//! agent.start();
//! // ...
//! agent.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod access;
mod listener;
mod refresher;
mod set_handler;
mod simulate;

pub use access::{AccessPolicy, Grant};
pub use refresher::Refresher;
pub use simulate::{SIMULATED_MESSAGE, simulated_trap};

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::{SharedClock, system_clock};
use crate::device::DEFAULT_PORT;
use crate::engine::{InboundRequest, LoopbackEngine, SharedEngine};
use crate::error::Result;
use crate::mib::{MibSeed, MibStore};
use crate::oid::Oid;
use crate::trap::{DestinationId, DispatchReport, EngineTrapSink, Severity, TrapDispatcher, TrapEvent};
use crate::util::Periodic;
use crate::value::Value;

use listener::Listener;

/// Default trap receiver port.
pub const DEFAULT_TRAP_PORT: u16 = 162;

/// Agent configuration.
#[derive(Debug)]
pub struct AgentConfig {
    pub agent_id: String,
    /// Address the agent answers on.
    pub address: String,
    pub port: u16,
    pub access: AccessPolicy,
    pub seed: MibSeed,
    pub refresh_interval: Duration,
    /// Upper bound on the refresher's failure backoff.
    pub max_backoff: Duration,
    /// Simulated trap period; `None` disables the simulator.
    pub trap_interval: Option<Duration>,
    pub delivery_timeout: Duration,
    /// Listener queue depth.
    pub request_capacity: usize,
}

impl AgentConfig {
    /// Defaults for `agent_id`: answers on `<agent_id>:161` with
    /// communities `public`/`private`.
    pub fn new(agent_id: impl Into<String>) -> Self {
        let agent_id = agent_id.into();
        Self {
            address: agent_id.clone(),
            port: DEFAULT_PORT,
            access: AccessPolicy::default(),
            seed: MibSeed::for_agent(&agent_id),
            refresh_interval: Duration::from_secs(30),
            max_backoff: Duration::from_secs(300),
            trap_interval: Some(Duration::from_secs(60)),
            delivery_timeout: crate::trap::DEFAULT_DELIVERY_TIMEOUT,
            request_capacity: 64,
            agent_id,
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn access(mut self, access: AccessPolicy) -> Self {
        self.access = access;
        self
    }

    pub fn seed(mut self, seed: MibSeed) -> Self {
        self.seed = seed;
        self
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn trap_interval(mut self, interval: Option<Duration>) -> Self {
        self.trap_interval = interval;
        self
    }
}

/// A running (or startable) SNMP agent.
pub struct Agent {
    id: String,
    address: String,
    port: u16,
    store: Arc<MibStore>,
    access: Arc<AccessPolicy>,
    traps: Arc<TrapDispatcher>,
    engine: SharedEngine,
    clock: SharedClock,
    refresh: Periodic,
    simulate: Option<Periodic>,
    request_capacity: usize,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    listener: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("port", &self.port)
            .field("entries", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Agent {
    /// Create an agent sending traps through `engine`.
    pub fn new(config: AgentConfig, engine: SharedEngine) -> Self {
        Self::with_clock(config, engine, system_clock())
    }

    /// Create an agent reading time from `clock`.
    pub fn with_clock(config: AgentConfig, engine: SharedEngine, clock: SharedClock) -> Self {
        let store = Arc::new(MibStore::seeded(&config.seed, clock.clone()));
        tracing::info!(
            snmp.agent_id = %config.agent_id,
            snmp.entries = store.len(),
            "agent created"
        );
        Self {
            refresh: Periodic {
                name: "refresher",
                interval: config.refresh_interval,
                max_backoff: config.max_backoff,
                immediate: false,
            },
            simulate: config.trap_interval.map(|interval| Periodic {
                name: "trap-simulator",
                interval,
                max_backoff: interval,
                immediate: false,
            }),
            id: config.agent_id,
            address: config.address,
            port: config.port,
            store,
            access: Arc::new(config.access),
            traps: Arc::new(TrapDispatcher::new(config.delivery_timeout)),
            engine,
            clock,
            request_capacity: config.request_capacity,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
            listener: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// `(address, port)` the agent answers on.
    pub fn endpoint(&self) -> (&str, u16) {
        (&self.address, self.port)
    }

    /// The agent's MIB.
    pub fn store(&self) -> &Arc<MibStore> {
        &self.store
    }

    /// The agent's trap dispatcher.
    pub fn traps(&self) -> &Arc<TrapDispatcher> {
        &self.traps
    }

    /// Send traps to a receiver at `address:port` through the engine.
    pub fn add_trap_destination(&self, address: impl Into<String>, port: u16) -> DestinationId {
        let address = address.into();
        tracing::info!(snmp.agent_id = %self.id, snmp.destination = %format_args!("{}:{}", address, port), "trap destination added");
        self.traps.add_destination(Arc::new(EngineTrapSink::new(
            Arc::clone(&self.engine),
            address,
            port,
        )))
    }

    /// Stop sending traps to a destination.
    pub fn remove_trap_destination(&self, id: DestinationId) -> bool {
        self.traps.remove_destination(id)
    }

    /// Send a trap to every destination.
    ///
    /// `message` defaults to `"Trap from <agent id>"`.
    pub async fn send_trap(
        &self,
        oid: Oid,
        value: Value,
        message: Option<&str>,
        severity: Severity,
    ) -> DispatchReport {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| format!("Trap from {}", self.id));
        let event = TrapEvent::at(&self.id, oid, value, message, severity, self.clock.now());
        tracing::info!(snmp.agent_id = %self.id, snmp.trap_id = %event.id, snmp.oid = %event.oid, "sending trap");
        self.traps.dispatch(&event).await
    }

    /// Serve requests arriving on `requests` from a dedicated thread.
    pub fn serve(&self, requests: mpsc::Receiver<InboundRequest>) -> Result<()> {
        let listener = Listener::new(
            self.id.clone(),
            self.store.clone(),
            Arc::clone(&self.access),
            self.cancel.child_token(),
        );
        let handle = listener.spawn(requests)?;
        if let Some(previous) = self.listener.lock().replace(handle) {
            tracing::warn!(snmp.agent_id = %self.id, "replacing running listener");
            drop(previous);
        }
        Ok(())
    }

    /// Bind the agent's endpoint on `engine` and serve it.
    pub fn serve_loopback(&self, engine: &LoopbackEngine) -> Result<()> {
        let requests = engine.bind_agent(self.address.clone(), self.port, self.request_capacity);
        self.serve(requests)
    }

    /// Start the refresher and, if configured, the trap simulator.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut tasks = self.tasks.lock();

        let refresher = Refresher::new(Arc::clone(&self.store), self.clock.clone());
        tasks.push(tokio::spawn(self.refresh.run(self.cancel.clone(), move || {
            let outcome = refresher.refresh_once();
            async move { outcome }
        })));

        if let Some(schedule) = self.simulate {
            let traps = Arc::clone(&self.traps);
            let clock = self.clock.clone();
            let id = self.id.clone();
            tasks.push(tokio::spawn(schedule.run(self.cancel.clone(), move || {
                let traps = Arc::clone(&traps);
                let event = simulated_trap(&id, clock.now());
                async move {
                    let report = traps.dispatch(&event).await;
                    tracing::debug!(
                        snmp.trap_id = %event.id,
                        delivered = report.delivered(),
                        failed = report.failed(),
                        "simulated trap sent"
                    );
                    Ok::<(), crate::Error>(())
                }
            })));
        }
        tracing::info!(snmp.agent_id = %self.id, "agent started");
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop every task and join the listener thread.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(snmp.agent_id = %self.id, error = %e, "agent task ended abnormally");
            }
        }
        let listener = self.listener.lock().take();
        if let Some(handle) = listener {
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(())) => {}
                _ => tracing::warn!(snmp.agent_id = %self.id, "listener thread ended abnormally"),
            }
        }
        tracing::info!(snmp.agent_id = %self.id, "agent stopped");
    }
}

impl Drop for Agent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
