//! In-process engine connecting managers, agents and trap receivers.
//!
//! Endpoints are keyed by `(address, port)`. An agent binds an endpoint
//! and receives [`InboundRequest`]s on an mpsc channel; each request
//! carries a oneshot the agent answers on. A trap receiver binds an
//! endpoint and receives [`TrapEvent`]s.
//!
//! ```text
//! Manager ── request() ──> [agent endpoint] ──> mpsc ──> agent listener thread
//!                                                          │
//!         <────────────── oneshot reply ───────────────────┘
//!
//! Agent ─── notify() ───> [trap endpoint] ──> mpsc ──> manager trap pump
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::handler::BoxFuture;
use crate::trap::TrapEvent;

use super::{EngineRequest, EngineResponse, ProtocolEngine};

/// A request delivered to an agent endpoint.
#[derive(Debug)]
pub struct InboundRequest {
    pub request: EngineRequest,
    /// Dropping this without sending makes the caller see a timeout.
    pub reply: oneshot::Sender<EngineResponse>,
}

type Endpoint = (String, u16);

#[derive(Debug, Default)]
struct Inner {
    agents: RwLock<HashMap<Endpoint, mpsc::Sender<InboundRequest>>>,
    receivers: RwLock<HashMap<Endpoint, mpsc::Sender<TrapEvent>>>,
}

/// In-process [`ProtocolEngine`].
///
/// Cloning is cheap; clones share the address book.
#[derive(Debug, Clone, Default)]
pub struct LoopbackEngine {
    inner: Arc<Inner>,
}

impl LoopbackEngine {
    /// Create an engine with an empty address book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an agent endpoint, replacing any previous binding.
    pub fn bind_agent(
        &self,
        address: impl Into<String>,
        port: u16,
        capacity: usize,
    ) -> mpsc::Receiver<InboundRequest> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let key = (address.into(), port);
        tracing::debug!(snmp.endpoint = %format_args!("{}:{}", key.0, key.1), "agent endpoint bound");
        self.inner.agents.write().insert(key, tx);
        rx
    }

    /// Remove an agent endpoint. Later requests to it fail with an indication.
    pub fn unbind_agent(&self, address: &str, port: u16) -> bool {
        self.inner
            .agents
            .write()
            .remove(&(address.to_string(), port))
            .is_some()
    }

    /// Bind a trap receiver endpoint, replacing any previous binding.
    pub fn bind_trap_receiver(
        &self,
        address: impl Into<String>,
        port: u16,
        capacity: usize,
    ) -> mpsc::Receiver<TrapEvent> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.inner.receivers.write().insert((address.into(), port), tx);
        rx
    }

    /// Remove a trap receiver endpoint.
    pub fn unbind_trap_receiver(&self, address: &str, port: u16) -> bool {
        self.inner
            .receivers
            .write()
            .remove(&(address.to_string(), port))
            .is_some()
    }

    async fn exchange(&self, request: EngineRequest) -> EngineResponse {
        let endpoint = request.endpoint();
        let sender = self
            .inner
            .agents
            .read()
            .get(&(request.address.clone(), request.port))
            .cloned();
        let Some(sender) = sender else {
            return EngineResponse::indication(format!("no agent listening on {}", endpoint));
        };

        let timeout = request.timeout;
        let (reply_tx, reply_rx) = oneshot::channel();
        let inbound = InboundRequest {
            request,
            reply: reply_tx,
        };

        let exchange = async move {
            if sender.send(inbound).await.is_err() {
                return EngineResponse::indication(format!("agent on {} is not running", endpoint));
            }
            match reply_rx.await {
                Ok(response) => response,
                // Agent discarded the request (e.g. bad credentials).
                Err(_) => EngineResponse::timed_out(),
            }
        };

        tokio::time::timeout(timeout, exchange)
            .await
            .unwrap_or_else(|_| EngineResponse::timed_out())
    }

    async fn deliver(&self, address: &str, port: u16, event: &TrapEvent) -> Result<()> {
        let destination = format!("{}:{}", address, port);
        let sender = self
            .inner
            .receivers
            .read()
            .get(&(address.to_string(), port))
            .cloned();
        let Some(sender) = sender else {
            return Err(Error::Delivery {
                destination,
                reason: "no trap receiver bound".into(),
            });
        };
        sender
            .send(event.clone())
            .await
            .map_err(|_| Error::Delivery {
                destination,
                reason: "trap receiver closed".into(),
            })
    }
}

impl ProtocolEngine for LoopbackEngine {
    fn request(&self, request: EngineRequest) -> BoxFuture<'_, EngineResponse> {
        Box::pin(self.exchange(request))
    }

    fn notify<'a>(
        &'a self,
        address: &'a str,
        port: u16,
        event: &'a TrapEvent,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.deliver(address, port, event))
    }
}
