//! Inbound request listener.
//!
//! The listener owns its own OS thread and a current-thread runtime, so a
//! slow handler or a backed-up engine never stalls the periodic tasks on
//! the caller's runtime. Requests arrive on an mpsc channel; each is
//! authenticated, answered through the [`MibHandler`], and replied to on the
//! request's oneshot.

use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::engine::{EngineRequest, EngineResponse, InboundRequest, Operation};
use crate::error::ErrorStatus;
use crate::handler::{GetNextResult, GetResult, MibHandler, RequestContext};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

use super::access::AccessPolicy;

pub(crate) struct Listener {
    pub(super) agent_id: String,
    pub(super) handler: Arc<dyn MibHandler>,
    pub(super) policy: Arc<AccessPolicy>,
    pub(super) cancel: CancellationToken,
    pub(super) next_request_id: u64,
}

impl Listener {
    pub(crate) fn new(
        agent_id: String,
        handler: Arc<dyn MibHandler>,
        policy: Arc<AccessPolicy>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            agent_id,
            handler,
            policy,
            cancel,
            next_request_id: 1,
        }
    }

    /// Start serving `requests` on a dedicated thread.
    pub(crate) fn spawn(self, requests: mpsc::Receiver<InboundRequest>) -> io::Result<JoinHandle<()>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        std::thread::Builder::new()
            .name(format!("snmp-agent-{}", self.agent_id))
            .spawn(move || runtime.block_on(self.serve(requests)))
    }

    async fn serve(mut self, mut requests: mpsc::Receiver<InboundRequest>) {
        tracing::info!(snmp.agent_id = %self.agent_id, "agent listener started");
        loop {
            let inbound = tokio::select! {
                _ = self.cancel.cancelled() => break,
                inbound = requests.recv() => match inbound {
                    Some(inbound) => inbound,
                    None => break,
                },
            };
            if let Some(response) = self.handle(inbound.request).await {
                // Caller may have given up already.
                let _ = inbound.reply.send(response);
            }
        }
        tracing::info!(snmp.agent_id = %self.agent_id, "agent listener stopped");
    }

    /// Answer one request, or `None` if it is dropped.
    pub(crate) async fn handle(&mut self, request: EngineRequest) -> Option<EngineResponse> {
        let Some(grant) = self.policy.authorize(request.version, &request.credential) else {
            tracing::debug!(
                snmp.agent_id = %self.agent_id,
                snmp.version = %request.version,
                "request dropped: credentials rejected"
            );
            return None;
        };

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        let ctx = RequestContext {
            agent_id: self.agent_id.clone(),
            version: request.version,
            security_name: grant.security_name,
            can_write: grant.can_write,
            request_id,
            operation: request.operation,
        };
        tracing::trace!(
            snmp.agent_id = %self.agent_id,
            snmp.request_id = request_id,
            snmp.operation = %request.operation,
            snmp.oid = %request.oid,
            "handling request"
        );

        let response = match request.operation {
            Operation::Get => self.handle_get(&ctx, &request.oid).await,
            Operation::GetNext => self.handle_get_next(&ctx, &request.oid).await,
            Operation::Set => {
                self.handle_set(&ctx, &request.oid, request.value.as_ref())
                    .await
            }
        };
        Some(response)
    }

    async fn handle_get(&self, ctx: &RequestContext, oid: &Oid) -> EngineResponse {
        let result = self.handler.get(ctx, oid).await;
        match result {
            GetResult::Value(value) => {
                EngineResponse::varbinds(vec![VarBind::new(oid.clone(), value)])
            }
            _ if ctx.version == Version::V1 => no_such_name(oid),
            other => {
                let value = other.exception_value().unwrap_or(Value::NoSuchObject);
                EngineResponse::varbinds(vec![VarBind::new(oid.clone(), value)])
            }
        }
    }

    async fn handle_get_next(&self, ctx: &RequestContext, oid: &Oid) -> EngineResponse {
        match self.handler.get_next(ctx, oid).await {
            GetNextResult::Value(vb) => EngineResponse::varbinds(vec![vb]),
            GetNextResult::EndOfMibView if ctx.version == Version::V1 => no_such_name(oid),
            GetNextResult::EndOfMibView => {
                EngineResponse::varbinds(vec![VarBind::new(oid.clone(), Value::EndOfMibView)])
            }
        }
    }
}

/// SNMPv1 answer for a missing object.
pub(super) fn no_such_name(oid: &Oid) -> EngineResponse {
    EngineResponse::status(ErrorStatus::NoSuchName, 1, vec![VarBind::null(oid.clone())])
}
