//! Scripted engine for tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, ErrorStatus, Result};
use crate::handler::BoxFuture;
use crate::oid::Oid;
use crate::trap::TrapEvent;
use crate::value::Value;
use crate::varbind::VarBind;

use super::{EngineRequest, EngineResponse, ProtocolEngine};

#[derive(Debug)]
enum Scripted {
    Respond(EngineResponse),
    /// Never answer; the caller's timeout decides.
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Scripted>,
    requests: Vec<EngineRequest>,
    delivered: Vec<(String, u16, TrapEvent)>,
    failing: HashSet<(String, u16)>,
}

/// Engine that answers from a queue of scripted responses.
///
/// Responses are consumed in order, one per request. Once the queue is
/// empty every request gets an indication error. Every request and every
/// delivered trap is recorded for later assertions.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    state: Arc<Mutex<MockState>>,
}

impl MockEngine {
    /// Create an engine with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unanswered request.
    pub fn queue_response(&self, response: EngineResponse) {
        self.state
            .lock()
            .script
            .push_back(Scripted::Respond(response));
    }

    /// Queue a request that never completes.
    pub fn queue_hang(&self) {
        self.state.lock().script.push_back(Scripted::Hang);
    }

    /// Make trap delivery to `address:port` fail.
    pub fn fail_notify(&self, address: impl Into<String>, port: u16) {
        self.state.lock().failing.insert((address.into(), port));
    }

    /// Requests seen so far.
    pub fn requests(&self) -> Vec<EngineRequest> {
        self.state.lock().requests.clone()
    }

    /// Traps delivered so far, with their destination.
    pub fn delivered(&self) -> Vec<(String, u16, TrapEvent)> {
        self.state.lock().delivered.clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.state.lock().script.len()
    }
}

impl ProtocolEngine for MockEngine {
    fn request(&self, request: EngineRequest) -> BoxFuture<'_, EngineResponse> {
        let next = {
            let mut state = self.state.lock();
            state.requests.push(request);
            state.script.pop_front()
        };
        Box::pin(async move {
            match next {
                Some(Scripted::Respond(response)) => response,
                Some(Scripted::Hang) => std::future::pending().await,
                None => EngineResponse::indication("no scripted response"),
            }
        })
    }

    fn notify<'a>(
        &'a self,
        address: &'a str,
        port: u16,
        event: &'a TrapEvent,
    ) -> BoxFuture<'a, Result<()>> {
        let result = {
            let mut state = self.state.lock();
            if state.failing.contains(&(address.to_string(), port)) {
                Err(Error::Delivery {
                    destination: format!("{}:{}", address, port),
                    reason: "scripted failure".into(),
                })
            } else {
                state
                    .delivered
                    .push((address.to_string(), port, event.clone()));
                Ok(())
            }
        };
        Box::pin(async move { result })
    }
}

/// Builder for scripted engine responses.
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    status: Option<(ErrorStatus, u32)>,
    varbinds: Vec<VarBind>,
}

impl ResponseBuilder {
    /// Start an empty successful response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a varbind.
    pub fn varbind(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    /// Report an error status.
    pub fn error_status(mut self, status: ErrorStatus, index: u32) -> Self {
        self.status = Some((status, index));
        self
    }

    /// Build the response.
    pub fn build(self) -> EngineResponse {
        match self.status {
            Some((status, index)) => EngineResponse::status(status, index, self.varbinds),
            None => EngineResponse::varbinds(self.varbinds),
        }
    }
}
