//! Trap destinations.

use std::fmt;

use tokio::sync::mpsc;

use crate::engine::SharedEngine;
use crate::error::{Error, Result};
use crate::handler::BoxFuture;

use super::TrapEvent;

/// Somewhere a trap can be delivered.
pub trait TrapSink: Send + Sync + 'static {
    /// Destination description used in reports and logs.
    fn name(&self) -> String;

    /// Deliver one event.
    fn deliver<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<()>>;
}

/// Sends traps to a remote receiver through the protocol engine.
pub struct EngineTrapSink {
    engine: SharedEngine,
    address: String,
    port: u16,
}

impl EngineTrapSink {
    pub fn new(engine: SharedEngine, address: impl Into<String>, port: u16) -> Self {
        Self {
            engine,
            address: address.into(),
            port,
        }
    }
}

impl fmt::Debug for EngineTrapSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineTrapSink")
            .field("address", &self.address)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl TrapSink for EngineTrapSink {
    fn name(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    fn deliver<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<()>> {
        self.engine.notify(&self.address, self.port, event)
    }
}

/// Forwards traps into an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    name: String,
    tx: mpsc::Sender<TrapEvent>,
}

impl ChannelSink {
    pub fn new(name: impl Into<String>, tx: mpsc::Sender<TrapEvent>) -> Self {
        Self {
            name: name.into(),
            tx,
        }
    }
}

impl TrapSink for ChannelSink {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn deliver<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.tx
                .send(event.clone())
                .await
                .map_err(|_| Error::Delivery {
                    destination: self.name.clone(),
                    reason: "channel closed".into(),
                })
        })
    }
}

type Callback = Box<dyn Fn(&TrapEvent) -> Result<()> + Send + Sync>;

/// Delivers traps by calling a closure.
pub struct FnSink {
    name: String,
    callback: Callback,
}

impl FnSink {
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&TrapEvent) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for FnSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSink")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl TrapSink for FnSink {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn deliver<'a>(&'a self, event: &'a TrapEvent) -> BoxFuture<'a, Result<()>> {
        let result = (self.callback)(event);
        Box::pin(async move { result })
    }
}
