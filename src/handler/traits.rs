//! MibHandler trait and related types.

use std::future::Future;
use std::pin::Pin;

use crate::oid::Oid;
use crate::value::Value;

use super::{GetNextResult, GetResult, RequestContext, SetResult};

/// Type alias for boxed async return type (dyn-compatible).
///
/// Handler methods return `BoxFuture` so handlers can be stored as
/// `Arc<dyn MibHandler>` by the agent listener.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Answers agent-side GET, GETNEXT and SET requests.
///
/// [`MibStore`](crate::mib::MibStore) is the implementation the agent uses;
/// tests and embedders can supply their own.
///
/// # GETNEXT ordering
///
/// [`get_next`](MibHandler::get_next) must return the first OID strictly
/// greater than the requested one, compared arc by arc as unsigned
/// integers: `1.3.6.1.2` < `1.3.6.1.2.1` < `1.3.6.1.3` < `1.3.6.1.10`.
/// The requested OID need not exist.
///
/// # SET
///
/// SET runs in two phases. [`test_set`](MibHandler::test_set) validates the
/// write without side effects; [`commit_set`](MibHandler::commit_set) applies
/// it. A handler that does not override them is read-only.
///
/// # Example
///
/// ```rust
/// use snmp_lab::handler::{BoxFuture, GetNextResult, GetResult, MibHandler, RequestContext};
/// use snmp_lab::{oid, Oid, Value, VarBind};
///
/// struct Uptime(u32);
///
/// impl MibHandler for Uptime {
///     fn get<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetResult> {
///         Box::pin(async move {
///             if oid == &oid!(1, 3, 6, 1, 2, 1, 1, 3, 0) {
///                 return GetResult::Value(Value::TimeTicks(self.0));
///             }
///             GetResult::NoSuchObject
///         })
///     }
///
///     fn get_next<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetNextResult> {
///         Box::pin(async move {
///             let uptime = oid!(1, 3, 6, 1, 2, 1, 1, 3, 0);
///             if oid < &uptime {
///                 return GetNextResult::Value(VarBind::new(uptime, Value::TimeTicks(self.0)));
///             }
///             GetNextResult::EndOfMibView
///         })
///     }
/// }
/// ```
pub trait MibHandler: Send + Sync + 'static {
    /// Handle a GET request for a specific OID.
    fn get<'a>(&'a self, ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetResult>;

    /// Handle a GETNEXT request.
    fn get_next<'a>(&'a self, ctx: &'a RequestContext, oid: &'a Oid)
    -> BoxFuture<'a, GetNextResult>;

    /// Validate a SET without applying it.
    ///
    /// Default: read-only, every OID answers [`SetResult::NotWritable`].
    fn test_set<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        _oid: &'a Oid,
        _value: &'a Value,
    ) -> BoxFuture<'a, SetResult> {
        Box::pin(async { SetResult::NotWritable })
    }

    /// Apply a SET that passed [`test_set`](MibHandler::test_set).
    ///
    /// State may have changed between the two phases, so implementations
    /// re-check and may still refuse.
    fn commit_set<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        _oid: &'a Oid,
        _value: &'a Value,
    ) -> BoxFuture<'a, SetResult> {
        Box::pin(async { SetResult::NotWritable })
    }
}
