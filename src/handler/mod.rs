//! Handler types and traits for agent-side MIB operations.
//!
//! - [`MibHandler`] - Trait for handling GET, GETNEXT, and SET operations
//! - [`RequestContext`] - Information about the incoming request
//! - [`GetResult`], [`GetNextResult`], [`SetResult`] - Operation results
//! - [`OidTable`] - Sorted OID storage used for GETNEXT
//!
//! The agent listener authenticates a request, builds a [`RequestContext`]
//! and hands the operation to its handler. SNMP version differences
//! (exception values versus v1 error statuses) are applied by the listener,
//! so handlers only answer in terms of these result types.

mod context;
mod oid_table;
mod results;
mod traits;

pub use context::RequestContext;
pub use oid_table::OidTable;
pub use results::{GetNextResult, GetResult, SetResult};
pub use traits::{BoxFuture, MibHandler};
