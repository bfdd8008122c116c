//! Request context for MIB handlers.

use crate::engine::Operation;
use crate::version::Version;

/// Request context passed to MIB handlers.
///
/// Describes who is asking and how, after the listener has accepted the
/// request's credentials.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Agent id of the listener that accepted the request.
    pub agent_id: String,
    /// SNMP version.
    pub version: Version,
    /// Security name (community string or USM user name).
    pub security_name: String,
    /// Whether the credentials grant write access.
    pub can_write: bool,
    /// Listener-assigned request sequence number.
    pub request_id: u64,
    /// Operation requested.
    pub operation: Operation,
}
