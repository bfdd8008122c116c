//! Error types for snmp-lab.
//!
//! All errors are `#[non_exhaustive]` to allow adding new variants without breaking changes.
//!
//! Library operations that can fail return [`Result`]. Operations exposed to
//! a manager user (GET/SET/GETNEXT/WALK against a device) never return `Err`;
//! they report failures inline, projected onto the [`ErrorKind`] taxonomy.

use std::time::Duration;

use crate::oid::Oid;
use crate::value::TypeTag;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Arc is empty or contains a non-digit character.
    InvalidArc,
    /// Arc does not fit in 32 bits.
    ArcOverflow,
    /// OID has too many arcs (exceeds MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::ArcOverflow => write!(f, "arc value exceeds 32 bits"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// SNMP error status codes (RFC 3416).
///
/// Carried in protocol engine responses; the agent listener produces them
/// and the operation dispatcher maps them back onto [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongValue,
    NoCreation,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            other => Self::Unknown(other),
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::Unknown(code) => *code,
        }
    }

    /// Taxonomy bucket a manager reports for this status.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ReadOnly | Self::NotWritable | Self::NoAccess | Self::AuthorizationError => {
                ErrorKind::AccessDenied
            }
            Self::NoSuchName | Self::NoCreation => ErrorKind::NotFound,
            Self::WrongType => ErrorKind::WrongType,
            _ => ErrorKind::ProtocolError,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoError => write!(f, "noError"),
            Self::TooBig => write!(f, "tooBig"),
            Self::NoSuchName => write!(f, "noSuchName"),
            Self::BadValue => write!(f, "badValue"),
            Self::ReadOnly => write!(f, "readOnly"),
            Self::GenErr => write!(f, "genErr"),
            Self::NoAccess => write!(f, "noAccess"),
            Self::WrongType => write!(f, "wrongType"),
            Self::WrongValue => write!(f, "wrongValue"),
            Self::NoCreation => write!(f, "noCreation"),
            Self::CommitFailed => write!(f, "commitFailed"),
            Self::UndoFailed => write!(f, "undoFailed"),
            Self::AuthorizationError => write!(f, "authorizationError"),
            Self::NotWritable => write!(f, "notWritable"),
            Self::Unknown(code) => write!(f, "unknown({})", code),
        }
    }
}

/// Failure taxonomy reported inline by manager operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown OID or device id.
    NotFound,
    /// Write attempted against a read-only entry.
    AccessDenied,
    /// Transport/indication failure or protocol error status (includes timeouts).
    ProtocolError,
    /// No successor entry. Terminates traversals; not a fault.
    EndOfMib,
    /// Trap dispatch with an empty destination set.
    NoDestinations,
    /// Value type does not match the entry's type tag.
    WrongType,
    /// Malformed caller input (OID text, value text, device definition).
    InvalidInput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::ProtocolError => write!(f, "protocol error"),
            Self::EndOfMib => write!(f, "end of MIB"),
            Self::NoDestinations => write!(f, "no destinations"),
            Self::WrongType => write!(f, "wrong type"),
            Self::InvalidInput => write!(f, "invalid input"),
        }
    }
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// OID not present in the MIB.
    #[error("no such object: {oid}")]
    NoSuchObject { oid: Oid },

    /// Device id not present in the registry.
    #[error("device not found: {id}")]
    DeviceNotFound { id: String },

    /// Write attempted against a read-only entry.
    #[error("{oid} is read-only")]
    AccessDenied { oid: Oid },

    /// SET value type differs from the entry's type tag.
    #[error("wrong type for {oid}: expected {expected}, got {actual}")]
    WrongType {
        oid: Oid,
        expected: TypeTag,
        actual: TypeTag,
    },

    /// No entry after the given OID.
    #[error("end of MIB after {oid}")]
    EndOfMib { oid: Oid },

    /// Transport/indication failure reported by the protocol engine.
    #[error("{message}{}", target.as_ref().map(|t| format!(" ({})", t)).unwrap_or_default())]
    Indication {
        target: Option<String>,
        message: String,
    },

    /// Request timed out.
    #[error("request timed out after {elapsed:?}{}", target.as_ref().map(|t| format!(" waiting for {}", t)).unwrap_or_default())]
    Timeout {
        target: Option<String>,
        elapsed: Duration,
    },

    /// SNMP protocol error returned by an agent.
    #[error("SNMP error{}: {status}", target.as_ref().map(|t| format!(" from {}", t)).unwrap_or_default())]
    Snmp {
        target: Option<String>,
        status: ErrorStatus,
        oid: Option<Oid>,
    },

    /// Invalid OID format.
    #[error("invalid OID: {kind}")]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>, // Only allocated when parsing string input
    },

    /// Value text could not be converted to the requested type.
    #[error("invalid {tag} value: {input:?}")]
    InvalidValue { tag: &'static str, input: String },

    /// Unrecognised type tag name.
    #[error("unknown type tag: {0:?}")]
    UnknownTypeTag(String),

    /// Device definition is inconsistent (e.g. v3 device with a community).
    #[error("invalid device {id}: {reason}")]
    InvalidDevice { id: String, reason: &'static str },

    /// Walk detected a non-increasing OID (agent misbehavior).
    #[error("walk detected non-increasing OID: {previous} >= {current}")]
    NonIncreasingOid { previous: Oid, current: Oid },

    /// Trap delivery to one destination failed.
    #[error("trap delivery to {destination} failed: {reason}")]
    Delivery { destination: String, reason: String },

    /// I/O error (listener thread or runtime setup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid OID error from a kind (no input string).
    pub fn invalid_oid(kind: OidErrorKind) -> Self {
        Self::InvalidOid { kind, input: None }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    /// Create an indication error.
    pub fn indication(target: Option<String>, message: impl Into<String>) -> Self {
        Self::Indication {
            target,
            message: message.into(),
        }
    }

    /// Project this error onto the reporting taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoSuchObject { .. } | Self::DeviceNotFound { .. } => ErrorKind::NotFound,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::WrongType { .. } => ErrorKind::WrongType,
            Self::EndOfMib { .. } => ErrorKind::EndOfMib,
            Self::Snmp { status, .. } => status.kind(),
            Self::InvalidOid { .. }
            | Self::InvalidValue { .. }
            | Self::UnknownTypeTag(_)
            | Self::InvalidDevice { .. } => ErrorKind::InvalidInput,
            Self::Indication { .. }
            | Self::Timeout { .. }
            | Self::NonIncreasingOid { .. }
            | Self::Delivery { .. }
            | Self::Io(_) => ErrorKind::ProtocolError,
        }
    }

    /// Get the target description if this error has one.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Indication { target, .. }
            | Self::Timeout { target, .. }
            | Self::Snmp { target, .. } => target.as_deref(),
            _ => None,
        }
    }
}
