//! Result types for MIB handler operations.

use crate::error::ErrorStatus;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// Result of a SET operation phase.
///
/// Used by both phases of the SET protocol:
/// - `test_set`: Returns Ok if the SET would succeed
/// - `commit_set`: Returns Ok if the change was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetResult {
    /// Operation succeeded.
    Ok,
    /// Object is read-only.
    NotWritable,
    /// Value has the wrong type for this OID.
    WrongType,
    /// OID does not exist and rows cannot be created.
    NoCreation,
    /// Commit failed (internal error during apply).
    CommitFailed,
}

impl SetResult {
    /// Check if this result indicates success.
    pub fn is_ok(&self) -> bool {
        matches!(self, SetResult::Ok)
    }

    /// Convert to the status code reported for `version`.
    ///
    /// SNMPv1 has no notWritable/noCreation/wrongType codes, so those fold
    /// into readOnly, noSuchName and badValue.
    pub fn to_error_status(&self, version: Version) -> ErrorStatus {
        match (self, version) {
            (SetResult::Ok, _) => ErrorStatus::NoError,
            (SetResult::NotWritable, Version::V1) => ErrorStatus::ReadOnly,
            (SetResult::NotWritable, _) => ErrorStatus::NotWritable,
            (SetResult::WrongType, Version::V1) => ErrorStatus::BadValue,
            (SetResult::WrongType, _) => ErrorStatus::WrongType,
            (SetResult::NoCreation, Version::V1) => ErrorStatus::NoSuchName,
            (SetResult::NoCreation, _) => ErrorStatus::NoCreation,
            (SetResult::CommitFailed, Version::V1) => ErrorStatus::GenErr,
            (SetResult::CommitFailed, _) => ErrorStatus::CommitFailed,
        }
    }
}

/// Result of a GET operation on a specific OID.
///
/// - `Value`: The OID exists and has the given value
/// - `NoSuchObject`: The object type is not implemented
/// - `NoSuchInstance`: The object type exists but this instance doesn't
///   (e.g. a table row that was never seeded)
///
/// For SNMPv1, both exception types result in a `noSuchName` error response.
/// For SNMPv2c/v3, they result in the matching exception value.
#[derive(Debug, Clone, PartialEq)]
pub enum GetResult {
    /// The OID exists and has this value.
    Value(Value),
    /// The object type is not implemented by this agent.
    NoSuchObject,
    /// The object type exists but this specific instance doesn't.
    NoSuchInstance,
}

impl GetResult {
    /// The exception value carried in a v2c/v3 response, if any.
    pub fn exception_value(&self) -> Option<Value> {
        match self {
            GetResult::Value(_) => None,
            GetResult::NoSuchObject => Some(Value::NoSuchObject),
            GetResult::NoSuchInstance => Some(Value::NoSuchInstance),
        }
    }
}

impl From<Value> for GetResult {
    fn from(value: Value) -> Self {
        GetResult::Value(value)
    }
}

/// Result of a GETNEXT operation.
///
/// For SNMPv1, `EndOfMibView` results in a `noSuchName` error response.
/// For SNMPv2c/v3, it results in the `endOfMibView` exception value.
#[derive(Debug, Clone, PartialEq)]
pub enum GetNextResult {
    /// The next OID/value pair in the MIB tree.
    Value(VarBind),
    /// No more OIDs after the given one (end of MIB view).
    EndOfMibView,
}

impl GetNextResult {
    /// Converts to an `Option<VarBind>`.
    pub fn into_option(self) -> Option<VarBind> {
        match self {
            GetNextResult::Value(vb) => Some(vb),
            GetNextResult::EndOfMibView => None,
        }
    }
}

impl From<Option<VarBind>> for GetNextResult {
    fn from(value: Option<VarBind>) -> Self {
        match value {
            Some(vb) => GetNextResult::Value(vb),
            None => GetNextResult::EndOfMibView,
        }
    }
}
