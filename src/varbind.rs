//! Variable binding (VarBind) type.
//!
//! A VarBind pairs an OID with a value. It is the unit exchanged with the
//! protocol engine and the item yielded by walks.

use crate::oid::Oid;
use crate::value::Value;

/// Variable binding - an OID-value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (for GET/GETNEXT requests).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_varbind_display() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("core-sw-01"));
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.5.0 = core-sw-01");
    }

    #[test]
    fn test_null_varbind() {
        let vb = VarBind::null(oid!(1, 3, 6, 1));
        assert_eq!(vb.value, Value::Null);
    }
}
