//! MIB entries.

use std::fmt;
use std::time::{Duration, SystemTime};

use crate::oid::Oid;
use crate::value::{TypeTag, Value};

/// Access level of a MIB entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

impl Access {
    pub fn is_writable(&self) -> bool {
        matches!(self, Access::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Access::ReadOnly => "read-only",
            Access::ReadWrite => "read-write",
        })
    }
}

/// One managed object held by a [`MibStore`](super::MibStore).
#[derive(Debug, Clone, PartialEq)]
pub struct MibEntry {
    pub oid: Oid,
    pub name: String,
    pub description: String,
    pub type_tag: TypeTag,
    pub access: Access,
    pub value: Value,
    pub last_updated: SystemTime,
}

impl MibEntry {
    /// Create an entry; the type tag is taken from `value`.
    ///
    /// Returns `None` if `value` carries no type (NULL or an exception).
    pub fn new(
        oid: Oid,
        name: impl Into<String>,
        description: impl Into<String>,
        access: Access,
        value: Value,
        now: SystemTime,
    ) -> Option<Self> {
        Some(Self {
            type_tag: value.type_tag()?,
            oid,
            name: name.into(),
            description: description.into(),
            access,
            value,
            last_updated: now,
        })
    }

    /// Store `value` and advance `last_updated` past its previous value.
    pub(crate) fn update(&mut self, value: Value, now: SystemTime) {
        self.value = value;
        self.last_updated = next_stamp(self.last_updated, now);
    }
}

/// `now`, or one nanosecond past `previous` if the clock has not moved on.
pub(crate) fn next_stamp(previous: SystemTime, now: SystemTime) -> SystemTime {
    if now > previous {
        now
    } else {
        previous + Duration::from_nanos(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_new_rejects_untyped_values() {
        let now = UNIX_EPOCH;
        assert!(
            MibEntry::new(oid!(1, 3, 6, 1), "x", "", Access::ReadOnly, Value::Null, now).is_none()
        );
        let entry = MibEntry::new(
            oid!(1, 3, 6, 1),
            "x",
            "",
            Access::ReadOnly,
            Value::Counter32(1),
            now,
        )
        .unwrap();
        assert_eq!(entry.type_tag, TypeTag::Counter32);
    }

    #[test]
    fn test_stamp_strictly_increases_on_stalled_clock() {
        let t = UNIX_EPOCH + Duration::from_secs(100);
        assert!(next_stamp(t, t) > t);
        assert!(next_stamp(t, t - Duration::from_secs(1)) > t);
        assert_eq!(next_stamp(t, t + Duration::from_secs(1)), t + Duration::from_secs(1));
    }
}
