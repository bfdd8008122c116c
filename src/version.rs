//! SNMP version enumeration.

use std::str::FromStr;

use crate::error::Error;

/// SNMP protocol version spoken with a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Version {
    /// SNMPv1 (RFC 1157), community-based.
    V1,
    /// SNMPv2c (RFC 1901), community-based.
    #[default]
    V2c,
    /// SNMPv3 (RFC 3411-3418), user-based security.
    V3,
}

impl Version {
    /// Whether this version authenticates with a community string.
    pub const fn uses_community(self) -> bool {
        matches!(self, Version::V1 | Version::V2c)
    }

    /// Whether responses use SNMPv2 exception values (endOfMibView etc.)
    /// rather than v1 error statuses.
    pub const fn has_exception_values(self) -> bool {
        !matches!(self, Version::V1)
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().trim_start_matches("snmp") {
            "1" | "v1" => Ok(Version::V1),
            "2c" | "v2c" | "2" => Ok(Version::V2c),
            "3" | "v3" => Ok(Version::V3),
            _ => Err(Error::InvalidValue {
                tag: "version",
                input: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Version::V1 => write!(f, "SNMPv1"),
            Version::V2c => write!(f, "SNMPv2c"),
            Version::V3 => write!(f, "SNMPv3"),
        }
    }
}
