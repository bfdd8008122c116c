//! Managed values and their type tags.

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::oid::Oid;

/// Value held by a MIB entry or carried in a variable binding.
///
/// The last three variants are SNMPv2 exception markers. They only appear
/// in protocol responses, never in a [`MibEntry`](crate::mib::MibEntry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// INTEGER.
    Integer(i64),
    /// OCTET STRING.
    OctetString(Bytes),
    /// OBJECT IDENTIFIER.
    ObjectIdentifier(Oid),
    /// Counter32 (wraps at 2^32).
    Counter32(u32),
    /// Gauge32.
    Gauge32(u32),
    /// TimeTicks, hundredths of a second.
    TimeTicks(u32),
    /// Placeholder value in request varbinds.
    Null,
    /// noSuchObject exception.
    NoSuchObject,
    /// noSuchInstance exception.
    NoSuchInstance,
    /// endOfMibView exception.
    EndOfMibView,
}

/// Type tag of a data-carrying [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Integer,
    OctetString,
    ObjectIdentifier,
    Counter32,
    Gauge32,
    TimeTicks,
}

impl TypeTag {
    /// Short lowercase name, as accepted by [`TypeTag::from_str`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::OctetString => "string",
            Self::ObjectIdentifier => "oid",
            Self::Counter32 => "counter",
            Self::Gauge32 => "gauge",
            Self::TimeTicks => "timeticks",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" | "i" => Ok(Self::Integer),
            "string" | "octet string" | "octetstring" | "s" => Ok(Self::OctetString),
            "oid" | "object identifier" | "objectidentifier" | "o" => Ok(Self::ObjectIdentifier),
            "counter" | "counter32" | "c" => Ok(Self::Counter32),
            "gauge" | "gauge32" | "unsigned" | "u" => Ok(Self::Gauge32),
            "timeticks" | "t" => Ok(Self::TimeTicks),
            _ => Err(Error::UnknownTypeTag(s.to_string())),
        }
    }
}

impl Value {
    /// Build a value of type `tag` from its text form.
    ///
    /// Used for the manager SET surface, where callers supply a value string
    /// plus a type tag name.
    pub fn parse_as(tag: TypeTag, input: &str) -> Result<Self> {
        let invalid = || Error::InvalidValue {
            tag: tag.as_str(),
            input: input.to_string(),
        };
        Ok(match tag {
            TypeTag::Integer => Value::Integer(input.trim().parse().map_err(|_| invalid())?),
            TypeTag::OctetString => Value::OctetString(Bytes::copy_from_slice(input.as_bytes())),
            TypeTag::ObjectIdentifier => {
                Value::ObjectIdentifier(Oid::parse(input.trim()).map_err(|_| invalid())?)
            }
            TypeTag::Counter32 => Value::Counter32(input.trim().parse().map_err(|_| invalid())?),
            TypeTag::Gauge32 => Value::Gauge32(input.trim().parse().map_err(|_| invalid())?),
            TypeTag::TimeTicks => Value::TimeTicks(input.trim().parse().map_err(|_| invalid())?),
        })
    }

    /// Type tag, or `None` for `Null` and the exception markers.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Value::Integer(_) => Some(TypeTag::Integer),
            Value::OctetString(_) => Some(TypeTag::OctetString),
            Value::ObjectIdentifier(_) => Some(TypeTag::ObjectIdentifier),
            Value::Counter32(_) => Some(TypeTag::Counter32),
            Value::Gauge32(_) => Some(TypeTag::Gauge32),
            Value::TimeTicks(_) => Some(TypeTag::TimeTicks),
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
                None
            }
        }
    }

    /// Whether this is one of the SNMPv2 exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// String contents, if this is a UTF-8 OCTET STRING.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::OctetString(bytes) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    /// Unsigned view of counter-like values.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => f.write_str(s),
                Err(_) => {
                    for (i, b) in bytes.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{:02X}", b)?;
                    }
                    Ok(())
                }
            },
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => write!(f, "{}", v),
            Value::Null => f.write_str("NULL"),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
        }
    }
}
