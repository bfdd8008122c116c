//! Well-known OID name hints.
//!
//! Friendly names for the objects the built-in agents serve. This is not
//! MIB support; the table is the agents' seed.

use crate::Oid;
use crate::mib::{known_names, resolve_name};

/// Friendly name for `oid`, with its instance suffix (`ifDescr.2`).
///
/// The longest known prefix wins. Returns `None` if nothing matches.
pub fn lookup(oid: &Oid) -> Option<String> {
    let (name, base) = known_names()
        .filter_map(|name| resolve_name(name).map(|base| (name, base)))
        .filter(|(_, base)| oid.starts_with(base))
        .max_by_key(|(_, base)| base.len())?;

    let suffix = &oid.arcs()[base.len()..];
    if suffix.is_empty() {
        return Some(name.to_string());
    }
    let suffix: Vec<String> = suffix.iter().map(u32::to_string).collect();
    Some(format!("{}.{}", name, suffix.join(".")))
}

/// Parse an OID from dotted notation or a well-known name.
///
/// Accepts:
/// - Dotted notation: "1.3.6.1.2.1.1.1.0"
/// - Well-known names with an optional instance: "sysDescr", "ifDescr.2", "system"
pub fn parse_oid(s: &str) -> Result<Oid, String> {
    if s.trim_start_matches('.')
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
    {
        return Oid::parse(s).map_err(|e| format!("invalid OID '{}': {}", s, e));
    }

    resolve_name(s).ok_or_else(|| {
        format!(
            "unknown OID name '{}'; use dotted notation (e.g., 1.3.6.1.2.1.1.1.0)",
            s
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_scalar() {
        let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(lookup(&oid).as_deref(), Some("sysDescr"));
    }

    #[test]
    fn test_lookup_column_instance() {
        let oid = Oid::from_slice(&[1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 2]);
        assert_eq!(lookup(&oid).as_deref(), Some("ifDescr.2"));
    }

    #[test]
    fn test_lookup_not_found() {
        let oid = Oid::from_slice(&[1, 3, 6, 1, 99, 99, 99]);
        assert_eq!(lookup(&oid), None);
    }

    #[test]
    fn test_parse_dotted() {
        let oid = parse_oid("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
    }

    #[test]
    fn test_parse_well_known() {
        let oid = parse_oid("ifIndex").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 2, 2, 1, 1]);

        let oid = parse_oid("SYSTEM").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1]);
    }

    #[test]
    fn test_parse_unknown_name() {
        assert!(parse_oid("unknownOid").is_err());
        assert!(parse_oid("1.3.x").is_err());
    }
}
