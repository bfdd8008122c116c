//! Static seed for an agent's MIB.
//!
//! The seed covers the system group, the interfaces group with one
//! `ifTable` row per configured interface, and one enterprise object.

use std::time::SystemTime;

use crate::oid::Oid;
use crate::value::Value;

use super::entry::{Access, MibEntry};

/// Well-known OIDs.
pub mod oids {
    use crate::oid;
    use crate::oid::Oid;

    /// The `system` group.
    pub fn system() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1)
    }
    pub fn sys_descr() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)
    }
    pub fn sys_object_id() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 2, 0)
    }
    pub fn sys_uptime() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)
    }
    pub fn sys_contact() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 4, 0)
    }
    pub fn sys_name() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)
    }
    pub fn sys_location() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 1, 6, 0)
    }
    pub fn if_number() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 2, 1, 0)
    }
    /// `ifEntry`; columns hang below it.
    pub fn if_entry() -> Oid {
        oid!(1, 3, 6, 1, 2, 1, 2, 2, 1)
    }
    pub fn if_index() -> Oid {
        if_entry().child(1)
    }
    pub fn if_descr() -> Oid {
        if_entry().child(2)
    }
    pub fn if_type() -> Oid {
        if_entry().child(3)
    }
    pub fn if_in_octets() -> Oid {
        if_entry().child(10)
    }
    pub fn if_out_octets() -> Oid {
        if_entry().child(16)
    }
    /// Enterprise object also used as the simulated trap OID.
    pub fn custom_trap() -> Oid {
        oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1, 1)
    }
    pub fn enterprise() -> Oid {
        oid!(1, 3, 6, 1, 4, 1, 9999, 1, 1)
    }
    /// `linkDown` notification.
    pub fn link_down() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)
    }
    /// `linkUp` notification.
    pub fn link_up() -> Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 4)
    }
}

/// Well-known object names and their OIDs, for name lookups.
const NAMES: &[(&str, &[u32])] = &[
    ("sysDescr", &[1, 3, 6, 1, 2, 1, 1, 1, 0]),
    ("sysObjectID", &[1, 3, 6, 1, 2, 1, 1, 2, 0]),
    ("sysUpTime", &[1, 3, 6, 1, 2, 1, 1, 3, 0]),
    ("sysContact", &[1, 3, 6, 1, 2, 1, 1, 4, 0]),
    ("sysName", &[1, 3, 6, 1, 2, 1, 1, 5, 0]),
    ("sysLocation", &[1, 3, 6, 1, 2, 1, 1, 6, 0]),
    ("system", &[1, 3, 6, 1, 2, 1, 1]),
    ("interfaces", &[1, 3, 6, 1, 2, 1, 2]),
    ("ifNumber", &[1, 3, 6, 1, 2, 1, 2, 1, 0]),
    ("ifTable", &[1, 3, 6, 1, 2, 1, 2, 2]),
    ("ifIndex", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 1]),
    ("ifDescr", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2]),
    ("ifType", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 3]),
    ("ifInOctets", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 10]),
    ("ifOutOctets", &[1, 3, 6, 1, 2, 1, 2, 2, 1, 16]),
    ("customTrap", &[1, 3, 6, 1, 4, 1, 9999, 1, 1, 1]),
];

/// Look up a well-known name, optionally with an instance suffix
/// (`"sysDescr"`, `"ifDescr.2"`).
pub fn resolve_name(name: &str) -> Option<Oid> {
    let (base, suffix) = match name.split_once('.') {
        Some((base, suffix)) => (base, Some(suffix)),
        None => (name, None),
    };
    let (_, arcs) = NAMES.iter().find(|(n, _)| n.eq_ignore_ascii_case(base))?;
    let mut oid = Oid::from_slice(arcs);
    if let Some(suffix) = suffix {
        for part in suffix.split('.') {
            oid = oid.child(part.parse().ok()?);
        }
    }
    Some(oid)
}

/// Known names, for help text.
pub fn known_names() -> impl Iterator<Item = &'static str> {
    NAMES.iter().map(|(n, _)| *n)
}

/// One `ifTable` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSeed {
    pub descr: String,
    /// IANAifType (6 = ethernetCsmacd).
    pub if_type: i64,
    pub in_octets: u32,
    pub out_octets: u32,
}

impl InterfaceSeed {
    /// Ethernet interface with zeroed counters.
    pub fn ethernet(descr: impl Into<String>) -> Self {
        Self {
            descr: descr.into(),
            if_type: 6,
            in_octets: 0,
            out_octets: 0,
        }
    }

    /// Set the starting counter values.
    pub fn counters(mut self, in_octets: u32, out_octets: u32) -> Self {
        self.in_octets = in_octets;
        self.out_octets = out_octets;
        self
    }
}

/// Initial values of an agent's MIB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MibSeed {
    pub sys_descr: String,
    pub sys_object_id: Oid,
    pub sys_contact: String,
    pub sys_name: String,
    pub sys_location: String,
    pub interfaces: Vec<InterfaceSeed>,
    pub custom_value: String,
}

impl Default for MibSeed {
    fn default() -> Self {
        Self {
            sys_descr: format!("snmp-lab agent {}", env!("CARGO_PKG_VERSION")),
            sys_object_id: oids::enterprise(),
            sys_contact: "admin@snmp-agent.local".into(),
            sys_name: "snmp-lab-agent".into(),
            sys_location: "Data Center Rack 1".into(),
            interfaces: vec![
                InterfaceSeed::ethernet("eth0").counters(1_000_000, 2_000_000),
                InterfaceSeed::ethernet("eth1").counters(1_500_000, 2_500_000),
            ],
            custom_value: "Custom Agent Value".into(),
        }
    }
}

impl MibSeed {
    /// Seed named for `agent_id` (`sysName = "SNMP-Agent-<id>"`).
    pub fn for_agent(agent_id: &str) -> Self {
        Self {
            sys_name: format!("SNMP-Agent-{}", agent_id),
            ..Self::default()
        }
    }

    /// Expand into MIB entries stamped with `now`.
    pub fn entries(&self, now: SystemTime) -> Vec<MibEntry> {
        let mut entries = Vec::with_capacity(8 + self.interfaces.len() * 5);
        let mut push = |oid: Oid, name: String, description: &str, access, value: Value| {
            // Seed values are always typed, so this never drops an entry.
            if let Some(entry) = MibEntry::new(oid, name, description, access, value, now) {
                entries.push(entry);
            }
        };

        push(
            oids::sys_descr(),
            "sysDescr".into(),
            "System Description",
            Access::ReadOnly,
            Value::from(self.sys_descr.as_str()),
        );
        push(
            oids::sys_object_id(),
            "sysObjectID".into(),
            "System Object ID",
            Access::ReadOnly,
            Value::ObjectIdentifier(self.sys_object_id.clone()),
        );
        push(
            oids::sys_uptime(),
            "sysUpTime".into(),
            "System Uptime",
            Access::ReadOnly,
            Value::TimeTicks(0),
        );
        push(
            oids::sys_contact(),
            "sysContact".into(),
            "System Contact",
            Access::ReadWrite,
            Value::from(self.sys_contact.as_str()),
        );
        push(
            oids::sys_name(),
            "sysName".into(),
            "System Name",
            Access::ReadWrite,
            Value::from(self.sys_name.as_str()),
        );
        push(
            oids::sys_location(),
            "sysLocation".into(),
            "System Location",
            Access::ReadWrite,
            Value::from(self.sys_location.as_str()),
        );
        push(
            oids::if_number(),
            "ifNumber".into(),
            "Number of Interfaces",
            Access::ReadOnly,
            Value::Integer(self.interfaces.len() as i64),
        );

        for (row, iface) in self.interfaces.iter().enumerate() {
            let index = row as u32 + 1;
            push(
                oids::if_index().child(index),
                format!("ifIndex.{}", index),
                "Interface Index",
                Access::ReadOnly,
                Value::Integer(index as i64),
            );
            push(
                oids::if_descr().child(index),
                format!("ifDescr.{}", index),
                "Interface Description",
                Access::ReadOnly,
                Value::from(iface.descr.as_str()),
            );
            push(
                oids::if_type().child(index),
                format!("ifType.{}", index),
                "Interface Type",
                Access::ReadOnly,
                Value::Integer(iface.if_type),
            );
            push(
                oids::if_in_octets().child(index),
                format!("ifInOctets.{}", index),
                "Interface In Octets",
                Access::ReadOnly,
                Value::Counter32(iface.in_octets),
            );
            push(
                oids::if_out_octets().child(index),
                format!("ifOutOctets.{}", index),
                "Interface Out Octets",
                Access::ReadOnly,
                Value::Counter32(iface.out_octets),
            );
        }

        push(
            oids::custom_trap(),
            "customTrap".into(),
            "Custom Trap OID",
            Access::ReadOnly,
            Value::from(self.custom_value.as_str()),
        );

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_default_seed_layout() {
        let entries = MibSeed::default().entries(UNIX_EPOCH);
        // 7 scalars, 2 rows of 5 columns, 1 enterprise object
        assert_eq!(entries.len(), 18);

        let if_number = entries.iter().find(|e| e.name == "ifNumber").unwrap();
        assert_eq!(if_number.value, Value::Integer(2));

        let descr = entries
            .iter()
            .find(|e| e.oid == oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 2))
            .unwrap();
        assert_eq!(descr.value, Value::from("eth1"));
    }

    #[test]
    fn test_resolve_name() {
        assert_eq!(resolve_name("sysDescr"), Some(oids::sys_descr()));
        assert_eq!(
            resolve_name("ifdescr.2"),
            Some(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 2))
        );
        assert_eq!(resolve_name("ifDescr.x"), None);
        assert_eq!(resolve_name("nope"), None);
    }

    #[test]
    fn test_for_agent_names_system() {
        assert_eq!(MibSeed::for_agent("agent-001").sys_name, "SNMP-Agent-agent-001");
    }
}
