//! Remote device definitions and the device registry.
//!
//! A device pairs a protocol version with the credential that version
//! needs. The pairing is fixed by the constructor ([`SnmpDevice::v1`],
//! [`SnmpDevice::v2c`], [`SnmpDevice::v3`]); the registry refuses
//! hand-assembled devices whose credential does not fit their version.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use parking_lot::RwLock;
use zeroize::Zeroizing;

use crate::clock::{SharedClock, system_clock};
use crate::error::{Error, Result};
use crate::version::Version;

/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// Credential presented to a device.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Community string (SNMPv1 / SNMPv2c).
    Community { community: String },
    /// User-based security (SNMPv3).
    Usm {
        user: String,
        auth_key: Zeroizing<String>,
    },
}

impl Credential {
    /// Community credential.
    pub fn community(community: impl Into<String>) -> Self {
        Credential::Community {
            community: community.into(),
        }
    }

    /// USM credential.
    pub fn usm(user: impl Into<String>, auth_key: impl Into<String>) -> Self {
        Credential::Usm {
            user: user.into(),
            auth_key: Zeroizing::new(auth_key.into()),
        }
    }

    /// Security name: the community string or the USM user name.
    pub fn security_name(&self) -> &str {
        match self {
            Credential::Community { community } => community,
            Credential::Usm { user, .. } => user,
        }
    }

    /// Whether this credential is the kind `version` authenticates with.
    pub fn fits(&self, version: Version) -> bool {
        match self {
            Credential::Community { .. } => version.uses_community(),
            Credential::Usm { .. } => !version.uses_community(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Community { .. } => f
                .debug_struct("Community")
                .field("community", &"<redacted>")
                .finish(),
            Credential::Usm { user, .. } => f
                .debug_struct("Usm")
                .field("user", user)
                .field("auth_key", &"<redacted>")
                .finish(),
        }
    }
}

/// Reachability of a device as seen by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceStatus {
    /// Never probed.
    #[default]
    Unknown,
    /// Last probe succeeded.
    Online,
    /// Last probe failed.
    Offline,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DeviceStatus::Unknown => "unknown",
            DeviceStatus::Online => "online",
            DeviceStatus::Offline => "offline",
        })
    }
}

/// A remote SNMP agent known to the manager.
#[derive(Debug, Clone)]
pub struct SnmpDevice {
    /// Caller-supplied unique id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Host name or address.
    pub address: String,
    /// Agent port.
    pub port: u16,
    /// Credential presented on every request.
    pub credential: Credential,
    /// Protocol version.
    pub version: Version,
    /// Current status, maintained by the monitor.
    pub status: DeviceStatus,
    /// When the device last came online.
    pub last_seen: Option<SystemTime>,
}

impl SnmpDevice {
    fn with(id: String, address: String, version: Version, credential: Credential) -> Self {
        Self {
            name: id.clone(),
            id,
            description: String::new(),
            address,
            port: DEFAULT_PORT,
            credential,
            version,
            status: DeviceStatus::Unknown,
            last_seen: None,
        }
    }

    /// SNMPv1 device using `community`.
    pub fn v1(
        id: impl Into<String>,
        address: impl Into<String>,
        community: impl Into<String>,
    ) -> Self {
        Self::with(
            id.into(),
            address.into(),
            Version::V1,
            Credential::community(community),
        )
    }

    /// SNMPv2c device using `community`.
    pub fn v2c(
        id: impl Into<String>,
        address: impl Into<String>,
        community: impl Into<String>,
    ) -> Self {
        Self::with(
            id.into(),
            address.into(),
            Version::V2c,
            Credential::community(community),
        )
    }

    /// SNMPv3 device using USM `user` and `auth_key`.
    pub fn v3(
        id: impl Into<String>,
        address: impl Into<String>,
        user: impl Into<String>,
        auth_key: impl Into<String>,
    ) -> Self {
        Self::with(
            id.into(),
            address.into(),
            Version::V3,
            Credential::usm(user, auth_key),
        )
    }

    /// Set the display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the agent port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// `address:port`, used in logs and error targets.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Short identifying summary attached to manager results.
    pub fn summary(&self) -> DeviceSummary {
        DeviceSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }

    /// Check the definition is usable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason| Error::InvalidDevice {
            id: self.id.clone(),
            reason,
        };
        if self.id.is_empty() {
            return Err(invalid("empty id"));
        }
        if self.address.is_empty() {
            return Err(invalid("empty address"));
        }
        if !self.credential.fits(self.version) {
            return Err(invalid("credential does not match version"));
        }
        Ok(())
    }
}

/// Identifying fields of a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSummary {
    pub id: String,
    pub name: String,
    pub address: String,
}

/// A device status change produced by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub device_id: String,
    pub from: DeviceStatus,
    pub to: DeviceStatus,
    pub at: SystemTime,
}

/// Registration stamp of a registry entry.
///
/// Every `add_device` issues a new generation, so a probe outcome can be
/// matched against the exact definition that was probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Generation(u64);

#[derive(Debug)]
struct Registered {
    generation: Generation,
    device: SnmpDevice,
}

/// The set of devices a manager knows about.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, Registered>>,
    next_generation: AtomicU64,
    clock: SharedClock,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    /// Create an empty registry on the system clock.
    pub fn new() -> Self {
        Self::with_clock(system_clock())
    }

    /// Create an empty registry reading time from `clock`.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            next_generation: AtomicU64::new(0),
            clock,
        }
    }

    /// Add a device, replacing any device with the same id.
    ///
    /// Returns the replaced device, if there was one.
    pub fn add_device(&self, device: SnmpDevice) -> Result<Option<SnmpDevice>> {
        device.validate()?;
        let id = device.id.clone();
        let generation = Generation(self.next_generation.fetch_add(1, Ordering::Relaxed));
        let replaced = self
            .devices
            .write()
            .insert(id.clone(), Registered { generation, device })
            .map(|r| r.device);
        if replaced.is_some() {
            tracing::info!(snmp.device_id = %id, "device replaced");
        } else {
            tracing::info!(snmp.device_id = %id, "device added");
        }
        Ok(replaced)
    }

    /// Remove a device.
    pub fn remove_device(&self, id: &str) -> Option<SnmpDevice> {
        let removed = self.devices.write().remove(id).map(|r| r.device);
        if removed.is_some() {
            tracing::info!(snmp.device_id = %id, "device removed");
        }
        removed
    }

    /// Copy of the device with `id`.
    pub fn get(&self, id: &str) -> Option<SnmpDevice> {
        self.devices.read().get(id).map(|r| r.device.clone())
    }

    /// Copies of all devices, ordered by id.
    pub fn list(&self) -> Vec<SnmpDevice> {
        self.probe_targets().into_iter().map(|(_, d)| d).collect()
    }

    /// Copies of all devices with their generation, ordered by id.
    pub fn probe_targets(&self) -> Vec<(Generation, SnmpDevice)> {
        let mut devices: Vec<_> = self
            .devices
            .read()
            .values()
            .map(|r| (r.generation, r.device.clone()))
            .collect();
        devices.sort_by(|a, b| a.1.id.cmp(&b.1.id));
        devices
    }

    /// Number of registered devices.
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Whether no devices are registered.
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Apply a probe outcome to the device's status.
    ///
    /// Returns the transition, if the status changed. Coming online stamps
    /// `last_seen`. A device that is no longer registered, or was replaced
    /// since `generation` was read, yields `None`.
    pub fn record_probe(
        &self,
        id: &str,
        generation: Generation,
        reachable: bool,
    ) -> Option<StatusTransition> {
        let mut devices = self.devices.write();
        let entry = devices.get_mut(id)?;
        if entry.generation != generation {
            tracing::debug!(snmp.device_id = %id, "discarding probe of replaced device");
            return None;
        }
        let device = &mut entry.device;
        let to = if reachable {
            DeviceStatus::Online
        } else {
            DeviceStatus::Offline
        };
        if device.status == to {
            return None;
        }
        let at = self.clock.now();
        let from = std::mem::replace(&mut device.status, to);
        if reachable {
            device.last_seen = Some(at);
        }
        Some(StatusTransition {
            device_id: id.to_string(),
            from,
            to,
            at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_constructors_pair_version_and_credential() {
        let d = SnmpDevice::v2c("sw1", "10.0.0.1", "public");
        assert_eq!(d.version, Version::V2c);
        assert_eq!(d.port, DEFAULT_PORT);
        assert_eq!(d.name, "sw1");
        assert!(d.validate().is_ok());

        let d = SnmpDevice::v3("sw2", "10.0.0.2", "admin", "authkey123").port(1161);
        assert_eq!(d.credential.security_name(), "admin");
        assert_eq!(d.endpoint(), "10.0.0.2:1161");
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_mismatched_credential_rejected() {
        let mut d = SnmpDevice::v2c("sw1", "10.0.0.1", "public");
        d.version = Version::V3;
        let registry = DeviceRegistry::new();
        let err = registry.add_device(d).unwrap_err();
        assert!(matches!(err, Error::InvalidDevice { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let d = SnmpDevice::v3("sw2", "10.0.0.2", "admin", "authkey123");
        let text = format!("{:?}", d);
        assert!(!text.contains("authkey123"));
        assert!(text.contains("admin"));

        let c = Credential::community("s3cret");
        assert!(!format!("{:?}", c).contains("s3cret"));
    }

    #[test]
    fn test_add_duplicate_overwrites() {
        let registry = DeviceRegistry::new();
        assert!(
            registry
                .add_device(SnmpDevice::v2c("sw1", "10.0.0.1", "public"))
                .unwrap()
                .is_none()
        );
        let replaced = registry
            .add_device(SnmpDevice::v2c("sw1", "10.0.0.9", "public"))
            .unwrap();
        assert_eq!(replaced.unwrap().address, "10.0.0.1");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("sw1").unwrap().address, "10.0.0.9");
    }

    #[test]
    fn test_list_and_remove() {
        let registry = DeviceRegistry::new();
        registry
            .add_device(SnmpDevice::v2c("b", "10.0.0.2", "public"))
            .unwrap();
        registry
            .add_device(SnmpDevice::v1("a", "10.0.0.1", "public"))
            .unwrap();
        let ids: Vec<_> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(registry.remove_device("a").is_some());
        assert!(registry.remove_device("a").is_none());
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn test_record_probe_transitions() {
        let clock = ManualClock::starting_at(Duration::from_secs(1_000));
        let registry = DeviceRegistry::with_clock(Arc::new(clock.clone()));
        registry
            .add_device(SnmpDevice::v2c("sw1", "10.0.0.1", "public"))
            .unwrap();
        let (generation, _) = registry.probe_targets()[0];

        let t = registry.record_probe("sw1", generation, true).unwrap();
        assert_eq!((t.from, t.to), (DeviceStatus::Unknown, DeviceStatus::Online));
        let first_seen = registry.get("sw1").unwrap().last_seen;
        assert_eq!(first_seen, Some(clock.now()));

        clock.advance(Duration::from_secs(30));
        assert!(registry.record_probe("sw1", generation, true).is_none());
        assert_eq!(registry.get("sw1").unwrap().last_seen, first_seen);

        let t = registry.record_probe("sw1", generation, false).unwrap();
        assert_eq!((t.from, t.to), (DeviceStatus::Online, DeviceStatus::Offline));
        assert!(registry.record_probe("sw1", generation, false).is_none());

        assert!(registry.record_probe("missing", generation, true).is_none());
    }

    #[test]
    fn test_probe_of_replaced_device_is_discarded() {
        let registry = DeviceRegistry::new();
        registry
            .add_device(SnmpDevice::v2c("sw1", "10.0.0.1", "public"))
            .unwrap();
        let (stale, _) = registry.probe_targets()[0];

        registry
            .add_device(SnmpDevice::v2c("sw1", "10.0.0.99", "public"))
            .unwrap();
        let (current, _) = registry.probe_targets()[0];
        assert_ne!(stale, current);

        assert!(registry.record_probe("sw1", stale, false).is_none());
        let device = registry.get("sw1").unwrap();
        assert_eq!(device.status, DeviceStatus::Unknown);
        assert!(registry.record_probe("sw1", current, false).is_some());
    }
}
