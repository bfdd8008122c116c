//! Request authentication for the agent listener.
//!
//! Community strings (v1/v2c) and USM users (v3) map to a read or a
//! read-write grant. Secrets are compared in constant time. A request whose
//! credential matches nothing gets no grant and is dropped unanswered.

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::device::Credential;
use crate::version::Version;

/// What an authenticated request may do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub security_name: String,
    pub can_write: bool,
}

struct UsmUser {
    name: String,
    auth_key: Zeroizing<String>,
    can_write: bool,
}

/// Credentials an agent accepts.
pub struct AccessPolicy {
    read_community: Zeroizing<String>,
    write_community: Zeroizing<String>,
    users: Vec<UsmUser>,
}

impl fmt::Debug for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let users: Vec<&str> = self.users.iter().map(|u| u.name.as_str()).collect();
        f.debug_struct("AccessPolicy")
            .field("users", &users)
            .finish_non_exhaustive()
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new("public", "private")
    }
}

fn secret_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

impl AccessPolicy {
    /// Accept `read` for reads and `write` for reads and writes.
    pub fn new(read: impl Into<String>, write: impl Into<String>) -> Self {
        Self {
            read_community: Zeroizing::new(read.into()),
            write_community: Zeroizing::new(write.into()),
            users: Vec::new(),
        }
    }

    /// Add an SNMPv3 user.
    pub fn user(mut self, name: impl Into<String>, auth_key: impl Into<String>, can_write: bool) -> Self {
        self.users.push(UsmUser {
            name: name.into(),
            auth_key: Zeroizing::new(auth_key.into()),
            can_write,
        });
        self
    }

    /// Grant for a request, or `None` if it must be dropped.
    pub fn authorize(&self, version: Version, credential: &Credential) -> Option<Grant> {
        match (credential, version.uses_community()) {
            (Credential::Community { community }, true) => {
                let can_write = if secret_eq(community, &self.write_community) {
                    true
                } else if secret_eq(community, &self.read_community) {
                    false
                } else {
                    return None;
                };
                Some(Grant {
                    security_name: community.clone(),
                    can_write,
                })
            }
            (Credential::Usm { user, auth_key }, false) => {
                let entry = self.users.iter().find(|u| u.name == *user)?;
                if !secret_eq(auth_key, &entry.auth_key) {
                    return None;
                }
                Some(Grant {
                    security_name: user.clone(),
                    can_write: entry.can_write,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_communities() {
        let policy = AccessPolicy::default();
        let read = policy
            .authorize(Version::V2c, &Credential::community("public"))
            .unwrap();
        assert!(!read.can_write);
        let write = policy
            .authorize(Version::V1, &Credential::community("private"))
            .unwrap();
        assert!(write.can_write);
        assert!(
            policy
                .authorize(Version::V2c, &Credential::community("guess"))
                .is_none()
        );
    }

    #[test]
    fn test_usm_users() {
        let policy = AccessPolicy::default().user("admin", "authkey123", true);
        let grant = policy
            .authorize(Version::V3, &Credential::usm("admin", "authkey123"))
            .unwrap();
        assert_eq!(grant.security_name, "admin");
        assert!(grant.can_write);
        assert!(
            policy
                .authorize(Version::V3, &Credential::usm("admin", "wrong"))
                .is_none()
        );
        assert!(
            policy
                .authorize(Version::V3, &Credential::usm("nobody", "authkey123"))
                .is_none()
        );
    }

    #[test]
    fn test_version_credential_mismatch_dropped() {
        let policy = AccessPolicy::default().user("admin", "authkey123", true);
        assert!(
            policy
                .authorize(Version::V3, &Credential::community("private"))
                .is_none()
        );
        assert!(
            policy
                .authorize(Version::V2c, &Credential::usm("admin", "authkey123"))
                .is_none()
        );
    }
}
