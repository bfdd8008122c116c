//! Object Identifier (OID) type.
//!
//! OIDs are stored as a sequence of `u32` arcs. Ordering is arc-by-arc
//! numeric comparison, with a strict prefix ordering before any OID that
//! extends it. This is the order GETNEXT and walks depend on; comparing the
//! dotted text would put `1.3.6.1.10` before `1.3.6.1.2`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::error::{Error, OidErrorKind, Result};

/// Maximum number of arcs accepted when parsing (RFC 2578 section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Most OIDs seen in practice fit in 16 arcs, so arcs are stored inline up
/// to that length.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted notation (e.g. `"1.3.6.1.2.1.1.1.0"`).
    ///
    /// A single leading dot is accepted (`".1.3.6.1"`), as printed by net-snmp.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in trimmed.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s));
            }
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::ArcOverflow, s))?;
            arcs.push(arc);
        }

        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }

        Ok(Self { arcs })
    }

    /// The arcs of this OID.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Whether the OID has no arcs.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether `prefix` matches the leading arcs of this OID.
    ///
    /// Comparison is per arc, so `1.3.6.1.2.1.2.2.1.10` does not start with
    /// `1.3.6.1.2.1.2.2.1.1` even though the dotted text does.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.arcs.starts_with(&prefix.arcs)
    }

    /// The OID with its last arc removed, or `None` for an empty OID.
    pub fn parent(&self) -> Option<Oid> {
        let (_, head) = self.arcs.split_last()?;
        Some(Self::from_slice(head))
    }

    /// A new OID with `arc` appended.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Self { arcs }
    }

    /// The last arc, if any (the instance index for table columns).
    pub fn last_arc(&self) -> Option<u32> {
        self.arcs.last().copied()
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> Ordering {
        // Slice ordering is element-wise numeric with shorter-prefix-first,
        // exactly the OID order.
        self.arcs.as_slice().cmp(other.arcs.as_slice())
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::from_slice(&arcs)
    }
}

/// Build an [`Oid`] from literal arcs.
///
/// ```rust
/// use snmp_lab::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
