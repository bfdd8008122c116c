//! Sorted OID table backing GET and GETNEXT lookups.

use crate::oid::Oid;

/// OID-ordered table of values.
///
/// Entries live in a vector sorted by [`Oid`] order, so exact lookups and
/// successor lookups are both a binary search. Insertion is `O(n)`, which is
/// fine for a table populated once from a seed.
///
/// ```rust
/// use snmp_lab::handler::OidTable;
/// use snmp_lab::oid;
///
/// let mut table = OidTable::new();
/// table.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), "sysUpTime");
/// table.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "sysDescr");
///
/// let (next, name) = table.get_next(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).unwrap();
/// assert_eq!(next, &oid!(1, 3, 6, 1, 2, 1, 1, 3, 0));
/// assert_eq!(*name, "sysUpTime");
/// ```
#[derive(Debug, Clone)]
pub struct OidTable<V> {
    entries: Vec<(Oid, V)>,
}

impl<V> OidTable<V> {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a table with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    fn position(&self, oid: &Oid) -> Result<usize, usize> {
        self.entries.binary_search_by(|(o, _)| o.cmp(oid))
    }

    /// Insert a value, keeping the table sorted.
    ///
    /// Returns the previous value if the OID was already present.
    pub fn insert(&mut self, oid: Oid, value: V) -> Option<V> {
        match self.position(&oid) {
            Ok(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (oid, value));
                None
            }
        }
    }

    /// Value for an exact OID match.
    pub fn get(&self, oid: &Oid) -> Option<&V> {
        self.position(oid).ok().map(|idx| &self.entries[idx].1)
    }

    /// Mutable value for an exact OID match.
    pub fn get_mut(&mut self, oid: &Oid) -> Option<&mut V> {
        match self.position(oid) {
            Ok(idx) => Some(&mut self.entries[idx].1),
            Err(_) => None,
        }
    }

    /// First entry whose OID is strictly greater than `oid`.
    ///
    /// `oid` need not be present in the table.
    pub fn get_next(&self, oid: &Oid) -> Option<(&Oid, &V)> {
        let idx = match self.position(oid) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        };
        self.entries.get(idx).map(|(o, v)| (o, v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in OID order.
    pub fn iter(&self) -> impl Iterator<Item = (&Oid, &V)> {
        self.entries.iter().map(|(o, v)| (o, v))
    }

    /// Iterate mutably in OID order, over entries whose OID starts with `prefix`.
    pub fn subtree_mut<'a>(
        &'a mut self,
        prefix: &'a Oid,
    ) -> impl Iterator<Item = (&'a Oid, &'a mut V)> + 'a {
        let start = match self.position(prefix) {
            Ok(idx) | Err(idx) => idx,
        };
        self.entries[start..]
            .iter_mut()
            .take_while(move |(o, _)| o.starts_with(prefix))
            .map(|(o, v)| (&*o, v))
    }
}

impl<V> Default for OidTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(Oid, V)> for OidTable<V> {
    fn from_iter<I: IntoIterator<Item = (Oid, V)>>(iter: I) -> Self {
        let mut table = OidTable::new();
        for (oid, value) in iter {
            table.insert(oid, value);
        }
        table
    }
}
