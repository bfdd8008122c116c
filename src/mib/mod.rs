//! Agent-side MIB store.
//!
//! [`MibStore`] keeps [`MibEntry`]s in an OID-ordered [`OidTable`] behind a
//! single mutex. Entries are created once from a seed; afterwards they only
//! change through [`MibStore::set`] (access-checked) or
//! [`MibStore::refresh`] (the agent's own volatile updates).

mod entry;
mod seed;

pub use entry::{Access, MibEntry};
pub use seed::{InterfaceSeed, MibSeed, known_names, oids, resolve_name};

use parking_lot::Mutex;

use crate::clock::{SharedClock, system_clock};
use crate::error::{Error, Result};
use crate::handler::{
    BoxFuture, GetNextResult, GetResult, MibHandler, OidTable, RequestContext, SetResult,
};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::VarBind;

/// OID-ordered table of managed objects.
#[derive(Debug)]
pub struct MibStore {
    table: Mutex<OidTable<MibEntry>>,
    clock: SharedClock,
}

impl MibStore {
    /// Store holding `entries`, on the system clock.
    pub fn new(entries: impl IntoIterator<Item = MibEntry>) -> Self {
        Self::with_clock(entries, system_clock())
    }

    /// Store holding `entries`, reading time from `clock`.
    pub fn with_clock(entries: impl IntoIterator<Item = MibEntry>, clock: SharedClock) -> Self {
        let table: OidTable<MibEntry> = entries.into_iter().map(|e| (e.oid.clone(), e)).collect();
        tracing::debug!(snmp.entries = table.len(), "MIB initialized");
        Self {
            table: Mutex::new(table),
            clock,
        }
    }

    /// Store populated from `seed`.
    pub fn seeded(seed: &MibSeed, clock: SharedClock) -> Self {
        let now = clock.now();
        Self::with_clock(seed.entries(now), clock)
    }

    /// Entry at exactly `oid`.
    pub fn get(&self, oid: &Oid) -> Result<MibEntry> {
        self.table
            .lock()
            .get(oid)
            .cloned()
            .ok_or_else(|| Error::NoSuchObject { oid: oid.clone() })
    }

    /// Replace the value of a writable entry.
    ///
    /// On failure the entry is left untouched.
    pub fn set(&self, oid: &Oid, value: Value) -> Result<()> {
        let now = self.clock.now();
        let mut table = self.table.lock();
        let entry = table
            .get_mut(oid)
            .ok_or_else(|| Error::NoSuchObject { oid: oid.clone() })?;
        check_write(entry, &value)?;
        entry.update(value, now);
        tracing::debug!(snmp.oid = %oid, snmp.name = %entry.name, "MIB entry set");
        Ok(())
    }

    /// Whether [`set`](MibStore::set) would accept `value`, without applying it.
    pub fn check_set(&self, oid: &Oid, value: &Value) -> Result<()> {
        let table = self.table.lock();
        let entry = table
            .get(oid)
            .ok_or_else(|| Error::NoSuchObject { oid: oid.clone() })?;
        check_write(entry, value)
    }

    /// First entry strictly after `oid`. `oid` need not exist.
    pub fn get_next(&self, oid: &Oid) -> Result<MibEntry> {
        self.table
            .lock()
            .get_next(oid)
            .map(|(_, entry)| entry.clone())
            .ok_or_else(|| Error::EndOfMib { oid: oid.clone() })
    }

    /// Recompute the value of `oid`, ignoring access control.
    ///
    /// `update` receives the current value. The result must keep the
    /// entry's type.
    pub fn refresh<F>(&self, oid: &Oid, update: F) -> Result<()>
    where
        F: FnOnce(&Value) -> Value,
    {
        let now = self.clock.now();
        let mut table = self.table.lock();
        let entry = table
            .get_mut(oid)
            .ok_or_else(|| Error::NoSuchObject { oid: oid.clone() })?;
        let value = update(&entry.value);
        check_type(entry, &value)?;
        entry.update(value, now);
        Ok(())
    }

    /// [`refresh`](MibStore::refresh) every entry under `prefix`.
    ///
    /// Returns the number of entries updated. Stops at the first type
    /// mismatch; entries already updated keep their new values.
    pub fn refresh_subtree<F>(&self, prefix: &Oid, mut update: F) -> Result<usize>
    where
        F: FnMut(&Oid, &Value) -> Value,
    {
        let now = self.clock.now();
        let mut table = self.table.lock();
        let mut updated = 0;
        for (oid, entry) in table.subtree_mut(prefix) {
            let value = update(oid, &entry.value);
            check_type(entry, &value)?;
            entry.update(value, now);
            updated += 1;
        }
        Ok(updated)
    }

    /// Ordered copy of every entry.
    pub fn snapshot(&self) -> Vec<MibEntry> {
        self.table.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }
}

fn check_type(entry: &MibEntry, value: &Value) -> Result<()> {
    match value.type_tag() {
        Some(tag) if tag == entry.type_tag => Ok(()),
        Some(actual) => Err(Error::WrongType {
            oid: entry.oid.clone(),
            expected: entry.type_tag,
            actual,
        }),
        None => Err(Error::InvalidValue {
            tag: entry.type_tag.as_str(),
            input: value.to_string(),
        }),
    }
}

fn check_write(entry: &MibEntry, value: &Value) -> Result<()> {
    if !entry.access.is_writable() {
        return Err(Error::AccessDenied {
            oid: entry.oid.clone(),
        });
    }
    check_type(entry, value)
}

/// Whether some entry is an instance of the object type `oid` would belong to.
fn serves_object(table: &OidTable<MibEntry>, oid: &Oid) -> bool {
    let Some(object) = oid.parent().filter(|p| !p.is_empty()) else {
        return false;
    };
    table
        .get_next(&object)
        .is_some_and(|(next, _)| next.starts_with(&object))
}

fn set_result(result: Result<()>) -> SetResult {
    match result {
        Ok(()) => SetResult::Ok,
        Err(Error::AccessDenied { .. }) => SetResult::NotWritable,
        Err(Error::NoSuchObject { .. }) => SetResult::NoCreation,
        Err(Error::WrongType { .. }) | Err(Error::InvalidValue { .. }) => SetResult::WrongType,
        Err(_) => SetResult::CommitFailed,
    }
}

impl MibHandler for MibStore {
    fn get<'a>(&'a self, _ctx: &'a RequestContext, oid: &'a Oid) -> BoxFuture<'a, GetResult> {
        let table = self.table.lock();
        let result = match table.get(oid) {
            Some(entry) => GetResult::Value(entry.value.clone()),
            None if serves_object(&table, oid) => GetResult::NoSuchInstance,
            None => GetResult::NoSuchObject,
        };
        drop(table);
        Box::pin(async move { result })
    }

    fn get_next<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        oid: &'a Oid,
    ) -> BoxFuture<'a, GetNextResult> {
        let result = match self.get_next(oid) {
            Ok(entry) => GetNextResult::Value(VarBind::new(entry.oid, entry.value)),
            Err(_) => GetNextResult::EndOfMibView,
        };
        Box::pin(async move { result })
    }

    fn test_set<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        oid: &'a Oid,
        value: &'a Value,
    ) -> BoxFuture<'a, SetResult> {
        let result = set_result(self.check_set(oid, value));
        Box::pin(async move { result })
    }

    fn commit_set<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        oid: &'a Oid,
        value: &'a Value,
    ) -> BoxFuture<'a, SetResult> {
        let result = set_result(self.set(oid, value.clone()));
        Box::pin(async move { result })
    }
}
