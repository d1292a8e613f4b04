//! Dynamic Side Table
//!
//! Expando members attached to host objects, keyed by object identity.
//!
//! Entries hold only a [`Weak`] handle to their object, so the table never
//! keeps an object alive. The weak handle also pins the object's allocation,
//! which means an identity cannot be reused by a new object while a stale
//! entry for it is still in the table; a live object's identity therefore
//! always maps to its own entry. Entries of dead objects are swept
//! periodically as new entries are created, or on demand with
//! [`DynamicSideTable::purge_dead`].
//!
//! Concurrency: the identity map is a sharded [`DashMap`], so operations on
//! different objects rarely contend. Each object's members sit behind their
//! own lock; shard locks are released before it is taken.

use crate::host::HostObject;
use crate::value::{ObjectRef, Value};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use dynscope_common::limits::{
    DEFAULT_SIDE_TABLE_SHARDS, DEFAULT_SWEEP_INTERVAL, MAX_SIDE_TABLE_SHARDS,
};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, trace};

/// Per-object members in insertion order.
type Members = IndexMap<String, Value, FxBuildHasher>;

/// Tuning for the side table.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DispatchOptions {
    /// Number of identity-map shards. Clamped to `2..=MAX_SIDE_TABLE_SHARDS`,
    /// then rounded up to a power of two.
    pub shards: usize,
    /// Sweep dead entries after this many new entries. 0 disables sweeping.
    pub sweep_interval: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        DispatchOptions {
            shards: DEFAULT_SIDE_TABLE_SHARDS,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

struct SideEntry {
    owner: Weak<HostObject>,
    members: Arc<RwLock<Members>>,
}

impl SideEntry {
    fn new(object: &ObjectRef) -> Self {
        SideEntry {
            owner: object.downgrade(),
            members: Arc::new(RwLock::new(Members::default())),
        }
    }

    #[inline]
    fn is_live(&self) -> bool {
        self.owner.strong_count() > 0
    }
}

/// Process-wide expando storage, constructed once and shared by reference.
pub struct DynamicSideTable {
    entries: DashMap<usize, SideEntry, FxBuildHasher>,
    created: AtomicUsize,
    sweep_interval: usize,
}

impl Default for DynamicSideTable {
    fn default() -> Self {
        Self::new(&DispatchOptions::default())
    }
}

impl DynamicSideTable {
    pub fn new(options: &DispatchOptions) -> Self {
        let shards = options
            .shards
            .clamp(2, MAX_SIDE_TABLE_SHARDS)
            .next_power_of_two();
        DynamicSideTable {
            entries: DashMap::with_hasher_and_shard_amount(FxBuildHasher, shards),
            created: AtomicUsize::new(0),
            sweep_interval: options.sweep_interval,
        }
    }

    /// Members of `object`, if it has any entry.
    fn members_of(&self, object: &ObjectRef) -> Option<Arc<RwLock<Members>>> {
        self.entries
            .get(&object.identity())
            .map(|entry| entry.members.clone())
    }

    /// Members of `object`, creating the entry atomically on first use.
    fn members_or_insert(&self, object: &ObjectRef) -> Arc<RwLock<Members>> {
        let (members, created) = match self.entries.entry(object.identity()) {
            Entry::Occupied(occupied) => (occupied.get().members.clone(), false),
            Entry::Vacant(vacant) => {
                let entry = SideEntry::new(object);
                let members = entry.members.clone();
                vacant.insert(entry);
                (members, true)
            }
        };
        if created {
            trace!(object = object.identity(), "side table entry created");
            self.maybe_sweep();
        }
        members
    }

    fn maybe_sweep(&self) {
        if self.sweep_interval == 0 {
            return;
        }
        let created = self.created.fetch_add(1, Ordering::Relaxed) + 1;
        if created % self.sweep_interval == 0 {
            self.purge_dead();
        }
    }

    pub fn get(&self, object: &ObjectRef, name: &str) -> Option<Value> {
        let members = self.members_of(object)?;
        let members = members.read().unwrap_or_else(PoisonError::into_inner);
        members.get(name).cloned()
    }

    /// Set `name` on `object`, returning the previous value.
    pub fn set(&self, object: &ObjectRef, name: &str, value: Value) -> Option<Value> {
        let members = self.members_or_insert(object);
        let mut members = members.write().unwrap_or_else(PoisonError::into_inner);
        members.insert(name.to_string(), value)
    }

    pub fn contains(&self, object: &ObjectRef, name: &str) -> bool {
        self.members_of(object).is_some_and(|members| {
            members
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains_key(name)
        })
    }

    /// Remove `name` from `object`. Later members keep their relative order.
    pub fn remove(&self, object: &ObjectRef, name: &str) -> Option<Value> {
        let members = self.members_of(object)?;
        let mut members = members.write().unwrap_or_else(PoisonError::into_inner);
        members.shift_remove(name)
    }

    /// Expando member names of `object` in insertion order.
    pub fn names(&self, object: &ObjectRef) -> Vec<String> {
        self.members_of(object).map_or_else(Vec::new, |members| {
            members
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .keys()
                .cloned()
                .collect()
        })
    }

    /// Drop the entries of objects that no longer exist. Returns how many
    /// entries were removed.
    pub fn purge_dead(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, remaining = self.entries.len(), "purged dead side table entries");
        }
        removed
    }

    /// Number of tracked objects, including dead ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "../tests/side_table_tests.rs"]
mod tests;
