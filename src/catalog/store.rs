//! Authoritative in-memory catalog of standards.
//!
//! Records are keyed by id in a `BTreeMap`; ownership is tracked per origin
//! alongside a reverse index so every record belongs to exactly one origin,
//! the last one that supplied it. All three maps live behind one `RwLock`:
//! readers never observe ownership and records disagreeing mid-update.
//! Poisoning means a writer panicked halfway through a swap, which is treated
//! as fatal.

use crate::catalog::identity::{Origin, StandardId};
use crate::catalog::model::Standard;
use crate::catalog::query::{QuerySpec, sort_and_page};
use crate::errors::{CatalogError, PersistenceError};
use crate::snapshot::SnapshotStore;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

#[derive(Default)]
struct CatalogState {
    records: BTreeMap<StandardId, Standard>,
    owners: BTreeMap<Origin, BTreeSet<StandardId>>,
    owner_by_id: BTreeMap<StandardId, Origin>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// What one `synchronize` call changed.
pub struct SyncSummary {
    /// Records inserted or overwritten (duplicates within a batch count once each).
    pub upserted: usize,
    /// Records dropped because the origin no longer supplies them.
    pub removed: usize,
}

/// Concurrency-safe store of standards with per-origin ownership.
#[derive(Default)]
pub struct StandardsCatalog {
    state: RwLock<CatalogState>,
    snapshots: Option<Arc<dyn SnapshotStore>>,
    // Held across mutate-then-persist so the mirror sees batches in catalog order.
    mirror_order: Mutex<()>,
}

impl StandardsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog that mirrors every synchronize into `store`.
    ///
    /// The mirror is a side channel: write failures are logged and never
    /// change in-memory results. Synchronize calls on such a catalog are
    /// serialized so each origin's snapshot is the batch the catalog applied
    /// last; readers are not blocked while a snapshot is written.
    pub fn with_snapshot_store(store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            state: RwLock::default(),
            snapshots: Some(store),
            mirror_order: Mutex::default(),
        }
    }

    /// Replace `origin`'s contribution with `standards`.
    ///
    /// Ids the origin supplied before but not now are removed; everything in
    /// the batch is inserted or overwritten, last write wins. An id claimed by
    /// another origin moves to `origin`.
    pub fn synchronize(&self, origin: &Origin, standards: Vec<Standard>) -> SyncSummary {
        let _mirror_turn = self
            .snapshots
            .as_ref()
            .map(|_| self.mirror_order.lock().expect("snapshot mirror lock poisoned"));
        let mirrored = self.snapshots.as_ref().map(|_| standards.clone());
        let summary = self.write().replace_origin(origin, standards);
        debug!(
            origin = %origin,
            upserted = summary.upserted,
            removed = summary.removed,
            "synchronized origin"
        );

        if let (Some(store), Some(batch)) = (&self.snapshots, mirrored) {
            if let Err(err) = store.persist(origin, &batch) {
                warn!(origin = %origin, error = %err, "snapshot mirror failed");
            }
        }
        summary
    }

    /// Filtered, sorted, paginated view of the catalog. Never fails; an empty
    /// vector means nothing matched.
    pub fn query(&self, spec: &QuerySpec) -> Vec<Standard> {
        let matched: Vec<Standard> = {
            let state = self.read();
            state
                .records
                .values()
                .filter(|standard| spec.matches(standard, state.owner_by_id.get(&standard.id)))
                .cloned()
                .collect()
        };
        sort_and_page(matched, spec.offset, spec.limit)
    }

    /// Look up a standard by id. `None` is the normal not-found outcome.
    pub fn get_by_id(&self, id: &str) -> Option<Standard> {
        self.read().records.get(&StandardId(id.to_string())).cloned()
    }

    /// Like [`get_by_id`](Self::get_by_id) but reports absence as a typed error.
    pub fn require(&self, id: &str) -> Result<Standard, CatalogError> {
        self.get_by_id(id)
            .ok_or_else(|| CatalogError::NotFound(StandardId(id.to_string())))
    }

    /// Record count per category over the current records.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let state = self.read();
        let mut counts = BTreeMap::new();
        for standard in state.records.values() {
            *counts.entry(standard.category.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Drop every record and all ownership tracking.
    pub fn clear(&self) {
        let mut state = self.write();
        state.records.clear();
        state.owners.clear();
        state.owner_by_id.clear();
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    /// Origins currently owning at least one record, in stable order.
    pub fn origins(&self) -> Vec<Origin> {
        self.read().owners.keys().cloned().collect()
    }

    /// The origin that last supplied `id`.
    pub fn origin_of(&self, id: &str) -> Option<Origin> {
        self.read()
            .owner_by_id
            .get(&StandardId(id.to_string()))
            .cloned()
    }

    /// Ids owned by `origin`, in stable order.
    pub fn ids_for_origin(&self, origin: &Origin) -> Vec<StandardId> {
        self.read()
            .owners
            .get(origin)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Repopulate from the snapshot store, one synchronize per stored origin.
    ///
    /// Returns the number of records restored; a catalog without a store
    /// restores nothing.
    pub fn restore_from_snapshots(&self) -> Result<usize, PersistenceError> {
        let Some(store) = &self.snapshots else {
            return Ok(0);
        };
        let batches = store.load_all()?;
        let mut restored = 0;
        let mut state = self.write();
        for batch in batches {
            restored += batch.records.len();
            state.replace_origin(&batch.origin, batch.records);
        }
        Ok(restored)
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().expect("standards catalog lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state.write().expect("standards catalog lock poisoned")
    }
}

impl CatalogState {
    fn replace_origin(&mut self, origin: &Origin, standards: Vec<Standard>) -> SyncSummary {
        let new_ids: BTreeSet<StandardId> = standards.iter().map(|s| s.id.clone()).collect();
        let previous = self.owners.remove(origin).unwrap_or_default();

        let mut removed = 0;
        for stale in previous.difference(&new_ids) {
            if self.owner_by_id.get(stale) == Some(origin) {
                self.owner_by_id.remove(stale);
                if self.records.remove(stale).is_some() {
                    removed += 1;
                }
            }
        }

        let upserted = standards.len();
        for standard in standards {
            let id = standard.id.clone();
            if let Some(prior) = self.owner_by_id.insert(id.clone(), origin.clone()) {
                if &prior != origin {
                    self.release(&prior, &id);
                }
            }
            self.records.insert(id, standard);
        }

        if !new_ids.is_empty() {
            self.owners.insert(origin.clone(), new_ids);
        }
        SyncSummary { upserted, removed }
    }

    fn release(&mut self, origin: &Origin, id: &StandardId) {
        if let Some(ids) = self.owners.get_mut(origin) {
            ids.remove(id);
            if ids.is_empty() {
                self.owners.remove(origin);
            }
        }
    }
}
