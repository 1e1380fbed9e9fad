//! The archetype store: component mask to archetype table.
//!
//! The store owns every [`Archetype`] for the lifetime of its world, together
//! with the [`ArchetypeIndex`] that makes the key set queryable. The two are
//! only ever mutated through [`ArchetypeStore::get_or_create`], so the index
//! always holds exactly the store's keys.

use crate::archetype::Archetype;
use crate::component::ComponentMask;
use crate::index::{ArchetypeIndex, Supersets};

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Mapping from component mask to the archetype table stored under it.
pub struct ArchetypeStore {
    tables: HashMap<ComponentMask, Archetype>,
    index: ArchetypeIndex,
}

impl ArchetypeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            index: ArchetypeIndex::new(),
        }
    }

    /// Fetch the table for `mask`, creating it with `make` (and indexing the
    /// mask) on first use. Tables are never removed, even when they lose
    /// their last row.
    pub fn get_or_create(
        &mut self,
        mask: ComponentMask,
        make: impl FnOnce() -> Archetype,
    ) -> &mut Archetype {
        match self.tables.entry(mask) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let table = make();
                debug_assert_eq!(table.mask(), mask, "table built for the wrong mask");
                self.index.insert(mask);
                tracing::debug!(mask = ?mask, "created archetype table");
                entry.insert(table)
            }
        }
    }

    /// The table stored under `mask`, if any.
    #[inline]
    pub fn get(&self, mask: ComponentMask) -> Option<&Archetype> {
        self.tables.get(&mask)
    }

    /// Mutable access to the table stored under `mask`, if any.
    #[inline]
    pub fn get_mut(&mut self, mask: ComponentMask) -> Option<&mut Archetype> {
        self.tables.get_mut(&mask)
    }

    /// Number of archetype tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the store holds no tables.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The index over the store's key set.
    #[inline]
    pub fn index(&self) -> &ArchetypeIndex {
        &self.index
    }

    /// Lazily enumerate the masks of all archetypes whose component set is a
    /// superset of `query`.
    #[inline]
    pub fn masks_matching(&self, query: ComponentMask) -> Supersets<'_> {
        self.index.supersets_of(query)
    }
}

impl Default for ArchetypeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArchetypeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchetypeStore")
            .field("tables", &self.tables.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
