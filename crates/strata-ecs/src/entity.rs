//! Entity identifiers and the entity registry.
//!
//! An [`EntityId`] is a plain 64-bit value drawn from a process-wide atomic
//! counter. Ids are unique across every [`World`](crate::world::World) in the
//! process and are never reused. Allocation is the one synchronized operation
//! in the database: a relaxed `fetch_add` keeps ids unique even when handles
//! are constructed from multiple threads (registration itself still requires
//! external locking, see the crate docs).
//!
//! The [`EntityRegistry`] records which archetype owns each live entity, keyed
//! by the archetype's component mask.

use crate::component::ComponentMask;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(0);

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A 64-bit entity identifier, monotonically allocated, never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh id from the process-wide counter.
    ///
    /// Uniqueness holds under concurrent allocation; ordering between
    /// allocations on different threads is not specified.
    #[inline]
    pub fn allocate() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw `u64` representation.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityRegistry
// ---------------------------------------------------------------------------

/// Mapping from live entity id to the mask of its owning archetype.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    map: HashMap<EntityId, ComponentMask>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity` as owned by the archetype under `mask`.
    pub fn insert(&mut self, entity: EntityId, mask: ComponentMask) {
        let prev = self.map.insert(entity, mask);
        debug_assert!(prev.is_none(), "entity {entity} registered twice");
    }

    /// Remove `entity`, returning its archetype mask if it was registered.
    pub fn remove(&mut self, entity: EntityId) -> Option<ComponentMask> {
        self.map.remove(&entity)
    }

    /// The archetype mask of `entity`, if registered.
    #[inline]
    pub fn get(&self, entity: EntityId) -> Option<ComponentMask> {
        self.map.get(&entity).copied()
    }

    /// Whether `entity` is registered.
    #[inline]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.map.contains_key(&entity)
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no entities are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate the registered `(entity, mask)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, ComponentMask)> + '_ {
        self.map.iter().map(|(&entity, &mask)| (entity, mask))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
