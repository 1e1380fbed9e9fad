//! The [`World`]: one self-contained entity-component database.
//!
//! A world owns the archetype store (tables plus their index) and the entity
//! registry behind a `RefCell`, so every operation takes `&self` and the
//! RAII [`Entity`] handle can unregister itself on drop. The database is
//! single-threaded with respect to mutation, and borrows returned to callers
//! never outlive a structural change: mutating the world while a
//! [`View`](crate::view::View) is live is a deterministic `RefCell` panic
//! rather than reference invalidation.
//!
//! Worlds are plain values. Independent databases are independent `World`s;
//! nothing is process-global except entity id allocation.

use crate::archetype::Archetype;
use crate::component::{Component, ComponentMask};
use crate::entity::{EntityId, EntityRegistry};
use crate::shape::{HasComponent, Shape};
use crate::store::ArchetypeStore;
use crate::EcsError;

use std::cell::{Ref, RefCell};
use std::fmt;
use std::marker::PhantomData;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

pub(crate) struct WorldState {
    pub(crate) store: ArchetypeStore,
    pub(crate) registry: EntityRegistry,
}

/// An in-memory entity-component database.
///
/// ```
/// use strata_ecs::prelude::*;
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Label(u32);
///
/// register_components! { Label }
/// shape! { struct Tagged { Label = Label(7) } }
///
/// let world = World::new();
/// let entity = world.spawn::<Tagged>();
/// assert_eq!(entity.get::<Label>(), Label(7));
/// assert_eq!(world.entity_count(), 1);
/// drop(entity);
/// assert_eq!(world.entity_count(), 0);
/// ```
pub struct World {
    state: RefCell<WorldState>,
}

impl World {
    /// Create an empty world.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(WorldState {
                store: ArchetypeStore::new(),
                registry: EntityRegistry::new(),
            }),
        }
    }

    pub(crate) fn state(&self) -> Ref<'_, WorldState> {
        self.state.borrow()
    }

    /// Create an entity of shape `S`, returning its owning handle.
    ///
    /// Allocates a fresh id, creates and indexes the shape's archetype table
    /// on first use, inserts a row seeded with the shape's defaults, and
    /// records the entity in the registry. Dropping the handle removes the
    /// entity again.
    ///
    /// # Panics
    ///
    /// Panics if a [`View`](crate::view::View) over this world is live.
    pub fn spawn<S: Shape>(&self) -> Entity<'_, S> {
        let id = EntityId::allocate();
        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let table = state.store.get_or_create(S::MASK, || {
                let mut archetype = Archetype::new(S::MASK);
                S::build_columns(&mut archetype);
                archetype
            });
            table.add_row(id);
            S::apply_defaults(table, id);
            state.registry.insert(id, S::MASK);
        }
        tracing::trace!(entity = %id, mask = ?S::MASK, "spawned entity");
        Entity {
            world: self,
            id,
            _shape: PhantomData,
        }
    }

    /// Remove `id`'s row from its archetype and forget the entity. The
    /// archetype table is retained even when it becomes empty.
    pub(crate) fn despawn(&self, id: EntityId) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        match state.registry.remove(id) {
            Some(mask) => {
                let table = state
                    .store
                    .get_mut(mask)
                    .expect("registered mask always has a table");
                let dropped = table.drop_row(id);
                debug_assert!(dropped, "registry and table disagree about {id}");
                drop(guard);
                tracing::trace!(entity = %id, "despawned entity");
            }
            None => {
                drop(guard);
                tracing::warn!(entity = %id, "despawn of unknown entity ignored");
            }
        }
    }

    // -- dynamic, runtime-checked access ------------------------------------

    /// Read a component by entity id, checked at runtime.
    ///
    /// Useful for ids harvested from a [`View`](crate::view::View); for
    /// shape-typed access prefer [`Entity::get`], which is checked at compile
    /// time.
    pub fn get_component<C: Component>(&self, entity: EntityId) -> Result<C, EcsError> {
        let state = self.state.borrow();
        let mask = state
            .registry
            .get(entity)
            .ok_or(EcsError::UnknownEntity { entity })?;
        if !mask.contains(C::ID) {
            return Err(EcsError::MissingComponent {
                entity,
                component: std::any::type_name::<C>(),
            });
        }
        let table = state
            .store
            .get(mask)
            .expect("registered mask always has a table");
        Ok(table.get::<C>(entity).clone())
    }

    /// Overwrite a component by entity id, checked at runtime.
    pub fn set_component<C: Component>(
        &self,
        entity: EntityId,
        value: C,
    ) -> Result<(), EcsError> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let mask = state
            .registry
            .get(entity)
            .ok_or(EcsError::UnknownEntity { entity })?;
        if !mask.contains(C::ID) {
            return Err(EcsError::MissingComponent {
                entity,
                component: std::any::type_name::<C>(),
            });
        }
        let table = state
            .store
            .get_mut(mask)
            .expect("registered mask always has a table");
        table.set(entity, value);
        Ok(())
    }

    /// Whether `entity` is live and its archetype includes `C`.
    pub fn has_component<C: Component>(&self, entity: EntityId) -> bool {
        self.state
            .borrow()
            .registry
            .get(entity)
            .is_some_and(|mask| mask.contains(C::ID))
    }

    /// The component mask of `entity`'s archetype.
    pub fn component_mask(&self, entity: EntityId) -> Result<ComponentMask, EcsError> {
        self.state
            .borrow()
            .registry
            .get(entity)
            .ok_or(EcsError::UnknownEntity { entity })
    }

    /// Whether `entity` is live in this world.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.state.borrow().registry.contains(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// Number of archetype tables (empty tables included).
    pub fn archetype_count(&self) -> usize {
        self.state.borrow().store.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("World")
            .field("entity_count", &state.registry.len())
            .field("archetype_count", &state.store.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Entity handle
// ---------------------------------------------------------------------------

/// Owning handle to one live entity of shape `S`.
///
/// The handle is move-only: it owns the entity's row, and dropping it
/// removes the row from every column of the archetype and unregisters the
/// id. Component access is compile-time checked against the shape; reads
/// return clones, so no borrow of the database escapes the call.
pub struct Entity<'w, S: Shape> {
    world: &'w World,
    id: EntityId,
    _shape: PhantomData<S>,
}

impl<'w, S: Shape> Entity<'w, S> {
    /// The entity's id. Stable for the life of the handle.
    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The world this entity lives in.
    #[inline]
    pub fn world(&self) -> &'w World {
        self.world
    }

    /// Read the entity's `C` component, by value.
    ///
    /// Only compiles when the shape includes `C`.
    pub fn get<C>(&self) -> C
    where
        C: Component,
        S: HasComponent<C>,
    {
        let state = self.world.state();
        let mask = state
            .registry
            .get(self.id)
            .expect("live handle points to a registered entity");
        let table = state
            .store
            .get(mask)
            .expect("registered mask always has a table");
        table.get::<C>(self.id).clone()
    }

    /// Overwrite the entity's `C` component.
    ///
    /// Only compiles when the shape includes `C`.
    ///
    /// # Panics
    ///
    /// Panics if a [`View`](crate::view::View) over this world is live.
    pub fn set<C>(&self, value: C)
    where
        C: Component,
        S: HasComponent<C>,
    {
        let mut guard = self.world.state.borrow_mut();
        let state = &mut *guard;
        let mask = state
            .registry
            .get(self.id)
            .expect("live handle points to a registered entity");
        let table = state
            .store
            .get_mut(mask)
            .expect("registered mask always has a table");
        table.set(self.id, value);
    }

    /// Whether the entity's registered archetype includes `C`.
    ///
    /// This is a runtime mask test, deliberately not constrained to the
    /// shape, so it accepts any component type.
    pub fn has<C: Component>(&self) -> bool {
        self.world
            .state()
            .registry
            .get(self.id)
            .is_some_and(|mask| mask.contains(C::ID))
    }

    /// Destroy the entity now. Equivalent to dropping the handle.
    pub fn despawn(self) {}
}

impl<S: Shape> Drop for Entity<'_, S> {
    fn drop(&mut self) {
        self.world.despawn(self.id);
    }
}

impl<S: Shape> fmt::Debug for Entity<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("mask", &S::MASK)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Vel {
        dx: f32,
        dy: f32,
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Health(u32);

    crate::register_components! { Pos, Vel, Health }

    crate::shape! {
        struct Walker { Pos }
    }

    crate::shape! {
        struct Mover {
            Pos,
            Vel = Vel { dx: 1.0, dy: 2.0 },
        }
    }

    // Same component set as Mover, different defaults.
    crate::shape! {
        struct Drifter {
            Pos = Pos { x: -1.0, y: -1.0 },
            Vel,
        }
    }

    #[test]
    fn spawn_registers_and_seeds_defaults() {
        let world = World::new();
        let mover = world.spawn::<Mover>();

        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.archetype_count(), 1);
        assert!(world.contains(mover.id()));
        assert_eq!(mover.get::<Pos>(), Pos::default());
        assert_eq!(mover.get::<Vel>(), Vel { dx: 1.0, dy: 2.0 });
    }

    #[test]
    fn set_then_get_roundtrips() {
        let world = World::new();
        let walker = world.spawn::<Walker>();
        walker.set(Pos { x: 9.0, y: 8.0 });
        assert_eq!(walker.get::<Pos>(), Pos { x: 9.0, y: 8.0 });
    }

    #[test]
    fn dropping_the_handle_removes_the_entity() {
        let world = World::new();
        let walker = world.spawn::<Walker>();
        let id = walker.id();
        drop(walker);

        assert_eq!(world.entity_count(), 0);
        assert!(!world.contains(id));
        assert!(world.get_component::<Pos>(id).is_err());
        // The archetype table outlives its rows.
        assert_eq!(world.archetype_count(), 1);
    }

    #[test]
    fn explicit_despawn_matches_drop() {
        let world = World::new();
        let walker = world.spawn::<Walker>();
        let id = walker.id();
        walker.despawn();
        assert!(!world.contains(id));
    }

    #[test]
    fn has_is_a_runtime_mask_test() {
        let world = World::new();
        let walker = world.spawn::<Walker>();
        assert!(walker.has::<Pos>());
        assert!(!walker.has::<Vel>());
        assert!(!walker.has::<Health>());
    }

    #[test]
    fn shapes_with_equal_masks_share_a_table() {
        let world = World::new();
        let mover = world.spawn::<Mover>();
        let drifter = world.spawn::<Drifter>();

        assert_eq!(world.archetype_count(), 1);
        // Each spawn applied its own shape's defaults.
        assert_eq!(mover.get::<Vel>(), Vel { dx: 1.0, dy: 2.0 });
        assert_eq!(drifter.get::<Pos>(), Pos { x: -1.0, y: -1.0 });
        assert_eq!(drifter.get::<Vel>(), Vel::default());
    }

    #[test]
    fn handles_get_distinct_ids() {
        let world = World::new();
        let a = world.spawn::<Walker>();
        let b = world.spawn::<Walker>();
        let c = world.spawn::<Mover>();
        assert_ne!(a.id(), b.id());
        assert_ne!(b.id(), c.id());
    }

    #[test]
    fn dynamic_access_is_checked() {
        let world = World::new();
        let walker = world.spawn::<Walker>();
        let id = walker.id();

        assert_eq!(world.get_component::<Pos>(id), Ok(Pos::default()));
        world.set_component(id, Pos { x: 5.0, y: 5.0 }).unwrap();
        assert_eq!(world.get_component::<Pos>(id), Ok(Pos { x: 5.0, y: 5.0 }));

        assert!(matches!(
            world.get_component::<Vel>(id),
            Err(EcsError::MissingComponent { .. })
        ));
        assert!(world.has_component::<Pos>(id));
        assert!(!world.has_component::<Vel>(id));

        let ghost = EntityId::from_raw(u64::MAX);
        assert!(matches!(
            world.get_component::<Pos>(ghost),
            Err(EcsError::UnknownEntity { .. })
        ));
    }

    #[test]
    fn component_mask_reports_the_shape_mask() {
        let world = World::new();
        let mover = world.spawn::<Mover>();
        assert_eq!(world.component_mask(mover.id()), Ok(<Mover as Shape>::MASK));
    }

    #[test]
    fn worlds_are_independent() {
        let world_a = World::new();
        let world_b = World::new();
        let a = world_a.spawn::<Walker>();

        assert_eq!(world_b.entity_count(), 0);
        assert!(!world_b.contains(a.id()));
    }

    #[test]
    #[should_panic(expected = "already borrowed")]
    fn spawning_during_view_iteration_panics() {
        let world = World::new();
        let _walker = world.spawn::<Walker>();
        let view = world.view::<(Pos,)>();
        let _rows = view.iter();
        let _clash = world.spawn::<Walker>();
    }
}
