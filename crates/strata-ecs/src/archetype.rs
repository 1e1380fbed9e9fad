//! Archetype storage.
//!
//! An [`Archetype`] is the columnar table for one component mask: all
//! entities whose shape has exactly that mask live here. Components are laid
//! out struct-of-arrays, one dense column per component type, plus a parallel
//! `Vec<EntityId>` mapping row index to entity and an entity-to-row map for
//! point lookups. Every row mutation touches all columns at once, so sibling
//! columns always agree on the entity sequence and lockstep iteration needs
//! no per-column bookkeeping.
//!
//! Columns are type-erased behind a small trait object; typed access
//! downcasts to the concrete column. Rows are removed with swap-remove to
//! keep the columns dense.

use crate::component::{Component, ComponentId, ComponentMask};
use crate::entity::EntityId;

use std::any::Any;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Columns
// ---------------------------------------------------------------------------

/// Type-erased operations every column supports regardless of its component
/// type. Typed reads and writes go through the `Any` downcasts.
trait AnyColumn: Send + Sync {
    /// Append one value-initialized component.
    fn push_default(&mut self);
    /// Remove the value at `row`, moving the last value into its place.
    fn swap_remove(&mut self, row: usize);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Dense storage for a single component type.
struct TypedColumn<C: Component> {
    values: Vec<C>,
}

impl<C: Component> TypedColumn<C> {
    fn new() -> Self {
        Self { values: Vec::new() }
    }
}

impl<C: Component> AnyColumn for TypedColumn<C> {
    fn push_default(&mut self) {
        self.values.push(C::default());
    }

    fn swap_remove(&mut self, row: usize) {
        self.values.swap_remove(row);
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Archetype
// ---------------------------------------------------------------------------

/// Columnar table for all entities sharing one component mask.
///
/// Invariant: every column has exactly `entities.len()` values, and index `i`
/// in every column belongs to `entities[i]`.
pub struct Archetype {
    /// The component set this table stores.
    mask: ComponentMask,
    /// One column per component type, sorted by `ComponentId` for
    /// binary-search lookup.
    columns: Vec<(ComponentId, Box<dyn AnyColumn>)>,
    /// Row index to entity id.
    entities: Vec<EntityId>,
    /// Entity id to row index.
    rows: HashMap<EntityId, usize>,
}

impl Archetype {
    /// Create an empty table for `mask`. Columns are added afterwards with
    /// [`add_column`](Self::add_column), one per mask member, before any row
    /// is inserted.
    pub fn new(mask: ComponentMask) -> Self {
        Self {
            mask,
            columns: Vec::new(),
            entities: Vec::new(),
            rows: HashMap::new(),
        }
    }

    /// Add the column for component type `C`.
    ///
    /// # Panics
    ///
    /// Panics if `C` is not a member of the table's mask, if the column
    /// already exists, or if rows have already been inserted.
    pub fn add_column<C: Component>(&mut self) {
        assert!(
            self.mask.contains(C::ID),
            "component {} is not in this archetype's mask",
            std::any::type_name::<C>()
        );
        assert!(
            self.entities.is_empty(),
            "columns must be added before rows"
        );
        let slot = match self.columns.binary_search_by_key(&C::ID, |(id, _)| *id) {
            Err(slot) => slot,
            Ok(_) => panic!(
                "duplicate column for component {}",
                std::any::type_name::<C>()
            ),
        };
        self.columns
            .insert(slot, (C::ID, Box::new(TypedColumn::<C>::new())));
    }

    #[inline]
    fn column_index(&self, id: ComponentId) -> Option<usize> {
        self.columns.binary_search_by_key(&id, |(id, _)| *id).ok()
    }

    fn column<C: Component>(&self) -> &TypedColumn<C> {
        let idx = self.column_index(C::ID).unwrap_or_else(|| {
            panic!(
                "archetype has no column for component {}",
                std::any::type_name::<C>()
            )
        });
        self.columns[idx].1.as_any().downcast_ref().unwrap_or_else(|| {
            panic!(
                "column for id {:?} does not store {} (were all component types \
                 registered in a single register_components! invocation?)",
                C::ID,
                std::any::type_name::<C>()
            )
        })
    }

    fn column_mut<C: Component>(&mut self) -> &mut TypedColumn<C> {
        let idx = self.column_index(C::ID).unwrap_or_else(|| {
            panic!(
                "archetype has no column for component {}",
                std::any::type_name::<C>()
            )
        });
        self.columns[idx]
            .1
            .as_any_mut()
            .downcast_mut()
            .unwrap_or_else(|| {
                panic!(
                    "column for id {:?} does not store {} (were all component types \
                     registered in a single register_components! invocation?)",
                    C::ID,
                    std::any::type_name::<C>()
                )
            })
    }

    /// The component mask identifying this archetype.
    #[inline]
    pub fn mask(&self) -> ComponentMask {
        self.mask
    }

    /// Whether the table stores a column for `id`.
    #[inline]
    pub fn has_component(&self, id: ComponentId) -> bool {
        self.mask.contains(id)
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// The entity ids stored in this table, in row order.
    #[inline]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Whether `entity` has a row in this table.
    #[inline]
    pub fn contains_entity(&self, entity: EntityId) -> bool {
        self.rows.contains_key(&entity)
    }

    /// Insert a row for `entity`, seeding every column with the
    /// value-initialized component. Returns the new row index.
    ///
    /// # Panics
    ///
    /// Panics if `entity` already has a row here.
    pub fn add_row(&mut self, entity: EntityId) -> usize {
        let row = self.entities.len();
        let prev = self.rows.insert(entity, row);
        assert!(prev.is_none(), "entity {entity} already stored in archetype");
        self.entities.push(entity);
        for (_, column) in &mut self.columns {
            column.push_default();
        }
        row
    }

    /// Remove the row for `entity` from every column, swap-filling the gap
    /// with the last row. Returns `false` if the entity has no row here.
    pub fn drop_row(&mut self, entity: EntityId) -> bool {
        let Some(row) = self.rows.remove(&entity) else {
            return false;
        };
        let last = self.entities.len() - 1;
        self.entities.swap_remove(row);
        for (_, column) in &mut self.columns {
            column.swap_remove(row);
        }
        // The previous last entity now occupies `row`.
        if row < last {
            let moved = self.entities[row];
            self.rows.insert(moved, row);
        }
        true
    }

    /// Read the `C` cell of `entity`'s row.
    ///
    /// # Panics
    ///
    /// Panics if the entity has no row here or the mask lacks `C`.
    pub fn get<C: Component>(&self, entity: EntityId) -> &C {
        let row = *self
            .rows
            .get(&entity)
            .unwrap_or_else(|| panic!("entity {entity} is not stored in this archetype"));
        &self.column::<C>().values[row]
    }

    /// Mutably borrow the `C` cell of `entity`'s row.
    ///
    /// # Panics
    ///
    /// Panics if the entity has no row here or the mask lacks `C`.
    pub fn get_mut<C: Component>(&mut self, entity: EntityId) -> &mut C {
        let row = *self
            .rows
            .get(&entity)
            .unwrap_or_else(|| panic!("entity {entity} is not stored in this archetype"));
        &mut self.column_mut::<C>().values[row]
    }

    /// Overwrite the `C` cell of `entity`'s row.
    pub fn set<C: Component>(&mut self, entity: EntityId, value: C) {
        *self.get_mut::<C>(entity) = value;
    }

    /// The dense `C` column, indexed in the same row order as
    /// [`entities`](Self::entities).
    pub fn column_slice<C: Component>(&self) -> &[C] {
        &self.column::<C>().values
    }
}

impl std::fmt::Debug for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archetype")
            .field("mask", &self.mask)
            .field("columns", &self.columns.len())
            .field("rows", &self.entities.len())
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

    crate::register_components! { Pos, Vel }

    fn eid(raw: u64) -> EntityId {
        EntityId::from_raw(raw)
    }

    fn pos_vel_archetype() -> Archetype {
        let mask = ComponentMask::of::<Pos>().with(Vel::ID);
        let mut arch = Archetype::new(mask);
        arch.add_column::<Pos>();
        arch.add_column::<Vel>();
        arch
    }

    #[test]
    fn add_row_seeds_defaults_in_every_column() {
        let mut arch = pos_vel_archetype();
        let row = arch.add_row(eid(7));
        assert_eq!(row, 0);
        assert_eq!(arch.len(), 1);
        assert!(arch.contains_entity(eid(7)));
        assert_eq!(arch.get::<Pos>(eid(7)), &Pos::default());
        assert_eq!(arch.get::<Vel>(eid(7)), &Vel::default());
    }

    #[test]
    fn set_and_get_roundtrip() {
        let mut arch = pos_vel_archetype();
        arch.add_row(eid(1));
        arch.set(eid(1), Pos { x: 3.0, y: 4.0 });
        assert_eq!(arch.get::<Pos>(eid(1)), &Pos { x: 3.0, y: 4.0 });
        // The sibling column is untouched.
        assert_eq!(arch.get::<Vel>(eid(1)), &Vel::default());
    }

    #[test]
    fn drop_row_removes_from_every_column() {
        let mut arch = pos_vel_archetype();
        arch.add_row(eid(1));
        arch.add_row(eid(2));
        assert!(arch.drop_row(eid(1)));
        assert!(!arch.contains_entity(eid(1)));
        assert_eq!(arch.len(), 1);
        assert_eq!(arch.column_slice::<Pos>().len(), 1);
        assert_eq!(arch.column_slice::<Vel>().len(), 1);
        assert!(!arch.drop_row(eid(1)));
    }

    #[test]
    fn swap_remove_repairs_the_displaced_row() {
        let mut arch = pos_vel_archetype();
        arch.add_row(eid(1));
        arch.add_row(eid(2));
        arch.add_row(eid(3));
        arch.set(eid(3), Pos { x: 30.0, y: 0.0 });

        // Removing the first row moves the last entity into its slot.
        arch.drop_row(eid(1));
        assert_eq!(arch.entities(), &[eid(3), eid(2)]);
        assert_eq!(arch.get::<Pos>(eid(3)), &Pos { x: 30.0, y: 0.0 });
    }

    #[test]
    fn columns_iterate_in_lockstep() {
        let mut arch = pos_vel_archetype();
        for raw in 0..5 {
            arch.add_row(eid(raw));
            arch.set(eid(raw), Pos { x: raw as f32, y: 0.0 });
            arch.set(eid(raw), Vel { dx: raw as f32, dy: 0.0 });
        }
        arch.drop_row(eid(2));

        let entities = arch.entities();
        let xs = arch.column_slice::<Pos>();
        let dxs = arch.column_slice::<Vel>();
        assert_eq!(entities.len(), xs.len());
        assert_eq!(entities.len(), dxs.len());
        for (i, &entity) in entities.iter().enumerate() {
            assert_eq!(xs[i].x, entity.to_raw() as f32);
            assert_eq!(dxs[i].dx, entity.to_raw() as f32);
        }
    }

    #[test]
    fn empty_table_survives_its_last_row() {
        let mut arch = pos_vel_archetype();
        arch.add_row(eid(9));
        arch.drop_row(eid(9));
        assert!(arch.is_empty());
        // Still usable afterwards.
        arch.add_row(eid(10));
        assert_eq!(arch.len(), 1);
    }

    #[test]
    #[should_panic(expected = "not in this archetype's mask")]
    fn add_column_outside_mask_panics() {
        let mut arch = Archetype::new(ComponentMask::of::<Pos>());
        arch.add_column::<Vel>();
    }

    #[test]
    #[should_panic(expected = "no column for component")]
    fn get_of_missing_column_panics() {
        let mut arch = Archetype::new(ComponentMask::of::<Pos>());
        arch.add_column::<Pos>();
        arch.add_row(eid(0));
        let _ = arch.get::<Vel>(eid(0));
    }
}
