//! Views: lazy queries over all entities carrying a component set.
//!
//! A [`View`] over the query set `Q` yields `(entity, (&C1, ..., &Ck))` for
//! every live entity whose archetype mask is a superset of `Q`'s mask. The
//! iteration is two-level: the outer cursor walks the archetype index's
//! superset enumeration; the inner cursor walks rows of the current table,
//! reading all requested columns in lockstep at the same row index. Column
//! slices are resolved once per archetype, so advancing a row is plain
//! indexing.
//!
//! Query sets are tuples of component types, arity 0 to 8. The unit tuple
//! `()` is the empty query and matches every archetype: iterating
//! `world.view::<()>()` visits every live entity exactly once.
//!
//! Views borrow the world: the order of rows is deterministic for a fixed
//! snapshot, and structurally mutating the world while a view is live is a
//! `RefCell` borrow panic rather than reference invalidation.

use crate::archetype::Archetype;
use crate::component::{Component, ComponentMask};
use crate::entity::EntityId;
use crate::index::Supersets;
use crate::store::ArchetypeStore;
use crate::world::{World, WorldState};

use std::cell::Ref;
use std::fmt;
use std::marker::PhantomData;

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// A queryable set of component types: a tuple `(C1, ..., Ck)` with
/// `0 <= k <= 8`.
///
/// The set's mask drives archetype matching; the two associated types carry
/// the per-archetype column slices and the per-row reference tuple.
pub trait ComponentSet: 'static {
    /// The OR of the member components' id bits.
    const MASK: ComponentMask;

    /// Dense column slices for one archetype, one per member.
    type Slices<'a>;

    /// The reference tuple yielded per row.
    type Refs<'a>;

    /// Resolve the member columns of `archetype`.
    ///
    /// # Panics
    ///
    /// Panics if the archetype's mask is not a superset of `MASK`; callers
    /// only pass archetypes matched by the index.
    fn slices(archetype: &Archetype) -> Self::Slices<'_>;

    /// Read one row out of resolved slices.
    fn refs<'a>(slices: &Self::Slices<'a>, row: usize) -> Self::Refs<'a>;
}

/// The empty query: matches every archetype, yields no component refs.
impl ComponentSet for () {
    const MASK: ComponentMask = ComponentMask::EMPTY;

    type Slices<'a> = ();
    type Refs<'a> = ();

    fn slices(_archetype: &Archetype) -> Self::Slices<'_> {}

    fn refs<'a>(_slices: &Self::Slices<'a>, _row: usize) -> Self::Refs<'a> {}
}

macro_rules! impl_component_set {
    ( $( $c:ident ),+ ) => {
        impl<$( $c: Component ),+> ComponentSet for ($( $c, )+) {
            const MASK: ComponentMask =
                ComponentMask::EMPTY $( .with($c::ID) )+;

            type Slices<'a> = ($( &'a [$c], )+);
            type Refs<'a> = ($( &'a $c, )+);

            fn slices(archetype: &Archetype) -> Self::Slices<'_> {
                ($( archetype.column_slice::<$c>(), )+)
            }

            fn refs<'a>(slices: &Self::Slices<'a>, row: usize) -> Self::Refs<'a> {
                // Slices are Copy, so read them out of the borrow and index
                // with the full column lifetime.
                #[allow(non_snake_case)]
                let ($( $c, )+) = *slices;
                ($( &$c[row], )+)
            }
        }
    };
}

impl_component_set!(C1);
impl_component_set!(C1, C2);
impl_component_set!(C1, C2, C3);
impl_component_set!(C1, C2, C3, C4);
impl_component_set!(C1, C2, C3, C4, C5);
impl_component_set!(C1, C2, C3, C4, C5, C6);
impl_component_set!(C1, C2, C3, C4, C5, C6, C7);
impl_component_set!(C1, C2, C3, C4, C5, C6, C7, C8);

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// A lazy query over one world. Obtained from [`World::view`]; iterate with
/// [`iter`](View::iter) or a `for` loop over `&view`.
///
/// The view holds a shared borrow of the world for its whole lifetime.
pub struct View<'w, Q: ComponentSet> {
    state: Ref<'w, WorldState>,
    _query: PhantomData<Q>,
}

impl World {
    /// Open a view over the component set `Q`.
    ///
    /// ```ignore
    /// for (entity, (pos, vel)) in &world.view::<(Position, Velocity)>() {
    ///     // every live entity whose shape includes both components
    /// }
    /// ```
    pub fn view<Q: ComponentSet>(&self) -> View<'_, Q> {
        View {
            state: self.state(),
            _query: PhantomData,
        }
    }
}

impl<'w, Q: ComponentSet> View<'w, Q> {
    /// Begin iterating the view's rows.
    pub fn iter(&self) -> ViewIter<'_, Q> {
        ViewIter::new(&self.state)
    }
}

impl<'a, 'w, Q: ComponentSet> IntoIterator for &'a View<'w, Q> {
    type Item = (EntityId, Q::Refs<'a>);
    type IntoIter = ViewIter<'a, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<Q: ComponentSet> fmt::Debug for View<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View").field("query", &Q::MASK).finish()
    }
}

// ---------------------------------------------------------------------------
// ViewIter
// ---------------------------------------------------------------------------

/// Resolved cursor state for the archetype currently being walked.
struct Block<'v, Q: ComponentSet> {
    entities: &'v [EntityId],
    slices: Q::Slices<'v>,
}

/// The two-level iterator behind a [`View`].
///
/// The outer cursor is the archetype index's lazy superset enumeration; the
/// inner cursor is a row index into the current archetype's columns. Empty
/// tables are skipped. Once the outer cursor is exhausted the iterator is
/// finished and stays finished.
pub struct ViewIter<'v, Q: ComponentSet> {
    store: &'v ArchetypeStore,
    masks: Supersets<'v>,
    current: Option<Block<'v, Q>>,
    row: usize,
}

impl<'v, Q: ComponentSet> ViewIter<'v, Q> {
    fn new(state: &'v WorldState) -> Self {
        Self {
            store: &state.store,
            masks: state.store.masks_matching(Q::MASK),
            current: None,
            row: 0,
        }
    }
}

impl<'v, Q: ComponentSet> Iterator for ViewIter<'v, Q> {
    type Item = (EntityId, Q::Refs<'v>);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(block) = &self.current {
                if self.row < block.entities.len() {
                    let entity = block.entities[self.row];
                    let refs = Q::refs(&block.slices, self.row);
                    self.row += 1;
                    return Some((entity, refs));
                }
                self.current = None;
            }
            // Advance to the next matching archetype, skipping empty tables.
            let mask = self.masks.next()?;
            let archetype = self
                .store
                .get(mask)
                .expect("indexed mask always has a table");
            if archetype.is_empty() {
                continue;
            }
            self.current = Some(Block {
                entities: archetype.entities(),
                slices: Q::slices(archetype),
            });
            self.row = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
