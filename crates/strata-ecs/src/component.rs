//! Component identity and set membership.
//!
//! Every component type carries a dense, stable [`ComponentId`] in
//! `[0, MAX_COMPONENTS)`, assigned at compile time by listing position in a
//! single [`register_components!`] invocation. Component sets are
//! [`ComponentMask`]s: 128-bit integers with bit `i` set iff component id `i`
//! is in the set. Masks are the canonical identity of an archetype.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of distinct component types in a program.
///
/// The limit exists so that a [`ComponentMask`] fits in a `u128` and so that
/// per-component lookup structures can assume a small dense id space.
pub const MAX_COMPONENTS: usize = 128;

// ---------------------------------------------------------------------------
// ComponentId
// ---------------------------------------------------------------------------

/// Dense, stable identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(u8);

impl ComponentId {
    /// Construct an id. `raw` must be below [`MAX_COMPONENTS`].
    ///
    /// This range check guards hand-written [`Component`] impls. Ids minted
    /// by [`register_components!`] are dense by construction; that macro's
    /// own count assertion rejects an overfull universe before any id goes
    /// out of range. In const context an out-of-range id is a compile
    /// error:
    ///
    /// ```compile_fail
    /// use strata_ecs::component::ComponentId;
    ///
    /// const BAD: ComponentId = ComponentId::new(128);
    /// let _ = BAD;
    /// ```
    pub const fn new(raw: u8) -> Self {
        assert!(
            (raw as usize) < MAX_COMPONENTS,
            "component id out of range (the id space is [0, 128))"
        );
        Self(raw)
    }

    /// The raw id value.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// The id as a bit position / array index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// A user-defined value type attachable to entities.
///
/// Implementations are normally generated by [`register_components!`], which
/// assigns dense ids by listing position. `Default` supplies the seed value
/// for freshly inserted rows (unless the entity's shape declares its own
/// default); `Clone` supports by-value reads through entity handles.
pub trait Component: Clone + Default + Send + Sync + 'static {
    /// The dense id assigned to this component type.
    const ID: ComponentId;
}

// ---------------------------------------------------------------------------
// ComponentMask
// ---------------------------------------------------------------------------

/// A set of component ids, packed into a 128-bit integer.
///
/// Bit `i` is set iff component id `i` is a member. Masks identify
/// archetypes: two entity shapes with the same mask share one archetype
/// table. All set algebra is `const fn` so shape masks resolve at compile
/// time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentMask(u128);

impl ComponentMask {
    /// The empty set.
    pub const EMPTY: ComponentMask = ComponentMask(0);

    /// The set containing exactly `id`.
    #[inline]
    pub const fn single(id: ComponentId) -> Self {
        Self(1u128 << id.index())
    }

    /// The set containing exactly the id of component type `C`.
    #[inline]
    pub const fn of<C: Component>() -> Self {
        Self::single(C::ID)
    }

    /// Set union.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Set intersection.
    #[inline]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// `self` with `id` added.
    #[inline]
    pub const fn with(self, id: ComponentId) -> Self {
        self.union(Self::single(id))
    }

    /// Whether `id` is a member.
    #[inline]
    pub const fn contains(self, id: ComponentId) -> bool {
        self.0 & (1u128 << id.index()) != 0
    }

    /// Whether every member of `other` is also a member of `self`.
    ///
    /// This is the superset test used by archetype index queries: a stored
    /// mask `B` matches a query mask `Q` iff `B.contains_all(Q)`.
    #[inline]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of members.
    #[inline]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether the set is empty.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The raw 128-bit representation.
    #[inline]
    pub const fn bits(self) -> u128 {
        self.0
    }

    /// Reconstruct a mask from its raw bits.
    #[inline]
    pub const fn from_bits(bits: u128) -> Self {
        Self(bits)
    }
}

impl Default for ComponentMask {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentMask({:#x})", self.0)
    }
}

// ---------------------------------------------------------------------------
// register_components!
// ---------------------------------------------------------------------------

/// Assign dense [`ComponentId`]s to a list of component types.
///
/// Ids are assigned by listing position, starting at 0, and are stable for
/// the lifetime of the program. Listing more than 128 types is a compile
/// error. Every component type that participates in the same universe of
/// [`World`](crate::world::World)s must appear in a single invocation;
/// splitting registration across invocations restarts the id sequence at 0
/// and produces colliding ids.
///
/// The listed names must be plain identifiers in scope (import the types
/// first). Each type must satisfy the [`Component`] supertraits
/// (`Clone + Default + Send + Sync + 'static`).
///
/// ```
/// use strata_ecs::component::{Component, ComponentId};
/// use strata_ecs::register_components;
///
/// #[derive(Clone, Default)]
/// struct Position { x: f32, y: f32 }
///
/// #[derive(Clone, Default)]
/// struct Velocity { dx: f32, dy: f32 }
///
/// register_components! { Position, Velocity }
///
/// assert_eq!(Position::ID, ComponentId::new(0));
/// assert_eq!(Velocity::ID, ComponentId::new(1));
/// ```
///
/// Registering a 129th type fails compilation on the macro's own count
/// assertion ("more than 128 distinct component types registered"), before
/// any id is handed out of range (the per-id range check on
/// [`ComponentId::new`] is a separate guard for hand-written ids):
///
/// ```compile_fail
/// macro_rules! declare_all {
///     ( $( $name:ident ),* $(,)? ) => {
///         $( #[derive(Clone, Default)] #[allow(dead_code)] struct $name; )*
///         strata_ecs::register_components! { $( $name ),* }
///     };
/// }
///
/// // 129 component types: one past the limit.
/// declare_all! {
/// #     D000, D001, D002, D003, D004, D005, D006, D007,
/// #     D008, D009, D010, D011, D012, D013, D014, D015,
/// #     D016, D017, D018, D019, D020, D021, D022, D023,
/// #     D024, D025, D026, D027, D028, D029, D030, D031,
/// #     D032, D033, D034, D035, D036, D037, D038, D039,
/// #     D040, D041, D042, D043, D044, D045, D046, D047,
/// #     D048, D049, D050, D051, D052, D053, D054, D055,
/// #     D056, D057, D058, D059, D060, D061, D062, D063,
/// #     D064, D065, D066, D067, D068, D069, D070, D071,
/// #     D072, D073, D074, D075, D076, D077, D078, D079,
/// #     D080, D081, D082, D083, D084, D085, D086, D087,
/// #     D088, D089, D090, D091, D092, D093, D094, D095,
/// #     D096, D097, D098, D099, D100, D101, D102, D103,
/// #     D104, D105, D106, D107, D108, D109, D110, D111,
/// #     D112, D113, D114, D115, D116, D117, D118, D119,
/// #     D120, D121, D122, D123, D124, D125, D126, D127,
///     D128, // the 129th
/// }
/// ```
///
/// The same listing without `D128` compiles; see the id-space boundary
/// tests for the full 128-type universe.
#[macro_export]
macro_rules! register_components {
    ( $( $component:ident ),* $(,)? ) => {
        // Enum discriminants hand out the listing positions without any
        // macro recursion, so a full 128-type universe stays well inside
        // the default recursion limit.
        #[doc(hidden)]
        #[allow(non_camel_case_types, dead_code)]
        #[repr(u8)]
        enum __StrataComponentOrdinal {
            $( $component, )*
            __strata_component_count,
        }

        $(
            impl $crate::component::Component for $component {
                const ID: $crate::component::ComponentId =
                    $crate::component::ComponentId::new(
                        __StrataComponentOrdinal::$component as u8,
                    );
            }
        )*

        const _: () = assert!(
            (__StrataComponentOrdinal::__strata_component_count as usize)
                <= $crate::component::MAX_COMPONENTS,
            "more than 128 distinct component types registered"
        );
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Pos {
        _x: f32,
    }

    #[derive(Clone, Default)]
    struct Vel {
        _dx: f32,
    }

    #[derive(Clone, Default)]
    struct Tag;

    crate::register_components! { Pos, Vel, Tag }

    #[test]
    fn ids_are_dense_and_stable() {
        assert_eq!(Pos::ID, ComponentId::new(0));
        assert_eq!(Vel::ID, ComponentId::new(1));
        assert_eq!(Tag::ID, ComponentId::new(2));
        // A second read observes the same assignment.
        assert_eq!(Pos::ID.get(), 0);
    }

    #[test]
    fn distinct_types_distinct_ids() {
        assert_ne!(Pos::ID, Vel::ID);
        assert_ne!(Vel::ID, Tag::ID);
    }

    #[test]
    fn mask_membership() {
        let mask = ComponentMask::EMPTY.with(Pos::ID).with(Tag::ID);
        assert!(mask.contains(Pos::ID));
        assert!(!mask.contains(Vel::ID));
        assert!(mask.contains(Tag::ID));
        assert_eq!(mask.count(), 2);
    }

    #[test]
    fn mask_is_or_of_component_bits() {
        let mask = ComponentMask::of::<Pos>().union(ComponentMask::of::<Vel>());
        assert_eq!(mask.bits(), (1 << Pos::ID.index()) | (1 << Vel::ID.index()));
    }

    #[test]
    fn superset_test() {
        let q = ComponentMask::of::<Pos>();
        let b = ComponentMask::of::<Pos>().with(Vel::ID);
        assert!(b.contains_all(q));
        assert!(!q.contains_all(b));
        // Every mask is a superset of the empty query.
        assert!(ComponentMask::EMPTY.contains_all(ComponentMask::EMPTY));
        assert!(b.contains_all(ComponentMask::EMPTY));
    }

    #[test]
    fn highest_id_still_fits_in_the_mask() {
        let top = ComponentId::new(127);
        let mask = ComponentMask::single(top);
        assert!(mask.contains(top));
        assert_eq!(mask.bits(), 1u128 << 127);
    }

    #[test]
    fn mask_bits_roundtrip() {
        let mask = ComponentMask::of::<Pos>().with(Tag::ID);
        assert_eq!(ComponentMask::from_bits(mask.bits()), mask);
    }
}
