//! Entity shapes: compile-time component sets.
//!
//! A shape is a type-level declaration of the exact component set a family
//! of entities carries, optionally with per-component default values. Shapes
//! are declared with [`shape!`], which derives the archetype mask at compile
//! time and emits one [`HasComponent`] marker per declared component; the
//! markers are what make `get`/`set` of an absent component a compile error
//! rather than a runtime check.
//!
//! Shapes may inherit from one parent shape, transitively unioning the
//! parent's component set and defaults into their own.

use crate::archetype::Archetype;
use crate::component::{Component, ComponentMask};
use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// A compile-time entity shape.
///
/// Normally implemented by [`shape!`]. Implementing by hand is supported:
/// `MASK` must be the OR of the ids of exactly the components added by
/// `build_columns`, and `apply_defaults` may overwrite any of those cells on
/// a freshly added row.
pub trait Shape: 'static {
    /// The component set, derived at compile time.
    const MASK: ComponentMask;

    /// Add one column per component in the shape to a table being built.
    fn build_columns(archetype: &mut Archetype);

    /// Overwrite the cells of `entity`'s freshly seeded row with the shape's
    /// declared default values. Components without a declared default keep
    /// their value-initialized seed.
    fn apply_defaults(archetype: &mut Archetype, entity: EntityId);
}

/// Marker: shape `Self` includes component `C`.
///
/// Emitted by [`shape!`] for every declared component, and forwarded from
/// the parent shape when inheriting. Bounds on this trait are what reject
/// out-of-shape component access at compile time.
pub trait HasComponent<C: Component>: Shape {}

// ---------------------------------------------------------------------------
// shape!
// ---------------------------------------------------------------------------

/// Declare an entity shape.
///
/// The body lists the shape's component types, each optionally followed by
/// `= expr` to declare the default value new entities are seeded with (the
/// component's `Default` is used otherwise). An optional `: Parent` after
/// the shape name inherits every component (and default) of one parent
/// shape; chains of single inheritance union transitively. Re-declaring a
/// component the parent already has is rejected by trait coherence.
///
/// ```
/// use strata_ecs::prelude::*;
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Position { x: f32, y: f32 }
///
/// #[derive(Debug, Clone, Default, PartialEq)]
/// struct Velocity { dx: f32, dy: f32 }
///
/// register_components! { Position, Velocity }
///
/// shape! {
///     /// Anything that moves.
///     pub struct Mover {
///         Position,
///         Velocity = Velocity { dx: 1.0, dy: 0.0 },
///     }
/// }
///
/// let world = World::new();
/// let mover = world.spawn::<Mover>();
/// assert_eq!(mover.get::<Velocity>(), Velocity { dx: 1.0, dy: 0.0 });
/// assert_eq!(mover.get::<Position>(), Position::default());
/// ```
///
/// Accessing a component outside the shape does not compile:
///
/// ```compile_fail
/// use strata_ecs::prelude::*;
///
/// #[derive(Clone, Default)]
/// struct Position { x: f32 }
///
/// #[derive(Clone, Default)]
/// struct Velocity { dx: f32 }
///
/// register_components! { Position, Velocity }
///
/// shape! { pub struct Still { Position } }
///
/// let world = World::new();
/// let entity = world.spawn::<Still>();
/// entity.get::<Velocity>(); // Still does not include Velocity
/// ```
#[macro_export]
macro_rules! shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $parent:ty {
            $( $component:ty $( = $default:expr )? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::shape::Shape for $name {
            const MASK: $crate::component::ComponentMask =
                <$parent as $crate::shape::Shape>::MASK
                    $( .with(<$component as $crate::component::Component>::ID) )*;

            fn build_columns(_archetype: &mut $crate::archetype::Archetype) {
                <$parent as $crate::shape::Shape>::build_columns(_archetype);
                $( _archetype.add_column::<$component>(); )*
            }

            fn apply_defaults(
                _archetype: &mut $crate::archetype::Archetype,
                _entity: $crate::entity::EntityId,
            ) {
                <$parent as $crate::shape::Shape>::apply_defaults(_archetype, _entity);
                $( $( _archetype.set::<$component>(_entity, $default); )? )*
            }
        }

        $( impl $crate::shape::HasComponent<$component> for $name {} )*

        impl<C> $crate::shape::HasComponent<C> for $name
        where
            C: $crate::component::Component,
            $parent: $crate::shape::HasComponent<C>,
        {
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $component:ty $( = $default:expr )? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name;

        impl $crate::shape::Shape for $name {
            const MASK: $crate::component::ComponentMask =
                $crate::component::ComponentMask::EMPTY
                    $( .with(<$component as $crate::component::Component>::ID) )*;

            fn build_columns(_archetype: &mut $crate::archetype::Archetype) {
                $( _archetype.add_column::<$component>(); )*
            }

            fn apply_defaults(
                _archetype: &mut $crate::archetype::Archetype,
                _entity: $crate::entity::EntityId,
            ) {
                $( $( _archetype.set::<$component>(_entity, $default); )? )*
            }
        }

        $( impl $crate::shape::HasComponent<$component> for $name {} )*
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
