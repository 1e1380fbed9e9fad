//! Strata ECS -- an in-memory entity-component database.
//!
//! Entities are 64-bit ids with a fixed, compile-time-declared set of typed
//! components (their *shape*). All entities sharing a component set are
//! stored together in an *archetype*: one dense column per component type,
//! kept in lockstep, so iterating any subset of components is contiguous per
//! type. Archetypes are identified by a 128-bit component mask and indexed
//! in a bitwise trie, which answers "which archetypes contain component set
//! `S`?" without touching non-matching tables.
//!
//! # Quick Start
//!
//! ```
//! use strata_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, Default, PartialEq)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! register_components! { Position, Velocity }
//!
//! shape! { pub struct Dot { Position } }
//! shape! {
//!     pub struct Particle {
//!         Position,
//!         Velocity = Velocity { dx: 1.0, dy: 0.0 },
//!     }
//! }
//!
//! let world = World::new();
//! let dot = world.spawn::<Dot>();
//! let particle = world.spawn::<Particle>();
//! particle.set(Position { x: 2.0, y: 3.0 });
//!
//! // Views span every archetype whose mask covers the query set.
//! assert_eq!(world.view::<(Position,)>().iter().count(), 2);
//!
//! for (entity, (position, velocity)) in &world.view::<(Position, Velocity)>() {
//!     assert_eq!(entity, particle.id());
//!     assert_eq!(position, &Position { x: 2.0, y: 3.0 });
//!     assert_eq!(velocity, &Velocity { dx: 1.0, dy: 0.0 });
//! }
//!
//! // Handles own their rows: dropping one removes the entity.
//! drop(dot);
//! assert_eq!(world.entity_count(), 1);
//! ```
//!
//! # Concurrency
//!
//! A [`World`](world::World) is single-threaded with respect to mutation.
//! The one synchronized operation is entity id allocation (a relaxed atomic
//! fetch-add), so ids stay unique even when handles are constructed from
//! several threads; hosts that share a world across threads must wrap it in
//! an external lock around registration and view iteration.

#![deny(unsafe_code)]

pub mod archetype;
pub mod component;
pub mod entity;
pub mod index;
pub mod shape;
pub mod store;
pub mod view;
pub mod world;

use crate::entity::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by runtime-checked (dynamic) database operations.
///
/// Shape-typed access through [`Entity`](world::Entity) handles cannot
/// produce these: out-of-shape component access is rejected at compile time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity id is not registered in this world (never spawned here, or
    /// already despawned).
    #[error("entity {entity} is not registered in this world")]
    UnknownEntity { entity: EntityId },

    /// The entity is live but its archetype does not include the requested
    /// component type.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        entity: EntityId,
        component: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::archetype::Archetype;
    pub use crate::component::{Component, ComponentId, ComponentMask, MAX_COMPONENTS};
    pub use crate::entity::{EntityId, EntityRegistry};
    pub use crate::index::ArchetypeIndex;
    pub use crate::shape::{HasComponent, Shape};
    pub use crate::store::ArchetypeStore;
    pub use crate::view::{ComponentSet, View, ViewIter};
    pub use crate::world::{Entity, World};
    pub use crate::{register_components, shape, EcsError};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
