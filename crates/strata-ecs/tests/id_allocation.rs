//! Entity id uniqueness under concurrent construction.
//!
//! Id allocation is the database's one synchronized operation; everything
//! else needs external locking when a world is shared across threads.

use std::collections::HashSet;
use std::sync::Mutex;
use std::thread;

use strata_ecs::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
struct Blip(u32);

strata_ecs::register_components! { Blip }

strata_ecs::shape! {
    struct Probe { Blip }
}

#[test]
fn concurrent_allocation_yields_distinct_ids() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 1_000;

    let mut all: HashSet<u64> = HashSet::new();
    thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    (0..PER_THREAD)
                        .map(|_| EntityId::allocate().to_raw())
                        .collect::<Vec<u64>>()
                })
            })
            .collect();
        for worker in workers {
            all.extend(worker.join().unwrap());
        }
    });

    assert_eq!(all.len(), THREADS * PER_THREAD);
}

#[test]
fn concurrent_spawns_behind_an_external_lock() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 250;

    let world = Mutex::new(World::new());
    let observed = Mutex::new(Vec::<u64>::new());

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for i in 0..PER_THREAD {
                    let guard = world.lock().unwrap();
                    let entity = guard.spawn::<Probe>();
                    entity.set(Blip(i as u32));
                    assert_eq!(entity.get::<Blip>(), Blip(i as u32));
                    observed.lock().unwrap().push(entity.id().to_raw());
                    // The handle drops before the world lock releases, so
                    // every spawned entity is torn down again here.
                }
            });
        }
    });

    let mut ids = observed.into_inner().unwrap();
    let total = ids.len();
    assert_eq!(total, THREADS * PER_THREAD);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), total, "no two handles shared an id");

    let world = world.into_inner().unwrap();
    assert_eq!(world.entity_count(), 0);
    assert_eq!(world.archetype_count(), 1);
}
