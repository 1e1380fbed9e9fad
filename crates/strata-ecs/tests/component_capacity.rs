//! Boundary checks for the component id space.
//!
//! The id space is exactly `[0, 128)`: a universe of 128 distinct component
//! types registers through `register_components!`, the last listed type
//! takes id 127, and that id occupies the top bit of a component mask. (A
//! 129th type is rejected at compile time by the macro's count assertion;
//! see the `register_components!` docs.)

use strata_ecs::component::{Component, ComponentId, ComponentMask, MAX_COMPONENTS};

/// Declare unit component types and register them in one invocation, so the
/// 128-name list below is written only once.
macro_rules! declare_and_register {
    ( $( $name:ident ),* $(,)? ) => {
        $(
            #[derive(Clone, Default)]
            #[allow(dead_code)]
            struct $name;
        )*
        strata_ecs::register_components! { $( $name ),* }
    };
}

declare_and_register! {
    C000, C001, C002, C003, C004, C005, C006, C007,
    C008, C009, C010, C011, C012, C013, C014, C015,
    C016, C017, C018, C019, C020, C021, C022, C023,
    C024, C025, C026, C027, C028, C029, C030, C031,
    C032, C033, C034, C035, C036, C037, C038, C039,
    C040, C041, C042, C043, C044, C045, C046, C047,
    C048, C049, C050, C051, C052, C053, C054, C055,
    C056, C057, C058, C059, C060, C061, C062, C063,
    C064, C065, C066, C067, C068, C069, C070, C071,
    C072, C073, C074, C075, C076, C077, C078, C079,
    C080, C081, C082, C083, C084, C085, C086, C087,
    C088, C089, C090, C091, C092, C093, C094, C095,
    C096, C097, C098, C099, C100, C101, C102, C103,
    C104, C105, C106, C107, C108, C109, C110, C111,
    C112, C113, C114, C115, C116, C117, C118, C119,
    C120, C121, C122, C123, C124, C125, C126, C127,
}

#[test]
fn a_full_universe_of_128_types_registers() {
    assert_eq!(C000::ID, ComponentId::new(0));
    assert_eq!(C064::ID, ComponentId::new(64));
    assert_eq!(C127::ID, ComponentId::new((MAX_COMPONENTS - 1) as u8));
}

#[test]
fn ids_stay_dense_across_the_whole_range() {
    let ids = [
        C000::ID.index(),
        C001::ID.index(),
        C031::ID.index(),
        C032::ID.index(),
        C100::ID.index(),
        C126::ID.index(),
        C127::ID.index(),
    ];
    assert_eq!(ids, [0, 1, 31, 32, 100, 126, 127]);
}

#[test]
fn the_top_id_occupies_the_top_mask_bit() {
    assert_eq!(ComponentMask::of::<C127>().bits(), 1u128 << 127);
    let full = ComponentMask::of::<C000>()
        .union(ComponentMask::of::<C063>())
        .union(ComponentMask::of::<C127>());
    assert!(full.contains(C063::ID));
    assert_eq!(full.count(), 3);
}
