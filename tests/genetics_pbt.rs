use fireflies_lib::model::config::GeneticsConfig;
use fireflies_lib::model::genetics::GeneticsEngine;
use fireflies_lib::model::state::{
    BreedingEnvironment, GeneticsRecord, Marker, TraitKind, TraitValues, TRAIT_COUNT,
};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

prop_compose! {
    fn arb_record()(
        values in prop::collection::vec(0.0f64..2.0f64, TRAIT_COUNT),
        starborn in any::<bool>(),
        generation in 0u32..50
    ) -> GeneticsRecord {
        let mut traits = TraitValues::defaults();
        for (kind, v) in TraitKind::ALL.into_iter().zip(values) {
            traits.set(kind, v);
        }
        let mut markers = BTreeSet::new();
        if starborn {
            markers.insert(Marker::Starborn);
        }
        GeneticsRecord { traits, markers, generation, ..GeneticsRecord::default() }
    }
}

prop_compose! {
    fn arb_environment()(
        near_gravity_well in any::<bool>(),
        near_ancient_well in any::<bool>(),
        cosmic_event in any::<bool>()
    ) -> BreedingEnvironment {
        BreedingEnvironment { near_gravity_well, near_ancient_well, cosmic_event }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn breed_stays_within_declared_bounds(
        a in arb_record(),
        b in arb_record(),
        env in arb_environment(),
        seed in any::<u64>(),
        global_rate in 0.0f64..5.0f64
    ) {
        let config = GeneticsConfig {
            global_mutation_rate: global_rate,
            ..GeneticsConfig::default()
        };
        let mut engine = GeneticsEngine::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let child = engine.breed(&a, &b, &env, &mut rng);

        prop_assert!(child.traits.within_bounds());
        prop_assert_eq!(child.generation, a.generation.max(b.generation) + 1);
        for marker in &child.markers {
            prop_assert!(a.markers.contains(marker) || b.markers.contains(marker));
        }
    }

    #[test]
    fn mutation_probability_never_exceeds_cap(
        env in arb_environment(),
        global_rate in 0.0f64..100.0f64,
        near_well in 1.0f64..10.0f64,
        cosmic in 1.0f64..10.0f64
    ) {
        let config = GeneticsConfig {
            global_mutation_rate: global_rate,
            near_well_multiplier: near_well,
            cosmic_event_multiplier: cosmic,
            ..GeneticsConfig::default()
        };
        let engine = GeneticsEngine::new(&config);
        for kind in TraitKind::ALL {
            let p = engine.mutation_probability(&kind.def(), &env);
            prop_assert!((0.0..=config.mutation_cap).contains(&p));
        }
    }

    #[test]
    fn identical_parents_without_mutation_pass_values_on(
        parent in arb_record(),
        seed in any::<u64>()
    ) {
        let config = GeneticsConfig {
            global_mutation_rate: 0.0,
            ..GeneticsConfig::default()
        };
        let mut engine = GeneticsEngine::new(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let env = BreedingEnvironment {
            near_gravity_well: true,
            near_ancient_well: true,
            cosmic_event: true,
        };
        let child = engine.breed(&parent, &parent, &env, &mut rng);
        for kind in TraitKind::ALL {
            prop_assert_eq!(child.traits[kind], parent.traits[kind]);
        }
        prop_assert!(child.mutations.is_empty());
    }
}
