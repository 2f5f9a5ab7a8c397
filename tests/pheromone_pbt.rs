use fireflies_lib::model::config::PheromoneConfig;
use fireflies_lib::model::pheromone::PheromoneField;
use fireflies_lib::model::state::{TrailKind, Vec2};
use proptest::prelude::*;
use uuid::Uuid;

fn arb_kind() -> impl Strategy<Value = TrailKind> {
    prop::sample::select(TrailKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(150))]

    #[test]
    fn nearby_deposits_of_one_depositor_merge(
        kind in arb_kind(),
        x in 20.0f64..1100.0,
        y in 20.0f64..700.0,
        dx in -10.0f64..10.0,
        dy in -10.0f64..10.0,
        first in 0.5f64..200.0,
        second in 0.5f64..200.0
    ) {
        let mut field = PheromoneField::new(&PheromoneConfig::default());
        let depositor = Some(Uuid::from_u128(1));
        let a = field.deposit(Vec2::new(x, y), kind, depositor, Some(first), 0.0);
        let b = field.deposit(Vec2::new(x + dx, y + dy), kind, depositor, Some(second), 10.0);

        prop_assert!(a.is_some());
        prop_assert_eq!(a, b);
        prop_assert_eq!(field.len(), 1);
        let max = kind.def().max_strength;
        let expected = (first.min(max) + second).min(max);
        let trail = field.get(a.unwrap()).unwrap();
        prop_assert!((trail.strength - expected).abs() < 1e-9);
    }

    #[test]
    fn trails_weaken_every_pass_and_never_outlive_ttl(
        kind in arb_kind(),
        strength in 1.0f64..150.0,
        steps in prop::collection::vec(100.0f64..1500.0, 10..80)
    ) {
        let mut field = PheromoneField::new(&PheromoneConfig::default());
        let id = field
            .deposit(Vec2::new(400.0, 400.0), kind, None, Some(strength), 0.0)
            .unwrap();
        let ttl = kind.def().ttl_ms;

        let mut now = 0.0;
        let mut last = field.get(id).unwrap().strength;
        for step in steps {
            now += step;
            prop_assert!(field.update(now));
            match field.get(id) {
                Some(trail) => {
                    prop_assert!(trail.strength < last);
                    prop_assert!(now < ttl);
                    last = trail.strength;
                }
                None => break,
            }
        }
        if now >= ttl {
            prop_assert!(field.get(id).is_none());
        }
    }
}
