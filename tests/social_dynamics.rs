mod common;

use common::{breeder, mature_agent, EcosystemBuilder};
use fireflies_lib::model::state::{BirthOrigin, Digit, FormationPattern, LiveEvent, Vec2};
use uuid::Uuid;

#[test]
fn test_reproduction_charges_parent_and_creates_one_child() {
    let parent_id = Uuid::from_u128(1);
    let mut eco = EcosystemBuilder::new()
        .with_config(|c| {
            c.reproduction.chance = 1.0;
            c.digit.flicker_enabled = false;
            c.constellation.enabled = false;
            c.swarm.formation_chance = 0.0;
        })
        .with_agent(breeder(1, 400.0, 400.0, Digit::Zero))
        .build();

    let events = eco.update(16.0);
    let births: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            LiveEvent::Birth {
                id,
                parents,
                digit,
                gen,
                origin: BirthOrigin::Reproduction,
                ..
            } => Some((*id, *parents, *digit, *gen)),
            _ => None,
        })
        .collect();
    assert_eq!(births.len(), 1);
    let (child_id, parents, digit, gen) = births[0];
    assert_eq!(parents, Some((parent_id, parent_id)));
    assert_eq!(digit, Digit::Zero);
    assert_eq!(gen, 1);
    assert_population!(eco, 2);

    let parent = eco.agent(&parent_id).unwrap();
    let cost = eco.config.reproduction.energy_cost;
    let fraction = eco.config.reproduction.offspring_energy_fraction;
    assert!(parent.energy <= 100.0 - cost);
    assert!(parent.energy > 100.0 - cost - 0.1);

    let child = eco.agent(&child_id).unwrap();
    assert_eq!(child.generation(), 1);
    assert!((child.energy - (100.0 - cost) * fraction).abs() < 1e-9);
    assert!(child.pos.distance(parent.pos) < 40.0);
}

#[test]
fn test_reproduction_cooldown_blocks_second_birth() {
    let mut eco = EcosystemBuilder::new()
        .with_config(|c| {
            c.reproduction.chance = 1.0;
            c.reproduction.energy_cost = 1.0;
            c.constellation.enabled = false;
            c.swarm.formation_chance = 0.0;
        })
        .with_agent(breeder(1, 400.0, 400.0, Digit::One))
        .build();

    let mut births = 0;
    for _ in 0..50 {
        births += eco
            .update(16.0)
            .iter()
            .filter(|e| matches!(e, LiveEvent::Birth { .. }))
            .count();
    }
    assert_eq!(births, 1);
}

#[test]
fn test_depleted_formation_disperses_next_update() {
    let mut builder = EcosystemBuilder::new().with_config(|c| {
        c.constellation.chance = 0.0;
        c.constellation.min_live_members = 3;
        c.swarm.formation_chance = 0.0;
    });
    for n in 1..=3u128 {
        builder = builder.with_agent(mature_agent(n, 500.0 + n as f64 * 20.0, 400.0, Digit::One));
    }
    let mut eco = builder.build();
    let formation = eco
        .constellations
        .form(&mut eco.agents, &[0, 1, 2], FormationPattern::Triangle, Vec2::ZERO)
        .unwrap();
    eco.update(16.0);
    assert_eq!(eco.constellations.len(), 1);

    assert!(eco.kill(&Uuid::from_u128(2)));
    let events = eco.update(16.0);

    assert!(eco.constellations.is_empty());
    assert!(events.iter().any(
        |e| matches!(e, LiveEvent::FormationEnded { formation_id, .. } if *formation_id == formation)
    ));
    for n in [1u128, 3] {
        let agent = eco.agent(&Uuid::from_u128(n)).unwrap();
        assert_eq!(agent.markers.constellation_id, None);
    }
    assert_agent_gone!(eco, Uuid::from_u128(2));
}

#[test]
fn test_dominant_house_wins_most_assignments() {
    let mut builder = EcosystemBuilder::new().with_config(|c| {
        c.personality.assignment_chance = 1.0;
        c.personality.assignment_scale = 1.0;
        c.personality.dominant_weight = 0.9;
        c.constellation.enabled = false;
        c.swarm.formation_chance = 0.0;
        c.reproduction.enabled = false;
    });
    for n in 1..=40u128 {
        let x = 50.0 + (n % 10) as f64 * 100.0;
        let y = 100.0 + (n / 10) as f64 * 150.0;
        builder = builder.with_agent(mature_agent(n, x, y, Digit::One));
    }
    let mut eco = builder.build();
    let house = "shield".parse().unwrap();
    eco.set_dominant_house(Some(house));

    eco.update(16.0);
    let assigned: Vec<_> = eco
        .agents
        .iter()
        .filter_map(|a| a.markers.house)
        .collect();
    assert_eq!(assigned.len(), 40);
    let dominant = assigned.iter().filter(|h| **h == house).count();
    assert!(dominant >= 28, "only {dominant} of 40 took the dominant house");
}
