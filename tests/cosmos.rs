mod common;

use common::{mature_agent, EcosystemBuilder};
use fireflies_lib::model::state::{CosmicKind, Digit, EnergyWellKind, LiveEvent, Vec2};
use uuid::Uuid;

fn foraging_builder() -> EcosystemBuilder {
    EcosystemBuilder::new().with_config(|c| {
        c.energy_wells.enabled = true;
        c.energy_wells.initial.clear();
        c.energy_wells.spawn_chance = 0.0;
        c.energy_wells.birth_ms = 0.0;
    })
}

fn sky_builder() -> EcosystemBuilder {
    EcosystemBuilder::new().with_config(|c| {
        c.cosmic.enabled = true;
        c.cosmic.base_chance = 0.0;
    })
}

#[test]
fn test_agent_on_an_ancient_well_is_fed() {
    let mut agent = mature_agent(1, 400.0, 300.0, Digit::One);
    agent.energy = 20.0;
    let mut eco = foraging_builder().with_agent(agent).build();
    let id = eco
        .place_energy_well(EnergyWellKind::Ancient, Vec2::new(400.0, 300.0))
        .unwrap();

    for _ in 0..10 {
        eco.update(16.0);
    }
    let well = eco.energy_wells.wells().iter().find(|w| w.id == id).unwrap();
    assert_eq!(well.served(), 1);
    assert!(well.total_given > 0.0);
    assert_eq!(well.fill(), 1.0);

    let stats = eco.stats();
    assert_eq!(stats.energy_wells, 1);
    assert!(stats.well_energy_given > 0.0);
    assert!(eco.agent(&Uuid::from_u128(1)).is_some());
}

#[test]
fn test_well_cap_and_snapshot() {
    let mut eco = foraging_builder()
        .with_config(|c| c.energy_wells.max_wells = 2)
        .build();
    assert!(eco
        .place_energy_well(EnergyWellKind::Standard, Vec2::new(200.0, 200.0))
        .is_some());
    assert!(eco
        .place_energy_well(EnergyWellKind::Volatile, Vec2::new(600.0, 400.0))
        .is_some());
    assert!(eco
        .place_energy_well(EnergyWellKind::Ancient, Vec2::new(500.0, 300.0))
        .is_none());

    eco.update(16.0);
    let snapshot = eco.snapshot();
    let kinds: Vec<EnergyWellKind> = snapshot.energy_wells.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![EnergyWellKind::Standard, EnergyWellKind::Volatile]);
    assert!(snapshot.energy_wells.iter().all(|w| !w.depleted));
}

#[test]
fn test_triggered_flare_is_announced_next_tick() {
    let mut eco = sky_builder().build();
    eco.trigger_cosmic_event(CosmicKind::SolarFlare);

    let events = eco.update(16.0);
    assert!(events.iter().any(|e| matches!(
        e,
        LiveEvent::CosmicEventStarted {
            kind: CosmicKind::SolarFlare,
            ..
        }
    )));
    assert_eq!(eco.snapshot().cosmic_events, vec![CosmicKind::SolarFlare]);
    assert_eq!(eco.stats().cosmic.triggered, 1);
}

#[test]
fn test_storm_displaces_a_running_flare() {
    let mut eco = sky_builder().build();
    eco.trigger_cosmic_event(CosmicKind::SolarFlare);
    eco.update(16.0);

    eco.trigger_cosmic_event(CosmicKind::VoidStorm);
    let events = eco.update(16.0);
    assert!(events.iter().any(|e| matches!(
        e,
        LiveEvent::CosmicEventEnded {
            kind: CosmicKind::SolarFlare,
            ..
        }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        LiveEvent::CosmicEventStarted {
            kind: CosmicKind::VoidStorm,
            ..
        }
    )));
    assert_eq!(eco.snapshot().cosmic_events, vec![CosmicKind::VoidStorm]);
}
