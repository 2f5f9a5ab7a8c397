use super::agent::{DeathCause, Digit, Tier};
use super::cosmos::{CosmicKind, EnergyWellKind};
use super::environment::{DayPeriod, Weather};
use super::predator::{PredatorKind, PredatorState};
use super::social::{FormationPattern, House, RareKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// How a new agent came to exist.
pub enum BirthOrigin {
    /// Initial or replacement spawn.
    Spontaneous,
    /// Mitosis from a mature parent.
    Reproduction,
    /// Spawned through the interaction gateway.
    Interaction,
    /// Replacement for a purified shadow.
    Purification,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
/// Result of two mature agents touching.
pub enum CollisionOutcome {
    /// 1 + 1: both become 0.
    Overflow,
    /// 0 + 0: both become 1.
    Quantum,
    /// Mixed digits: both gain energy.
    Merge,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "event")]
/// Tagged union of all discrete events emitted during a tick.
///
/// Serialised with `#[serde(tag = "event")]` for streaming JSONL output.
pub enum LiveEvent {
    /// A new agent entered the arena.
    Birth {
        id: Uuid,
        parents: Option<(Uuid, Uuid)>,
        digit: Digit,
        gen: u32,
        origin: BirthOrigin,
        tick: u64,
        x: f64,
        y: f64,
    },
    /// An agent was removed.
    Death {
        id: Uuid,
        cause: DeathCause,
        tier: Tier,
        gen: u32,
        tick: u64,
    },
    /// Two mature agents collided.
    Collision {
        a: Uuid,
        b: Uuid,
        outcome: CollisionOutcome,
        tick: u64,
    },
    /// An agent reached a new tier.
    Evolution { id: Uuid, tier: Tier, tick: u64 },
    /// A predator ate an agent.
    Consumed {
        predator: PredatorKind,
        predator_id: u64,
        agent: Uuid,
        digit: Digit,
        tick: u64,
    },
    /// A shadow corrupted an agent in place.
    Converted { shadow_id: u64, agent: Uuid, tick: u64 },
    /// A shadow finished purifying; a replacement agent is requested.
    ShadowPurified { shadow_id: u64, x: f64, y: f64, tick: u64 },
    /// A predator changed state.
    PredatorStateChanged {
        predator: PredatorKind,
        predator_id: u64,
        from: PredatorState,
        to: PredatorState,
        tick: u64,
    },
    /// A predator entered the arena.
    PredatorSpawned {
        predator: PredatorKind,
        predator_id: u64,
        tick: u64,
    },
    /// A predator left or was removed.
    PredatorRemoved {
        predator: PredatorKind,
        predator_id: u64,
        tick: u64,
    },
    /// A constellation started forming.
    FormationStarted {
        formation_id: u64,
        pattern: FormationPattern,
        members: Vec<Uuid>,
        tick: u64,
    },
    /// A constellation released its members.
    FormationEnded { formation_id: u64, tick: u64 },
    /// One holding constellation pulsed at another.
    FormationSignal { from: u64, to: u64, tick: u64 },
    /// A swarm formed.
    SwarmFormed {
        swarm_id: u64,
        members: usize,
        tick: u64,
    },
    /// A swarm dispersed.
    SwarmDispersed { swarm_id: u64, tick: u64 },
    /// A house personality was adopted.
    HouseAssigned { agent: Uuid, house: House, tick: u64 },
    /// A house personality ran out.
    HouseExpired { agent: Uuid, house: House, tick: u64 },
    /// An agent became a rare variant.
    RareEmerged { agent: Uuid, kind: RareKind, tick: u64 },
    /// A planet was born from an ascended sacrifice.
    PlanetBorn { planet_id: u64, digit: Digit, tick: u64 },
    /// The day moved into a new period.
    PeriodChanged { period: DayPeriod, tick: u64 },
    /// The weather changed.
    WeatherChanged { weather: Weather, tick: u64 },
    /// An energy well ran dry and went dark.
    EnergyWellDepleted {
        well_id: u64,
        kind: EnergyWellKind,
        tick: u64,
    },
    /// A depleted energy well came back at partial reserve.
    EnergyWellRestored {
        well_id: u64,
        kind: EnergyWellKind,
        tick: u64,
    },
    /// A cosmic event began.
    CosmicEventStarted {
        kind: CosmicKind,
        intensity: f64,
        duration_ms: f64,
        tick: u64,
    },
    /// A cosmic event ran its course or was displaced.
    CosmicEventEnded { kind: CosmicKind, tick: u64 },
}

impl LiveEvent {
    #[must_use]
    pub fn tick(&self) -> u64 {
        match self {
            LiveEvent::Birth { tick, .. }
            | LiveEvent::Death { tick, .. }
            | LiveEvent::Collision { tick, .. }
            | LiveEvent::Evolution { tick, .. }
            | LiveEvent::Consumed { tick, .. }
            | LiveEvent::Converted { tick, .. }
            | LiveEvent::ShadowPurified { tick, .. }
            | LiveEvent::PredatorStateChanged { tick, .. }
            | LiveEvent::PredatorSpawned { tick, .. }
            | LiveEvent::PredatorRemoved { tick, .. }
            | LiveEvent::FormationStarted { tick, .. }
            | LiveEvent::FormationEnded { tick, .. }
            | LiveEvent::FormationSignal { tick, .. }
            | LiveEvent::SwarmFormed { tick, .. }
            | LiveEvent::SwarmDispersed { tick, .. }
            | LiveEvent::HouseAssigned { tick, .. }
            | LiveEvent::HouseExpired { tick, .. }
            | LiveEvent::RareEmerged { tick, .. }
            | LiveEvent::PlanetBorn { tick, .. }
            | LiveEvent::PeriodChanged { tick, .. }
            | LiveEvent::WeatherChanged { tick, .. }
            | LiveEvent::EnergyWellDepleted { tick, .. }
            | LiveEvent::EnergyWellRestored { tick, .. }
            | LiveEvent::CosmicEventStarted { tick, .. }
            | LiveEvent::CosmicEventEnded { tick, .. } => *tick,
        }
    }

    /// Short human-readable line for logs and terminal output.
    #[must_use]
    pub fn to_message(&self) -> String {
        match self {
            LiveEvent::Birth { id, gen, origin, .. } => {
                format!("Born: {} (gen {gen}, {origin:?})", short(id))
            }
            LiveEvent::Death { id, cause, .. } => format!("Died: {} ({cause:?})", short(id)),
            LiveEvent::Collision { outcome, .. } => format!("Collision: {outcome:?}"),
            LiveEvent::Evolution { id, tier, .. } => {
                format!("Evolved: {} -> {tier:?}", short(id))
            }
            LiveEvent::Consumed {
                predator, agent, ..
            } => format!("Consumed by {predator}: {}", short(agent)),
            LiveEvent::Converted { agent, .. } => format!("Corrupted: {}", short(agent)),
            LiveEvent::ShadowPurified { shadow_id, .. } => {
                format!("Shadow #{shadow_id} purified")
            }
            LiveEvent::PredatorStateChanged {
                predator, to, ..
            } => format!("{predator} -> {to:?}"),
            LiveEvent::PredatorSpawned { predator, .. } => format!("{predator} appeared"),
            LiveEvent::PredatorRemoved { predator, .. } => format!("{predator} left"),
            LiveEvent::FormationStarted {
                pattern, members, ..
            } => format!("Constellation {pattern:?} with {} members", members.len()),
            LiveEvent::FormationEnded { formation_id, .. } => {
                format!("Constellation #{formation_id} dispersed")
            }
            LiveEvent::FormationSignal { from, to, .. } => {
                format!("Constellation #{from} signalled #{to}")
            }
            LiveEvent::SwarmFormed { members, .. } => format!("Swarm of {members}"),
            LiveEvent::SwarmDispersed { swarm_id, .. } => format!("Swarm #{swarm_id} dispersed"),
            LiveEvent::HouseAssigned { agent, house, .. } => {
                format!("{} joined {}", short(agent), house.name())
            }
            LiveEvent::HouseExpired { agent, house, .. } => {
                format!("{} left {}", short(agent), house.name())
            }
            LiveEvent::RareEmerged { agent, kind, .. } => {
                format!("Rare {kind:?}: {}", short(agent))
            }
            LiveEvent::PlanetBorn { digit, .. } => format!("Planet born ({})", digit.value()),
            LiveEvent::PeriodChanged { period, .. } => format!("Period: {period:?}"),
            LiveEvent::WeatherChanged { weather, .. } => format!("Weather: {weather:?}"),
            LiveEvent::EnergyWellDepleted { well_id, kind, .. } => {
                format!("Energy well #{well_id} ({kind}) depleted")
            }
            LiveEvent::EnergyWellRestored { well_id, kind, .. } => {
                format!("Energy well #{well_id} ({kind}) restored")
            }
            LiveEvent::CosmicEventStarted {
                kind, duration_ms, ..
            } => format!("Cosmic event: {kind} ({:.1}s)", duration_ms / 1000.0),
            LiveEvent::CosmicEventEnded { kind, .. } => format!("Cosmic event over: {kind}"),
        }
    }
}

fn short(id: &Uuid) -> String {
    id.to_string().chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let ev = LiveEvent::Evolution {
            id: Uuid::nil(),
            tier: Tier::Radiant,
            tick: 7,
        };
        let json = serde_json::to_value(&ev).expect("serialize");
        assert_eq!(json["event"], "Evolution");
        assert_eq!(json["tier"], "radiant");
        assert_eq!(ev.tick(), 7);
    }

    #[test]
    fn test_message_is_short() {
        let ev = LiveEvent::Death {
            id: Uuid::nil(),
            cause: DeathCause::Serpent,
            tier: Tier::Basic,
            gen: 0,
            tick: 1,
        };
        assert_eq!(ev.to_message(), "Died: 00000000 (Serpent)");
    }
}
