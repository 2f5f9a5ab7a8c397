use crate::energy_well::EnergyWell;
use crate::planet::Planet;
use crate::predators::{Predator, PredatorManager};
use crate::social::Formation;
use firefly_data::{
    Agent, CosmicKind, Digit, EnergyWellKind, EnvironmentSnapshot, FormationPattern,
    FormationPhase, House, LifeState, PredatorKind, PredatorState, RareKind, Tier, Vec2,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AgentSnapshot {
    pub id: Uuid,
    pub x: f64,
    pub y: f64,
    pub digit: Digit,
    pub state: LifeState,
    pub tier: Tier,
    pub energy: f64,
    /// Genetic glow intensity times this tick's glow modifier.
    pub glow: f64,
    pub opacity: f64,
    pub stealth: bool,
    pub corrupted: bool,
    pub house: Option<House>,
    pub rare: Option<RareKind>,
    pub constellation_id: Option<u64>,
    pub generation: u32,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            x: agent.pos.x,
            y: agent.pos.y,
            digit: agent.digit,
            state: agent.state,
            tier: agent.tier,
            energy: agent.energy,
            glow: agent.phenotype.glow_intensity * agent.modifiers.glow,
            opacity: agent.modifiers.opacity,
            stealth: agent.markers.stealth,
            corrupted: agent.markers.corrupted,
            house: agent.markers.house,
            rare: agent.markers.rare,
            constellation_id: agent.markers.constellation_id,
            generation: agent.generation(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PredatorSnapshot {
    pub id: u64,
    pub kind: PredatorKind,
    pub state: PredatorState,
    pub x: f64,
    pub y: f64,
    pub vigor: f64,
    pub target: Option<Uuid>,
    /// Body points for serpents, head first; empty for everything else.
    pub segments: Vec<Vec2>,
}

impl PredatorSnapshot {
    fn of(p: &dyn Predator) -> Self {
        let pos = p.pos();
        Self {
            id: p.id(),
            kind: p.kind(),
            state: p.state(),
            x: pos.x,
            y: pos.y,
            vigor: p.vigor(),
            target: p.target(),
            segments: Vec::new(),
        }
    }

    /// Every present predator, with serpent bodies filled in.
    #[must_use]
    pub fn all(predators: &PredatorManager) -> Vec<Self> {
        let mut out: Vec<Self> = predators
            .iter()
            .filter(|p| p.kind() != PredatorKind::Serpent)
            .map(Self::of)
            .collect();
        out.extend(predators.serpents().iter().map(|s| Self {
            segments: s.segments.clone(),
            ..Self::of(s)
        }));
        out
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FormationSnapshot {
    pub id: u64,
    pub pattern: FormationPattern,
    pub phase: FormationPhase,
    pub members: Vec<Uuid>,
    pub pulsing: bool,
}

impl From<&Formation> for FormationSnapshot {
    fn from(f: &Formation) -> Self {
        Self {
            id: f.id,
            pattern: f.pattern,
            phase: f.phase,
            members: f.members.clone(),
            pulsing: f.is_pulsing(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PlanetSnapshot {
    pub id: u64,
    pub digit: Digit,
    pub x: f64,
    pub y: f64,
    pub mature: bool,
}

impl From<&Planet> for PlanetSnapshot {
    fn from(p: &Planet) -> Self {
        Self {
            id: p.id,
            digit: p.digit,
            x: p.pos.x,
            y: p.pos.y,
            mature: p.is_mature(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnergyWellSnapshot {
    pub id: u64,
    pub kind: EnergyWellKind,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// Reserve as a fraction of capacity.
    pub fill: f64,
    pub depleted: bool,
}

impl From<&EnergyWell> for EnergyWellSnapshot {
    fn from(w: &EnergyWell) -> Self {
        Self {
            id: w.id,
            kind: w.kind,
            x: w.pos.x,
            y: w.pos.y,
            size: w.size,
            fill: w.fill(),
            depleted: w.depleted,
        }
    }
}

/// Read-only view of one tick for a presentation layer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: f64,
    pub height: f64,
    pub environment: EnvironmentSnapshot,
    pub agents: Vec<AgentSnapshot>,
    pub predators: Vec<PredatorSnapshot>,
    pub formations: Vec<FormationSnapshot>,
    pub planets: Vec<PlanetSnapshot>,
    pub energy_wells: Vec<EnergyWellSnapshot>,
    pub cosmic_events: Vec<CosmicKind>,
    /// Centres of the void storm's vortices.
    pub vortices: Vec<Vec2>,
    pub trails: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_agent_snapshot_folds_glow() {
        let mut agent = Agent::new(Uuid::from_u128(4), Vec2::new(3.0, 4.0), Digit::Zero);
        agent.phenotype.glow_intensity = 1.2;
        agent.modifiers.glow = 0.5;
        agent.markers.stealth = true;
        let snap = AgentSnapshot::from(&agent);
        assert!((snap.glow - 0.6).abs() < 1e-12);
        assert_eq!((snap.x, snap.y), (3.0, 4.0));
        assert!(snap.stealth);
    }

    #[test]
    fn test_serpent_bodies_are_included() {
        let config = AppConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut predators = PredatorManager::empty();
        predators.add_serpent(Vec2::new(-40.0, 300.0), &config, &mut rng);
        let snaps = PredatorSnapshot::all(&predators);
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].kind, PredatorKind::Serpent);
        assert_eq!(snaps[0].segments.len(), config.serpent.segments);
    }
}
