use super::Ecosystem;
use firefly_core::cosmic::CosmicStats;
use firefly_core::genetics::GeneticsStats;
use firefly_core::pheromone::PheromoneStats;
use firefly_core::snapshot::{
    AgentSnapshot, EnergyWellSnapshot, FormationSnapshot, PlanetSnapshot, PredatorSnapshot,
    WorldSnapshot,
};
use firefly_data::{DayPeriod, DeathCause, Digit, Tier, Weather};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Population and subsystem totals at one point in time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EcosystemStats {
    pub tick: u64,
    pub elapsed_ms: f64,
    pub population: usize,
    pub mature: usize,
    pub ones: usize,
    pub zeros: usize,
    pub tiers: BTreeMap<Tier, usize>,
    pub avg_energy: f64,
    pub max_generation: u32,
    pub births: u64,
    pub deaths: HashMap<DeathCause, u64>,
    pub consumed: u64,
    pub conversions: u64,
    pub predators: HashMap<String, usize>,
    pub formations: usize,
    pub swarms: usize,
    pub personalities: usize,
    pub planets: usize,
    pub energy_wells: usize,
    /// Energy all wells have handed out so far.
    pub well_energy_given: f64,
    pub cosmic: CosmicStats,
    pub rare: usize,
    pub period: DayPeriod,
    pub weather: Weather,
    pub pheromones: PheromoneStats,
    pub genetics: GeneticsStats,
    pub lineage_entries: usize,
}

impl Ecosystem {
    #[must_use]
    pub fn stats(&self) -> EcosystemStats {
        let alive: Vec<_> = self.agents.iter().filter(|a| a.is_alive()).collect();
        let mut tiers = BTreeMap::new();
        for agent in &alive {
            *tiers.entry(agent.tier).or_insert(0) += 1;
        }
        let avg_energy = if alive.is_empty() {
            0.0
        } else {
            alive.iter().map(|a| a.energy).sum::<f64>() / alive.len() as f64
        };
        let env = self.environment.snapshot();

        EcosystemStats {
            tick: self.tick,
            elapsed_ms: self.now_ms,
            population: alive.len(),
            mature: alive.iter().filter(|a| a.is_mature()).count(),
            ones: alive.iter().filter(|a| a.digit == Digit::One).count(),
            zeros: alive.iter().filter(|a| a.digit == Digit::Zero).count(),
            tiers,
            avg_energy,
            max_generation: alive.iter().map(|a| a.generation()).max().unwrap_or(0),
            births: self.births,
            deaths: self.deaths.clone(),
            consumed: self.consumed,
            conversions: self.conversions,
            predators: self.predators.counts(),
            formations: self.constellations.len(),
            swarms: self.swarms.len(),
            personalities: self.personalities.len(),
            planets: self.planets.len(),
            energy_wells: self.energy_wells.len(),
            well_energy_given: self.energy_wells.wells().iter().map(|w| w.total_given).sum(),
            cosmic: self.cosmic.stats(),
            rare: alive.iter().filter(|a| a.markers.rare.is_some()).count(),
            period: env.period,
            weather: env.weather,
            pheromones: self.pheromones.stats(),
            genetics: self.genetics.stats(),
            lineage_entries: self.genetics.lineage().len(),
        }
    }

    /// Read-only view of the current tick for a presentation layer.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            width: self.config.arena.width,
            height: self.config.arena.height,
            environment: self.environment.snapshot(),
            agents: self
                .agents
                .iter()
                .filter(|a| a.is_alive())
                .map(AgentSnapshot::from)
                .collect(),
            predators: PredatorSnapshot::all(&self.predators),
            formations: self
                .constellations
                .formations()
                .iter()
                .map(FormationSnapshot::from)
                .collect(),
            planets: self
                .planets
                .planets()
                .iter()
                .map(PlanetSnapshot::from)
                .collect(),
            energy_wells: self
                .energy_wells
                .wells()
                .iter()
                .map(EnergyWellSnapshot::from)
                .collect(),
            cosmic_events: self.cosmic.active().iter().map(|e| e.kind).collect(),
            vortices: self
                .cosmic
                .active()
                .iter()
                .flat_map(|e| e.vortices.iter().map(|v| v.pos))
                .collect(),
            trails: self.pheromones.len(),
        }
    }
}
