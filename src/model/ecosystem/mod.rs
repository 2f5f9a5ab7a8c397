//! The coordinator: owns every collection and runs the tick.

use crate::model::config::AppConfig;
use firefly_core::agents::AgentStore;
use firefly_core::cosmic::CosmicScheduler;
use firefly_core::context::{Clock, TickOutput};
use firefly_core::energy_well::EnergyWellSystem;
use firefly_core::environment::Environment;
use firefly_core::genetics::GeneticsEngine;
use firefly_core::interaction::{GatewayCommand, InteractionGateway};
use firefly_core::lineage::AncestryTree;
use firefly_core::metrics::Metrics;
use firefly_core::pheromone::PheromoneField;
use firefly_core::planet::PlanetSystem;
use firefly_core::predators::PredatorManager;
use firefly_core::social::{ConstellationSystem, PersonalitySystem, SwarmSystem};
use firefly_core::spatial_hash::SpatialHash;
use firefly_data::{
    Agent, CosmicKind, DeathCause, Digit, EnergyWellKind, House, HunterKind, LiveEvent, Vec2,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use uuid::Uuid;

pub mod spawn;
pub mod stats;
pub mod update;

pub use stats::EcosystemStats;

/// A running firefly ecosystem.
///
/// Every entity collection lives here. Subsystems only see them through the
/// per-tick context built in [`Ecosystem::update`], and refer to agents by id
/// so anything removed during cleanup simply drops out of their lists.
pub struct Ecosystem {
    pub config: AppConfig,
    rng: ChaCha8Rng,
    pub agents: AgentStore,
    spatial: SpatialHash,
    pub pheromones: PheromoneField,
    pub genetics: GeneticsEngine,
    pub predators: PredatorManager,
    pub constellations: ConstellationSystem,
    pub personalities: PersonalitySystem,
    pub swarms: SwarmSystem,
    pub planets: PlanetSystem,
    pub energy_wells: EnergyWellSystem,
    pub cosmic: CosmicScheduler,
    pub environment: Environment,
    gateway: InteractionGateway,
    pub metrics: Metrics,
    tick: u64,
    now_ms: f64,
    births: u64,
    deaths: HashMap<DeathCause, u64>,
    consumed: u64,
    conversions: u64,
    /// Events raised outside a tick (initial population, explicit spawns),
    /// handed out with the next tick's events.
    pending: Vec<LiveEvent>,
}

impl Ecosystem {
    /// Builds an ecosystem seeded from `config.arena.seed`, or from entropy
    /// when none is set, and spawns the initial population.
    pub fn new(config: AppConfig) -> Self {
        let rng = match config.arena.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// Same as [`Ecosystem::new`] with an explicit seed.
    pub fn with_seed(mut config: AppConfig, seed: u64) -> Self {
        config.arena.seed = Some(seed);
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: AppConfig, mut rng: ChaCha8Rng) -> Self {
        let predators = PredatorManager::new(&config, &mut rng);
        let mut eco = Self {
            rng,
            agents: AgentStore::new(),
            spatial: SpatialHash::new(
                config.arena.cell_size,
                config.arena.width,
                config.arena.height,
            ),
            pheromones: PheromoneField::new(&config.pheromones),
            genetics: GeneticsEngine::new(&config.genetics),
            predators,
            constellations: ConstellationSystem::new(),
            personalities: PersonalitySystem::new(&config.personality),
            swarms: SwarmSystem::new(),
            planets: PlanetSystem::new(&config.planets),
            energy_wells: EnergyWellSystem::new(&config.energy_wells),
            cosmic: CosmicScheduler::new(&config.cosmic),
            environment: Environment::new(&config.environment),
            gateway: InteractionGateway::new(),
            metrics: Metrics::new(),
            tick: 0,
            now_ms: 0.0,
            births: 0,
            deaths: HashMap::new(),
            consumed: 0,
            conversions: 0,
            pending: Vec::new(),
            config,
        };
        eco.energy_wells.seed(&eco.config.arena, &mut eco.rng);
        eco.spawn_initial_population();
        tracing::info!(
            agents = eco.agents.len(),
            predators = eco.predators.len(),
            energy_wells = eco.energy_wells.len(),
            fingerprint = %eco.config.fingerprint(),
            "Ecosystem created"
        );
        eco
    }

    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated milliseconds since creation.
    #[must_use]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    #[must_use]
    pub fn population(&self) -> usize {
        self.agents.present_count()
    }

    #[must_use]
    pub fn agent(&self, id: &Uuid) -> Option<&Agent> {
        self.agents.get(id)
    }

    pub fn agent_mut(&mut self, id: &Uuid) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    /// Queues a pointer or touch command for the next tick and counts it as user activity.
    pub fn interact(&mut self, command: GatewayCommand) {
        self.environment.register_activity();
        self.gateway.push(command);
    }

    #[must_use]
    pub fn gateway(&self) -> &InteractionGateway {
        &self.gateway
    }

    /// Marks an agent dead. It is removed, with a `Death` event, during the next cleanup.
    pub fn kill(&mut self, id: &Uuid) -> bool {
        self.agents
            .get_mut(id)
            .is_some_and(|a| a.kill(DeathCause::Forced))
    }

    pub fn set_dominant_house(&mut self, house: Option<House>) {
        self.personalities.set_dominant(house);
    }

    /// Jumps the day clock to a normalised time in `[0, 1)`.
    pub fn set_time_of_day(&mut self, time: f64) {
        self.environment.set_time(time);
    }

    /// Places (or moves) the gravity well.
    pub fn place_gravity_well(&mut self, pos: Vec2) -> u64 {
        self.predators.set_gravity_well(pos, &self.config)
    }

    pub fn add_hunter(&mut self, kind: HunterKind, pos: Vec2) -> u64 {
        self.predators
            .add_hunter(kind, pos, &self.config, &mut self.rng)
    }

    pub fn add_shadow(&mut self, pos: Vec2) -> u64 {
        self.predators.add_shadow(pos, &self.config)
    }

    pub fn add_serpent(&mut self, head: Vec2) -> u64 {
        self.predators.add_serpent(head, &self.config, &mut self.rng)
    }

    /// Places an energy well. Returns `None` once `energy_wells.max_wells` is reached.
    pub fn place_energy_well(&mut self, kind: EnergyWellKind, pos: Vec2) -> Option<u64> {
        self.energy_wells.add(kind, pos)
    }

    /// Starts a cosmic event now, ending any it cannot run alongside.
    /// The events it raises are delivered with the next tick's.
    pub fn trigger_cosmic_event(&mut self, kind: CosmicKind) {
        let clock = Clock::new(self.tick, self.now_ms, 0.0);
        let mut out = TickOutput::default();
        self.cosmic
            .force(kind, clock, &self.config.arena, &mut self.rng, &mut out);
        self.pending.extend(out.events);
    }

    /// Ancestry of everything the lineage store remembers, in Graphviz DOT.
    #[must_use]
    pub fn lineage_dot(&self) -> String {
        AncestryTree::build(self.genetics.lineage(), self.agents.as_slice()).to_dot()
    }

    /// Ids of `id`'s ancestors along the first-parent chain, nearest first.
    #[must_use]
    pub fn ancestry(&self, id: &Uuid) -> Vec<Uuid> {
        let Some(agent) = self.agents.get(id) else {
            return Vec::new();
        };
        self.genetics.lineage().ancestry(
            &agent.lineage_id(),
            self.config.genetics.max_ancestry_depth,
        )
    }

    /// Inserts a fully built agent as is. Its genetics are not re-rolled.
    pub fn insert_agent(&mut self, agent: Agent) -> Uuid {
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    /// Count of present agents carrying `digit`.
    #[must_use]
    pub fn digit_count(&self, digit: Digit) -> usize {
        self.agents
            .iter()
            .filter(|a| a.is_alive() && a.digit == digit)
            .count()
    }
}
