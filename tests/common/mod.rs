pub mod macros;

use fireflies_lib::model::config::AppConfig;
use fireflies_lib::model::state::{Agent, Digit, LifeState, Tier, Vec2};
use fireflies_lib::Ecosystem;
use uuid::Uuid;

type EcosystemMod = Box<dyn FnOnce(&mut Ecosystem)>;

/// Builds an ecosystem with nothing in it unless asked: no initial agents,
/// no replacements, no predators, no random newcomers, no energy wells and
/// no cosmic events.
#[allow(dead_code)]
pub struct EcosystemBuilder {
    config: AppConfig,
    agents: Vec<Agent>,
    seed: u64,
    mods: Vec<EcosystemMod>,
}

#[allow(dead_code)]
impl EcosystemBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.arena.initial_population = 0;
        config.arena.min_population = 0;
        config.gravity_well.enabled = false;
        config.hunters.enabled = false;
        config.hunters.initial.clear();
        config.shadows.enabled = false;
        config.serpent.enabled = false;
        config.rare.enabled = false;
        config.environment.enabled = false;
        config.energy_wells.enabled = false;
        config.cosmic.enabled = false;
        Self {
            config,
            agents: Vec::new(),
            seed: 42,
            mods: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut AppConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    /// Places a gravity well even though the builder disabled the default one.
    pub fn with_gravity_well(mut self, x: f64, y: f64) -> Self {
        self.config.gravity_well.enabled = true;
        self.mods.push(Box::new(move |eco| {
            eco.place_gravity_well(Vec2::new(x, y));
        }));
        self
    }

    pub fn build(self) -> Ecosystem {
        let mut eco = Ecosystem::with_seed(self.config, self.seed);
        for modifier in self.mods {
            modifier(&mut eco);
        }
        for agent in self.agents {
            eco.insert_agent(agent);
        }
        eco
    }
}

/// A mature agent with default genetics and a stable id.
#[allow(dead_code)]
pub fn mature_agent(n: u128, x: f64, y: f64, digit: Digit) -> Agent {
    let mut agent = Agent::new(Uuid::from_u128(n), Vec2::new(x, y), digit);
    agent.state = LifeState::Mature;
    agent
}

/// A mature agent that passes every reproduction gate.
#[allow(dead_code)]
pub fn breeder(n: u128, x: f64, y: f64, digit: Digit) -> Agent {
    let mut agent = mature_agent(n, x, y, digit);
    agent.tier = Tier::Charged;
    agent.energy = 100.0;
    agent.age_ms = 30_000.0;
    agent
}
