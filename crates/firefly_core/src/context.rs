//! Per-tick context handed to every subsystem.
//!
//! The coordinator owns all collections. Each tick it lends them out through a
//! [`TickContext`]; subsystems keep only their own auxiliary state and report
//! side effects (events, spawn requests, planet births) through [`TickOutput`].

use crate::agents::AgentStore;
use crate::config::AppConfig;
use crate::pheromone::PheromoneField;
use crate::planet::Planet;
use crate::spatial_hash::SpatialHash;
use firefly_data::{BirthOrigin, Digit, EnvironmentSnapshot, GeneticsRecord, LiveEvent, Vec2};
use rand::Rng;
use uuid::Uuid;

/// Milliseconds per reference frame. Per-frame rates are scaled by `dt / FRAME_MS`.
pub const FRAME_MS: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    pub tick: u64,
    /// Simulated milliseconds since the ecosystem was created.
    pub now_ms: f64,
    pub dt_ms: f64,
}

impl Clock {
    #[must_use]
    pub fn new(tick: u64, now_ms: f64, dt_ms: f64) -> Self {
        Self { tick, now_ms, dt_ms }
    }

    /// This tick's length in reference frames.
    #[must_use]
    pub fn frames(&self) -> f64 {
        self.dt_ms / FRAME_MS
    }

    #[must_use]
    pub fn seconds(&self) -> f64 {
        self.dt_ms / 1000.0
    }
}

/// A new agent the coordinator should create during cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRequest {
    pub pos: Vec2,
    pub digit: Option<Digit>,
    pub origin: BirthOrigin,
    pub energy: Option<f64>,
    /// Parent id and genetics; the offspring is bred from them.
    pub parent: Option<(Uuid, Box<GeneticsRecord>)>,
    /// Start mature instead of spawning.
    pub mature: bool,
}

impl SpawnRequest {
    #[must_use]
    pub fn at(pos: Vec2, origin: BirthOrigin) -> Self {
        Self {
            pos,
            digit: None,
            origin,
            energy: None,
            parent: None,
            mature: false,
        }
    }
}

/// Planet birth triggered by an ascended sacrifice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanetRequest {
    pub center: Vec2,
    pub digit: Digit,
}

/// Side effects collected during one tick.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub events: Vec<LiveEvent>,
    pub spawns: Vec<SpawnRequest>,
    pub planets: Vec<PlanetRequest>,
}

impl TickOutput {
    pub fn emit(&mut self, event: LiveEvent) {
        self.events.push(event);
    }

    pub fn request_spawn(&mut self, request: SpawnRequest) {
        self.spawns.push(request);
    }
}

/// Mutable view of the ecosystem lent to one subsystem for one tick.
pub struct TickContext<'a, R: Rng> {
    pub clock: Clock,
    pub config: &'a AppConfig,
    pub env: &'a EnvironmentSnapshot,
    pub agents: &'a mut AgentStore,
    /// Built from `agents` at the start of the tick. Indices stay valid because
    /// agents are only removed during cleanup.
    pub spatial: &'a SpatialHash,
    pub pheromones: &'a mut PheromoneField,
    pub planets: &'a [Planet],
    pub rng: &'a mut R,
    pub out: &'a mut TickOutput,
}

impl<R: Rng> TickContext<'_, R> {
    /// Bernoulli trial.
    pub fn chance(&mut self, p: f64) -> bool {
        p > 0.0 && self.rng.gen::<f64>() < p
    }

    /// Indices of present agents within `radius` of `pos` that satisfy `filter`.
    pub fn agents_near<F>(&self, pos: Vec2, radius: f64, filter: F) -> Vec<usize>
    where
        F: Fn(&firefly_data::Agent) -> bool,
    {
        self.agents.indices_near(self.spatial, pos, radius, filter)
    }

    /// Count of mature agents within `radius`, used for swarm defence.
    pub fn mature_count_near(&self, pos: Vec2, radius: f64) -> usize {
        self.agents.count_near(self.spatial, pos, radius, |a| a.is_mature())
    }

    /// True when `pos` lies inside any planet's protection radius.
    pub fn planet_protected(&self, pos: Vec2) -> bool {
        self.planets.iter().any(|p| p.protects(pos))
    }
}
