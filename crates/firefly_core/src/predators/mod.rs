//! Predator archetypes and the manager that owns them.
//!
//! Every archetype implements [`Predator`]. Each tick a predator recomputes
//! the agents visible within its detection radius exactly once, and a dense
//! enough crowd of mature agents close by forces it into its retreat/flee
//! behaviour before it may catch anything.

pub mod gravity_well;
pub mod hunter;
pub mod serpent;
pub mod shadow;

pub use gravity_well::{GravityWell, Meal};
pub use hunter::Hunter;
pub use serpent::Serpent;
pub use shadow::Shadow;

use crate::agents::AgentStore;
use crate::config::AppConfig;
use crate::context::{TickContext, TickOutput};
use firefly_data::{
    Agent, DeathCause, Digit, HunterKind, LiveEvent, PredatorKind, PredatorState, RareKind, Tier,
    Vec2,
};
use rand::Rng;
use std::collections::HashMap;
use uuid::Uuid;

/// How long an agent keeps laying danger trails after seeing a predator.
pub const ALARM_MS: f64 = 1500.0;

/// Common contract of every predator archetype.
pub trait Predator {
    fn id(&self) -> u64;
    fn kind(&self) -> PredatorKind;
    fn state(&self) -> PredatorState;
    fn pos(&self) -> Vec2;
    /// Satiation for hunters, health or energy for the others.
    fn vigor(&self) -> f64;
    /// The agent currently being pursued, if any.
    fn target(&self) -> Option<Uuid> {
        None
    }
    /// True once the predator should be removed from the arena.
    fn is_finished(&self) -> bool;
    /// Drops references to agents that no longer exist.
    fn prune(&mut self, agents: &AgentStore);
    /// Runs one tick. `well` is the gravity well's current pull. Only shadows
    /// feel it; hunters and serpents move under their own power.
    fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, well: Option<WellField>)
    where
        Self: Sized;
}

/// The gravity well's pull as seen by other predators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WellField {
    pub pos: Vec2,
    pub radius: f64,
    pub strength: f64,
}

impl WellField {
    /// Pull at `pos`, toward the well, with quadratic falloff.
    #[must_use]
    pub fn pull_at(&self, pos: Vec2) -> Vec2 {
        let d = self.pos.distance(pos);
        if d >= self.radius || d < 1.0 {
            return Vec2::ZERO;
        }
        let f = (self.radius - d) / self.radius;
        (self.pos - pos).normalized() * (self.strength * f * f)
    }
}

/// Emits a state change event when `from != to`.
pub(crate) fn transition(
    out: &mut TickOutput,
    predator: PredatorKind,
    predator_id: u64,
    from: PredatorState,
    to: PredatorState,
    tick: u64,
) {
    if from == to {
        return;
    }
    tracing::debug!(predator = %predator, id = predator_id, ?from, ?to, "Predator state changed");
    out.emit(LiveEvent::PredatorStateChanged {
        predator,
        predator_id,
        from,
        to,
        tick,
    });
}

/// Mature, visible agents are fair game.
pub(crate) fn is_prey(agent: &Agent) -> bool {
    agent.is_mature() && !agent.markers.stealth
}

/// Kills the agent at `idx` and reports the meal. `None` if it was not mature.
pub(crate) fn consume<R: Rng>(
    ctx: &mut TickContext<'_, R>,
    idx: usize,
    predator: PredatorKind,
    predator_id: u64,
    cause: DeathCause,
) -> Option<(Digit, Tier)> {
    let agent = ctx.agents.at_mut(idx)?;
    if !agent.is_mature() {
        return None;
    }
    let (id, digit, tier) = (agent.id, agent.digit, agent.tier);
    agent.kill(cause);
    ctx.out.emit(LiveEvent::Consumed {
        predator,
        predator_id,
        agent: id,
        digit,
        tick: ctx.clock.tick,
    });
    Some((digit, tier))
}

/// True when at least `count` mature agents are within `radius`.
pub(crate) fn swarm_threat<R: Rng>(
    ctx: &TickContext<'_, R>,
    pos: Vec2,
    count: usize,
    radius: f64,
) -> bool {
    count > 0 && ctx.mature_count_near(pos, radius) >= count
}

/// Centroid of the given agents.
pub(crate) fn centroid(agents: &[Agent], indices: &[usize]) -> Option<Vec2> {
    if indices.is_empty() {
        return None;
    }
    let sum = indices
        .iter()
        .filter_map(|&i| agents.get(i))
        .fold(Vec2::ZERO, |acc, a| acc + a.pos);
    Some(sum * (1.0 / indices.len() as f64))
}

/// A diamond agent near `pos` shields it.
pub(crate) fn diamond_shielded<R: Rng>(ctx: &TickContext<'_, R>, pos: Vec2) -> bool {
    let radius = ctx.config.rare.diamond_shield_radius;
    ctx.agents.count_near(ctx.spatial, pos, radius, |a| {
        a.is_mature() && a.markers.rare == Some(RareKind::Diamond)
    }) > 0
}

/// Success chance of a catch at `pos`.
pub(crate) fn catch_chance<R: Rng>(ctx: &TickContext<'_, R>, pos: Vec2) -> f64 {
    if ctx.planet_protected(pos) {
        0.0
    } else if diamond_shielded(ctx, pos) {
        1.0 - ctx.config.hunters.diamond_shield
    } else {
        1.0
    }
}

pub(crate) fn alarm(agents: &mut AgentStore, indices: &[usize]) {
    for &i in indices {
        if let Some(agent) = agents.at_mut(i) {
            agent.alarm_ms = agent.alarm_ms.max(ALARM_MS);
        }
    }
}

/// Keeps a position inside the arena shrunk by `margin`, reflecting velocity.
pub(crate) fn keep_inside(pos: &mut Vec2, vel: &mut Vec2, width: f64, height: f64, margin: f64) {
    let margin = margin.min(width / 2.0).min(height / 2.0);
    if pos.x < margin {
        pos.x = margin;
        vel.x = vel.x.abs();
    } else if pos.x > width - margin {
        pos.x = width - margin;
        vel.x = -vel.x.abs();
    }
    if pos.y < margin {
        pos.y = margin;
        vel.y = vel.y.abs();
    } else if pos.y > height - margin {
        pos.y = height - margin;
        vel.y = -vel.y.abs();
    }
}

/// Random point on the arena border.
pub(crate) fn edge_point<R: Rng>(rng: &mut R, width: f64, height: f64) -> Vec2 {
    match rng.gen_range(0..4) {
        0 => Vec2::new(rng.gen_range(0.0..width), 0.0),
        1 => Vec2::new(width, rng.gen_range(0.0..height)),
        2 => Vec2::new(rng.gen_range(0.0..width), height),
        _ => Vec2::new(0.0, rng.gen_range(0.0..height)),
    }
}

/// Owns every predator and spawns or retires them.
#[derive(Debug, Clone)]
pub struct PredatorManager {
    well: Option<GravityWell>,
    hunters: Vec<Hunter>,
    shadows: Vec<Shadow>,
    serpents: Vec<Serpent>,
    next_id: u64,
    serpent_cooldown_ms: f64,
}

impl PredatorManager {
    /// The well sits at the arena centre; hunters named in the config start at random spots.
    pub fn new<R: Rng>(config: &AppConfig, rng: &mut R) -> Self {
        let mut manager = Self {
            well: None,
            hunters: Vec::new(),
            shadows: Vec::new(),
            serpents: Vec::new(),
            next_id: 1,
            serpent_cooldown_ms: config.serpent.spawn_cooldown_ms / 2.0,
        };
        let center = Vec2::new(config.arena.width / 2.0, config.arena.height / 2.0);
        if config.gravity_well.enabled {
            let id = manager.allocate_id();
            manager.well = Some(GravityWell::new(id, center, &config.gravity_well));
        }
        if config.hunters.enabled {
            for name in &config.hunters.initial {
                let Ok(kind) = name.parse::<HunterKind>() else {
                    tracing::warn!(name = %name, "Skipping unknown hunter kind");
                    continue;
                };
                let pos = Vec2::new(
                    rng.gen_range(0.0..config.arena.width),
                    rng.gen_range(0.0..config.arena.height),
                );
                let id = manager.allocate_id();
                manager
                    .hunters
                    .push(Hunter::new(id, kind, pos, &config.hunters, rng));
            }
        }
        manager
    }

    /// A manager with no predators at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            well: None,
            hunters: Vec::new(),
            shadows: Vec::new(),
            serpents: Vec::new(),
            next_id: 1,
            serpent_cooldown_ms: 0.0,
        }
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[must_use]
    pub fn well(&self) -> Option<&GravityWell> {
        self.well.as_ref()
    }

    pub fn well_mut(&mut self) -> Option<&mut GravityWell> {
        self.well.as_mut()
    }

    #[must_use]
    pub fn hunters(&self) -> &[Hunter] {
        &self.hunters
    }

    #[must_use]
    pub fn shadows(&self) -> &[Shadow] {
        &self.shadows
    }

    #[must_use]
    pub fn serpents(&self) -> &[Serpent] {
        &self.serpents
    }

    /// Every predator through the common contract.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Predator> {
        self.well
            .iter()
            .map(|w| w as &dyn Predator)
            .chain(self.hunters.iter().map(|h| h as &dyn Predator))
            .chain(self.shadows.iter().map(|s| s as &dyn Predator))
            .chain(self.serpents.iter().map(|s| s as &dyn Predator))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Present predators keyed by archetype name.
    #[must_use]
    pub fn counts(&self) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for p in self.iter() {
            *counts.entry(p.kind().to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Places a gravity well, replacing any existing one.
    pub fn set_gravity_well(&mut self, pos: Vec2, config: &AppConfig) -> u64 {
        let id = self.allocate_id();
        self.well = Some(GravityWell::new(id, pos, &config.gravity_well));
        id
    }

    pub fn add_hunter<R: Rng>(
        &mut self,
        kind: HunterKind,
        pos: Vec2,
        config: &AppConfig,
        rng: &mut R,
    ) -> u64 {
        let id = self.allocate_id();
        self.hunters
            .push(Hunter::new(id, kind, pos, &config.hunters, rng));
        id
    }

    pub fn add_shadow(&mut self, pos: Vec2, config: &AppConfig) -> u64 {
        let id = self.allocate_id();
        self.shadows.push(Shadow::new(id, pos, &config.shadows));
        id
    }

    pub fn add_serpent<R: Rng>(&mut self, head: Vec2, config: &AppConfig, rng: &mut R) -> u64 {
        let id = self.allocate_id();
        let center = Vec2::new(config.arena.width / 2.0, config.arena.height / 2.0);
        self.serpents
            .push(Serpent::new(id, head, center, &config.serpent, rng));
        id
    }

    /// A star strike at `point`. Returns `true` when it hit the well.
    pub fn strike_well(
        &mut self,
        point: Vec2,
        reach: f64,
        tick: u64,
        out: &mut TickOutput,
    ) -> bool {
        self.well
            .as_mut()
            .is_some_and(|w| w.strike(point, reach, tick, out))
    }

    /// True when `pos` lies within `radius` of an active gravity well.
    #[must_use]
    pub fn near_well(&self, pos: Vec2, radius: f64) -> bool {
        self.well
            .as_ref()
            .is_some_and(|w| w.is_active() && w.pos.distance(pos) <= radius)
    }

    /// Runs every predator, then spawns newcomers and retires finished ones.
    pub fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let field = match self.well.as_mut() {
            Some(well) => {
                well.update(ctx, None);
                well.field()
            }
            None => None,
        };
        for hunter in &mut self.hunters {
            hunter.update(ctx, field);
        }
        for shadow in &mut self.shadows {
            shadow.update(ctx, field);
        }
        for serpent in &mut self.serpents {
            serpent.update(ctx, field);
        }

        self.maybe_spawn_shadow(ctx);
        self.maybe_spawn_serpent(ctx);
        self.retire_finished(ctx.clock.tick, ctx.out);
    }

    fn maybe_spawn_shadow<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let config = ctx.config;
        let cfg = &config.shadows;
        if !cfg.enabled
            || self.shadows.len() >= cfg.max_shadows
            || ctx.clock.now_ms < cfg.min_ecosystem_age_ms
            || !ctx.chance(cfg.spawn_chance)
        {
            return;
        }
        let pos = edge_point(ctx.rng, ctx.config.arena.width, ctx.config.arena.height);
        let id = self.add_shadow(pos, ctx.config);
        announce(ctx.out, PredatorKind::Shadow, id, ctx.clock.tick);
    }

    fn maybe_spawn_serpent<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let config = ctx.config;
        let cfg = &config.serpent;
        if !cfg.enabled || !self.serpents.is_empty() {
            return;
        }
        self.serpent_cooldown_ms -= ctx.clock.dt_ms;
        if self.serpent_cooldown_ms > 0.0
            || ctx.clock.now_ms < cfg.min_ecosystem_age_ms
            || ctx.agents.present_count() < cfg.min_population
        {
            return;
        }
        self.serpent_cooldown_ms = cfg.spawn_cooldown_ms;
        let head = edge_point(ctx.rng, ctx.config.arena.width, ctx.config.arena.height);
        let id = self.add_serpent(head, ctx.config, ctx.rng);
        announce(ctx.out, PredatorKind::Serpent, id, ctx.clock.tick);
    }

    fn retire_finished(&mut self, tick: u64, out: &mut TickOutput) {
        let mut retired: Vec<(PredatorKind, u64)> = Vec::new();
        for h in self.hunters.iter().filter(|h| h.is_finished()) {
            retired.push((h.kind(), h.id()));
        }
        for s in self.shadows.iter().filter(|s| s.is_finished()) {
            retired.push((s.kind(), s.id()));
        }
        for s in self.serpents.iter().filter(|s| s.is_finished()) {
            retired.push((s.kind(), s.id()));
        }
        self.hunters.retain(|h| !h.is_finished());
        self.shadows.retain(|s| !s.is_finished());
        self.serpents.retain(|s| !s.is_finished());
        for (predator, predator_id) in retired {
            tracing::info!(predator = %predator, id = predator_id, "Predator removed");
            out.emit(LiveEvent::PredatorRemoved {
                predator,
                predator_id,
                tick,
            });
        }
    }

    /// Forgets agent ids that are gone.
    pub fn prune(&mut self, agents: &AgentStore) {
        if let Some(well) = self.well.as_mut() {
            well.prune(agents);
        }
        for h in &mut self.hunters {
            h.prune(agents);
        }
        for s in &mut self.shadows {
            s.prune(agents);
        }
        for s in &mut self.serpents {
            s.prune(agents);
        }
    }
}

fn announce(out: &mut TickOutput, predator: PredatorKind, predator_id: u64, tick: u64) {
    tracing::info!(predator = %predator, id = predator_id, "Predator appeared");
    out.emit(LiveEvent::PredatorSpawned {
        predator,
        predator_id,
        tick,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_well_field_pulls_inward_with_falloff() {
        let field = WellField {
            pos: Vec2::new(100.0, 100.0),
            radius: 100.0,
            strength: 1.0,
        };
        let near = field.pull_at(Vec2::new(150.0, 100.0));
        assert!((near.x + 0.25).abs() < 1e-12);
        assert_eq!(field.pull_at(Vec2::new(250.0, 100.0)), Vec2::ZERO);
    }

    #[test]
    fn test_manager_starts_with_configured_predators() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = AppConfig::default();
        let manager = PredatorManager::new(&config, &mut rng);
        assert!(manager.well().is_some());
        assert_eq!(manager.hunters().len(), 2);
        let counts = manager.counts();
        assert_eq!(counts.get("gravity_well"), Some(&1));
        assert_eq!(counts.get("hunter"), Some(&1));
        assert_eq!(counts.get("lurker"), Some(&1));
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn test_keep_inside_reflects() {
        let mut pos = Vec2::new(-5.0, 500.0);
        let mut vel = Vec2::new(-1.0, 1.0);
        keep_inside(&mut pos, &mut vel, 400.0, 300.0, 50.0);
        assert_eq!(pos, Vec2::new(50.0, 250.0));
        assert_eq!(vel, Vec2::new(1.0, -1.0));
    }
}
