//! Chemical trails deposited by agents and the forces they exert.
//!
//! Trails live in a flat id map and are indexed by a sparse grid keyed by
//! cell coordinates. Influence queries visit only the cells overlapping the
//! largest trail radius, so the cost per agent depends on local density and
//! not on the total trail count.

use crate::config::PheromoneConfig;
use crate::context::TickContext;
use crate::social::reproduction::is_reproduction_ready;
use firefly_data::{Agent, BehaviorFlags, Trail, TrailKind, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Radians between successive fallback directions.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Combined trail force on one receiver plus the behaviours it triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Influence {
    pub force: Vec2,
    pub flags: BehaviorFlags,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PheromoneStats {
    pub deposited: u64,
    pub decayed: u64,
    /// Trails dropped to keep a cell under `max_trails_per_cell`.
    pub evicted: u64,
    pub active: usize,
    pub peak: usize,
}

/// Linear falloff shared by trails and pointer forces: 1 at the centre, 0 at `radius`.
#[must_use]
pub fn falloff(distance: f64, radius: f64) -> f64 {
    if radius <= 0.0 || distance >= radius {
        0.0
    } else {
        1.0 - distance / radius
    }
}

/// Unit vector from `from` toward `to`. Closer than one pixel, `fallback` is used.
#[must_use]
pub fn direction_or(from: Vec2, to: Vec2, fallback: Vec2) -> Vec2 {
    let delta = to - from;
    if delta.length() < 1.0 {
        fallback
    } else {
        delta.normalized()
    }
}

/// Stable direction for a trail id, used when a receiver sits on the trail centre.
#[must_use]
pub fn fallback_direction(trail_id: u64) -> Vec2 {
    Vec2::from_angle((trail_id as f64 * GOLDEN_ANGLE).rem_euclid(std::f64::consts::TAU))
}

#[derive(Debug, Clone)]
pub struct PheromoneField {
    config: PheromoneConfig,
    trails: HashMap<u64, Trail>,
    grid: HashMap<(i64, i64), Vec<u64>>,
    next_id: u64,
    last_update_ms: f64,
    stats: PheromoneStats,
}

impl PheromoneField {
    pub fn new(config: &PheromoneConfig) -> Self {
        Self {
            config: config.clone(),
            trails: HashMap::new(),
            grid: HashMap::new(),
            next_id: 1,
            last_update_ms: 0.0,
            stats: PheromoneStats::default(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
    }

    #[must_use]
    pub fn config(&self) -> &PheromoneConfig {
        &self.config
    }

    #[must_use]
    pub fn stats(&self) -> PheromoneStats {
        PheromoneStats {
            active: self.trails.len(),
            ..self.stats
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trails.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trails.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: u64) -> Option<&Trail> {
        self.trails.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Trail> {
        self.trails.values()
    }

    #[must_use]
    pub fn count_kind(&self, kind: TrailKind) -> usize {
        self.trails.values().filter(|t| t.kind == kind).count()
    }

    fn cell_of(&self, pos: Vec2) -> (i64, i64) {
        (
            (pos.x / self.config.cell_size).floor() as i64,
            (pos.y / self.config.cell_size).floor() as i64,
        )
    }

    /// Calls `f` for every trail whose cell overlaps the square of half-width `radius`.
    fn for_each_near<F: FnMut(&Trail)>(&self, pos: Vec2, radius: f64, mut f: F) {
        let (min_x, min_y) = self.cell_of(pos - Vec2::new(radius, radius));
        let (max_x, max_y) = self.cell_of(pos + Vec2::new(radius, radius));
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                let Some(ids) = self.grid.get(&(cx, cy)) else {
                    continue;
                };
                for id in ids {
                    if let Some(trail) = self.trails.get(id) {
                        f(trail);
                    }
                }
            }
        }
    }

    /// Trails within `radius` of `pos`.
    #[must_use]
    pub fn trails_near(&self, pos: Vec2, radius: f64) -> Vec<&Trail> {
        let mut found = Vec::new();
        let r2 = radius * radius;
        let (min_x, min_y) = self.cell_of(pos - Vec2::new(radius, radius));
        let (max_x, max_y) = self.cell_of(pos + Vec2::new(radius, radius));
        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                if let Some(ids) = self.grid.get(&(cx, cy)) {
                    found.extend(
                        ids.iter()
                            .filter_map(|id| self.trails.get(id))
                            .filter(|t| t.pos.distance_sq(pos) <= r2),
                    );
                }
            }
        }
        found
    }

    /// Lays down a trail, or strengthens a matching one within the merge radius.
    ///
    /// Returns the id of the trail that now carries the deposit, or `None` when
    /// the field is disabled or the input is unusable.
    pub fn deposit(
        &mut self,
        pos: Vec2,
        kind: TrailKind,
        depositor: Option<Uuid>,
        strength: Option<f64>,
        now_ms: f64,
    ) -> Option<u64> {
        if !self.config.enabled || !pos.is_finite() {
            return None;
        }
        let def = kind.def();
        let amount = strength.unwrap_or(def.deposit);
        if amount.is_nan() || amount <= 0.0 {
            return None;
        }

        let merge_r2 = self.config.merge_radius * self.config.merge_radius;
        let mut merge_target: Option<(u64, f64)> = None;
        self.for_each_near(pos, self.config.merge_radius, |t| {
            let d2 = t.pos.distance_sq(pos);
            if t.kind == kind
                && t.depositor == depositor
                && d2 <= merge_r2
                && merge_target.map_or(true, |(_, best)| d2 < best)
            {
                merge_target = Some((t.id, d2));
            }
        });
        if let Some((id, _)) = merge_target {
            if let Some(trail) = self.trails.get_mut(&id) {
                trail.strength = (trail.strength + amount).min(def.max_strength);
                trail.refreshed_ms = now_ms;
                return Some(id);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.trails.insert(
            id,
            Trail {
                id,
                pos,
                kind,
                strength: amount.min(def.max_strength),
                depositor,
                created_ms: now_ms,
                refreshed_ms: now_ms,
                ttl_ms: def.ttl_ms,
            },
        );
        let cell = self.cell_of(pos);
        let ids = self.grid.entry(cell).or_default();
        ids.push(id);

        if ids.len() > self.config.max_trails_per_cell {
            let weakest = ids
                .iter()
                .copied()
                .filter(|&other| other != id)
                .min_by(|a, b| {
                    let sa = self.trails.get(a).map_or(0.0, |t| t.strength);
                    let sb = self.trails.get(b).map_or(0.0, |t| t.strength);
                    sa.total_cmp(&sb)
                });
            if let Some(weakest) = weakest {
                ids.retain(|&other| other != weakest);
                self.trails.remove(&weakest);
                self.stats.evicted += 1;
            }
        }

        self.stats.deposited += 1;
        self.stats.peak = self.stats.peak.max(self.trails.len());
        Some(id)
    }

    /// Overrides the lifetime of one trail. Returns `false` for unknown ids.
    pub fn set_ttl(&mut self, id: u64, ttl_ms: f64) -> bool {
        match self.trails.get_mut(&id) {
            Some(trail) => {
                trail.ttl_ms = ttl_ms.max(0.0);
                true
            }
            None => false,
        }
    }

    /// Force and behaviour flags for `agent`.
    #[must_use]
    pub fn influence(&self, agent: &Agent) -> Influence {
        self.influence_at(agent.pos, Some(agent.id), agent.is_mature())
    }

    /// Sums every nearby trail's contribution at `pos`.
    ///
    /// Each trail adds `force × strength_fraction × falloff` along the unit
    /// vector toward its centre; repelling kinds carry a negative force. Trails
    /// laid by `receiver` are skipped except path marks. Mating trails only
    /// affect mature receivers.
    #[must_use]
    pub fn influence_at(&self, pos: Vec2, receiver: Option<Uuid>, mature: bool) -> Influence {
        let mut influence = Influence::default();
        if !self.config.enabled || !pos.is_finite() {
            return influence;
        }
        let reach = TrailKind::ALL
            .into_iter()
            .map(|k| k.def().radius)
            .fold(0.0, f64::max);

        self.for_each_near(pos, reach, |trail| {
            let def = trail.kind.def();
            if def.mature_only && !mature {
                return;
            }
            if trail.kind != TrailKind::Path && receiver.is_some() && trail.depositor == receiver
            {
                return;
            }
            let distance = trail.pos.distance(pos);
            let weight = trail.strength_fraction() * falloff(distance, def.radius);
            if weight <= 0.0 {
                return;
            }
            let toward = direction_or(pos, trail.pos, fallback_direction(trail.id));
            influence.force += toward * (def.force * weight);
            influence.flags.raise(trail.kind);
        });
        influence
    }

    /// Decays and purges trails. Runs at most once per decay interval.
    ///
    /// Returns `true` when a decay pass actually ran.
    pub fn update(&mut self, now_ms: f64) -> bool {
        let elapsed_ms = now_ms - self.last_update_ms;
        if elapsed_ms < self.config.decay_interval_ms {
            return false;
        }
        self.last_update_ms = now_ms;
        let seconds = elapsed_ms / 1000.0;

        let mut expired = Vec::new();
        for trail in self.trails.values_mut() {
            let def = trail.kind.def();
            trail.strength -= def.decay_rate * def.max_strength * seconds;
            if trail.is_expired(now_ms) {
                expired.push((trail.id, trail.pos));
            }
        }
        for (id, pos) in expired {
            self.remove_trail(id, pos);
            self.stats.decayed += 1;
        }
        true
    }

    fn remove_trail(&mut self, id: u64, pos: Vec2) {
        self.trails.remove(&id);
        let cell = self.cell_of(pos);
        if let Some(ids) = self.grid.get_mut(&cell) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.grid.remove(&cell);
            }
        }
    }

    pub fn clear(&mut self) {
        self.trails.clear();
        self.grid.clear();
    }
}

/// Mature agents lay trails on a per-agent timer, then the field decays.
///
/// Kinds laid, in order: danger while alarmed, mating when ready to
/// reproduce, swarm while in a swarm, food near a mature planet, and
/// sometimes a weak path mark.
pub fn deposit_and_decay<R: Rng>(ctx: &mut TickContext<'_, R>) {
    if !ctx.pheromones.is_enabled() {
        return;
    }
    let now = ctx.clock.now_ms;
    let dt = ctx.clock.dt_ms;
    let interval = ctx.config.pheromones.deposit_interval_ms;
    let path_chance = ctx.config.pheromones.path_deposit_chance;
    let food_radius = ctx.config.pheromones.food_planet_radius;

    for i in 0..ctx.agents.len() {
        let agent = &mut ctx.agents.as_mut_slice()[i];
        if !agent.is_mature() {
            continue;
        }
        agent.deposit_timer_ms -= dt;
        if agent.deposit_timer_ms > 0.0 {
            continue;
        }
        agent.deposit_timer_ms = interval;

        let (id, pos) = (agent.id, agent.pos);
        let alarmed = agent.alarm_ms > 0.0;
        let ready = is_reproduction_ready(agent, &ctx.config.reproduction);
        let swarming = agent.markers.swarm_id.is_some();
        let near_food = agent.modifiers.near_energy_well
            || ctx
                .planets
                .iter()
                .any(|p| p.is_mature() && p.pos.distance(pos) <= food_radius);

        if alarmed {
            ctx.pheromones.deposit(pos, TrailKind::Danger, Some(id), None, now);
        }
        if ready {
            ctx.pheromones.deposit(pos, TrailKind::Mating, Some(id), None, now);
        }
        if swarming {
            ctx.pheromones.deposit(pos, TrailKind::Swarm, Some(id), None, now);
        }
        if near_food {
            ctx.pheromones.deposit(pos, TrailKind::Food, Some(id), None, now);
        }
        if ctx.chance(path_chance) {
            let half = TrailKind::Path.def().deposit * 0.5;
            ctx.pheromones
                .deposit(pos, TrailKind::Path, Some(id), Some(half), now);
        }
    }

    ctx.pheromones.update(now);
}

/// Applies each live agent's trail influence as a steering force.
pub fn steer_agents<R: Rng>(ctx: &mut TickContext<'_, R>) {
    if !ctx.pheromones.is_enabled() || ctx.pheromones.is_empty() {
        return;
    }
    for i in 0..ctx.agents.len() {
        let agent = &ctx.agents.as_slice()[i];
        if !agent.is_alive() {
            continue;
        }
        let force = ctx.pheromones.influence(agent).force;
        ctx.agents.as_mut_slice()[i].apply_force(force);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_data::{Digit, LifeState};

    fn field() -> PheromoneField {
        PheromoneField::new(&PheromoneConfig::default())
    }

    fn mature(n: u128, x: f64, y: f64) -> Agent {
        let mut a = Agent::new(Uuid::from_u128(n), Vec2::new(x, y), Digit::One);
        a.state = LifeState::Mature;
        a
    }

    #[test]
    fn test_same_kind_and_depositor_merge() {
        let mut f = field();
        let owner = Some(Uuid::from_u128(1));
        let a = f.deposit(Vec2::new(100.0, 100.0), TrailKind::Food, owner, Some(60.0), 0.0);
        let b = f.deposit(Vec2::new(108.0, 100.0), TrailKind::Food, owner, Some(60.0), 10.0);
        assert_eq!(a, b);
        assert_eq!(f.len(), 1);
        let trail = f.get(a.expect("deposited")).expect("trail");
        assert_eq!(trail.strength, 100.0);
        assert_eq!(trail.refreshed_ms, 10.0);
    }

    #[test]
    fn test_different_depositor_or_distance_do_not_merge() {
        let mut f = field();
        f.deposit(Vec2::new(100.0, 100.0), TrailKind::Food, Some(Uuid::from_u128(1)), None, 0.0);
        f.deposit(Vec2::new(100.0, 100.0), TrailKind::Food, Some(Uuid::from_u128(2)), None, 0.0);
        f.deposit(Vec2::new(130.0, 100.0), TrailKind::Food, Some(Uuid::from_u128(1)), None, 0.0);
        f.deposit(Vec2::new(100.0, 100.0), TrailKind::Swarm, Some(Uuid::from_u128(1)), None, 0.0);
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn test_disabled_field_refuses_deposits() {
        let mut f = field();
        f.set_enabled(false);
        assert!(f
            .deposit(Vec2::new(1.0, 1.0), TrailKind::Danger, None, None, 0.0)
            .is_none());
        assert!(f.is_empty());
    }

    #[test]
    fn test_cell_capacity_evicts_weakest() {
        let mut f = field();
        for n in 0..10u128 {
            f.deposit(
                Vec2::new(5.0, 5.0),
                TrailKind::Path,
                Some(Uuid::from_u128(n)),
                Some(10.0 + n as f64),
                0.0,
            );
        }
        assert_eq!(f.len(), 10);
        assert_eq!(f.stats().evicted, 0);
        let newest = f.deposit(Vec2::new(6.0, 6.0), TrailKind::Path, Some(Uuid::from_u128(99)), Some(30.0), 0.0);
        assert_eq!(f.len(), 10);
        assert!(f.iter().all(|t| t.strength > 10.0));
        assert!(f.get(newest.expect("deposited")).is_some());
        let stats = f.stats();
        assert_eq!(stats.evicted, 1);
        assert_eq!(stats.deposited, 11);
        assert_eq!(stats.active, 10);
    }

    #[test]
    fn test_neighbouring_cell_is_not_evicted() {
        let mut f = field();
        for n in 0..10u128 {
            f.deposit(Vec2::new(5.0, 5.0), TrailKind::Path, Some(Uuid::from_u128(n)), Some(20.0), 0.0);
        }
        let cell = f.config().cell_size;
        f.deposit(Vec2::new(cell + 5.0, 5.0), TrailKind::Path, Some(Uuid::from_u128(50)), Some(20.0), 0.0);
        assert_eq!(f.len(), 11);
        assert_eq!(f.stats().evicted, 0);
    }

    #[test]
    fn test_danger_at_centre_pushes_away() {
        let mut f = field();
        let trail = Vec2::new(200.0, 200.0);
        f.deposit(trail, TrailKind::Danger, Some(Uuid::from_u128(7)), None, 0.0);

        let on_top = f.influence(&mature(1, 200.0, 200.0));
        assert!(on_top.flags.fleeing_danger);
        assert!(on_top.force.length() > 0.0);
        let step = trail + on_top.force.normalized() * 5.0;
        assert!(step.distance(trail) > 0.0);

        let beside = f.influence(&mature(2, 210.0, 200.0));
        assert!(beside.force.x > 0.0);
    }

    #[test]
    fn test_own_trails_ignored_except_path() {
        let mut f = field();
        let agent = mature(1, 50.0, 50.0);
        f.deposit(Vec2::new(60.0, 50.0), TrailKind::Food, Some(agent.id), None, 0.0);
        assert_eq!(f.influence(&agent), Influence::default());

        f.deposit(Vec2::new(60.0, 50.0), TrailKind::Path, Some(agent.id), None, 0.0);
        let inf = f.influence(&agent);
        assert!(inf.flags.following_path);
        assert!(!inf.flags.seeking_food);
        assert!(inf.force.x > 0.0);
    }

    #[test]
    fn test_mating_only_reaches_mature() {
        let mut f = field();
        f.deposit(Vec2::new(50.0, 50.0), TrailKind::Mating, Some(Uuid::from_u128(9)), None, 0.0);
        let mut young = mature(1, 70.0, 50.0);
        young.state = LifeState::Spawning;
        assert!(!f.influence(&young).flags.seeking_mate);
        assert!(f.influence(&mature(2, 70.0, 50.0)).flags.seeking_mate);
    }

    #[test]
    fn test_update_is_throttled_and_decays() {
        let mut f = field();
        let id = f
            .deposit(Vec2::new(10.0, 10.0), TrailKind::Food, None, Some(50.0), 0.0)
            .expect("deposited");
        assert!(!f.update(50.0));
        assert_eq!(f.get(id).map(|t| t.strength), Some(50.0));
        assert!(f.update(1000.0));
        let after = f.get(id).map(|t| t.strength).expect("alive");
        assert!((after - 48.0).abs() < 1e-9);
    }

    #[test]
    fn test_ttl_expiry_clears_grid() {
        let mut f = field();
        f.deposit(Vec2::new(10.0, 10.0), TrailKind::Danger, None, Some(150.0), 0.0);
        f.update(14_900.0);
        assert_eq!(f.len(), 1);
        f.update(15_000.0);
        assert_eq!(f.len(), 0);

        f.deposit(Vec2::new(10.0, 10.0), TrailKind::Path, None, Some(50.0), 20_000.0);
        f.update(79_900.0);
        assert_eq!(f.len(), 1);
        f.update(80_000.0);
        assert_eq!(f.len(), 0);
        assert!(f.trails_near(Vec2::new(10.0, 10.0), 50.0).is_empty());
        assert_eq!(f.stats().decayed, 2);
        assert_eq!(f.stats().deposited, 2);
    }

    #[test]
    fn test_foraging_at_an_energy_well_lays_food() {
        let mut config = crate::config::AppConfig::default();
        config.pheromones.path_deposit_chance = 0.0;
        let mut fx = crate::context::testing::Fixture::new(config);
        let forager = fx.mature_at(1, Vec2::new(200.0, 200.0), Digit::One);
        fx.mature_at(2, Vec2::new(600.0, 200.0), Digit::One);
        fx.agents.as_mut_slice()[forager].modifiers.near_energy_well = true;

        deposit_and_decay(&mut fx.ctx());

        let food: Vec<_> = fx.pheromones.iter().filter(|t| t.kind == TrailKind::Food).collect();
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].depositor, Some(Uuid::from_u128(1)));
    }
}
