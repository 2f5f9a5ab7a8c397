use super::{
    alarm, catch_chance, centroid, consume, is_prey, keep_inside, transition, Predator, WellField,
};
use crate::agents::AgentStore;
use crate::config::HunterConfig;
use crate::context::{TickContext, TickOutput};
use firefly_data::{
    DeathCause, HunterKind, HunterProfile, HunterState, PredatorKind, PredatorState, Vec2,
};
use rand::Rng;
use uuid::Uuid;

const DETECT_MS: f64 = 300.0;
const FEED_MS: f64 = 1500.0;
const STEER: f64 = 0.1;

/// Mobile predator that patrols, chases and strikes.
#[derive(Debug, Clone)]
pub struct Hunter {
    pub id: u64,
    pub kind: HunterKind,
    pub pos: Vec2,
    /// Pixels per millisecond.
    pub vel: Vec2,
    pub state: HunterState,
    pub satiation: f64,
    pub caught: u64,
    target: Option<Uuid>,
    waypoint: Vec2,
    timer_ms: f64,
    cooldown_ms: f64,
    burst_ms: f64,
    burst_cooldown_ms: f64,
    profile: HunterProfile,
    config: HunterConfig,
}

impl Hunter {
    pub fn new<R: Rng>(
        id: u64,
        kind: HunterKind,
        pos: Vec2,
        config: &HunterConfig,
        rng: &mut R,
    ) -> Self {
        let heading = rng.gen_range(0.0..std::f64::consts::TAU);
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            state: HunterState::Spawning,
            satiation: 0.0,
            caught: 0,
            target: None,
            waypoint: pos + Vec2::from_angle(heading) * 100.0,
            timer_ms: config.birth_ms,
            cooldown_ms: 0.0,
            burst_ms: 0.0,
            burst_cooldown_ms: 0.0,
            profile: kind.profile(),
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn profile(&self) -> &HunterProfile {
        &self.profile
    }

    #[must_use]
    pub fn is_bursting(&self) -> bool {
        self.burst_ms > 0.0
    }

    fn set_state(&mut self, to: HunterState, tick: u64, out: &mut TickOutput) {
        let from = self.state;
        self.state = to;
        transition(
            out,
            PredatorKind::Hunter(self.kind),
            self.id,
            PredatorState::Hunter(from),
            PredatorState::Hunter(to),
            tick,
        );
    }

    /// Adds satiation, never past the sub-type's maximum.
    pub fn feed(&mut self, amount: f64) {
        self.satiation = (self.satiation + amount).clamp(0.0, self.profile.satiation_max);
    }

    fn steer(&mut self, desired: Vec2, frames: f64) {
        self.vel += (desired - self.vel) * (STEER * frames).min(1.0);
    }

    fn pick_waypoint<R: Rng>(&mut self, rng: &mut R, width: f64, height: f64) {
        let m = self.config.bounds_margin.min(width / 2.0).min(height / 2.0);
        self.waypoint = Vec2::new(
            rng.gen_range(m..=width - m),
            rng.gen_range(m..=height - m),
        );
    }

    fn patrol_wait<R: Rng>(&self, rng: &mut R) -> f64 {
        let (lo, hi) = (self.config.patrol_wait_min_ms, self.config.patrol_wait_max_ms);
        if hi > lo {
            rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Nearest visible prey the sub-type is willing to go after.
    fn choose_target(&self, agents: &AgentStore, visible: &[usize]) -> Option<Uuid> {
        let nearest = agents.at(*visible.first()?)?;
        if let Some(ambush) = self.profile.ambush_radius {
            if nearest.pos.distance(self.pos) > ambush {
                return None;
            }
        }
        Some(nearest.id)
    }

    /// Catches up to `max_prey` agents inside the catch radius.
    fn strike<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) -> u32 {
        let kind = PredatorKind::Hunter(self.kind);
        let candidates = ctx.agents_near(self.pos, self.profile.catch_radius, is_prey);
        let mut caught = 0;
        for idx in candidates {
            if caught >= self.profile.max_prey {
                break;
            }
            let Some(pos) = ctx.agents.at(idx).map(|a| a.pos) else {
                continue;
            };
            let chance = catch_chance(ctx, pos);
            if chance <= 0.0 || ctx.rng.gen::<f64>() >= chance {
                continue;
            }
            if consume(ctx, idx, kind, self.id, DeathCause::Hunter).is_some() {
                caught += 1;
                self.caught += 1;
                self.feed(self.config.catch_satiation);
            }
        }
        caught
    }

    fn update_burst(&mut self, dt: f64, target_distance: Option<f64>) {
        self.burst_cooldown_ms = (self.burst_cooldown_ms - dt).max(0.0);
        if self.burst_ms > 0.0 {
            self.burst_ms = (self.burst_ms - dt).max(0.0);
            return;
        }
        let (Some(burst), Some(d)) = (self.profile.burst, target_distance) else {
            return;
        };
        if self.burst_cooldown_ms <= 0.0 && d <= burst.radius {
            self.burst_ms = burst.duration_ms;
            self.burst_cooldown_ms = burst.cooldown_ms;
            tracing::debug!(id = self.id, "Nova burst");
        }
    }
}

impl Predator for Hunter {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> PredatorKind {
        PredatorKind::Hunter(self.kind)
    }

    fn state(&self) -> PredatorState {
        PredatorState::Hunter(self.state)
    }

    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn vigor(&self) -> f64 {
        self.satiation
    }

    fn target(&self) -> Option<Uuid> {
        self.target
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn prune(&mut self, agents: &AgentStore) {
        if self.target.is_some_and(|id| !agents.is_live(&id)) {
            self.target = None;
        }
    }

    fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, _well: Option<WellField>) {
        let tick = ctx.clock.tick;
        let dt = ctx.clock.dt_ms;
        let frames = ctx.clock.frames();
        let (width, height) = (ctx.config.arena.width, ctx.config.arena.height);

        self.cooldown_ms = (self.cooldown_ms - dt).max(0.0);
        self.timer_ms -= dt;

        let visible = ctx.agents_near(self.pos, self.profile.detect_radius, is_prey);
        if self.state != HunterState::Spawning {
            alarm(ctx.agents, &visible);
        }

        // Crowds win before any catch is attempted.
        match self.state {
            HunterState::Spawning | HunterState::Dormant | HunterState::Retreat => {}
            _ if visible.len() > self.config.retreat_prey_count => {
                self.target = None;
                self.set_state(HunterState::Retreat, tick, ctx.out);
            }
            _ => {}
        }
        if self.satiation >= self.profile.satiation_max
            && !matches!(self.state, HunterState::Dormant | HunterState::Spawning)
        {
            self.target = None;
            self.set_state(HunterState::Dormant, tick, ctx.out);
        }

        let mut speed = self.profile.speed;
        match self.state {
            HunterState::Spawning => {
                self.vel = Vec2::ZERO;
                if self.timer_ms <= 0.0 {
                    self.pick_waypoint(ctx.rng, width, height);
                    self.set_state(HunterState::Patrol, tick, ctx.out);
                }
            }
            HunterState::Patrol => {
                if self.cooldown_ms <= 0.0 {
                    if let Some(target) = self.choose_target(ctx.agents, &visible) {
                        self.target = Some(target);
                        self.timer_ms = DETECT_MS;
                        self.set_state(HunterState::Detect, tick, ctx.out);
                    }
                }
                if self.pos.distance(self.waypoint) < 20.0 {
                    self.vel = self.vel * 0.5;
                    if self.timer_ms <= 0.0 {
                        self.pick_waypoint(ctx.rng, width, height);
                        self.timer_ms = self.patrol_wait(ctx.rng);
                    }
                } else {
                    let desired = (self.waypoint - self.pos).normalized() * speed;
                    self.steer(desired, frames);
                }
            }
            HunterState::Detect => {
                self.vel = self.vel * 0.9;
                if self.target.is_none() {
                    self.set_state(HunterState::Patrol, tick, ctx.out);
                } else if self.timer_ms <= 0.0 {
                    let next = match self.profile.ambush_radius {
                        Some(ambush) => {
                            let close = self
                                .target
                                .and_then(|id| ctx.agents.get(&id))
                                .is_some_and(|a| is_prey(a) && a.pos.distance(self.pos) <= ambush);
                            if close {
                                HunterState::Strike
                            } else {
                                self.target = None;
                                HunterState::Patrol
                            }
                        }
                        None => HunterState::Chase,
                    };
                    self.set_state(next, tick, ctx.out);
                }
            }
            HunterState::Chase => {
                let target = self
                    .target
                    .and_then(|id| ctx.agents.get(&id))
                    .filter(|a| is_prey(a))
                    .map(|a| a.pos);
                match target {
                    Some(pos) if pos.distance(self.pos) <= self.profile.chase_radius => {
                        let d = pos.distance(self.pos);
                        self.update_burst(dt, Some(d));
                        speed = self.profile.chase_speed;
                        if self.is_bursting() {
                            speed *= 2.0;
                        }
                        self.steer((pos - self.pos).normalized() * speed, frames);
                        if d <= self.profile.catch_radius {
                            self.set_state(HunterState::Strike, tick, ctx.out);
                        }
                    }
                    _ => {
                        self.target = None;
                        self.set_state(HunterState::Patrol, tick, ctx.out);
                    }
                }
            }
            HunterState::Strike => {
                let caught = self.strike(ctx);
                self.target = None;
                self.cooldown_ms = self.profile.hunt_cooldown_ms;
                if caught > 0 {
                    tracing::debug!(id = self.id, caught, satiation = self.satiation, "Hunter fed");
                    self.timer_ms = FEED_MS;
                    self.vel = Vec2::ZERO;
                    self.set_state(HunterState::Feed, tick, ctx.out);
                } else {
                    self.set_state(HunterState::Patrol, tick, ctx.out);
                }
            }
            HunterState::Feed => {
                self.vel = self.vel * 0.8;
                if self.timer_ms <= 0.0 {
                    self.set_state(HunterState::Patrol, tick, ctx.out);
                }
            }
            HunterState::Retreat => {
                if visible.len() < self.config.recover_prey_count {
                    self.set_state(HunterState::Patrol, tick, ctx.out);
                } else if let Some(center) = centroid(ctx.agents.as_slice(), &visible) {
                    let away = (self.pos - center).normalized();
                    self.steer(away * (speed * self.config.retreat_speed), frames);
                }
            }
            HunterState::Dormant => {
                if self.satiation < self.profile.satiation_max * self.config.wake_fraction {
                    self.set_state(HunterState::Patrol, tick, ctx.out);
                } else {
                    let desired = (self.waypoint - self.pos).normalized()
                        * (speed * self.config.dormant_speed);
                    self.steer(desired, frames);
                }
            }
        }

        self.satiation =
            (self.satiation - self.profile.satiation_decay * ctx.clock.seconds()).max(0.0);
        self.vel = self.vel * self.config.friction.powf(frames);
        self.pos += self.vel * dt;
        keep_inside(&mut self.pos, &mut self.vel, width, height, self.config.bounds_margin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::testing::Fixture;
    use firefly_data::Digit;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn hunter(kind: HunterKind, pos: Vec2) -> Hunter {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        Hunter::new(9, kind, pos, &HunterConfig::default(), &mut rng)
    }

    #[test]
    fn test_satiation_never_exceeds_max() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        for n in 0..3 {
            fx.mature_at(n, pos + Vec2::new(n as f64, 0.0), Digit::One);
        }
        let mut h = hunter(HunterKind::Hunter, pos);
        h.state = HunterState::Strike;
        h.satiation = 90.0;
        h.update(&mut fx.ctx(), None);

        let max = h.profile().satiation_max;
        assert!(h.satiation <= max && max - h.satiation < 0.01);
        assert_eq!(h.caught, 3);
        assert_eq!(h.state, HunterState::Feed);
        assert_eq!(fx.agents.mature_count(), 0);
    }

    #[test]
    fn test_strike_respects_max_prey() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        for n in 0..3 {
            fx.mature_at(n, pos, Digit::Zero);
        }
        let mut h = hunter(HunterKind::Lurker, pos);
        h.state = HunterState::Strike;
        h.update(&mut fx.ctx(), None);
        assert_eq!(h.caught, 1);
        assert_eq!(fx.agents.mature_count(), 2);
    }

    #[test]
    fn test_crowd_forces_retreat_without_catch() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        for n in 0..11 {
            fx.mature_at(n, pos + Vec2::new(5.0, n as f64), Digit::One);
        }
        let mut h = hunter(HunterKind::Hunter, pos);
        h.state = HunterState::Strike;
        h.update(&mut fx.ctx(), None);

        assert_eq!(h.state, HunterState::Retreat);
        assert_eq!(h.caught, 0);
        assert_eq!(fx.agents.mature_count(), 11);
        assert!(fx.agents.iter().all(|a| a.alarm_ms > 0.0));
    }

    #[test]
    fn test_planet_protection_blocks_catch() {
        let mut config = AppConfig::default();
        config.planets.maturing_ms = 0.0;
        let mut fx = Fixture::new(config);
        let center = Vec2::new(220.0, 400.0);
        let planet = crate::planet::Planet::new(1, center, Digit::Zero, 0.0, 0.0, &fx.config.planets);
        let pos = planet.pos;
        fx.planets.push(planet);
        fx.mature_at(1, pos, Digit::One);

        let mut h = hunter(HunterKind::Hunter, pos);
        h.state = HunterState::Strike;
        h.update(&mut fx.ctx(), None);
        assert_eq!(h.caught, 0);
        assert_eq!(h.state, HunterState::Patrol);
    }

    #[test]
    fn test_lurker_strikes_from_ambush_without_chasing() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        let prey_pos = pos + Vec2::new(70.0, 0.0);
        fx.mature_at(1, prey_pos, Digit::One);
        let mut h = hunter(HunterKind::Lurker, pos);
        h.state = HunterState::Patrol;
        h.waypoint = pos;
        h.timer_ms = 0.0;

        let mut seen = Vec::new();
        for _ in 0..40 {
            h.update(&mut fx.ctx(), None);
            seen.push(h.state);
            if h.state == HunterState::Strike {
                break;
            }
            assert!(h.pos.distance(prey_pos) >= 70.0 - 1e-9);
        }
        assert!(!seen.contains(&HunterState::Chase));
        assert_eq!(seen.last(), Some(&HunterState::Strike));

        h.update(&mut fx.ctx(), None);
        assert_eq!(h.state, HunterState::Patrol);
        assert_eq!(h.caught, 0);
        assert_eq!(fx.agents.mature_count(), 1);
    }

    #[test]
    fn test_lurker_ignores_prey_outside_ambush() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        fx.mature_at(1, pos + Vec2::new(110.0, 0.0), Digit::One);
        let mut h = hunter(HunterKind::Lurker, pos);
        h.state = HunterState::Patrol;
        h.waypoint = pos;
        for _ in 0..30 {
            h.update(&mut fx.ctx(), None);
            assert_eq!(h.state, HunterState::Patrol);
        }
    }

    #[test]
    fn test_hunter_ignores_well_pull() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        let mut h = hunter(HunterKind::Hunter, pos);
        let field = WellField {
            pos: pos + Vec2::new(50.0, 0.0),
            radius: 300.0,
            strength: 5.0,
        };
        h.state = HunterState::Patrol;
        h.waypoint = pos;
        for _ in 0..10 {
            h.update(&mut fx.ctx(), Some(field));
        }
        assert_eq!(h.state, HunterState::Patrol);
        assert_eq!(h.pos, pos);
        assert_eq!(h.vel, Vec2::ZERO);
    }

    #[test]
    fn test_dormant_until_hunger_returns() {
        let mut fx = Fixture::new(AppConfig::default());
        let mut h = hunter(HunterKind::Hunter, Vec2::new(400.0, 400.0));
        h.state = HunterState::Patrol;
        h.satiation = 100.0;
        h.update(&mut fx.ctx(), None);
        assert_eq!(h.state, HunterState::Dormant);

        h.satiation = 65.0;
        h.update(&mut fx.ctx(), None);
        assert_eq!(h.state, HunterState::Patrol);
    }
}
