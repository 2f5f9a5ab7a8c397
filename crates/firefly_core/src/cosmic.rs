//! Cosmic events: rare arena-wide weather rolled on a fixed interval.
//!
//! A solar flare sweeps a band of light from the top of the arena to the
//! bottom, charging every agent it passes once. A void storm scatters drifting
//! vortices that swirl agents around and occasionally mark one with extra
//! gravity resistance. While anything is running, breeding counts as
//! happening under a cosmic event.

use crate::config::{ArenaConfig, CosmicConfig};
use crate::context::{Clock, TickContext, TickOutput};
use firefly_data::{CosmicKind, LiveEvent, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

const HISTORY_LEN: usize = 50;

/// Multipliers the running events impose on the rest of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmicModifiers {
    /// Scales energy-well output.
    pub energy: f64,
    pub glow: f64,
    pub speed: f64,
}

impl Default for CosmicModifiers {
    fn default() -> Self {
        Self {
            energy: 1.0,
            glow: 1.0,
            speed: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vortex {
    pub pos: Vec2,
    /// Pixels per millisecond.
    pub vel: Vec2,
    pub radius: f64,
    pub strength: f64,
    pub clockwise: bool,
    pub age_ms: f64,
    pub max_age_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEvent {
    pub kind: CosmicKind,
    pub started_ms: f64,
    pub duration_ms: f64,
    /// In `[0.5, 1.0]`.
    pub intensity: f64,
    /// Agents the flare wave already charged.
    touched: HashSet<Uuid>,
    pub vortices: Vec<Vortex>,
    max_vortices: usize,
}

impl ActiveEvent {
    #[must_use]
    pub fn ends_ms(&self) -> f64 {
        self.started_ms + self.duration_ms
    }

    /// Fraction of the duration elapsed at `now_ms`, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.started_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// Rises from 0 to 1 at mid-event and back.
    fn curve(&self, now_ms: f64) -> f64 {
        (self.progress(now_ms) * std::f64::consts::PI).sin()
    }

    fn modifiers(&self, now_ms: f64) -> CosmicModifiers {
        let curve = self.curve(now_ms);
        match self.kind {
            CosmicKind::SolarFlare => CosmicModifiers {
                energy: 1.0 + 0.5 * curve * self.intensity,
                glow: 1.0 + 0.3 * curve * self.intensity,
                speed: 1.0,
            },
            CosmicKind::VoidStorm => CosmicModifiers {
                speed: 1.0 + 0.2 * curve,
                ..CosmicModifiers::default()
            },
        }
    }
}

/// One past start, kept for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmicRecord {
    pub kind: CosmicKind,
    pub started_ms: f64,
    pub duration_ms: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CosmicStats {
    pub active: Vec<CosmicKind>,
    pub triggered: u64,
    pub recent: Vec<CosmicKind>,
}

/// Rolls for new events, runs the active ones and ends them on time.
#[derive(Debug, Clone)]
pub struct CosmicScheduler {
    config: CosmicConfig,
    active: Vec<ActiveEvent>,
    /// Last start time per kind.
    last_started: HashMap<CosmicKind, f64>,
    last_check_ms: f64,
    history: VecDeque<CosmicRecord>,
    triggered: u64,
}

impl CosmicScheduler {
    pub fn new(config: &CosmicConfig) -> Self {
        Self {
            config: config.clone(),
            active: Vec::new(),
            last_started: HashMap::new(),
            last_check_ms: 0.0,
            history: VecDeque::new(),
            triggered: 0,
        }
    }

    #[must_use]
    pub fn active(&self) -> &[ActiveEvent] {
        &self.active
    }

    #[must_use]
    pub fn is_active(&self, kind: CosmicKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    /// True while any event is running.
    #[must_use]
    pub fn any_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Product of every running event's multipliers at `now_ms`.
    #[must_use]
    pub fn modifiers(&self, now_ms: f64) -> CosmicModifiers {
        self.active
            .iter()
            .map(|e| e.modifiers(now_ms))
            .fold(CosmicModifiers::default(), |acc, m| CosmicModifiers {
                energy: acc.energy * m.energy,
                glow: acc.glow * m.glow,
                speed: acc.speed * m.speed,
            })
    }

    #[must_use]
    pub fn stats(&self) -> CosmicStats {
        CosmicStats {
            active: self.active.iter().map(|e| e.kind).collect(),
            triggered: self.triggered,
            recent: self.history.iter().rev().take(5).map(|r| r.kind).collect(),
        }
    }

    /// Whether `kind` could start now: off cooldown, not running, and
    /// compatible with everything that is.
    fn eligible(&self, kind: CosmicKind, now_ms: f64) -> bool {
        if self.is_active(kind) {
            return false;
        }
        if let Some(&last) = self.last_started.get(&kind) {
            if now_ms - last < kind.profile().cooldown_ms {
                return false;
            }
        }
        self.active.iter().all(|e| kind.can_overlap(e.kind))
    }

    /// Starts `kind` right away, ending whatever it cannot share the sky with.
    /// Cooldowns and the concurrency cap do not apply.
    pub fn force<R: Rng>(
        &mut self,
        kind: CosmicKind,
        clock: Clock,
        arena: &ArenaConfig,
        rng: &mut R,
        out: &mut TickOutput,
    ) {
        let displaced: Vec<CosmicKind> = self
            .active
            .iter()
            .filter(|e| e.kind == kind || !kind.can_overlap(e.kind))
            .map(|e| e.kind)
            .collect();
        for other in displaced {
            self.end(other, clock.tick, out);
        }
        self.start(kind, clock, arena, rng, out);
    }

    fn start<R: Rng>(
        &mut self,
        kind: CosmicKind,
        clock: Clock,
        arena: &ArenaConfig,
        rng: &mut R,
        out: &mut TickOutput,
    ) {
        let profile = kind.profile();
        let duration_ms = rng.gen_range(profile.min_duration_ms..=profile.max_duration_ms);
        let intensity = rng.gen_range(0.5..=1.0);
        let mut event = ActiveEvent {
            kind,
            started_ms: clock.now_ms,
            duration_ms,
            intensity,
            touched: HashSet::new(),
            vortices: Vec::new(),
            max_vortices: 0,
        };
        if kind == CosmicKind::VoidStorm {
            event.max_vortices = 3 + (intensity * 3.0).floor() as usize;
            let initial = 1 + (intensity * 2.0).floor() as usize;
            for _ in 0..initial {
                let vortex = self.spawn_vortex(intensity, arena, rng);
                event.vortices.push(vortex);
            }
        }

        self.active.push(event);
        self.last_started.insert(kind, clock.now_ms);
        self.triggered += 1;
        self.history.push_back(CosmicRecord {
            kind,
            started_ms: clock.now_ms,
            duration_ms,
        });
        if self.history.len() > HISTORY_LEN {
            self.history.pop_front();
        }
        tracing::info!(%kind, intensity, duration_ms, tick = clock.tick, "Cosmic event started");
        out.emit(LiveEvent::CosmicEventStarted {
            kind,
            intensity,
            duration_ms,
            tick: clock.tick,
        });
    }

    fn end(&mut self, kind: CosmicKind, tick: u64, out: &mut TickOutput) {
        let before = self.active.len();
        self.active.retain(|e| e.kind != kind);
        if self.active.len() != before {
            tracing::info!(%kind, tick, "Cosmic event ended");
            out.emit(LiveEvent::CosmicEventEnded { kind, tick });
        }
    }

    fn spawn_vortex<R: Rng>(&self, intensity: f64, arena: &ArenaConfig, rng: &mut R) -> Vortex {
        let cfg = &self.config;
        Vortex {
            pos: Vec2::new(
                rng.gen_range(0.0..=arena.width),
                rng.gen_range(0.0..=arena.height),
            ),
            vel: Vec2::new(rng.gen_range(-0.025..=0.025), rng.gen_range(-0.025..=0.025)),
            radius: rng.gen_range(cfg.vortex_min_radius..=cfg.vortex_max_radius),
            strength: 0.01 + rng.gen::<f64>() * 0.02 * intensity,
            clockwise: rng.gen_bool(0.5),
            age_ms: 0.0,
            max_age_ms: rng.gen_range(cfg.vortex_min_life_ms..=cfg.vortex_max_life_ms),
        }
    }

    /// Rolls for a new event when the check interval has passed.
    fn roll<R: Rng>(&mut self, clock: Clock, arena: &ArenaConfig, rng: &mut R, out: &mut TickOutput) {
        if clock.now_ms - self.last_check_ms <= self.config.check_interval_ms {
            return;
        }
        self.last_check_ms = clock.now_ms;
        if rng.gen::<f64>() >= self.config.base_chance {
            return;
        }
        if self.active.len() >= self.config.max_concurrent {
            return;
        }
        let candidates: Vec<CosmicKind> = CosmicKind::ALL
            .into_iter()
            .filter(|k| self.eligible(*k, clock.now_ms))
            .collect();
        let total: f64 = candidates.iter().map(|k| k.profile().weight).sum();
        if candidates.is_empty() || total <= 0.0 {
            return;
        }
        let mut pick = rng.gen::<f64>() * total;
        for kind in candidates {
            pick -= kind.profile().weight;
            if pick <= 0.0 {
                self.start(kind, clock, arena, rng, out);
                return;
            }
        }
    }

    /// Ends expired events, rolls for a new one, then runs what is active and
    /// folds the glow and speed multipliers into every agent.
    pub fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        if !self.config.enabled {
            return;
        }
        let clock = ctx.clock;
        let expired: Vec<CosmicKind> = self
            .active
            .iter()
            .filter(|e| clock.now_ms > e.ends_ms())
            .map(|e| e.kind)
            .collect();
        for kind in expired {
            self.end(kind, clock.tick, ctx.out);
        }
        self.roll(clock, &ctx.config.arena, &mut *ctx.rng, ctx.out);

        let mut active = std::mem::take(&mut self.active);
        for event in &mut active {
            match event.kind {
                CosmicKind::SolarFlare => self.run_flare(event, ctx),
                CosmicKind::VoidStorm => self.run_storm(event, ctx),
            }
        }
        self.active = active;

        let mods = self.modifiers(clock.now_ms);
        if mods == CosmicModifiers::default() {
            return;
        }
        for agent in ctx.agents.iter_mut().filter(|a| a.is_alive()) {
            agent.modifiers.glow *= mods.glow;
            agent.modifiers.speed *= mods.speed;
        }
    }

    fn run_flare<R: Rng>(&self, event: &mut ActiveEvent, ctx: &mut TickContext<'_, R>) {
        let progress = event.progress(ctx.clock.now_ms);
        let eased = if progress < 0.5 {
            2.0 * progress * progress
        } else {
            1.0 - (-2.0 * progress + 2.0).powi(2) / 2.0
        };
        let top = -100.0 + (ctx.config.arena.height + 300.0) * eased;
        let bottom = top + self.config.flare_band;
        let boost = self.config.flare_energy * event.intensity;
        let evolve_chance = self.config.flare_evolution_chance * event.intensity;

        for i in 0..ctx.agents.len() {
            let roll = ctx.rng.gen::<f64>();
            let agent = &mut ctx.agents.as_mut_slice()[i];
            if !agent.is_alive() || agent.pos.y < top || agent.pos.y > bottom {
                continue;
            }
            if !event.touched.insert(agent.id) {
                continue;
            }
            agent.add_energy(boost);
            if agent.tier.index() >= 2 && roll < evolve_chance {
                agent.evolution_points += 1;
            }
        }
    }

    fn run_storm<R: Rng>(&self, event: &mut ActiveEvent, ctx: &mut TickContext<'_, R>) {
        let dt = ctx.clock.dt_ms;
        let frames = ctx.clock.frames();
        let config = ctx.config;
        let arena = &config.arena;

        if event.vortices.len() < event.max_vortices && ctx.chance(0.005 * event.intensity * frames) {
            let vortex = self.spawn_vortex(event.intensity, arena, &mut *ctx.rng);
            event.vortices.push(vortex);
        }

        event.vortices.retain_mut(|v| {
            v.age_ms += dt;
            if v.age_ms > v.max_age_ms {
                return false;
            }
            v.pos += v.vel * dt;
            if v.pos.x < 0.0 || v.pos.x > arena.width {
                v.vel.x = -v.vel.x;
            }
            if v.pos.y < 0.0 || v.pos.y > arena.height {
                v.vel.y = -v.vel.y;
            }
            true
        });

        let touch_chance = self.config.void_touch_chance * event.intensity * frames;
        for vortex in &event.vortices {
            for idx in ctx.agents_near(vortex.pos, vortex.radius, |a| a.is_alive()) {
                let roll = ctx.rng.gen::<f64>();
                let Some(agent) = ctx.agents.at_mut(idx) else {
                    continue;
                };
                let offset = vortex.pos - agent.pos;
                let dist = offset.length();
                if dist < 10.0 || dist > vortex.radius {
                    continue;
                }
                let force = vortex.strength * (1.0 - dist / vortex.radius);
                let turn = if vortex.clockwise {
                    std::f64::consts::FRAC_PI_2
                } else {
                    -std::f64::consts::FRAC_PI_2
                };
                let tangent = Vec2::from_angle(offset.angle() + turn) * (force * 0.7);
                let radial = offset * (force * 0.3 / dist);
                agent.apply_force((tangent + radial) * frames);

                if !agent.markers.void_touched && dist < vortex.radius * 0.3 && roll < touch_chance {
                    agent.markers.void_touched = true;
                    agent.modifiers.resistance_bonus += self.config.void_resistance;
                    tracing::debug!(agent = %agent.id, "Void storm marked an agent");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::testing::Fixture;
    use firefly_data::{Digit, Tier};

    /// Only forced events run.
    fn quiet() -> AppConfig {
        let mut config = AppConfig::default();
        config.cosmic.base_chance = 0.0;
        config
    }

    fn forced(fx: &mut Fixture, scheduler: &mut CosmicScheduler, kind: CosmicKind) {
        let arena = fx.config.arena.clone();
        scheduler.force(kind, fx.clock, &arena, &mut fx.rng, &mut fx.out);
    }

    #[test]
    fn test_flare_charges_each_agent_once() {
        let mut fx = Fixture::new(quiet());
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        forced(&mut fx, &mut scheduler, CosmicKind::SolarFlare);
        let intensity = scheduler.active()[0].intensity;
        let duration = scheduler.active()[0].duration_ms;

        // Just after the start the band covers the top rows of the arena.
        let idx = fx.mature_at(1, Vec2::new(300.0, 10.0), Digit::One);
        let far = fx.mature_at(2, Vec2::new(300.0, 700.0), Digit::One);
        fx.agents.as_mut_slice()[idx].energy = 10.0;
        fx.agents.as_mut_slice()[far].energy = 10.0;

        scheduler.update(&mut fx.ctx());
        let boost = fx.config.cosmic.flare_energy * intensity;
        assert!((fx.agents.as_slice()[idx].energy - (10.0 + boost)).abs() < 1e-9);
        assert_eq!(fx.agents.as_slice()[far].energy, 10.0);

        scheduler.update(&mut fx.ctx());
        assert!((fx.agents.as_slice()[idx].energy - (10.0 + boost)).abs() < 1e-9);

        fx.clock.now_ms += duration + 1.0;
        scheduler.update(&mut fx.ctx());
        assert!(!scheduler.any_active());
        assert!(fx.out.events.iter().any(|e| matches!(
            e,
            LiveEvent::CosmicEventEnded { kind: CosmicKind::SolarFlare, .. }
        )));
    }

    #[test]
    fn test_flare_brightens_agents_mid_event() {
        let mut fx = Fixture::new(quiet());
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        forced(&mut fx, &mut scheduler, CosmicKind::SolarFlare);
        let duration = scheduler.active()[0].duration_ms;
        let idx = fx.mature_at(1, Vec2::new(300.0, 300.0), Digit::Zero);

        fx.clock.now_ms += duration / 2.0;
        scheduler.update(&mut fx.ctx());
        let mods = scheduler.modifiers(fx.clock.now_ms);
        assert!(mods.energy > 1.0 && mods.glow > 1.0);
        assert!((fx.agents.as_slice()[idx].modifiers.glow - mods.glow).abs() < 1e-12);
    }

    #[test]
    fn test_flare_can_push_radiant_agents_toward_evolution() {
        let mut config = quiet();
        config.cosmic.flare_evolution_chance = 1.0;
        let mut fx = Fixture::new(config);
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        forced(&mut fx, &mut scheduler, CosmicKind::SolarFlare);
        scheduler.active[0].intensity = 1.0;
        let idx = fx.mature_at(1, Vec2::new(300.0, 5.0), Digit::One);
        fx.agents.as_mut_slice()[idx].tier = Tier::Radiant;
        scheduler.update(&mut fx.ctx());
        assert_eq!(fx.agents.as_slice()[idx].evolution_points, 1);
    }

    #[test]
    fn test_storm_swirls_agents_near_a_vortex() {
        let mut fx = Fixture::new(quiet());
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        forced(&mut fx, &mut scheduler, CosmicKind::VoidStorm);
        let storm = &mut scheduler.active[0];
        assert!(!storm.vortices.is_empty());
        storm.vortices.truncate(1);
        storm.max_vortices = 1;
        let vortex = &mut storm.vortices[0];
        vortex.pos = Vec2::new(400.0, 400.0);
        vortex.vel = Vec2::ZERO;
        vortex.radius = 150.0;
        vortex.max_age_ms = 1e9;
        let near = fx.mature_at(1, Vec2::new(460.0, 400.0), Digit::One);
        let far = fx.mature_at(2, Vec2::new(800.0, 400.0), Digit::One);

        scheduler.update(&mut fx.ctx());
        let pushed = fx.agents.as_slice()[near].acc;
        assert!(pushed.length() > 0.0);
        assert!(pushed.x < 0.0);
        assert!(pushed.y.abs() > pushed.x.abs());
        assert_eq!(fx.agents.as_slice()[far].acc, Vec2::ZERO);
        assert!(scheduler.modifiers(fx.clock.now_ms).speed >= 1.0);
    }

    #[test]
    fn test_void_touch_grants_resistance_once() {
        let mut fx = Fixture::new(quiet());
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        scheduler.config.void_touch_chance = 1.0;
        forced(&mut fx, &mut scheduler, CosmicKind::VoidStorm);
        let storm = &mut scheduler.active[0];
        storm.intensity = 1.0;
        storm.vortices.truncate(1);
        storm.max_vortices = 1;
        let vortex = &mut storm.vortices[0];
        vortex.pos = Vec2::new(400.0, 400.0);
        vortex.vel = Vec2::ZERO;
        vortex.radius = 200.0;
        vortex.max_age_ms = 1e9;
        let idx = fx.mature_at(1, Vec2::new(420.0, 400.0), Digit::Zero);

        for _ in 0..5 {
            scheduler.update(&mut fx.ctx());
            fx.agents.as_mut_slice()[idx].pos = Vec2::new(420.0, 400.0);
        }
        let agent = &fx.agents.as_slice()[idx];
        assert!(agent.markers.void_touched);
        assert_eq!(agent.modifiers.resistance_bonus, fx.config.cosmic.void_resistance);
    }

    #[test]
    fn test_forcing_displaces_incompatible_events() {
        let mut fx = Fixture::new(quiet());
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        forced(&mut fx, &mut scheduler, CosmicKind::SolarFlare);
        forced(&mut fx, &mut scheduler, CosmicKind::VoidStorm);
        assert!(scheduler.is_active(CosmicKind::VoidStorm));
        assert!(!scheduler.is_active(CosmicKind::SolarFlare));
        assert_eq!(scheduler.stats().triggered, 2);
        let ended = fx
            .out
            .events
            .iter()
            .filter(|e| matches!(e, LiveEvent::CosmicEventEnded { .. }))
            .count();
        assert_eq!(ended, 1);
    }

    #[test]
    fn test_scheduler_respects_interval_cooldown_and_cap() {
        let mut config = AppConfig::default();
        config.cosmic.base_chance = 1.0;
        config.cosmic.check_interval_ms = 1000.0;
        let mut fx = Fixture::new(config);
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        fx.clock.now_ms = 500.0;
        scheduler.update(&mut fx.ctx());
        assert!(!scheduler.any_active());

        fx.clock.now_ms = 1500.0;
        scheduler.update(&mut fx.ctx());
        assert_eq!(scheduler.active().len(), 1);
        let first = scheduler.active()[0].kind;

        // The other kind cannot overlap, and the running one is not eligible twice.
        fx.clock.now_ms = 3000.0;
        scheduler.update(&mut fx.ctx());
        assert_eq!(scheduler.active().len(), 1);
        assert_eq!(scheduler.active()[0].kind, first);

        // Once it ends the other kind takes over; the first stays on cooldown.
        let ends = scheduler.active()[0].ends_ms();
        fx.clock.now_ms = ends + 1.0;
        scheduler.update(&mut fx.ctx());
        let other = CosmicKind::ALL
            .into_iter()
            .find(|k| *k != first)
            .expect("two kinds");
        assert!(scheduler.is_active(other));
        assert!(!scheduler.is_active(first));

        fx.clock.now_ms += 1001.0;
        scheduler.update(&mut fx.ctx());
        assert!(!scheduler.is_active(first));
        assert_eq!(scheduler.stats().triggered, 2);
    }

    #[test]
    fn test_disabled_scheduler_never_starts() {
        let mut config = AppConfig::default();
        config.cosmic.enabled = false;
        config.cosmic.base_chance = 1.0;
        let mut fx = Fixture::new(config);
        let mut scheduler = CosmicScheduler::new(&fx.config.cosmic);
        for step in 1..50 {
            fx.clock.now_ms = step as f64 * 20_000.0;
            scheduler.update(&mut fx.ctx());
        }
        assert_eq!(scheduler.stats().triggered, 0);
        assert!(fx.out.events.is_empty());
    }
}
