use super::{centroid, swarm_threat, transition, Predator, WellField};
use crate::agents::AgentStore;
use crate::config::ShadowConfig;
use crate::context::{SpawnRequest, TickContext, TickOutput};
use firefly_data::{
    BirthOrigin, LiveEvent, PredatorKind, PredatorState, RareKind, ShadowState, Vec2,
};
use rand::Rng;
use uuid::Uuid;

/// Corrupting wanderer. Converts agents of the target digit in place and is
/// purified by golden agents or by lingering near planets.
#[derive(Debug, Clone)]
pub struct Shadow {
    pub id: u64,
    pub pos: Vec2,
    /// Pixels per millisecond.
    pub vel: Vec2,
    pub state: ShadowState,
    pub energy: f64,
    /// Light absorbed near planets.
    pub absorbed: f64,
    pub converted: u64,
    /// Updates spent inside a golden agent's touch radius.
    touches: u32,
    target: Option<Uuid>,
    timer_ms: f64,
    cooldown_ms: f64,
    config: ShadowConfig,
}

impl Shadow {
    pub fn new(id: u64, pos: Vec2, config: &ShadowConfig) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            state: ShadowState::Spawning,
            energy: config.energy,
            absorbed: 0.0,
            converted: 0,
            touches: 0,
            target: None,
            timer_ms: config.spawning_ms,
            cooldown_ms: 0.0,
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn touches(&self) -> u32 {
        self.touches
    }

    fn set_state(&mut self, to: ShadowState, tick: u64, out: &mut TickOutput) {
        let from = self.state;
        self.state = to;
        transition(
            out,
            PredatorKind::Shadow,
            self.id,
            PredatorState::Shadow(from),
            PredatorState::Shadow(to),
            tick,
        );
    }

    fn begin_purifying(&mut self, tick: u64, out: &mut TickOutput) {
        self.target = None;
        self.timer_ms = self.config.purifying_ms;
        tracing::debug!(id = self.id, touches = self.touches(), absorbed = self.absorbed, "Shadow purifying");
        self.set_state(ShadowState::Purifying, tick, out);
    }

    /// Converts the agent at `idx` in place.
    fn convert<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, idx: usize) -> bool {
        let Some(agent) = ctx.agents.at_mut(idx) else {
            return false;
        };
        if !agent.is_mature() || agent.markers.corrupted {
            return false;
        }
        agent.markers.corrupted = true;
        agent.modifiers.decay_multiplier = self.config.victim_decay_multiplier;
        agent.modifiers.resistance_bonus = self.config.victim_resistance;
        let id = agent.id;
        self.energy += self.config.conversion_energy;
        self.converted += 1;
        self.cooldown_ms = self.config.conversion_cooldown_ms;
        self.target = None;
        ctx.out.emit(LiveEvent::Converted {
            shadow_id: self.id,
            agent: id,
            tick: ctx.clock.tick,
        });
        true
    }

    /// Steering from nearby mature planets, and light absorbed from them.
    fn planet_pressure<R: Rng>(&mut self, ctx: &TickContext<'_, R>) -> Vec2 {
        let radius = self.config.planet_avoid_radius;
        let mut force = Vec2::ZERO;
        for planet in ctx.planets.iter().filter(|p| p.is_mature()) {
            let d = planet.pos.distance(self.pos);
            if d >= radius {
                continue;
            }
            let f = (radius - d) / radius;
            force += (self.pos - planet.pos).normalized() * (self.config.planet_avoid_force * f);
            self.absorbed += self.config.absorb_rate * ctx.clock.frames();
        }
        force
    }
}

impl Predator for Shadow {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> PredatorKind {
        PredatorKind::Shadow
    }

    fn state(&self) -> PredatorState {
        PredatorState::Shadow(self.state)
    }

    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn vigor(&self) -> f64 {
        self.energy
    }

    fn target(&self) -> Option<Uuid> {
        self.target
    }

    fn is_finished(&self) -> bool {
        self.state == ShadowState::Dead
    }

    fn prune(&mut self, agents: &AgentStore) {
        if self.target.is_some_and(|id| !agents.is_mature(&id)) {
            self.target = None;
        }
    }

    fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, well: Option<WellField>) {
        let tick = ctx.clock.tick;
        let dt = ctx.clock.dt_ms;
        let frames = ctx.clock.frames();
        self.timer_ms -= dt;
        self.cooldown_ms = (self.cooldown_ms - dt).max(0.0);

        match self.state {
            ShadowState::Dead => return,
            ShadowState::Purifying => {
                self.vel = self.vel * self.config.damping;
                self.pos += self.vel * dt;
                if self.timer_ms <= 0.0 {
                    tracing::info!(id = self.id, "Shadow purified");
                    self.set_state(ShadowState::Dead, tick, ctx.out);
                    ctx.out.emit(LiveEvent::ShadowPurified {
                        shadow_id: self.id,
                        x: self.pos.x,
                        y: self.pos.y,
                        tick,
                    });
                    ctx.out
                        .request_spawn(SpawnRequest::at(self.pos, BirthOrigin::Purification));
                }
                return;
            }
            ShadowState::Spawning => {
                if self.timer_ms <= 0.0 {
                    self.set_state(ShadowState::Active, tick, ctx.out);
                }
                return;
            }
            ShadowState::Active | ShadowState::Fleeing => {}
        }

        self.energy -= self.config.energy_decay * dt;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            tracing::info!(id = self.id, "Shadow faded");
            self.set_state(ShadowState::Dead, tick, ctx.out);
            return;
        }

        let mut force = Vec2::ZERO;
        if let Some(field) = well {
            force += field.pull_at(self.pos) * (1.0 - self.config.gravity_immunity);
        }
        force += self.planet_pressure(ctx);

        let golden = ctx.agents_near(self.pos, self.config.flee_release, |a| {
            a.is_alive() && a.markers.rare == Some(RareKind::Golden)
        });
        let nearest_golden = golden
            .first()
            .and_then(|&i| ctx.agents.at(i))
            .map(|a| (a.id, a.pos));
        let touched = golden.iter().any(|&i| {
            ctx.agents
                .at(i)
                .is_some_and(|a| a.pos.distance(self.pos) <= self.config.touch_radius)
        });
        if touched {
            self.touches += 1;
        }
        if self.touches >= self.config.touches_to_purify
            || self.absorbed >= self.config.absorb_threshold
        {
            self.begin_purifying(tick, ctx.out);
            return;
        }

        let crowded = swarm_threat(
            ctx,
            self.pos,
            self.config.swarm_defense_count,
            self.config.swarm_defense_radius,
        );
        let golden_close = nearest_golden
            .is_some_and(|(_, pos)| pos.distance(self.pos) <= self.config.flee_radius);
        match self.state {
            ShadowState::Active if golden_close || crowded => {
                self.target = None;
                self.set_state(ShadowState::Fleeing, tick, ctx.out);
            }
            ShadowState::Fleeing if nearest_golden.is_none() && !crowded => {
                self.set_state(ShadowState::Active, tick, ctx.out);
            }
            _ => {}
        }

        let mut max_speed = self.config.base_speed;
        if self.state == ShadowState::Fleeing {
            if let Some((_, pos)) = nearest_golden {
                force += (self.pos - pos).normalized() * self.config.flee_force;
            } else {
                let crowd =
                    ctx.agents_near(self.pos, self.config.swarm_defense_radius, |a| a.is_mature());
                if let Some(center) = centroid(ctx.agents.as_slice(), &crowd) {
                    force += (self.pos - center).normalized() * self.config.flee_force;
                }
            }
            max_speed *= 1.5;
        } else {
            let digit = ctx.config.digit.shadow_target_digit;
            let prey = ctx.agents_near(self.pos, self.config.hunt_radius, |a| {
                a.is_mature() && a.digit == digit && !a.markers.corrupted
            });
            if let Some(&idx) = prey.first() {
                let Some((id, pos)) = ctx.agents.at(idx).map(|a| (a.id, a.pos)) else {
                    return;
                };
                self.target = Some(id);
                force += (pos - self.pos).normalized() * self.config.hunt_force;
                let in_range = pos.distance(self.pos) <= self.config.conversion_radius;
                if in_range
                    && self.cooldown_ms <= 0.0
                    && ctx.chance(self.config.conversion_chance)
                    && self.convert(ctx, idx)
                {
                    tracing::debug!(id = self.id, agent = %id, "Agent corrupted");
                }
            } else {
                self.target = None;
            }
        }

        self.vel += force * frames;
        self.vel = (self.vel * self.config.damping).clamp_length(max_speed);
        self.pos += self.vel * dt;
        super::keep_inside(
            &mut self.pos,
            &mut self.vel,
            ctx.config.arena.width,
            ctx.config.arena.height,
            0.0,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::testing::Fixture;
    use firefly_data::Digit;

    fn active(pos: Vec2) -> Shadow {
        let mut s = Shadow::new(3, pos, &ShadowConfig::default());
        s.state = ShadowState::Active;
        s
    }

    #[test]
    fn test_conversion_marks_victim() {
        let mut config = AppConfig::default();
        config.shadows.conversion_chance = 1.0;
        let mut fx = Fixture::new(config);
        let pos = Vec2::new(400.0, 400.0);
        let zero = fx.mature_at(1, pos + Vec2::new(20.0, 0.0), Digit::Zero);
        let one = fx.mature_at(2, pos + Vec2::new(0.0, 20.0), Digit::One);
        let mut s = active(pos);
        s.update(&mut fx.ctx(), None);

        let victim = &fx.agents.as_slice()[zero];
        assert!(victim.markers.corrupted);
        assert_eq!(victim.modifiers.decay_multiplier, 0.5);
        assert_eq!(victim.modifiers.resistance_bonus, 0.5);
        assert!(!fx.agents.as_slice()[one].markers.corrupted);
        assert_eq!(s.converted, 1);
        assert!(s.energy > 150.0);
        assert!(fx
            .out
            .events
            .iter()
            .any(|e| matches!(e, LiveEvent::Converted { shadow_id: 3, .. })));
    }

    #[test]
    fn test_energy_exhaustion_removes_without_replacement() {
        let mut fx = Fixture::new(AppConfig::default());
        let mut s = active(Vec2::new(400.0, 400.0));
        s.energy = 0.1;
        s.update(&mut fx.ctx(), None);
        assert!(s.is_finished());
        assert!(fx.out.spawns.is_empty());
    }

    #[test]
    fn test_lingering_golden_purifies() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        let idx = fx.mature_at(1, pos + Vec2::new(10.0, 0.0), Digit::One);
        fx.agents.as_mut_slice()[idx].markers.rare = Some(RareKind::Golden);
        let mut s = active(pos);

        let needed = s.config.touches_to_purify;
        for _ in 1..needed {
            s.update(&mut fx.ctx(), None);
            assert_eq!(s.state, ShadowState::Fleeing);
        }
        s.update(&mut fx.ctx(), None);
        assert_eq!(s.touches(), needed);
        assert_eq!(s.state, ShadowState::Purifying);

        fx.clock.dt_ms = 3000.0;
        s.update(&mut fx.ctx(), None);
        assert!(s.is_finished());
        assert_eq!(fx.out.spawns.len(), 1);
        assert_eq!(fx.out.spawns[0].origin, BirthOrigin::Purification);
        assert!(fx
            .out
            .events
            .iter()
            .any(|e| matches!(e, LiveEvent::ShadowPurified { .. })));
    }

    #[test]
    fn test_crowd_forces_flee_until_it_disperses() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        let count = fx.config.shadows.swarm_defense_count;
        for n in 0..count {
            let angle = n as f64 * std::f64::consts::TAU / count as f64;
            fx.mature_at(n as u128 + 1, pos + Vec2::from_angle(angle) * 30.0, Digit::One);
        }
        let mut s = active(pos);
        s.update(&mut fx.ctx(), None);

        assert_eq!(s.state, ShadowState::Fleeing);
        assert!(s.target().is_none());
        assert!(fx.out.events.iter().any(|e| matches!(
            e,
            LiveEvent::PredatorStateChanged {
                to: PredatorState::Shadow(ShadowState::Fleeing),
                ..
            }
        )));

        for agent in fx.agents.iter_mut() {
            agent.pos += Vec2::new(300.0, 0.0);
        }
        s.update(&mut fx.ctx(), None);
        assert_eq!(s.state, ShadowState::Active);
    }

    #[test]
    fn test_flees_golden_and_releases() {
        let mut fx = Fixture::new(AppConfig::default());
        let pos = Vec2::new(400.0, 400.0);
        let idx = fx.mature_at(1, pos + Vec2::new(90.0, 0.0), Digit::One);
        fx.agents.as_mut_slice()[idx].markers.rare = Some(RareKind::Golden);
        let mut s = active(pos);
        s.update(&mut fx.ctx(), None);
        assert_eq!(s.state, ShadowState::Fleeing);

        fx.agents.as_mut_slice()[idx].pos = pos + Vec2::new(300.0, 0.0);
        s.update(&mut fx.ctx(), None);
        assert_eq!(s.state, ShadowState::Active);
    }
}
