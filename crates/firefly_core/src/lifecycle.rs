use crate::config::{AgentConfig, AppConfig, DigitConvention};
use crate::context::TickContext;
use firefly_data::{
    Agent, CollisionOutcome, DeathCause, Digit, LifeState, LiveEvent, Tier, Vec2,
};
use rand::Rng;
use uuid::Uuid;

/// Per-agent rules that need no neighbourhood.
pub trait AgentLogic {
    /// `(1 - min(life_left, energy_fraction))^exponent`, in `[0, 1]`.
    fn desperation(&self, exponent: f64) -> f64;
    /// Cruising speed in px per frame.
    fn speed_cap(&self, config: &AgentConfig, desperation: f64) -> f64;
    /// Promotes the agent once it has collected enough evolution points.
    fn try_evolve(&mut self) -> Option<Tier>;
    /// Moves an agent that left the arena plus padding to the opposite edge.
    fn wrap(&mut self, width: f64, height: f64, padding: f64);
    /// Starts the dying fade, remembering why.
    fn begin_dying(&mut self, cause: DeathCause);
}

impl AgentLogic for Agent {
    fn desperation(&self, exponent: f64) -> f64 {
        let energy = (self.energy / Agent::MAX_ENERGY).clamp(0.0, 1.0);
        (1.0 - self.life_fraction().min(energy)).powf(exponent)
    }

    fn speed_cap(&self, config: &AgentConfig, desperation: f64) -> f64 {
        let m = &self.modifiers;
        self.base_speed
            * self.phenotype.speed
            * m.activity
            * m.speed
            * (1.0 + config.desperation_speed_boost * desperation)
    }

    fn try_evolve(&mut self) -> Option<Tier> {
        let threshold = self.tier.evolve_threshold()?;
        if self.evolution_points < threshold {
            return None;
        }
        let next = self.tier.next()?;
        self.tier = next;
        self.evolution_points = 0;
        self.age_ms = 0.0;
        self.energy = Agent::MAX_ENERGY;
        self.refresh_max_age();
        Some(next)
    }

    fn wrap(&mut self, width: f64, height: f64, padding: f64) {
        if self.pos.x < -padding {
            self.pos.x = width + padding;
        } else if self.pos.x > width + padding {
            self.pos.x = -padding;
        }
        if self.pos.y < -padding {
            self.pos.y = height + padding;
        } else if self.pos.y > height + padding {
            self.pos.y = -padding;
        }
    }

    fn begin_dying(&mut self, cause: DeathCause) {
        if self.is_alive() {
            self.state = LifeState::Dying;
            self.age_ms = 0.0;
            self.death_cause = Some(cause);
        }
    }
}

/// Builds a fresh spawning agent. Genetics are attached by the caller.
pub fn create_agent_with_rng<R: Rng>(
    pos: Vec2,
    digit: Option<Digit>,
    config: &AgentConfig,
    rng: &mut R,
) -> Agent {
    let id = Uuid::from_u128(rng.gen::<u128>());
    let digit = digit.unwrap_or_else(|| {
        if rng.gen_bool(0.5) {
            Digit::One
        } else {
            Digit::Zero
        }
    });
    let mut agent = Agent::new(id, pos, digit);
    agent.base_speed = sample(rng, config.min_base_speed, config.max_base_speed);
    agent.base_max_age_ms = sample(rng, config.min_max_age_ms, config.max_max_age_ms);
    agent.refresh_max_age();
    agent.wobble_phase = rng.gen_range(0.0..std::f64::consts::TAU);
    agent.vel = Vec2::from_angle(rng.gen_range(0.0..std::f64::consts::TAU)) * agent.base_speed * 0.5;
    agent
}

fn sample<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Ageing, maturation, energy decay, digit flicker and the dying fade.
pub fn advance_lifecycles<R: Rng>(ctx: &mut TickContext<'_, R>) {
    let dt = ctx.clock.dt_ms;
    let frames = ctx.clock.frames();
    let cfg = &ctx.config.agent;
    let digit = &ctx.config.digit;

    for agent in ctx.agents.iter_mut() {
        agent.collision_cooldown_ms = (agent.collision_cooldown_ms - dt).max(0.0);
        agent.reproduction_cooldown_ms = (agent.reproduction_cooldown_ms - dt).max(0.0);
        agent.alarm_ms = (agent.alarm_ms - dt).max(0.0);
        agent.age_ms += dt * agent.modifiers.time_dilation;

        match agent.state {
            LifeState::Spawning => {
                let grow_ms = (cfg.birth_ms + cfg.growth_ms) / agent.phenotype.maturity_speed;
                if agent.age_ms >= grow_ms {
                    agent.state = LifeState::Mature;
                    agent.age_ms = 0.0;
                } else if flickers(digit, digit.flicker_spawning, ctx.rng) {
                    agent.digit = agent.digit.flipped();
                }
            }
            LifeState::Mature => {
                let decay = cfg.energy_decay / (1.0 + f64::from(agent.tier.index()) * 0.3)
                    * frames
                    / agent.phenotype.energy_efficiency.max(0.1)
                    * agent.modifiers.decay_multiplier;
                agent.energy = (agent.energy - decay).max(0.0);

                if agent.energy <= 0.0 {
                    agent.begin_dying(DeathCause::Starvation);
                } else if agent.age_ms >= agent.max_age_ms {
                    agent.begin_dying(DeathCause::OldAge);
                } else {
                    let d = agent.desperation(cfg.desperation_exponent);
                    let p = digit.flicker_mature + digit.flicker_desperation * d;
                    if flickers(digit, p, ctx.rng) {
                        agent.digit = agent.digit.flipped();
                    }
                }
            }
            LifeState::Dying => {
                if agent.age_ms >= cfg.dying_ms {
                    let cause = agent.death_cause.unwrap_or(DeathCause::Forced);
                    agent.kill(cause);
                }
            }
            LifeState::Dead => {}
        }
    }
}

fn flickers<R: Rng>(convention: &DigitConvention, p: f64, rng: &mut R) -> bool {
    convention.flicker_enabled && p > 0.0 && rng.gen::<f64>() < p
}

/// Integrates accumulated forces into velocity and position.
///
/// Per-frame quantities scale with `dt / 16`. Above the cruising cap the
/// velocity is damped, and it is never allowed past `overspeed_factor` times
/// the cap.
pub fn integrate<R: Rng>(ctx: &mut TickContext<'_, R>) {
    let frames = ctx.clock.frames();
    let cfg = &ctx.config.agent;
    let arena = &ctx.config.arena;
    let wind = ctx.env.wind;

    for agent in ctx.agents.iter_mut() {
        if !agent.state.is_present() {
            agent.acc = Vec2::ZERO;
            continue;
        }
        let d = agent.desperation(cfg.desperation_exponent);

        if agent.state != LifeState::Dying {
            let impulse_p = (cfg.impulse_chance + cfg.impulse_desperation_chance * d)
                * agent.phenotype.wander;
            if impulse_p > 0.0 && ctx.rng.gen::<f64>() < impulse_p {
                let angle = ctx.rng.gen_range(0.0..std::f64::consts::TAU);
                agent.acc += Vec2::from_angle(angle)
                    * (cfg.impulse_strength * agent.phenotype.agility * (1.0 + d));
            }
            agent.acc += wind * (1.0 - agent.gravity_resistance());
        }

        agent.vel += agent.acc;
        agent.acc = Vec2::ZERO;
        if !agent.vel.is_finite() {
            agent.vel = Vec2::ZERO;
        }

        let cap = agent.speed_cap(cfg, d);
        if agent.vel.length() > cap {
            agent.vel = (agent.vel * cfg.overspeed_damping).clamp_length(cap * cfg.overspeed_factor);
        }

        agent.wobble_phase =
            (agent.wobble_phase + 0.05 * agent.phenotype.glow_frequency * frames)
                .rem_euclid(std::f64::consts::TAU);
        let wobble = Vec2::new(agent.wobble_phase.sin(), (agent.wobble_phase * 1.3).cos())
            * (cfg.wobble_amplitude * 0.1);
        let step = if agent.state == LifeState::Dying {
            agent.vel * 0.3
        } else {
            agent.vel + wobble
        };
        agent.pos += step * frames;
        agent.wrap(arena.width, arena.height, arena.edge_padding);
    }
}

/// Outcome of two mature agents touching, and the digits they end up with.
#[must_use]
pub fn collision_outcome(a: Digit, b: Digit, rules: bool) -> (CollisionOutcome, Digit, Digit) {
    if !rules {
        return (CollisionOutcome::Merge, a, b);
    }
    match (a, b) {
        (Digit::One, Digit::One) => (CollisionOutcome::Overflow, Digit::Zero, Digit::Zero),
        (Digit::Zero, Digit::Zero) => (CollisionOutcome::Quantum, Digit::One, Digit::One),
        _ => (CollisionOutcome::Merge, a, b),
    }
}

/// Resolves every touching mature pair once and evolves agents that earned it.
pub fn resolve_collisions<R: Rng>(ctx: &mut TickContext<'_, R>) {
    let cfg = &ctx.config.agent;
    let radius = cfg.collision_radius;
    if radius <= 0.0 {
        return;
    }
    let rules = ctx.config.digit.collision_rules;
    let tick = ctx.clock.tick;
    // Positions moved since the spatial hash was built; widen the candidate search.
    let search = radius + ctx.config.arena.cell_size;

    for i in 0..ctx.agents.len() {
        if !ready_to_collide(&ctx.agents.as_slice()[i]) {
            continue;
        }
        let pos = ctx.agents.as_slice()[i].pos;
        let candidates = ctx.agents.indices_near(ctx.spatial, pos, search, ready_to_collide);
        for j in candidates {
            if j <= i {
                continue;
            }
            let Some((a, b)) = ctx.agents.pair_mut(i, j) else {
                continue;
            };
            if !ready_to_collide(a) || !ready_to_collide(b) || a.pos.distance(b.pos) > radius {
                continue;
            }
            let (outcome, da, db) = collision_outcome(a.digit, b.digit, rules);
            a.digit = da;
            b.digit = db;
            if outcome == CollisionOutcome::Merge {
                a.add_energy(cfg.merge_energy);
                b.add_energy(cfg.merge_energy);
            }
            for agent in [&mut *a, &mut *b] {
                agent.collision_cooldown_ms = cfg.collision_cooldown_ms;
                agent.evolution_points += 1;
            }
            let (ida, idb) = (a.id, b.id);
            let evolved = [(a.id, a.try_evolve()), (b.id, b.try_evolve())];
            ctx.out.emit(LiveEvent::Collision {
                a: ida,
                b: idb,
                outcome,
                tick,
            });
            for (id, tier) in evolved {
                if let Some(tier) = tier {
                    ctx.out.emit(LiveEvent::Evolution { id, tier, tick });
                }
            }
            break;
        }
    }
}

fn ready_to_collide(agent: &Agent) -> bool {
    agent.is_mature() && agent.collision_cooldown_ms <= 0.0
}

/// True when `config` lets this many agents exist.
#[must_use]
pub fn has_room(config: &AppConfig, population: usize) -> bool {
    population < config.arena.max_population
}
