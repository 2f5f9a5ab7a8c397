use super::{consume, swarm_threat, transition, Predator, WellField};
use crate::agents::AgentStore;
use crate::config::{DigitConvention, GravityWellConfig};
use crate::context::{PlanetRequest, TickContext, TickOutput};
use firefly_data::{DeathCause, Digit, PredatorKind, PredatorState, Tier, Vec2, WellState};
use rand::Rng;

/// What a meal did to the well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meal {
    Grew,
    Shrank,
    /// An ascended agent was sacrificed; a planet is born instead of resizing.
    Sacrifice,
}

/// Stationary attractor that swallows mature agents crossing its event horizon.
#[derive(Debug, Clone)]
pub struct GravityWell {
    pub id: u64,
    pub pos: Vec2,
    pub size: f64,
    pub health: f64,
    pub state: WellState,
    /// Pull multiplier from nearby mature planets.
    pub symbiosis: f64,
    /// Set on ticks where a swarm drove the well off.
    pub repelled: bool,
    pub consumed: u64,
    timer_ms: f64,
    config: GravityWellConfig,
}

impl GravityWell {
    pub fn new(id: u64, pos: Vec2, config: &GravityWellConfig) -> Self {
        Self {
            id,
            pos,
            size: config.base_size,
            health: config.max_health,
            state: WellState::Active,
            symbiosis: 1.0,
            repelled: false,
            consumed: 0,
            timer_ms: 0.0,
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn mass(&self) -> f64 {
        if self.config.base_size > 0.0 {
            self.size / self.config.base_size
        } else {
            1.0
        }
    }

    #[must_use]
    pub fn pull_radius(&self) -> f64 {
        self.config.base_radius + self.config.radius_per_size * self.size
    }

    #[must_use]
    pub fn event_horizon(&self) -> f64 {
        self.config.horizon_factor * self.size
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state != WellState::Dormant
    }

    /// `1 + bonus × (1 − e^(−falloff × n))` for `n` mature planets in range.
    #[must_use]
    pub fn symbiosis_multiplier(planets: usize, bonus: f64, falloff: f64) -> f64 {
        1.0 + bonus * (1.0 - (-falloff * planets as f64).exp())
    }

    /// The pull other predators feel, if the well is pulling at all.
    #[must_use]
    pub fn field(&self) -> Option<WellField> {
        if !self.is_active() || self.repelled {
            return None;
        }
        Some(WellField {
            pos: self.pos,
            radius: self.pull_radius(),
            strength: self.config.strength * self.mass() * self.symbiosis,
        })
    }

    /// Resizes after swallowing an agent of `digit` and `tier`.
    pub fn feed(&mut self, digit: Digit, tier: Tier, convention: &DigitConvention) -> Meal {
        self.consumed += 1;
        if tier == Tier::Ascended {
            return Meal::Sacrifice;
        }
        if digit == convention.gravity_growth_digit {
            self.size = (self.size + self.config.growth_rate).min(self.config.max_size);
            Meal::Grew
        } else {
            self.size = (self.size - self.config.shrink_rate).max(self.config.min_size);
            Meal::Shrank
        }
    }

    fn set_state(&mut self, to: WellState, tick: u64, out: &mut TickOutput) {
        let from = self.state;
        self.state = to;
        transition(
            out,
            PredatorKind::GravityWell,
            self.id,
            PredatorState::Well(from),
            PredatorState::Well(to),
            tick,
        );
    }

    /// A star thrown at `point`. Lands when it falls within `reach` horizons.
    pub fn strike(&mut self, point: Vec2, reach: f64, tick: u64, out: &mut TickOutput) -> bool {
        if !self.is_active() || self.pos.distance(point) > self.event_horizon() * reach {
            return false;
        }
        self.health -= self.config.star_damage;
        self.size = (self.size - self.config.damage_shrink).max(self.config.min_size);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.timer_ms = self.config.respawn_ms;
            tracing::info!(id = self.id, "Gravity well collapsed");
            self.set_state(WellState::Dormant, tick, out);
        } else {
            self.timer_ms = self.config.hurt_ms;
            self.set_state(WellState::Hurt, tick, out);
        }
        true
    }

    fn pull_strength(&self, d: f64, radius: f64) -> f64 {
        let f = (radius - d) / radius;
        self.config.strength * self.mass() * self.symbiosis * f * f
    }
}

impl Predator for GravityWell {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> PredatorKind {
        PredatorKind::GravityWell
    }

    fn state(&self) -> PredatorState {
        PredatorState::Well(self.state)
    }

    fn pos(&self) -> Vec2 {
        self.pos
    }

    fn vigor(&self) -> f64 {
        self.health
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn prune(&mut self, _agents: &AgentStore) {}

    fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, _well: Option<WellField>) {
        let tick = ctx.clock.tick;
        let dt = ctx.clock.dt_ms;
        match self.state {
            WellState::Dormant => {
                self.timer_ms -= dt;
                if self.timer_ms <= 0.0 {
                    self.size = self.config.base_size;
                    self.health = self.config.max_health;
                    tracing::info!(id = self.id, "Gravity well reformed");
                    self.set_state(WellState::Active, tick, ctx.out);
                }
                self.repelled = false;
                return;
            }
            WellState::Hurt => {
                self.timer_ms -= dt;
                if self.timer_ms <= 0.0 {
                    self.set_state(WellState::Active, tick, ctx.out);
                }
            }
            WellState::Active => {}
        }
        self.health =
            (self.health + self.config.regen_rate * ctx.clock.seconds()).min(self.config.max_health);

        self.repelled = swarm_threat(
            ctx,
            self.pos,
            self.config.swarm_defense_count,
            self.config.swarm_defense_radius,
        );
        if self.repelled {
            return;
        }

        let planets = ctx
            .planets
            .iter()
            .filter(|p| p.is_mature() && p.pos.distance(self.pos) <= self.config.symbiosis_range)
            .count();
        self.symbiosis = Self::symbiosis_multiplier(
            planets,
            self.config.symbiosis_bonus,
            self.config.symbiosis_falloff,
        );

        let radius = self.pull_radius();
        let horizon = self.event_horizon();
        let frames = ctx.clock.frames();
        let visible = ctx.agents_near(self.pos, radius, |a| a.is_mature());
        for idx in visible {
            let Some(agent) = ctx.agents.at(idx) else {
                continue;
            };
            let (pos, resistance) = (agent.pos, agent.gravity_resistance());
            let protected = ctx.planet_protected(pos);
            let d = pos.distance(self.pos);

            if d < horizon && !protected {
                let Some((digit, tier)) =
                    consume(ctx, idx, PredatorKind::GravityWell, self.id, DeathCause::GravityWell)
                else {
                    continue;
                };
                match self.feed(digit, tier, &ctx.config.digit) {
                    Meal::Sacrifice => {
                        tracing::info!(id = self.id, digit = digit.value(), "Ascended sacrifice");
                        ctx.out.planets.push(PlanetRequest {
                            center: self.pos,
                            digit,
                        });
                    }
                    meal => {
                        tracing::debug!(id = self.id, size = self.size, ?meal, "Gravity well fed");
                    }
                }
                continue;
            }

            let mut strength = self.pull_strength(d, radius) * (1.0 - resistance);
            if protected {
                strength *= self.config.planet_shield;
            }
            let force = (self.pos - pos).normalized() * (strength * frames);
            if let Some(agent) = ctx.agents.at_mut(idx) {
                agent.apply_force(force);
            }
        }
    }
}
