use super::{centroid, consume, is_prey, swarm_threat, transition, Predator, WellField};
use crate::agents::AgentStore;
use crate::config::SerpentConfig;
use crate::context::{TickContext, TickOutput};
use firefly_data::{DeathCause, PredatorKind, PredatorState, SerpentState, Vec2};
use rand::Rng;
use std::f64::consts::PI;
use uuid::Uuid;

/// A chain of segments led by its head. Only the head eats; every segment drags
/// nearby agents along in its wake.
#[derive(Debug, Clone)]
pub struct Serpent {
    pub id: u64,
    /// Head first.
    pub segments: Vec<Vec2>,
    pub heading: f64,
    pub state: SerpentState,
    pub health: f64,
    pub age_ms: f64,
    pub lifespan_ms: f64,
    pub meals: u64,
    target: Option<Uuid>,
    exit: Option<Vec2>,
    timer_ms: f64,
    config: SerpentConfig,
}

fn wrap_angle(a: f64) -> f64 {
    (a + PI).rem_euclid(2.0 * PI) - PI
}

impl Serpent {
    pub fn new<R: Rng>(
        id: u64,
        head: Vec2,
        center: Vec2,
        config: &SerpentConfig,
        rng: &mut R,
    ) -> Self {
        let heading = (center - head).angle();
        let back = Vec2::from_angle(heading) * -config.segment_spacing;
        let segments = (0..config.segments.max(1))
            .map(|i| head + back * i as f64)
            .collect();
        let lifespan_ms = if config.max_lifespan_ms > config.min_lifespan_ms {
            rng.gen_range(config.min_lifespan_ms..config.max_lifespan_ms)
        } else {
            config.min_lifespan_ms
        };
        Self {
            id,
            segments,
            heading,
            state: SerpentState::Entering,
            health: config.health,
            age_ms: 0.0,
            lifespan_ms,
            meals: 0,
            target: None,
            exit: None,
            timer_ms: config.entering_ms,
            config: config.clone(),
        }
    }

    #[must_use]
    pub fn head(&self) -> Vec2 {
        self.segments.first().copied().unwrap_or_default()
    }

    /// Distance from `pos` to the closest segment, and that segment.
    #[must_use]
    pub fn nearest_segment(&self, pos: Vec2) -> Option<(Vec2, f64)> {
        self.segments
            .iter()
            .map(|&s| (s, s.distance(pos)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    fn set_state(&mut self, to: SerpentState, tick: u64, out: &mut TickOutput) {
        let from = self.state;
        self.state = to;
        transition(
            out,
            PredatorKind::Serpent,
            self.id,
            PredatorState::Serpent(from),
            PredatorState::Serpent(to),
            tick,
        );
    }

    /// A point `exit_margin` beyond the arena edge closest to the head.
    fn exit_point(&self, width: f64, height: f64) -> Vec2 {
        let h = self.head();
        let m = self.config.exit_margin;
        let options = [
            (h.x, Vec2::new(-m, h.y)),
            (width - h.x, Vec2::new(width + m, h.y)),
            (h.y, Vec2::new(h.x, -m)),
            (height - h.y, Vec2::new(h.x, height + m)),
        ];
        options
            .into_iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or(Vec2::new(-m, h.y), |(_, p)| p)
    }

    fn turn_toward(&mut self, point: Vec2, dt: f64) {
        let desired = (point - self.head()).angle();
        let diff = wrap_angle(desired - self.heading);
        let max = self.config.turn_rate * dt;
        self.heading = wrap_angle(self.heading + diff.clamp(-max, max));
    }

    /// Moves the head along the heading with a sideways wave, then lets the
    /// body follow.
    fn slither(&mut self, speed: f64, dt: f64) {
        let forward = Vec2::from_angle(self.heading);
        let side = Vec2::new(-forward.y, forward.x);
        let w = self.config.wave_frequency;
        let lateral = self.config.wave_amplitude * w * (w * self.age_ms).cos();
        if let Some(head) = self.segments.first_mut() {
            *head += (forward * speed + side * lateral) * dt;
        }
        self.follow();
    }

    /// Pulls each segment back toward its spacing from the one ahead.
    fn follow(&mut self) {
        for i in 1..self.segments.len() {
            let lead = self.segments[i - 1];
            let delta = lead - self.segments[i];
            let d = delta.length();
            if d > self.config.segment_spacing {
                let correction = (d - self.config.segment_spacing) * self.config.spring;
                self.segments[i] += delta.normalized() * correction;
            }
        }
    }

    /// Drags nearby mature agents toward whichever segment is closest to them.
    fn apply_wake<R: Rng>(&self, ctx: &mut TickContext<'_, R>) {
        let Some(center) = centroid_of(&self.segments) else {
            return;
        };
        let reach = self
            .segments
            .iter()
            .map(|s| s.distance(center))
            .fold(0.0, f64::max)
            + self.config.wake_radius;
        let radius = self.config.wake_radius;
        let frames = ctx.clock.frames();
        for idx in ctx.agents_near(center, reach, |a| a.is_mature()) {
            let Some(agent) = ctx.agents.at_mut(idx) else {
                continue;
            };
            let Some((segment, d)) = self.nearest_segment(agent.pos) else {
                continue;
            };
            if d >= radius {
                continue;
            }
            let f = self.config.wake_strength * (1.0 - d / radius);
            agent.apply_force((segment - agent.pos).normalized() * (f * frames));
        }
    }

    fn keep_off_edges(&mut self, width: f64, height: f64, dt: f64) {
        let h = self.head();
        let m = self.config.edge_margin;
        if h.x < m || h.x > width - m || h.y < m || h.y > height - m {
            self.turn_toward(Vec2::new(width / 2.0, height / 2.0), dt);
        }
    }
}

fn centroid_of(points: &[Vec2]) -> Option<Vec2> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec2::ZERO, |acc, &p| acc + p);
    Some(sum * (1.0 / points.len() as f64))
}

impl Predator for Serpent {
    fn id(&self) -> u64 {
        self.id
    }

    fn kind(&self) -> PredatorKind {
        PredatorKind::Serpent
    }

    fn state(&self) -> PredatorState {
        PredatorState::Serpent(self.state)
    }

    fn pos(&self) -> Vec2 {
        self.head()
    }

    fn vigor(&self) -> f64 {
        self.health
    }

    fn target(&self) -> Option<Uuid> {
        self.target
    }

    fn is_finished(&self) -> bool {
        self.state == SerpentState::Gone
    }

    fn prune(&mut self, agents: &AgentStore) {
        if self.target.is_some_and(|id| !agents.is_mature(&id)) {
            self.target = None;
        }
    }

    fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, _well: Option<WellField>) {
        if self.state == SerpentState::Gone {
            return;
        }
        let tick = ctx.clock.tick;
        let dt = ctx.clock.dt_ms;
        let (width, height) = (ctx.config.arena.width, ctx.config.arena.height);
        self.age_ms += dt;
        self.timer_ms -= dt;
        self.health = (self.health - self.config.health_decay * dt).max(0.0);

        if (self.health <= 0.0 || self.age_ms >= self.lifespan_ms)
            && self.state != SerpentState::Leaving
        {
            self.target = None;
            self.exit = Some(self.exit_point(width, height));
            tracing::info!(id = self.id, meals = self.meals, "Serpent leaving");
            self.set_state(SerpentState::Leaving, tick, ctx.out);
        }

        let head = self.head();
        if matches!(self.state, SerpentState::Hunting | SerpentState::Feeding)
            && swarm_threat(
                ctx,
                head,
                self.config.swarm_defense_count,
                self.config.swarm_defense_radius,
            )
        {
            self.target = None;
            self.timer_ms = self.config.flee_ms;
            self.set_state(SerpentState::Fleeing, tick, ctx.out);
        }

        let speed = self.config.speed;
        match self.state {
            SerpentState::Gone => {}
            SerpentState::Entering => {
                self.turn_toward(Vec2::new(width / 2.0, height / 2.0), dt);
                self.slither(speed, dt);
                if self.timer_ms <= 0.0 {
                    self.set_state(SerpentState::Hunting, tick, ctx.out);
                }
            }
            SerpentState::Hunting => {
                let visible = ctx.agents_near(head, self.config.detect_radius, is_prey);
                let prey = visible
                    .first()
                    .and_then(|&i| ctx.agents.at(i))
                    .map(|a| (a.id, a.pos));
                self.target = prey.map(|(id, _)| id);
                if let Some((_, pos)) = prey {
                    self.turn_toward(pos, dt);
                }
                self.keep_off_edges(width, height, dt);
                self.slither(speed, dt);

                let head = self.head();
                let bite = ctx
                    .agents_near(head, self.config.consume_radius, is_prey)
                    .into_iter()
                    .find(|&i| ctx.agents.at(i).is_some_and(|a| !ctx.planet_protected(a.pos)));
                if let Some(idx) = bite {
                    if consume(ctx, idx, PredatorKind::Serpent, self.id, DeathCause::Serpent)
                        .is_some()
                    {
                        self.meals += 1;
                        self.health = (self.health + self.config.meal_health).min(self.config.health);
                        self.target = None;
                        self.timer_ms = self.config.feeding_ms;
                        self.set_state(SerpentState::Feeding, tick, ctx.out);
                    }
                }
                self.apply_wake(ctx);
            }
            SerpentState::Feeding => {
                self.follow();
                if self.timer_ms <= 0.0 {
                    self.set_state(SerpentState::Hunting, tick, ctx.out);
                }
                self.apply_wake(ctx);
            }
            SerpentState::Fleeing => {
                let crowd = ctx.agents_near(head, self.config.swarm_defense_radius * 2.0, |a| {
                    a.is_mature()
                });
                if let Some(center) = centroid(ctx.agents.as_slice(), &crowd) {
                    self.turn_toward(head + (head - center), dt);
                }
                self.keep_off_edges(width, height, dt);
                self.slither(speed * self.config.flee_speed, dt);
                if self.timer_ms <= 0.0 {
                    self.set_state(SerpentState::Hunting, tick, ctx.out);
                }
            }
            SerpentState::Leaving => {
                let exit = match self.exit {
                    Some(exit) => exit,
                    None => {
                        let exit = self.exit_point(width, height);
                        self.exit = Some(exit);
                        exit
                    }
                };
                self.turn_toward(exit, dt * 4.0);
                let step = speed * self.config.flee_speed * dt;
                self.slither(speed * self.config.flee_speed, dt);
                let h = self.head();
                let beyond = (self.config.exit_margin - 5.0).max(0.0);
                let outside = h.x < -beyond
                    || h.x > width + beyond
                    || h.y < -beyond
                    || h.y > height + beyond;
                if outside || h.distance(exit) <= step.max(5.0) {
                    self.set_state(SerpentState::Gone, tick, ctx.out);
                }
            }
        }
    }
}
