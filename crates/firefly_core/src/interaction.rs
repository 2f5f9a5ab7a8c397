//! Pointer and touch input turned into forces, spawns and star strikes.
//!
//! Hosts queue [`GatewayCommand`]s between ticks. The gateway drains them
//! during the interaction phase; every force it applies uses the same linear
//! falloff as trail influence.

use crate::context::{SpawnRequest, TickContext};
use crate::lifecycle::has_room;
use crate::pheromone::{direction_or, falloff};
use firefly_data::{BirthOrigin, Vec2};
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatewayCommand {
    Move { x: f64, y: f64 },
    /// Starts charging a burst.
    Press { x: f64, y: f64 },
    /// Releases the charge; bursts when charged enough.
    Release { x: f64, y: f64 },
    Click { x: f64, y: f64 },
    DoubleClick { x: f64, y: f64 },
    SecondaryClick { x: f64, y: f64 },
    Drag { x: f64, y: f64 },
    TouchStart { x: f64, y: f64 },
    TouchEnd { x: f64, y: f64 },
    /// Aimed at the gravity well.
    StarStrike { x: f64, y: f64 },
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hold {
    pos: Vec2,
    held_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionGateway {
    queue: Vec<GatewayCommand>,
    pointer: Option<Vec2>,
    hold: Option<Hold>,
    touch: Option<Hold>,
    /// Drag points with the time they were laid.
    drag_trail: Vec<(Vec2, f64)>,
    spawn_cooldown_ms: f64,
}

impl InteractionGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: GatewayCommand) {
        self.queue.push(command);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Burst charge in `[0, 1]` while a press is held.
    #[must_use]
    pub fn charge(&self, hold_charge_ms: f64) -> f64 {
        self.hold
            .map_or(0.0, |h| (h.held_ms / hold_charge_ms.max(1.0)).min(1.0))
    }

    /// Drains the queue and applies continuous effects.
    ///
    /// Returns the points of any star strikes so the caller can aim them at
    /// the gravity well.
    pub fn apply<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) -> Vec<Vec2> {
        let config = ctx.config;
        let cfg = &config.interaction;
        let dt = ctx.clock.dt_ms;
        let now = ctx.clock.now_ms;
        self.spawn_cooldown_ms = (self.spawn_cooldown_ms - dt).max(0.0);
        for hold in [&mut self.hold, &mut self.touch].into_iter().flatten() {
            hold.held_ms += dt;
        }
        self.drag_trail
            .retain(|&(_, laid)| now - laid <= cfg.drag_persistence_ms);

        let mut strikes = Vec::new();
        for command in std::mem::take(&mut self.queue) {
            match command {
                GatewayCommand::Move { x, y } => self.pointer = Some(Vec2::new(x, y)),
                GatewayCommand::Press { x, y } => {
                    let pos = Vec2::new(x, y);
                    self.pointer = Some(pos);
                    self.hold = Some(Hold { pos, held_ms: 0.0 });
                }
                GatewayCommand::Release { x, y } => {
                    let charge = self.charge(cfg.hold_charge_ms);
                    self.hold = None;
                    if charge > cfg.burst_min_charge {
                        burst(ctx, Vec2::new(x, y), charge);
                    }
                }
                GatewayCommand::Click { x, y } => {
                    pulse(ctx, Vec2::new(x, y), cfg.attraction_force);
                }
                GatewayCommand::SecondaryClick { x, y } => {
                    pulse(ctx, Vec2::new(x, y), -cfg.repel_force);
                }
                GatewayCommand::DoubleClick { x, y } => self.spawn(ctx, Vec2::new(x, y)),
                GatewayCommand::Drag { x, y } => {
                    let pos = Vec2::new(x, y);
                    self.pointer = Some(pos);
                    self.drag_trail.push((pos, now));
                    if self.drag_trail.len() > cfg.drag_max_points {
                        let excess = self.drag_trail.len() - cfg.drag_max_points;
                        self.drag_trail.drain(..excess);
                    }
                }
                GatewayCommand::TouchStart { x, y } => {
                    self.touch = Some(Hold {
                        pos: Vec2::new(x, y),
                        held_ms: 0.0,
                    });
                }
                GatewayCommand::TouchEnd { x, y } => {
                    let pos = Vec2::new(x, y);
                    let held = self.touch.take().map_or(0.0, |t| t.held_ms);
                    if held >= cfg.long_press_ms {
                        self.spawn(ctx, pos);
                    } else if held < cfg.tap_ms {
                        pulse(ctx, pos, cfg.attraction_force);
                    }
                }
                GatewayCommand::StarStrike { x, y } => strikes.push(Vec2::new(x, y)),
                GatewayCommand::Leave => {
                    self.pointer = None;
                    self.hold = None;
                    self.touch = None;
                    self.drag_trail.clear();
                }
            }
        }

        if let Some(pointer) = self.pointer {
            pulse(ctx, pointer, cfg.passive_force * ctx.clock.frames());
        }
        self.apply_drag_current(ctx);
        strikes
    }

    fn spawn<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, pos: Vec2) {
        if self.spawn_cooldown_ms > 0.0 {
            return;
        }
        let population = ctx.agents.present_count() + ctx.out.spawns.len();
        if !has_room(ctx.config, population) {
            return;
        }
        self.spawn_cooldown_ms = ctx.config.interaction.spawn_cooldown_ms;
        ctx.out
            .request_spawn(SpawnRequest::at(pos, BirthOrigin::Interaction));
    }

    /// Pushes agents along the direction the drag trail was drawn in.
    fn apply_drag_current<R: Rng>(&self, ctx: &mut TickContext<'_, R>) {
        if self.drag_trail.len() < 2 {
            return;
        }
        let cfg = &ctx.config.interaction;
        let strength = cfg.drag_force * ctx.clock.frames();
        let width = cfg.drag_width;
        for agent in ctx.agents.iter_mut().filter(|a| a.is_mature()) {
            let nearest = self
                .drag_trail
                .windows(2)
                .map(|w| (w[1].0.distance(agent.pos), w[1].0 - w[0].0))
                .filter(|&(d, dir)| d < width && dir.length() > 0.0)
                .min_by(|a, b| a.0.total_cmp(&b.0));
            if let Some((d, dir)) = nearest {
                agent.apply_force(dir.normalized() * (strength * falloff(d, width)));
            }
        }
    }
}

/// Attraction (positive `force`) or repulsion toward `pos` within the attraction radius.
fn pulse<R: Rng>(ctx: &mut TickContext<'_, R>, pos: Vec2, force: f64) {
    let radius = ctx.config.interaction.attraction_radius;
    for agent in ctx.agents.iter_mut().filter(|a| a.is_mature()) {
        let d = agent.pos.distance(pos);
        let w = falloff(d, radius);
        if w > 0.0 {
            let toward = direction_or(agent.pos, pos, Vec2::ZERO);
            agent.apply_force(toward * (force * w));
        }
    }
}

fn burst<R: Rng>(ctx: &mut TickContext<'_, R>, pos: Vec2, charge: f64) {
    let cfg = &ctx.config.interaction;
    let (radius, force) = (cfg.burst_radius, cfg.burst_force * charge);
    tracing::debug!(x = pos.x, y = pos.y, charge, "Burst released");
    for agent in ctx.agents.iter_mut().filter(|a| a.is_mature()) {
        let d = agent.pos.distance(pos);
        let w = falloff(d, radius);
        if w > 0.0 {
            let away = direction_or(pos, agent.pos, Vec2::new(0.0, -1.0));
            agent.apply_force(away * (force * w));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::testing::Fixture;
    use firefly_data::Digit;

    fn one_agent() -> (Fixture, usize) {
        let mut fx = Fixture::new(AppConfig::default());
        let idx = fx.mature_at(1, Vec2::new(300.0, 300.0), Digit::One);
        (fx, idx)
    }

    #[test]
    fn test_click_attracts_and_secondary_repels() {
        let (mut fx, idx) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::Click { x: 375.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        // Half the radius away: half the configured force.
        assert!((fx.agents.as_slice()[idx].acc.x - 0.04).abs() < 1e-9);

        fx.agents.as_mut_slice()[idx].acc = Vec2::ZERO;
        gateway.push(GatewayCommand::SecondaryClick { x: 375.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        assert!((fx.agents.as_slice()[idx].acc.x + 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_double_click_spawn_honours_cooldown() {
        let (mut fx, _) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::DoubleClick { x: 100.0, y: 100.0 });
        gateway.push(GatewayCommand::DoubleClick { x: 120.0, y: 100.0 });
        gateway.apply(&mut fx.ctx());
        assert_eq!(fx.out.spawns.len(), 1);
        assert_eq!(fx.out.spawns[0].origin, BirthOrigin::Interaction);

        fx.clock.dt_ms = 600.0;
        gateway.push(GatewayCommand::DoubleClick { x: 100.0, y: 100.0 });
        gateway.apply(&mut fx.ctx());
        assert_eq!(fx.out.spawns.len(), 2);
    }

    #[test]
    fn test_short_press_does_not_burst() {
        let (mut fx, idx) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::Press { x: 130.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        gateway.push(GatewayCommand::Release { x: 130.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        assert_eq!(fx.agents.as_slice()[idx].acc, Vec2::ZERO);
        assert_eq!(gateway.charge(1500.0), 0.0);
    }

    #[test]
    fn test_charged_release_bursts_outward() {
        let (mut fx, idx) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::Press { x: 130.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        fx.clock.dt_ms = 1500.0;
        gateway.apply(&mut fx.ctx());
        assert!((gateway.charge(1500.0) - 1.0).abs() < 1e-9);
        assert_eq!(fx.agents.as_slice()[idx].acc, Vec2::ZERO);

        gateway.push(GatewayCommand::Release { x: 130.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        assert!(fx.agents.as_slice()[idx].acc.x > 0.0);
    }

    #[test]
    fn test_touch_tap_and_long_press() {
        let (mut fx, idx) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::TouchStart { x: 350.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        gateway.push(GatewayCommand::TouchEnd { x: 350.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        assert!(fx.agents.as_slice()[idx].acc.x > 0.0);
        assert!(fx.out.spawns.is_empty());

        gateway.push(GatewayCommand::TouchStart { x: 350.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        fx.clock.dt_ms = 900.0;
        gateway.push(GatewayCommand::TouchEnd { x: 350.0, y: 300.0 });
        gateway.apply(&mut fx.ctx());
        assert_eq!(fx.out.spawns.len(), 1);
    }

    #[test]
    fn test_drag_current_follows_stroke() {
        let (mut fx, idx) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::Drag { x: 280.0, y: 330.0 });
        gateway.push(GatewayCommand::Drag { x: 300.0, y: 330.0 });
        gateway.push(GatewayCommand::Leave);
        gateway.apply(&mut fx.ctx());
        assert_eq!(fx.agents.as_slice()[idx].acc, Vec2::ZERO);

        gateway.push(GatewayCommand::Drag { x: 280.0, y: 330.0 });
        gateway.push(GatewayCommand::Drag { x: 300.0, y: 330.0 });
        gateway.apply(&mut fx.ctx());
        let acc = fx.agents.as_slice()[idx].acc;
        // Drag current along +x plus passive pull toward the pointer below.
        assert!(acc.x > 0.0);
        assert!(acc.y > 0.0);
    }

    #[test]
    fn test_star_strikes_are_returned() {
        let (mut fx, _) = one_agent();
        let mut gateway = InteractionGateway::new();
        gateway.push(GatewayCommand::StarStrike { x: 600.0, y: 400.0 });
        let strikes = gateway.apply(&mut fx.ctx());
        assert_eq!(strikes, vec![Vec2::new(600.0, 400.0)]);
        assert_eq!(gateway.pending(), 0);
    }
}
