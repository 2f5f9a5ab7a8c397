use super::mean;
use crate::agents::AgentStore;
use crate::context::TickContext;
use firefly_data::{LiveEvent, Vec2};
use rand::Rng;
use uuid::Uuid;

/// Temporary flock of same-area agents moving faster together.
#[derive(Debug, Clone, PartialEq)]
pub struct Swarm {
    pub id: u64,
    pub members: Vec<Uuid>,
    pub age_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct SwarmSystem {
    swarms: Vec<Swarm>,
    next_id: u64,
}

impl SwarmSystem {
    pub fn new() -> Self {
        Self {
            swarms: Vec::new(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn swarms(&self) -> &[Swarm] {
        &self.swarms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.swarms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.swarms.is_empty()
    }

    pub fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        if !ctx.config.swarm.enabled {
            return;
        }
        apply_boids(ctx);
        self.age_and_disperse(ctx);
        self.boost_members(ctx.agents, ctx.config.swarm.speed_boost);
        self.maybe_form(ctx);
    }

    fn age_and_disperse<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let dt = ctx.clock.dt_ms;
        let duration = ctx.config.swarm.duration_ms;
        let tick = ctx.clock.tick;
        let agents = &mut *ctx.agents;
        let out = &mut *ctx.out;
        self.swarms.retain_mut(|swarm| {
            swarm.age_ms += dt;
            swarm.members.retain(|id| {
                agents
                    .get(id)
                    .is_some_and(|a| a.is_mature() && a.markers.swarm_id == Some(swarm.id))
            });
            if swarm.age_ms < duration && swarm.members.len() >= 2 {
                return true;
            }
            for id in &swarm.members {
                if let Some(agent) = agents.get_mut(id) {
                    agent.markers.swarm_id = None;
                }
            }
            tracing::debug!(swarm = swarm.id, "Swarm dispersed");
            out.emit(LiveEvent::SwarmDispersed {
                swarm_id: swarm.id,
                tick,
            });
            false
        });
    }

    fn boost_members(&self, agents: &mut AgentStore, boost: f64) {
        for swarm in &self.swarms {
            for id in &swarm.members {
                if let Some(agent) = agents.get_mut(id) {
                    agent.modifiers.speed *= boost;
                }
            }
        }
    }

    fn maybe_form<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let config = ctx.config;
        let cfg = &config.swarm;
        if !ctx.chance(cfg.formation_chance) {
            return;
        }
        let free = |a: &firefly_data::Agent| {
            a.is_mature() && a.markers.swarm_id.is_none() && a.markers.constellation_id.is_none()
        };
        let candidates: Vec<usize> = (0..ctx.agents.len())
            .filter(|&i| ctx.agents.at(i).is_some_and(free))
            .collect();
        if candidates.is_empty() {
            return;
        }
        let seed = candidates[ctx.rng.gen_range(0..candidates.len())];
        let Some(center) = ctx.agents.at(seed).map(|a| a.pos) else {
            return;
        };
        let members = ctx.agents_near(center, cfg.formation_radius, free);
        if members.len() < cfg.min_members {
            return;
        }
        let id = self.form(ctx.agents, &members);
        tracing::debug!(swarm = id, members = members.len(), "Swarm formed");
        ctx.out.emit(LiveEvent::SwarmFormed {
            swarm_id: id,
            members: members.len(),
            tick: ctx.clock.tick,
        });
    }

    /// Binds the agents at `indices` into a new swarm.
    pub fn form(&mut self, agents: &mut AgentStore, indices: &[usize]) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let mut members = Vec::with_capacity(indices.len());
        for &i in indices {
            if let Some(agent) = agents.at_mut(i) {
                agent.markers.swarm_id = Some(id);
                members.push(agent.id);
            }
        }
        self.swarms.push(Swarm {
            id,
            members,
            age_ms: 0.0,
        });
        id
    }

    pub fn prune(&mut self, agents: &AgentStore) {
        for swarm in &mut self.swarms {
            swarm.members.retain(|id| agents.index_of(id).is_some());
        }
    }
}

/// Separation from everyone; alignment and cohesion with same-digit neighbours.
fn apply_boids<R: Rng>(ctx: &mut TickContext<'_, R>) {
    let config = ctx.config;
    let cfg = &config.swarm;
    let frames = ctx.clock.frames();
    let cohesion_scale = if ctx.env.gathering {
        config.environment.gathering_cohesion
    } else {
        1.0
    };
    let reach = cfg
        .separation_radius
        .max(cfg.alignment_radius)
        .max(cfg.cohesion_radius);

    let agents = ctx.agents.as_slice();
    let mut forces = Vec::new();
    for (i, agent) in agents.iter().enumerate() {
        if !agent.is_mature() || agent.in_formation() {
            continue;
        }
        let neighbours = ctx.agents_near(agent.pos, reach, |a| a.is_mature());
        let mut separation = Vec2::ZERO;
        let mut aligned = Vec::new();
        let mut cohesive = Vec::new();
        for &j in &neighbours {
            if j == i {
                continue;
            }
            let Some(other) = agents.get(j) else {
                continue;
            };
            let d = other.pos.distance(agent.pos);
            if d < cfg.separation_radius && d > 0.0 {
                separation +=
                    (agent.pos - other.pos).normalized() * (1.0 - d / cfg.separation_radius);
            }
            if other.digit == agent.digit {
                if d < cfg.alignment_radius {
                    aligned.push(other.vel);
                }
                if d < cfg.cohesion_radius {
                    cohesive.push(other.pos);
                }
            }
        }
        let mut force = separation * cfg.separation_force;
        if let Some(v) = mean(aligned.into_iter()) {
            force += (v - agent.vel) * cfg.alignment_force;
        }
        if let Some(c) = mean(cohesive.into_iter()) {
            force += (c - agent.pos).normalized() * (cfg.cohesion_force * cohesion_scale);
        }
        if force != Vec2::ZERO {
            forces.push((i, force * frames));
        }
    }
    for (i, force) in forces {
        if let Some(agent) = ctx.agents.at_mut(i) {
            agent.apply_force(force);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::testing::Fixture;
    use firefly_data::Digit;

    #[test]
    fn test_separation_pushes_apart() {
        let mut fx = Fixture::new(AppConfig::default());
        let a = fx.mature_at(1, Vec2::new(300.0, 300.0), Digit::One);
        let b = fx.mature_at(2, Vec2::new(310.0, 300.0), Digit::Zero);
        apply_boids(&mut fx.ctx());
        assert!(fx.agents.as_slice()[a].acc.x < 0.0);
        assert!(fx.agents.as_slice()[b].acc.x > 0.0);
    }

    #[test]
    fn test_same_digit_coheres() {
        let mut fx = Fixture::new(AppConfig::default());
        let a = fx.mature_at(1, Vec2::new(300.0, 300.0), Digit::One);
        fx.mature_at(2, Vec2::new(370.0, 300.0), Digit::One);
        apply_boids(&mut fx.ctx());
        assert!(fx.agents.as_slice()[a].acc.x > 0.0);
    }

    #[test]
    fn test_swarm_forms_and_disperses() {
        let mut config = AppConfig::default();
        config.swarm.formation_chance = 1.0;
        let mut fx = Fixture::new(config);
        for n in 0..4 {
            fx.mature_at(n, Vec2::new(300.0 + n as f64 * 20.0, 300.0), Digit::One);
        }
        let mut swarms = SwarmSystem::new();
        swarms.update(&mut fx.ctx());
        assert_eq!(swarms.len(), 1);
        assert!(fx.agents.iter().all(|a| a.markers.swarm_id.is_some()));
        assert!(fx.agents.iter().all(|a| (a.modifiers.speed - 1.0).abs() < 1e-12));

        fx.config.swarm.formation_chance = 0.0;
        swarms.update(&mut fx.ctx());
        assert!(fx.agents.iter().all(|a| (a.modifiers.speed - 1.3).abs() < 1e-12));

        fx.clock.dt_ms = 8000.0;
        swarms.update(&mut fx.ctx());
        assert!(swarms.is_empty());
        assert!(fx.agents.iter().all(|a| a.markers.swarm_id.is_none()));
        assert!(fx
            .out
            .events
            .iter()
            .any(|e| matches!(e, LiveEvent::SwarmDispersed { .. })));
    }
}
