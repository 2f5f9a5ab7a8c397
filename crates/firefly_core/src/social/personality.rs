//! House personalities: temporary behaviour profiles for mature agents.

use super::mean;
use crate::config::PersonalityConfig;
use crate::context::TickContext;
use crate::pheromone::falloff;
use firefly_data::{Agent, House, LiveEvent, ScriptPattern, TrailKind, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct Personality {
    pub agent: Uuid,
    pub house: House,
    pub remaining_ms: f64,
    pub age_ms: f64,
    /// Curve followed while in `House::Script`.
    pub script: ScriptPattern,
}

#[derive(Debug, Clone, Default)]
pub struct PersonalitySystem {
    personalities: Vec<Personality>,
    dominant: Option<House>,
}

impl PersonalitySystem {
    pub fn new(config: &PersonalityConfig) -> Self {
        Self {
            personalities: Vec::new(),
            dominant: config.dominant_house,
        }
    }

    #[must_use]
    pub fn personalities(&self) -> &[Personality] {
        &self.personalities
    }

    #[must_use]
    pub fn get(&self, agent: &Uuid) -> Option<&Personality> {
        self.personalities.iter().find(|p| p.agent == *agent)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.personalities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.personalities.is_empty()
    }

    #[must_use]
    pub fn dominant(&self) -> Option<House> {
        self.dominant
    }

    /// Biases future assignments toward `house`; `None` restores uniform picks.
    pub fn set_dominant(&mut self, house: Option<House>) {
        self.dominant = house;
        tracing::info!(house = house.map_or("none", House::name), "Dominant house set");
    }

    pub fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let config = ctx.config;
        let cfg = &config.personality;
        if !cfg.enabled {
            return;
        }
        self.expire(ctx);
        for p in &mut self.personalities {
            p.age_ms += ctx.clock.dt_ms;
        }
        for i in 0..self.personalities.len() {
            let p = self.personalities[i].clone();
            apply_house(&p, ctx, cfg);
        }
        self.assign(ctx, cfg);
    }

    fn expire<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let dt = ctx.clock.dt_ms;
        let tick = ctx.clock.tick;
        let agents = &mut *ctx.agents;
        let out = &mut *ctx.out;
        self.personalities.retain_mut(|p| {
            p.remaining_ms -= dt;
            let Some(agent) = agents.get_mut(&p.agent).filter(|a| a.is_mature()) else {
                return false;
            };
            if p.remaining_ms > 0.0 {
                return true;
            }
            agent.markers.house = None;
            agent.markers.stealth = false;
            out.emit(LiveEvent::HouseExpired {
                agent: p.agent,
                house: p.house,
                tick,
            });
            false
        });
    }

    fn assign<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, cfg: &PersonalityConfig) {
        let candidates: Vec<Uuid> = ctx
            .agents
            .iter()
            .filter(|a| a.is_mature() && a.markers.house.is_none())
            .map(|a| a.id)
            .collect();
        let p = cfg.assignment_chance * cfg.assignment_scale;
        for id in candidates {
            if !ctx.chance(p) {
                continue;
            }
            let house = pick_house(ctx.rng, self.dominant, cfg.dominant_weight);
            let duration = cfg.duration_ms + ctx.rng.gen::<f64>() * cfg.duration_jitter_ms;
            let script = ScriptPattern::ALL
                .choose(ctx.rng)
                .copied()
                .unwrap_or(ScriptPattern::Zigzag);
            if let Some(agent) = ctx.agents.get_mut(&id) {
                agent.markers.house = Some(house);
            }
            self.personalities.push(Personality {
                agent: id,
                house,
                remaining_ms: duration,
                age_ms: 0.0,
                script,
            });
            tracing::debug!(agent = %id, house = house.name(), "House assigned");
            ctx.out.emit(LiveEvent::HouseAssigned {
                agent: id,
                house,
                tick: ctx.clock.tick,
            });
        }
    }

    pub fn prune(&mut self, agents: &crate::agents::AgentStore) {
        self.personalities.retain(|p| agents.index_of(&p.agent).is_some());
    }
}

/// The dominant house with probability `weight`, otherwise any house uniformly.
pub fn pick_house<R: Rng>(rng: &mut R, dominant: Option<House>, weight: f64) -> House {
    if let Some(house) = dominant {
        if rng.gen::<f64>() < weight {
            return house;
        }
    }
    House::ALL[rng.gen_range(0..House::ALL.len())]
}

/// Unit heading along `pattern` at `phase` in `[0, 1)` of one cycle.
#[must_use]
pub fn script_heading(pattern: ScriptPattern, phase: f64) -> Vec2 {
    let tau = std::f64::consts::TAU;
    match pattern {
        ScriptPattern::Zigzag => {
            let leg = (phase * 4.0).floor() as i64;
            let dy = if leg % 2 == 0 { 1.0 } else { -1.0 };
            Vec2::new(1.0, dy).normalized()
        }
        ScriptPattern::Spiral => Vec2::from_angle(phase * tau * 2.0),
        ScriptPattern::Square => match (phase * 4.0).floor() as i64 {
            0 => Vec2::new(1.0, 0.0),
            1 => Vec2::new(0.0, 1.0),
            2 => Vec2::new(-1.0, 0.0),
            _ => Vec2::new(0.0, -1.0),
        },
        ScriptPattern::Sine => Vec2::new(1.0, (phase * tau).cos()).normalized(),
    }
}

fn apply_house<R: Rng>(p: &Personality, ctx: &mut TickContext<'_, R>, cfg: &PersonalityConfig) {
    let frames = ctx.clock.frames();
    let Some(idx) = ctx.agents.index_of(&p.agent) else {
        return;
    };
    let Some(pos) = ctx.agents.at(idx).map(|a| a.pos) else {
        return;
    };
    let mut force = Vec2::ZERO;

    match p.house {
        House::Web => {
            let links: Vec<Vec2> = ctx
                .agents_near(pos, cfg.web_radius, |a| a.is_mature() && a.id != p.agent)
                .into_iter()
                .take(cfg.web_links)
                .filter_map(|j| ctx.agents.at(j).map(|a| a.pos))
                .collect();
            if let Some(center) = mean(links.into_iter()) {
                force = (center - pos).normalized() * (cfg.web_force * frames);
            }
        }
        House::Shield => {
            let weakest = ctx
                .agents_near(pos, cfg.shield_radius, |a| {
                    a.is_mature() && a.id != p.agent && a.energy < cfg.shield_weak_energy
                })
                .into_iter()
                .filter_map(|j| ctx.agents.at(j).map(|a| (j, a.energy, a.pos)))
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            if let Some((j, _, target)) = weakest {
                let d = target.distance(pos);
                if d > cfg.shield_follow_distance {
                    force = (target - pos).normalized() * (cfg.shield_force * frames);
                }
                if d <= cfg.shield_transfer_radius {
                    if let Some((guard, ward)) = ctx.agents.pair_mut(idx, j) {
                        shield_transfer(guard, ward, cfg.shield_transfer * frames, cfg.shield_min_energy);
                    }
                }
            }
        }
        House::Forge => {
            if ctx.chance(cfg.forge_mark_chance) {
                let now = ctx.clock.now_ms;
                if let Some(id) =
                    ctx.pheromones
                        .deposit(pos, TrailKind::Path, Some(p.agent), None, now)
                {
                    ctx.pheromones.set_ttl(id, cfg.forge_mark_ttl_ms);
                }
            }
        }
        House::Script => {
            let cycle = cfg.script_cycle_ms.max(1.0);
            let phase = (p.age_ms % cycle) / cycle;
            force = script_heading(p.script, phase) * (cfg.script_force * frames);
        }
        House::Cloud => {
            force = Vec2::new(0.0, cfg.cloud_lift * frames);
        }
        House::DarkArts => {
            let mut push = Vec2::ZERO;
            for j in ctx.agents_near(pos, cfg.dark_repel_radius, |a| a.id != p.agent && a.is_alive()) {
                if let Some(other) = ctx.agents.at(j) {
                    let w = falloff(other.pos.distance(pos), cfg.dark_repel_radius);
                    push += (pos - other.pos).normalized() * w;
                }
            }
            force = push * (cfg.dark_repel_force * frames);
        }
    }

    let Some(agent) = ctx.agents.at_mut(idx) else {
        return;
    };
    agent.apply_force(force);
    agent.modifiers.speed *= p.house.speed_multiplier();
    match p.house {
        House::Cloud => agent.modifiers.opacity *= cfg.cloud_opacity,
        House::DarkArts => {
            let cycle = cfg.dark_cycle_ms.max(1.0);
            agent.markers.stealth = p.age_ms % cycle < cfg.dark_stealth_ms;
            if agent.markers.stealth {
                agent.modifiers.opacity *= 0.3;
            }
        }
        _ => {}
    }
}

/// Moves `amount` of energy from a guard with more than `min_energy`; the ward receives half.
fn shield_transfer(guard: &mut Agent, ward: &mut Agent, amount: f64, min_energy: f64) {
    if guard.energy <= min_energy {
        return;
    }
    let given = amount.min(guard.energy - min_energy);
    guard.energy -= given;
    ward.add_energy(given * 0.5);
}
