//! Rare variants: golden, diamond, glitch and ancient agents.
//!
//! Golden, diamond and glitch are rolled once at birth. Ancient status is
//! earned: a mature agent old enough may become ancient on any tick.
//! Diamond shielding is read by the predators when they try to catch.

use crate::config::RareConfig;
use crate::context::TickContext;
use firefly_data::{Digit, LiveEvent, RareKind, Vec2};
use rand::Rng;

/// Energy an ancient keeps for itself when sharing.
const ANCIENT_RESERVE: f64 = 20.0;

/// One draw deciding a newborn's variant, if any.
///
/// Golden needs digit one and diamond needs digit zero; glitch can hit either.
pub fn roll_rare<R: Rng>(digit: Digit, cfg: &RareConfig, rng: &mut R) -> Option<RareKind> {
    if !cfg.enabled {
        return None;
    }
    let (kind, p) = match digit {
        Digit::One => (RareKind::Golden, cfg.golden_chance),
        Digit::Zero => (RareKind::Diamond, cfg.diamond_chance),
    };
    let roll = rng.gen::<f64>();
    if roll < p {
        Some(kind)
    } else if roll < p + cfg.glitch_chance {
        Some(RareKind::Glitch)
    } else {
        None
    }
}

/// Runs every rare agent's effect for one tick.
pub fn run<R: Rng>(ctx: &mut TickContext<'_, R>) {
    let config = ctx.config;
    let cfg = &config.rare;
    if !cfg.enabled {
        return;
    }
    emerge_ancients(ctx, cfg);

    let frames = ctx.clock.frames();
    for i in 0..ctx.agents.len() {
        let Some((kind, pos, id)) = ctx
            .agents
            .at(i)
            .filter(|a| a.is_mature())
            .and_then(|a| a.markers.rare.map(|k| (k, a.pos, a.id)))
        else {
            continue;
        };
        match kind {
            RareKind::Golden => {
                for j in ctx.agents_near(pos, cfg.golden_attract_radius, |a| {
                    a.is_mature() && a.id != id
                }) {
                    let Some(other) = ctx.agents.at_mut(j) else {
                        continue;
                    };
                    let d = other.pos.distance(pos);
                    if other.digit == Digit::One {
                        other.apply_force(
                            (pos - other.pos).normalized() * (cfg.golden_attract_force * frames),
                        );
                    }
                    if d <= cfg.golden_feed_radius {
                        other.add_energy(cfg.golden_feed * frames);
                    }
                }
                if let Some(golden) = ctx.agents.at_mut(i) {
                    golden.modifiers.glow *= 1.5;
                }
            }
            RareKind::Diamond => {
                if let Some(diamond) = ctx.agents.at_mut(i) {
                    diamond.modifiers.glow *= 1.3;
                }
            }
            RareKind::Glitch => {
                if ctx.chance(cfg.glitch_teleport_chance) {
                    let angle = ctx.rng.gen_range(0.0..std::f64::consts::TAU);
                    let reach = ctx.rng.gen::<f64>() * cfg.glitch_teleport_range;
                    let (w, h) = (config.arena.width, config.arena.height);
                    if let Some(glitch) = ctx.agents.at_mut(i) {
                        let to = glitch.pos + Vec2::from_angle(angle) * reach;
                        glitch.pos = Vec2::new(to.x.clamp(0.0, w), to.y.clamp(0.0, h));
                    }
                }
            }
            RareKind::Ancient => {
                let share = cfg.ancient_share * frames;
                for j in ctx.agents_near(pos, cfg.ancient_share_radius, |a| {
                    a.is_mature() && a.id != id
                }) {
                    let Some((ancient, other)) = ctx.agents.pair_mut(i, j) else {
                        continue;
                    };
                    if ancient.energy - share < ANCIENT_RESERVE || other.energy >= ancient.energy {
                        continue;
                    }
                    ancient.energy -= share;
                    other.add_energy(share);
                }
                if let Some(ancient) = ctx.agents.at_mut(i) {
                    ancient.modifiers.speed *= cfg.ancient_speed;
                }
            }
        }
    }
}

fn emerge_ancients<R: Rng>(ctx: &mut TickContext<'_, R>, cfg: &RareConfig) {
    let candidates: Vec<usize> = ctx
        .agents
        .iter()
        .enumerate()
        .filter(|(_, a)| a.is_mature() && a.markers.rare.is_none() && a.age_ms >= cfg.ancient_age_ms)
        .map(|(i, _)| i)
        .collect();
    for i in candidates {
        if !ctx.chance(cfg.ancient_chance) {
            continue;
        }
        if let Some(agent) = ctx.agents.at_mut(i) {
            agent.markers.rare = Some(RareKind::Ancient);
            tracing::debug!(agent = %agent.id, "Ancient emerged");
            ctx.out.emit(LiveEvent::RareEmerged {
                agent: agent.id,
                kind: RareKind::Ancient,
                tick: ctx.clock.tick,
            });
        }
    }
}
