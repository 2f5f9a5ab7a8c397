//! Constellations: short-lived rigid formations of mature agents.
//!
//! A formation moves through `Forming` (members steer to their slots),
//! `Holding` (the shape drifts as one, bounces off the arena edges and
//! twinkles) and `Dispersing` (members are let go). A formation that loses
//! too many members dissolves at once.

use super::{is_free, mean};
use crate::agents::AgentStore;
use crate::config::ConstellationConfig;
use crate::context::{TickContext, TickOutput};
use firefly_data::{FormationPattern, FormationPhase, LiveEvent, Vec2};
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

/// Phase offset between neighbouring members' twinkle.
const TWINKLE_OFFSET: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    pub id: u64,
    pub pattern: FormationPattern,
    /// Member `i` owns slot `i` of the pattern.
    pub members: Vec<Uuid>,
    pub phase: FormationPhase,
    /// Centre of the shape.
    pub anchor: Vec2,
    /// Pixels per frame while holding.
    pub drift: Vec2,
    pub age_ms: f64,
    pub phase_ms: f64,
    signal_cooldown_ms: f64,
    /// Countdown to answering a signal with a pulse.
    response_ms: Option<f64>,
    pub pulse_ms: f64,
}

impl Formation {
    /// Slot position of member `i` around the anchor.
    #[must_use]
    pub fn slot(&self, i: usize, radius: f64) -> Option<Vec2> {
        let &(px, py) = self.pattern.points().get(i)?;
        Some(self.anchor + Vec2::new(px - 0.5, py - 0.5) * (2.0 * radius))
    }

    #[must_use]
    pub fn is_pulsing(&self) -> bool {
        self.pulse_ms > 0.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstellationSystem {
    formations: Vec<Formation>,
    next_id: u64,
}

impl ConstellationSystem {
    pub fn new() -> Self {
        Self {
            formations: Vec::new(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn formations(&self) -> &[Formation] {
        &self.formations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.formations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formations.is_empty()
    }

    pub fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>) {
        let config = ctx.config;
        let cfg = &config.constellation;
        if !cfg.enabled {
            return;
        }
        self.dissolve_depleted(ctx.agents, ctx.out, ctx.clock.tick, cfg.min_live_members);
        for formation in &mut self.formations {
            advance(formation, ctx, cfg);
        }
        self.release_finished(ctx.agents, ctx.out, ctx.clock.tick, cfg.dispersing_ms);
        self.exchange_signals(ctx, cfg);
        if self.formations.len() < cfg.max_active && ctx.chance(cfg.chance) {
            self.try_form(ctx, cfg);
        }
    }

    /// Drops formations whose live membership fell below `min_live`.
    fn dissolve_depleted(
        &mut self,
        agents: &mut AgentStore,
        out: &mut TickOutput,
        tick: u64,
        min_live: usize,
    ) {
        self.formations.retain(|f| {
            let live = f
                .members
                .iter()
                .filter(|id| {
                    agents
                        .get(id)
                        .is_some_and(|a| a.is_mature() && a.markers.constellation_id == Some(f.id))
                })
                .count();
            if live >= min_live {
                return true;
            }
            release(agents, f);
            tracing::debug!(formation = f.id, live, "Constellation dissolved");
            out.emit(LiveEvent::FormationEnded {
                formation_id: f.id,
                tick,
            });
            false
        });
    }

    fn release_finished(
        &mut self,
        agents: &mut AgentStore,
        out: &mut TickOutput,
        tick: u64,
        dispersing_ms: f64,
    ) {
        self.formations.retain(|f| {
            let done = f.phase == FormationPhase::Dispersing && f.phase_ms >= dispersing_ms;
            if done {
                release(agents, f);
                tracing::debug!(formation = f.id, "Constellation dispersed");
                out.emit(LiveEvent::FormationEnded {
                    formation_id: f.id,
                    tick,
                });
            }
            !done
        });
    }

    fn exchange_signals<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, cfg: &ConstellationConfig) {
        let holding: Vec<usize> = (0..self.formations.len())
            .filter(|&i| self.formations[i].phase == FormationPhase::Holding)
            .collect();
        if holding.len() < 2 {
            return;
        }
        for &i in &holding {
            if self.formations[i].signal_cooldown_ms > 0.0 || !ctx.chance(cfg.signal_chance) {
                continue;
            }
            let others: Vec<usize> = holding.iter().copied().filter(|&j| j != i).collect();
            let Some(&j) = others.choose(ctx.rng) else {
                continue;
            };
            let delay = if cfg.response_max_ms > cfg.response_min_ms {
                ctx.rng.gen_range(cfg.response_min_ms..cfg.response_max_ms)
            } else {
                cfg.response_min_ms
            };
            self.formations[i].signal_cooldown_ms = cfg.signal_cooldown_ms;
            self.formations[j].response_ms = Some(delay);
            ctx.out.emit(LiveEvent::FormationSignal {
                from: self.formations[i].id,
                to: self.formations[j].id,
                tick: ctx.clock.tick,
            });
        }
    }

    fn try_form<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, cfg: &ConstellationConfig) {
        let eligible: Vec<usize> = ctx
            .agents
            .iter()
            .enumerate()
            .filter(|(_, a)| is_free(a))
            .map(|(i, _)| i)
            .collect();
        let Some(&seed) = eligible.choose(ctx.rng) else {
            return;
        };
        let Some(center) = ctx.agents.at(seed).map(|a| a.pos) else {
            return;
        };
        let nearby = ctx.agents_near(center, cfg.radius * 2.0, is_free);
        if nearby.len() < cfg.min_members {
            return;
        }
        let count = nearby.len().min(cfg.max_members);
        let patterns: Vec<FormationPattern> = FormationPattern::ALL
            .into_iter()
            .filter(|p| p.slots() <= count && p.slots() >= cfg.min_live_members)
            .collect();
        let Some(&pattern) = patterns.choose(ctx.rng) else {
            return;
        };
        let drift_speed = if cfg.max_drift > cfg.min_drift {
            ctx.rng.gen_range(cfg.min_drift..cfg.max_drift)
        } else {
            cfg.min_drift
        };
        let drift = Vec2::from_angle(ctx.rng.gen_range(0.0..std::f64::consts::TAU)) * drift_speed;
        let members = &nearby[..pattern.slots()];
        if let Some(id) = self.form(ctx.agents, members, pattern, drift) {
            let formation = self.formations.last();
            tracing::debug!(formation = id, ?pattern, "Constellation forming");
            ctx.out.emit(LiveEvent::FormationStarted {
                formation_id: id,
                pattern,
                members: formation.map(|f| f.members.clone()).unwrap_or_default(),
                tick: ctx.clock.tick,
            });
        }
    }

    /// Binds the mature, unassigned agents at `indices` into a new formation.
    ///
    /// Returns `None` when fewer agents than the pattern has slots qualify.
    pub fn form(
        &mut self,
        agents: &mut AgentStore,
        indices: &[usize],
        pattern: FormationPattern,
        drift: Vec2,
    ) -> Option<u64> {
        let chosen: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| agents.at(i).is_some_and(is_free))
            .take(pattern.slots())
            .collect();
        if chosen.len() < pattern.slots() {
            return None;
        }
        let anchor = mean(chosen.iter().filter_map(|&i| agents.at(i)).map(|a| a.pos))?;
        let id = self.next_id;
        self.next_id += 1;
        let mut members = Vec::with_capacity(chosen.len());
        for &i in &chosen {
            if let Some(agent) = agents.at_mut(i) {
                agent.markers.constellation_id = Some(id);
                members.push(agent.id);
            }
        }
        self.formations.push(Formation {
            id,
            pattern,
            members,
            phase: FormationPhase::Forming,
            anchor,
            drift,
            age_ms: 0.0,
            phase_ms: 0.0,
            signal_cooldown_ms: 0.0,
            response_ms: None,
            pulse_ms: 0.0,
        });
        Some(id)
    }

    pub fn prune(&mut self, agents: &AgentStore) {
        for formation in &mut self.formations {
            formation.members.retain(|id| agents.index_of(id).is_some());
        }
    }
}

fn release(agents: &mut AgentStore, formation: &Formation) {
    for id in &formation.members {
        if let Some(agent) = agents.get_mut(id) {
            if agent.markers.constellation_id == Some(formation.id) {
                agent.markers.constellation_id = None;
            }
        }
    }
}

fn advance<R: Rng>(f: &mut Formation, ctx: &mut TickContext<'_, R>, cfg: &ConstellationConfig) {
    let dt = ctx.clock.dt_ms;
    let frames = ctx.clock.frames();
    f.age_ms += dt;
    f.phase_ms += dt;
    f.signal_cooldown_ms = (f.signal_cooldown_ms - dt).max(0.0);
    f.pulse_ms = (f.pulse_ms - dt).max(0.0);
    if let Some(remaining) = f.response_ms {
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            f.response_ms = None;
            f.pulse_ms = cfg.pulse_ms;
        } else {
            f.response_ms = Some(remaining);
        }
    }

    match f.phase {
        FormationPhase::Forming => {
            let mut settled = true;
            for (i, id) in f.members.iter().enumerate() {
                let (Some(slot), Some(agent)) = (f.slot(i, cfg.radius), ctx.agents.get_mut(id))
                else {
                    continue;
                };
                let d = slot.distance(agent.pos);
                if d > cfg.forming_tolerance {
                    settled = false;
                }
                agent.vel = agent.vel * cfg.forming_damping;
                agent.apply_force((slot - agent.pos).normalized() * (cfg.forming_force * frames));
            }
            if settled || f.phase_ms >= cfg.forming_ms {
                f.phase = FormationPhase::Holding;
                f.phase_ms = 0.0;
            }
        }
        FormationPhase::Holding => {
            f.anchor += f.drift * frames;
            let margin = cfg.radius + 50.0;
            let (w, h) = (ctx.config.arena.width, ctx.config.arena.height);
            if f.anchor.x < margin || f.anchor.x > w - margin {
                f.drift.x = -f.drift.x;
                f.anchor.x = f.anchor.x.clamp(margin.min(w / 2.0), (w - margin).max(w / 2.0));
            }
            if f.anchor.y < margin || f.anchor.y > h - margin {
                f.drift.y = -f.drift.y;
                f.anchor.y = f.anchor.y.clamp(margin.min(h / 2.0), (h - margin).max(h / 2.0));
            }
            let pulse = if f.is_pulsing() { 1.5 } else { 1.0 };
            for (i, id) in f.members.iter().enumerate() {
                let (Some(slot), Some(agent)) = (f.slot(i, cfg.radius), ctx.agents.get_mut(id))
                else {
                    continue;
                };
                agent.vel = agent.vel * cfg.holding_damping;
                agent.apply_force((slot - agent.pos) * (cfg.holding_force * frames));
                let wave = (f.age_ms * cfg.twinkle_speed + i as f64 * TWINKLE_OFFSET).sin();
                agent.modifiers.glow *=
                    cfg.glow_boost * (1.0 + cfg.twinkle_intensity * wave) * pulse;
            }
            if f.age_ms >= cfg.duration_ms - cfg.dispersing_ms {
                f.phase = FormationPhase::Dispersing;
                f.phase_ms = 0.0;
            }
        }
        FormationPhase::Dispersing => {
            for id in &f.members {
                if let Some(agent) = ctx.agents.get_mut(id) {
                    let fade = 1.0 - f.phase_ms / cfg.dispersing_ms.max(1.0);
                    agent.modifiers.glow *= 1.0 + (cfg.glow_boost - 1.0) * fade.max(0.0);
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
    use firefly_data::{DeathCause, Digit};

    fn triangle(fx: &mut Fixture, system: &mut ConstellationSystem) -> u64 {
        let idx: Vec<usize> = (0..3)
            .map(|n| fx.mature_at(n, Vec2::new(300.0 + n as f64 * 30.0, 300.0), Digit::One))
            .collect();
        system
            .form(&mut fx.agents, &idx, FormationPattern::Triangle, Vec2::new(0.5, 0.0))
            .unwrap_or_default()
    }

    #[test]
    fn test_form_assigns_members() {
        let mut fx = Fixture::new(AppConfig::default());
        let mut system = ConstellationSystem::new();
        let id = triangle(&mut fx, &mut system);
        assert_eq!(id, 1);
        assert!(fx.agents.iter().all(|a| a.markers.constellation_id == Some(1)));
        assert_eq!(system.formations()[0].anchor, Vec2::new(330.0, 300.0));
    }

    #[test]
    fn test_immature_agents_are_never_assigned() {
        let mut fx = Fixture::new(AppConfig::default());
        let idx: Vec<usize> = (0..3)
            .map(|n| fx.mature_at(n, Vec2::new(300.0, 300.0), Digit::One))
            .collect();
        fx.agents.as_mut_slice()[1].state = firefly_data::LifeState::Spawning;
        let mut system = ConstellationSystem::new();
        assert!(system
            .form(&mut fx.agents, &idx, FormationPattern::Triangle, Vec2::ZERO)
            .is_none());
        assert!(fx.agents.iter().all(|a| a.markers.constellation_id.is_none()));
    }

    #[test]
    fn test_losing_a_member_dissolves_on_next_update() {
        let mut config = AppConfig::default();
        config.constellation.chance = 0.0;
        let mut fx = Fixture::new(config);
        let mut system = ConstellationSystem::new();
        triangle(&mut fx, &mut system);

        fx.agents.as_mut_slice()[0].kill(DeathCause::Hunter);
        system.update(&mut fx.ctx());

        assert!(system.is_empty());
        assert!(fx.agents.iter().all(|a| a.markers.constellation_id.is_none()));
        assert!(fx
            .out
            .events
            .iter()
            .any(|e| matches!(e, LiveEvent::FormationEnded { formation_id: 1, .. })));
    }

    #[test]
    fn test_full_life_cycle_releases_members() {
        let mut config = AppConfig::default();
        config.constellation.chance = 0.0;
        let mut fx = Fixture::new(config);
        let mut system = ConstellationSystem::new();
        triangle(&mut fx, &mut system);

        fx.clock.dt_ms = 100.0;
        let mut phases = Vec::new();
        for _ in 0..60 {
            system.update(&mut fx.ctx());
            match system.formations().first() {
                Some(f) => phases.push(f.phase),
                None => break,
            }
        }
        assert!(system.is_empty());
        assert!(phases.contains(&FormationPhase::Holding));
        assert!(phases.contains(&FormationPhase::Dispersing));
        assert!(fx.agents.iter().all(|a| a.markers.constellation_id.is_none()));
    }
}
