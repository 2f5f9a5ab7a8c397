//! Stationary energy wells: foraging spots that pull mature agents in and
//! feed the ones close to the core.

use crate::config::{ArenaConfig, EnergyWellConfig};
use crate::context::TickContext;
use firefly_data::{EnergyWellKind, LiveEvent, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyWell {
    pub id: u64,
    pub kind: EnergyWellKind,
    pub pos: Vec2,
    /// Core radius; grows to full size over the birth period.
    pub size: f64,
    pub age_ms: f64,
    /// Remaining reserve. Ignored for bottomless wells.
    pub energy: f64,
    pub depleted: bool,
    pub depleted_ms: f64,
    pub total_given: f64,
    served: HashSet<Uuid>,
}

impl EnergyWell {
    pub fn new(id: u64, kind: EnergyWellKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            size: 0.0,
            age_ms: 0.0,
            energy: kind.profile().capacity.unwrap_or(f64::INFINITY),
            depleted: false,
            depleted_ms: 0.0,
            total_given: 0.0,
            served: HashSet::new(),
        }
    }

    #[must_use]
    pub fn is_mature(&self, config: &EnergyWellConfig) -> bool {
        self.age_ms >= config.birth_ms
    }

    /// Open for business: fully grown and not recovering from depletion.
    #[must_use]
    pub fn is_active(&self, config: &EnergyWellConfig) -> bool {
        self.is_mature(config) && !self.depleted
    }

    /// Reserve as a fraction of capacity; always 1 for bottomless wells.
    #[must_use]
    pub fn fill(&self) -> f64 {
        match self.kind.profile().capacity {
            Some(cap) if cap > 0.0 => self.energy / cap,
            _ => 1.0,
        }
    }

    /// Distinct agents this well has fed.
    #[must_use]
    pub fn served(&self) -> usize {
        self.served.len()
    }

    fn advance(&mut self, config: &EnergyWellConfig, dt_ms: f64, tick: u64) -> Option<LiveEvent> {
        self.age_ms += dt_ms;
        let growth = if config.birth_ms > 0.0 {
            (self.age_ms / config.birth_ms).min(1.0)
        } else {
            1.0
        };
        self.size = config.base_size * growth;

        let profile = self.kind.profile();
        let Some(capacity) = profile.capacity else {
            return None;
        };
        if self.depleted {
            self.depleted_ms -= dt_ms;
            if self.depleted_ms <= 0.0 {
                self.depleted = false;
                self.energy = capacity * config.restore_fraction;
                tracing::debug!(well = self.id, kind = %self.kind, "Energy well restored");
                return Some(LiveEvent::EnergyWellRestored {
                    well_id: self.id,
                    kind: self.kind,
                    tick,
                });
            }
        } else if self.energy < capacity {
            self.energy = (self.energy + profile.regen_rate * dt_ms / 1000.0).min(capacity);
        }
        None
    }

    /// Draws up to `wanted` from the reserve. Returns what was actually given
    /// and whether the draw emptied the well.
    fn draw(&mut self, wanted: f64, config: &EnergyWellConfig) -> (f64, bool) {
        if self.kind.profile().capacity.is_none() {
            return (wanted, false);
        }
        let given = wanted.min(self.energy);
        self.energy -= given;
        if self.energy <= 0.0 {
            self.energy = 0.0;
            self.depleted = true;
            self.depleted_ms = config.depleted_ms;
            return (given, true);
        }
        (given, false)
    }
}

/// Owns the energy wells and their id counter.
#[derive(Debug, Clone)]
pub struct EnergyWellSystem {
    config: EnergyWellConfig,
    wells: Vec<EnergyWell>,
    next_id: u64,
}

impl EnergyWellSystem {
    pub fn new(config: &EnergyWellConfig) -> Self {
        Self {
            config: config.clone(),
            wells: Vec::new(),
            next_id: 1,
        }
    }

    /// Places the configured starting wells inside the middle of the arena.
    pub fn seed<R: Rng>(&mut self, arena: &ArenaConfig, rng: &mut R) {
        if !self.config.enabled {
            return;
        }
        let kinds: Vec<EnergyWellKind> = self
            .config
            .initial
            .iter()
            .filter_map(|name| name.parse().ok())
            .collect();
        for kind in kinds {
            let pos = inner_point(arena, rng);
            self.add(kind, pos);
        }
    }

    #[must_use]
    pub fn wells(&self) -> &[EnergyWell] {
        &self.wells
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.wells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wells.is_empty()
    }

    /// Adds a well. Returns `None` at the cap.
    pub fn add(&mut self, kind: EnergyWellKind, pos: Vec2) -> Option<u64> {
        if self.wells.len() >= self.config.max_wells {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.wells.push(EnergyWell::new(id, kind, pos));
        tracing::info!(well = id, %kind, x = pos.x, y = pos.y, "Energy well placed");
        Some(id)
    }

    /// Ages the wells, pulls mature agents toward them and feeds those at the core.
    ///
    /// `output` scales every transfer; cosmic events raise it above 1.
    pub fn update<R: Rng>(&mut self, ctx: &mut TickContext<'_, R>, output: f64) {
        if !self.config.enabled {
            return;
        }
        let cfg = &self.config;
        let frames = ctx.clock.frames();
        let seconds = ctx.clock.seconds();

        for well in &mut self.wells {
            if let Some(event) = well.advance(cfg, ctx.clock.dt_ms, ctx.clock.tick) {
                ctx.out.emit(event);
            }
            if !well.is_active(cfg) {
                continue;
            }
            let profile = well.kind.profile();
            let transfer_radius = well.size * 2.0;
            for idx in ctx.agents_near(well.pos, profile.attract_radius, |a| a.is_mature()) {
                let Some(agent) = ctx.agents.at_mut(idx) else {
                    continue;
                };
                let offset = well.pos - agent.pos;
                let distance = offset.length();
                agent.modifiers.near_energy_well = true;

                if distance >= well.size && distance > 0.0 {
                    let strength = profile.attract_strength * (1.0 - distance / profile.attract_radius);
                    agent.apply_force(offset * (strength * frames / distance));
                }

                if well.depleted || distance > transfer_radius || transfer_radius <= 0.0 {
                    continue;
                }
                let proximity = 1.0 - distance / transfer_radius;
                let wanted = profile.output_rate * proximity * seconds * output;
                if wanted <= 0.0 {
                    continue;
                }
                let (given, emptied) = well.draw(wanted, cfg);
                agent.add_energy(given);
                well.total_given += given;
                well.served.insert(agent.id);
                if emptied {
                    tracing::debug!(well = well.id, kind = %well.kind, "Energy well depleted");
                    ctx.out.emit(LiveEvent::EnergyWellDepleted {
                        well_id: well.id,
                        kind: well.kind,
                        tick: ctx.clock.tick,
                    });
                }
            }
        }

        if self.wells.len() < self.config.max_wells
            && !self.config.kinds.is_empty()
            && ctx.chance(self.config.spawn_chance * frames)
        {
            let pick = ctx.rng.gen_range(0..self.config.kinds.len());
            if let Ok(kind) = self.config.kinds[pick].parse() {
                let pos = inner_point(&ctx.config.arena, &mut *ctx.rng);
                self.add(kind, pos);
            }
        }
    }
}

/// A random point in the middle 60% of the arena.
fn inner_point<R: Rng>(arena: &ArenaConfig, rng: &mut R) -> Vec2 {
    Vec2::new(
        arena.width * (0.2 + 0.6 * rng.gen::<f64>()),
        arena.height * (0.2 + 0.6 * rng.gen::<f64>()),
    )
}
