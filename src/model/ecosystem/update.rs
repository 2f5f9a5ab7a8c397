use super::Ecosystem;
use firefly_core::context::{Clock, TickContext, TickOutput};
use firefly_core::{lifecycle, pheromone, planet, rare};
use firefly_data::{DeathCause, LiveEvent, Vec2};
use firefly_core::social::reproduction;
use std::time::Instant;

impl Ecosystem {
    /// Advances the ecosystem by one tick of `dt_ms` simulated milliseconds.
    ///
    /// Phases run in a fixed order:
    /// - environment (day clock, weather, planets)
    /// - cosmic events and energy-well foraging
    /// - interaction gateway
    /// - predators
    /// - social layer (swarms, constellations, personalities, mitosis, rare variants)
    /// - pheromone deposit, decay and steering
    /// - agent lifecycles, integration and collisions
    /// - cleanup (spawns, removals, pruning, replacements)
    ///
    /// `dt_ms` is clamped to `[0, arena.max_dt_ms]`; a non-finite value counts as zero.
    ///
    /// # Returns
    /// Every event raised during the tick, plus any raised since the last one
    /// by explicit calls such as [`Ecosystem::spawn_agent`].
    pub fn update(&mut self, dt_ms: f64) -> Vec<LiveEvent> {
        let started = Instant::now();
        let dt = if dt_ms.is_finite() {
            dt_ms.clamp(0.0, self.config.arena.max_dt_ms)
        } else {
            self.metrics.log_warning("Non-finite dt treated as zero");
            0.0
        };
        self.tick += 1;
        self.now_ms += dt;
        let clock = Clock::new(self.tick, self.now_ms, dt);
        let mut out = TickOutput::default();

        self.begin_tick();
        self.run_environment(clock, &mut out);
        self.run_subsystems(clock, &mut out);
        self.finish_tick(out, started)
    }

    fn begin_tick(&mut self) {
        for agent in self.agents.iter_mut() {
            agent.modifiers.reset_transient();
        }
        self.spatial.build(&self.agents.positions());
    }

    fn run_environment(&mut self, clock: Clock, out: &mut TickOutput) {
        self.environment.update(
            &self.config.environment,
            clock,
            &mut self.agents,
            &mut self.rng,
            out,
        );
        let center = self.well_center();
        self.planets.update(center, clock.dt_ms);
    }

    /// Everything that runs against the shared tick context.
    fn run_subsystems(&mut self, clock: Clock, out: &mut TickOutput) {
        let env = self.environment.snapshot();
        let mut ctx = TickContext {
            clock,
            config: &self.config,
            env: &env,
            agents: &mut self.agents,
            spatial: &self.spatial,
            pheromones: &mut self.pheromones,
            planets: self.planets.planets(),
            rng: &mut self.rng,
            out,
        };
        planet::apply_planet_effects(&mut ctx);

        self.cosmic.update(&mut ctx);
        let output = self.cosmic.modifiers(clock.now_ms).energy;
        self.energy_wells.update(&mut ctx, output);

        let reach = ctx.config.interaction.strike_reach;
        for point in self.gateway.apply(&mut ctx) {
            if self
                .predators
                .strike_well(point, reach, clock.tick, ctx.out)
            {
                tracing::debug!(x = point.x, y = point.y, "Star strike hit the gravity well");
            }
        }

        self.predators.update(&mut ctx);

        self.swarms.update(&mut ctx);
        self.constellations.update(&mut ctx);
        self.personalities.update(&mut ctx);
        reproduction::run(&mut ctx);
        rare::run(&mut ctx);

        pheromone::deposit_and_decay(&mut ctx);
        pheromone::steer_agents(&mut ctx);

        lifecycle::advance_lifecycles(&mut ctx);
        lifecycle::integrate(&mut ctx);
        lifecycle::resolve_collisions(&mut ctx);
    }

    fn finish_tick(&mut self, out: TickOutput, started: Instant) -> Vec<LiveEvent> {
        let TickOutput {
            events: tick_events,
            spawns,
            planets,
        } = out;
        let mut events = std::mem::take(&mut self.pending);
        events.extend(tick_events);

        for request in planets {
            if let Some(event) =
                self.planets
                    .birth(request.center, request.digit, self.tick, &mut self.rng)
            {
                events.push(event);
            }
        }
        for request in spawns {
            self.apply_spawn(request, &mut events);
        }

        self.remove_dead(&mut events);
        self.constellations.prune(&self.agents);
        self.personalities.prune(&self.agents);
        self.swarms.prune(&self.agents);
        self.predators.prune(&self.agents);
        self.replenish(&mut events);

        for event in &events {
            self.count_event(event);
        }
        self.metrics
            .record_tick(started.elapsed(), self.agents.len(), self.pheromones.len());
        events
    }

    fn remove_dead(&mut self, events: &mut Vec<LiveEvent>) {
        for agent in self.agents.remove_dead() {
            let cause = agent.death_cause.unwrap_or(DeathCause::Forced);
            *self.deaths.entry(cause).or_insert(0) += 1;
            events.push(LiveEvent::Death {
                id: agent.id,
                cause,
                tier: agent.tier,
                gen: agent.generation(),
                tick: self.tick,
            });
        }
    }

    fn count_event(&mut self, event: &LiveEvent) {
        match event {
            LiveEvent::Birth { .. } => self.births += 1,
            LiveEvent::Consumed { .. } => self.consumed += 1,
            LiveEvent::Converted { .. } => self.conversions += 1,
            LiveEvent::PlanetBorn { planet_id, digit, .. } => self.metrics.log_event(
                "planet_born",
                &format!("planet {planet_id} from digit {}", digit.value()),
            ),
            LiveEvent::ShadowPurified { shadow_id, .. } => self
                .metrics
                .log_event("shadow_purified", &format!("shadow {shadow_id}")),
            LiveEvent::CosmicEventStarted { kind, .. } => self
                .metrics
                .log_event("cosmic_event", &kind.to_string()),
            _ => {}
        }
        self.metrics.record_event(event);
    }

    /// The gravity well's position, or the arena centre without one.
    pub(crate) fn well_center(&self) -> Vec2 {
        self.predators.well().map_or_else(
            || Vec2::new(self.config.arena.width / 2.0, self.config.arena.height / 2.0),
            |w| w.pos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use firefly_data::{Agent, Digit, LifeState};
    use uuid::Uuid;

    fn quiet_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.arena.initial_population = 0;
        config.arena.min_population = 0;
        config.gravity_well.enabled = false;
        config.hunters.enabled = false;
        config.shadows.enabled = false;
        config.serpent.enabled = false;
        config.energy_wells.enabled = false;
        config.cosmic.enabled = false;
        config
    }

    #[test]
    fn test_dt_is_clamped() {
        let mut eco = Ecosystem::with_seed(quiet_config(), 1);
        eco.update(10_000.0);
        assert_eq!(eco.now_ms(), 250.0);
        eco.update(-5.0);
        assert_eq!(eco.now_ms(), 250.0);
        eco.update(f64::NAN);
        assert_eq!(eco.now_ms(), 250.0);
        assert_eq!(eco.tick(), 3);
    }

    #[test]
    fn test_killed_agent_is_removed_with_one_death_event() {
        let mut eco = Ecosystem::with_seed(quiet_config(), 2);
        let mut agent = Agent::new(Uuid::from_u128(9), Vec2::new(200.0, 200.0), Digit::One);
        agent.state = LifeState::Mature;
        let id = eco.insert_agent(agent);

        assert!(eco.kill(&id));
        assert!(!eco.kill(&id));
        let events = eco.update(16.0);
        let deaths: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, LiveEvent::Death { id: d, .. } if *d == id))
            .collect();
        assert_eq!(deaths.len(), 1);
        assert!(eco.agent(&id).is_none());
        assert!(!eco.kill(&id));
    }

    #[test]
    fn test_metrics_follow_ticks() {
        let mut eco = Ecosystem::with_seed(quiet_config(), 3);
        for _ in 0..5 {
            eco.update(16.0);
        }
        assert_eq!(eco.metrics.tick_count(), 5);
    }
}
