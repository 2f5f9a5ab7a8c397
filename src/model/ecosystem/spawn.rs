use super::Ecosystem;
use firefly_core::context::SpawnRequest;
use firefly_core::lifecycle::{create_agent_with_rng, has_room};
use firefly_core::rare::roll_rare;
use firefly_data::{
    BirthOrigin, BreedingEnvironment, Digit, LifeState, LiveEvent, RareKind, Vec2,
};
use rand::Rng;
use uuid::Uuid;

impl Ecosystem {
    pub(crate) fn spawn_initial_population(&mut self) {
        let mut events = Vec::new();
        for _ in 0..self.config.arena.initial_population {
            let pos = self.random_point();
            let request = SpawnRequest {
                mature: true,
                ..SpawnRequest::at(pos, BirthOrigin::Spontaneous)
            };
            self.apply_spawn(request, &mut events);
        }
        self.pending.extend(events);
    }

    /// Creates a mature agent right away, outside the tick.
    ///
    /// Returns `None` when the population cap is reached. The `Birth` event is
    /// delivered with the next tick's events.
    pub fn spawn_agent(&mut self, pos: Vec2, digit: Option<Digit>) -> Option<Uuid> {
        let request = SpawnRequest {
            digit,
            mature: true,
            ..SpawnRequest::at(pos, BirthOrigin::Spontaneous)
        };
        let mut events = Vec::new();
        let id = self.apply_spawn(request, &mut events);
        self.pending.extend(events);
        id
    }

    /// Turns a spawn request into an agent.
    ///
    /// Offspring are bred from the recorded parent under the local breeding
    /// conditions; everything else gets fresh genetics. Purification
    /// replacements are star seeds.
    pub(crate) fn apply_spawn(
        &mut self,
        request: SpawnRequest,
        events: &mut Vec<LiveEvent>,
    ) -> Option<Uuid> {
        if !has_room(&self.config, self.agents.present_count()) {
            tracing::debug!(origin = ?request.origin, "Spawn dropped at population cap");
            return None;
        }
        let mut agent =
            create_agent_with_rng(request.pos, request.digit, &self.config.agent, &mut self.rng);

        let parents = request.parent.as_ref().map(|(id, _)| (*id, *id));
        let record = match &request.parent {
            Some((_, genetics)) => {
                let env = self.breeding_environment(request.pos);
                self.genetics.breed(genetics, genetics, &env, &mut self.rng)
            }
            None if request.origin == BirthOrigin::Purification => {
                self.genetics.create_star_seed(&mut self.rng)
            }
            None => self.genetics.create_default(&mut self.rng),
        };
        self.genetics.apply_to_agent(&mut agent, record);

        if let Some(energy) = request.energy {
            agent.energy = energy.clamp(0.0, 100.0);
        }
        if request.mature {
            agent.state = LifeState::Mature;
        }
        if let Some(kind) = roll_rare(agent.digit, &self.config.rare, &mut self.rng) {
            agent.markers.rare = Some(kind);
            tracing::debug!(agent = %agent.id, kind = ?kind, "Rare variant born");
            events.push(LiveEvent::RareEmerged {
                agent: agent.id,
                kind,
                tick: self.tick,
            });
        }

        let id = agent.id;
        events.push(LiveEvent::Birth {
            id,
            parents,
            digit: agent.digit,
            gen: agent.generation(),
            origin: request.origin,
            tick: self.tick,
            x: agent.pos.x,
            y: agent.pos.y,
        });
        self.agents.push(agent);
        Some(id)
    }

    /// Mutation conditions at `pos`: a live gravity well or an ancient nearby,
    /// and whether a cosmic event is running.
    pub(crate) fn breeding_environment(&self, pos: Vec2) -> BreedingEnvironment {
        let radius = self.config.genetics.near_well_radius;
        BreedingEnvironment {
            near_gravity_well: self.predators.near_well(pos, radius),
            near_ancient_well: self.agents.iter().any(|a| {
                a.is_alive()
                    && a.markers.rare == Some(RareKind::Ancient)
                    && a.pos.distance(pos) <= radius
            }),
            cosmic_event: self.cosmic.any_active(),
        }
    }

    /// Below the minimum population, rolls for one spontaneous replacement.
    /// The odds grow with the deficit.
    pub(crate) fn replenish(&mut self, events: &mut Vec<LiveEvent>) {
        let present = self.agents.present_count();
        let min = self.config.arena.min_population;
        if present >= min {
            return;
        }
        let deficit = (min - present) as f64;
        let p = self.config.arena.replacement_rate * (1.0 + 0.5 * deficit);
        if self.rng.gen::<f64>() >= p {
            return;
        }
        let pos = self.random_point();
        self.apply_spawn(SpawnRequest::at(pos, BirthOrigin::Spontaneous), events);
    }

    fn random_point(&mut self) -> Vec2 {
        let margin = 50.0_f64
            .min(self.config.arena.width / 4.0)
            .min(self.config.arena.height / 4.0);
        Vec2::new(
            self.rng
                .gen_range(margin..=self.config.arena.width - margin),
            self.rng
                .gen_range(margin..=self.config.arena.height - margin),
        )
    }
}
