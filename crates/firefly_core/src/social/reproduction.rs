use crate::config::ReproductionConfig;
use crate::context::{SpawnRequest, TickContext};
use crate::lifecycle::has_room;
use firefly_data::{Agent, BirthOrigin, Vec2};
use rand::Rng;

/// Mature, rested, energetic, evolved, and not committed to a group.
#[must_use]
pub fn is_reproduction_ready(agent: &Agent, config: &ReproductionConfig) -> bool {
    config.enabled
        && agent.is_mature()
        && agent.energy >= config.min_energy
        && agent.age_ms >= config.min_mature_age_ms
        && agent.tier.index() >= config.min_tier
        && agent.reproduction_cooldown_ms <= 0.0
        && agent.markers.constellation_id.is_none()
        && agent.markers.swarm_id.is_none()
}

/// Mitosis: charges the parent and describes the offspring.
///
/// The offspring keeps the parent's digit and starts with a fraction of the
/// parent's remaining energy. Its genetics are bred from the parent's record
/// when the request is applied.
pub fn reproduce<R: Rng>(parent: &mut Agent, config: &ReproductionConfig, rng: &mut R) -> SpawnRequest {
    parent.energy = (parent.energy - config.energy_cost).max(0.0);
    parent.reproduction_cooldown_ms = config.cooldown_ms;

    let angle = rng.gen_range(0.0..std::f64::consts::TAU);
    let pos = parent.pos + Vec2::from_angle(angle) * config.spawn_offset;
    SpawnRequest {
        digit: Some(parent.digit),
        energy: Some(parent.energy * config.offspring_energy_fraction),
        parent: Some((parent.id, Box::new(parent.genetics.clone()))),
        ..SpawnRequest::at(pos, BirthOrigin::Reproduction)
    }
}

/// Rolls mitosis for every ready agent while the population has room.
pub fn run<R: Rng>(ctx: &mut TickContext<'_, R>) {
    let config = &ctx.config.reproduction;
    if !config.enabled {
        return;
    }
    let mut population = ctx.agents.present_count() + ctx.out.spawns.len();
    for agent in ctx.agents.iter_mut() {
        if !has_room(ctx.config, population) {
            break;
        }
        if !is_reproduction_ready(agent, config) {
            continue;
        }
        let p = config.chance * agent.phenotype.fertility;
        if ctx.rng.gen::<f64>() >= p {
            continue;
        }
        let request = reproduce(agent, config, ctx.rng);
        tracing::debug!(parent = %agent.id, energy = agent.energy, "Mitosis");
        ctx.out.request_spawn(request);
        population += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::context::testing::Fixture;
    use firefly_data::{Digit, Tier};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ready_parent(fx: &mut Fixture) -> usize {
        let idx = fx.mature_at(1, Vec2::new(300.0, 300.0), Digit::Zero);
        let a = &mut fx.agents.as_mut_slice()[idx];
        a.tier = Tier::Charged;
        a.energy = 100.0;
        a.age_ms = 25_000.0;
        idx
    }

    #[test]
    fn test_readiness_gates() {
        let mut fx = Fixture::new(AppConfig::default());
        let idx = ready_parent(&mut fx);
        let cfg = ReproductionConfig::default();
        let a = &mut fx.agents.as_mut_slice()[idx];
        assert!(is_reproduction_ready(a, &cfg));
        a.markers.constellation_id = Some(1);
        assert!(!is_reproduction_ready(a, &cfg));
        a.markers.constellation_id = None;
        a.tier = Tier::Basic;
        assert!(!is_reproduction_ready(a, &cfg));
        a.tier = Tier::Charged;
        a.state = firefly_data::LifeState::Spawning;
        assert!(!is_reproduction_ready(a, &cfg));
    }

    #[test]
    fn test_mitosis_charges_parent_and_spawns_once() {
        let mut config = AppConfig::default();
        config.reproduction.chance = 1.0;
        let mut fx = Fixture::new(config);
        let idx = ready_parent(&mut fx);
        run(&mut fx.ctx());

        let parent = &fx.agents.as_slice()[idx];
        assert_eq!(parent.energy, 40.0);
        assert_eq!(parent.reproduction_cooldown_ms, 30_000.0);
        assert_eq!(fx.out.spawns.len(), 1);
        let child = &fx.out.spawns[0];
        assert_eq!(child.digit, Some(Digit::Zero));
        assert_eq!(child.origin, BirthOrigin::Reproduction);
        assert!((child.energy.unwrap_or_default() - 16.0).abs() < 1e-9);
        assert!((child.pos.distance(parent.pos) - 30.0).abs() < 1e-9);
        assert_eq!(child.parent.as_ref().map(|(id, _)| *id), Some(parent.id));

        run(&mut fx.ctx());
        assert_eq!(fx.out.spawns.len(), 1);
    }

    #[test]
    fn test_population_cap_blocks_mitosis() {
        let mut config = AppConfig::default();
        config.reproduction.chance = 1.0;
        config.arena.max_population = 1;
        let mut fx = Fixture::new(config);
        ready_parent(&mut fx);
        run(&mut fx.ctx());
        assert!(fx.out.spawns.is_empty());
    }

    #[test]
    fn test_reproduce_never_goes_negative() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut a = Agent::new(uuid::Uuid::nil(), Vec2::ZERO, Digit::One);
        a.energy = 10.0;
        let req = reproduce(&mut a, &ReproductionConfig::default(), &mut rng);
        assert_eq!(a.energy, 0.0);
        assert_eq!(req.energy, Some(0.0));
    }
}
