//! Genetics engine: default and star-seed records, breeding with dominance and
//! mutation, phenotype expression and targeted mutation events.

use crate::config::GeneticsConfig;
use crate::lineage::LineageStore;
use firefly_data::{
    Agent, BreedingEnvironment, GeneticQuality, GeneticsRecord, Marker, MutationKind,
    MutationRecord, Phenotype, TraitDef, TraitKind, TraitValues,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneticsStats {
    pub breedings: u64,
    pub mutations: u64,
    pub markers_passed: u64,
}

#[derive(Debug, Clone)]
pub struct GeneticsEngine {
    config: GeneticsConfig,
    stats: GeneticsStats,
    lineage: LineageStore,
}

impl GeneticsEngine {
    pub fn new(config: &GeneticsConfig) -> Self {
        Self {
            config: config.clone(),
            stats: GeneticsStats::default(),
            lineage: LineageStore::new(config.lineage_capacity, config.eviction_fraction),
        }
    }

    #[must_use]
    pub fn stats(&self) -> GeneticsStats {
        self.stats
    }

    #[must_use]
    pub fn lineage(&self) -> &LineageStore {
        &self.lineage
    }

    #[must_use]
    pub fn config(&self) -> &GeneticsConfig {
        &self.config
    }

    /// Defaults jittered by `±default_jitter`, no markers, generation 0.
    pub fn create_default<R: Rng>(&mut self, rng: &mut R) -> GeneticsRecord {
        let jitter = self.config.default_jitter;
        let mut traits = TraitValues::defaults();
        for kind in TraitKind::ALL {
            let v = kind.def().default + symmetric(rng, jitter);
            traits.set(kind, v);
        }
        let record = GeneticsRecord {
            traits,
            lineage_id: Uuid::from_u128(rng.gen::<u128>()),
            ..GeneticsRecord::default()
        };
        self.track(&record);
        record
    }

    /// A `starborn` record pushed away from the defaults in a random direction per trait.
    pub fn create_star_seed<R: Rng>(&mut self, rng: &mut R) -> GeneticsRecord {
        let spread = self.config.star_seed_jitter;
        let mut traits = TraitValues::defaults();
        for kind in TraitKind::ALL {
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            let magnitude = spread / 3.0 + rng.gen::<f64>() * spread * 2.0 / 3.0;
            traits.set(kind, kind.def().default + sign * magnitude);
        }
        let mut markers = BTreeSet::new();
        markers.insert(Marker::Starborn);
        let record = GeneticsRecord {
            traits,
            markers,
            lineage_id: Uuid::from_u128(rng.gen::<u128>()),
            ..GeneticsRecord::default()
        };
        self.track(&record);
        record
    }

    /// Probability that `def` mutates during breeding, capped at `mutation_cap`.
    #[must_use]
    pub fn mutation_probability(&self, def: &TraitDef, env: &BreedingEnvironment) -> f64 {
        let mut rate = def.mutation_rate * self.config.global_mutation_rate;
        if self.config.environmental_mutation {
            if env.near_gravity_well {
                rate *= self.config.near_well_multiplier;
            }
            if env.near_ancient_well {
                rate *= self.config.ancient_well_multiplier;
            }
            if env.cosmic_event {
                rate *= self.config.cosmic_event_multiplier;
            }
        }
        rate.clamp(0.0, self.config.mutation_cap)
    }

    /// Combines two parent records into an offspring record.
    ///
    /// Each trait rolls against its dominance weight: dominant inheritance blends
    /// toward the larger parent value, otherwise the parents are averaged with a
    /// little noise. Parents that agree on a trait pass it on unchanged. Every
    /// value is clamped after crossover and again after mutation.
    pub fn breed<R: Rng>(
        &mut self,
        a: &GeneticsRecord,
        b: &GeneticsRecord,
        env: &BreedingEnvironment,
        rng: &mut R,
    ) -> GeneticsRecord {
        if !self.config.enabled {
            return self.create_default(rng);
        }
        self.stats.breedings += 1;

        let generation = a.generation.max(b.generation) + 1;
        let mut traits = TraitValues::defaults();
        let mut mutations = Vec::new();

        for kind in TraitKind::ALL {
            let def = kind.def();
            let (va, vb) = (a.traits[kind], b.traits[kind]);
            let (hi, lo) = if va >= vb { (va, vb) } else { (vb, va) };

            let inherited = if rng.gen::<f64>() < def.dominance {
                if hi == lo {
                    hi
                } else {
                    let w = self.config.dominant_weight;
                    hi * w + lo * (1.0 - w)
                }
            } else if hi == lo {
                hi
            } else {
                (va + vb) / 2.0 + symmetric(rng, self.config.blend_noise)
            };
            let mut value = def.clamp(inherited);

            let p = self.mutation_probability(&def, env);
            if p > 0.0 && rng.gen::<f64>() < p {
                let before = value;
                value = def.clamp(value + symmetric(rng, def.mutation_range));
                mutations.push(MutationRecord {
                    trait_kind: kind,
                    kind: MutationKind::Inherited,
                    before,
                    after: value,
                });
                self.stats.mutations += 1;
            }
            traits.set(kind, value);
        }

        let mut markers = BTreeSet::new();
        for marker in a.markers.union(&b.markers) {
            if rng.gen::<f64>() < marker.inherit_chance() && markers.insert(*marker) {
                self.stats.markers_passed += 1;
            }
        }

        let record = GeneticsRecord {
            traits,
            markers,
            generation,
            parents: Some((a.lineage_id, b.lineage_id)),
            lineage_id: Uuid::from_u128(rng.gen::<u128>()),
            mutations,
        };
        self.track(&record);
        record
    }

    fn track(&mut self, record: &GeneticsRecord) {
        if self.config.track_lineage {
            self.lineage.record(record);
        }
    }

    /// Attaches `record` to `agent` and recomputes its phenotype and lifespan.
    pub fn apply_to_agent(&self, agent: &mut Agent, record: GeneticsRecord) {
        agent.phenotype = express(&record);
        agent.genetics = record;
        agent.refresh_max_age();
    }

    /// Mutates one random trait of `agent` and re-expresses its phenotype.
    pub fn mutate<R: Rng>(
        &mut self,
        agent: &mut Agent,
        kind: MutationKind,
        rng: &mut R,
    ) -> MutationRecord {
        let trait_kind = TraitKind::ALL[rng.gen_range(0..TraitKind::ALL.len())];
        let def = trait_kind.def();
        let range = def.mutation_range;
        let delta = match kind {
            MutationKind::Beneficial => rng.gen::<f64>() * range * 2.0,
            MutationKind::Harmful => -rng.gen::<f64>() * range * 2.0,
            MutationKind::Extreme => symmetric(rng, range * 2.0),
            MutationKind::Random | MutationKind::Inherited => symmetric(rng, range),
        };
        let before = agent.genetics.traits[trait_kind];
        agent.genetics.traits.set(trait_kind, before + delta);
        let mutation = MutationRecord {
            trait_kind,
            kind,
            before,
            after: agent.genetics.traits[trait_kind],
        };
        agent.genetics.mutations.push(mutation);
        agent.phenotype = express(&agent.genetics);
        agent.refresh_max_age();
        self.stats.mutations += 1;
        mutation
    }
}

/// Uniform in `[-half_width, half_width)`.
fn symmetric<R: Rng>(rng: &mut R, half_width: f64) -> f64 {
    if half_width <= 0.0 {
        return 0.0;
    }
    (rng.gen::<f64>() - 0.5) * 2.0 * half_width
}

/// Phenotype for a record: trait values plus marker effects.
#[must_use]
pub fn express(record: &GeneticsRecord) -> Phenotype {
    let t = &record.traits;
    let global: f64 = record
        .markers
        .iter()
        .map(|m| m.effect_multiplier())
        .product();

    let mut p = Phenotype {
        speed: t[TraitKind::Speed] * global,
        agility: t[TraitKind::Agility],
        size: t[TraitKind::Size],
        glow_intensity: t[TraitKind::GlowIntensity] * global,
        glow_frequency: t[TraitKind::GlowFrequency],
        energy_efficiency: t[TraitKind::EnergyEfficiency],
        lifespan: t[TraitKind::Lifespan],
        resilience: t[TraitKind::Resilience],
        sociability: t[TraitKind::Sociability],
        curiosity: t[TraitKind::Curiosity],
        fertility: t[TraitKind::Fertility],
        maturity_speed: t[TraitKind::MaturitySpeed],
        gravity_resistance: 0.0,
        wander: 1.0,
    };
    for marker in &record.markers {
        match marker {
            Marker::AncientBloodline => p.lifespan *= 1.15,
            Marker::VoidTouched => p.gravity_resistance = 0.5,
            Marker::Starborn => p.glow_intensity *= 1.2,
            Marker::CosmicWanderer => p.wander *= 1.3,
        }
    }
    p
}

/// Mean normalised deviation from the defaults: positive above, negative below.
#[must_use]
pub fn quality_score(record: &GeneticsRecord) -> f64 {
    let total: f64 = record
        .traits
        .iter()
        .map(|(kind, v)| {
            let def = kind.def();
            let span = if v >= def.default {
                def.max - def.default
            } else {
                def.default - def.min
            };
            if span > 0.0 {
                (v - def.default) / span
            } else {
                0.0
            }
        })
        .sum();
    total / TraitKind::ALL.len() as f64
}

#[must_use]
pub fn quality(record: &GeneticsRecord) -> GeneticQuality {
    GeneticQuality::from_score(quality_score(record))
}

/// `1 - mean |a - b|` over all traits, floored at zero.
#[must_use]
pub fn similarity(a: &GeneticsRecord, b: &GeneticsRecord) -> f64 {
    let total: f64 = TraitKind::ALL
        .iter()
        .map(|&k| (a.traits[k] - b.traits[k]).abs())
        .sum();
    (1.0 - total / TraitKind::ALL.len() as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_data::{Digit, Vec2};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> GeneticsEngine {
        GeneticsEngine::new(&GeneticsConfig::default())
    }

    #[test]
    fn test_identical_parents_without_mutation_copy_exactly() {
        let mut engine = GeneticsEngine::new(&GeneticsConfig {
            global_mutation_rate: 0.0,
            ..Default::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let parent = engine.create_default(&mut rng);
        for _ in 0..20 {
            let child = engine.breed(&parent, &parent, &BreedingEnvironment::default(), &mut rng);
            assert_eq!(child.traits, parent.traits);
            assert_eq!(child.generation, 1);
            assert!(child.mutations.is_empty());
        }
    }

    #[test]
    fn test_mutation_probability_is_capped() {
        let engine = GeneticsEngine::new(&GeneticsConfig {
            global_mutation_rate: 1.0,
            near_well_multiplier: 50.0,
            ..Default::default()
        });
        let env = BreedingEnvironment {
            near_gravity_well: true,
            near_ancient_well: true,
            cosmic_event: true,
        };
        for kind in TraitKind::ALL {
            assert!(engine.mutation_probability(&kind.def(), &env) <= 0.5);
        }
    }

    #[test]
    fn test_environment_raises_mutation_probability() {
        let engine = engine();
        let def = TraitKind::GlowIntensity.def();
        let calm = engine.mutation_probability(&def, &BreedingEnvironment::default());
        let hazardous = engine.mutation_probability(
            &def,
            &BreedingEnvironment {
                near_gravity_well: true,
                ..Default::default()
            },
        );
        assert!((calm - 0.03).abs() < 1e-12);
        assert!((hazardous - 0.06).abs() < 1e-12);
    }

    #[test]
    fn test_generation_and_parents_recorded() {
        let mut engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a = engine.create_default(&mut rng);
        let mut b = engine.create_default(&mut rng);
        b.generation = 4;
        let child = engine.breed(&a, &b, &BreedingEnvironment::default(), &mut rng);
        assert_eq!(child.generation, 5);
        assert_eq!(child.parents, Some((a.lineage_id, b.lineage_id)));
        assert!(engine.lineage().get(&child.lineage_id).is_some());
        assert_eq!(engine.stats().breedings, 1);
    }

    #[test]
    fn test_star_seed_has_marker_and_wider_spread() {
        let mut engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let star = engine.create_star_seed(&mut rng);
        assert!(star.has_marker(Marker::Starborn));
        assert!(star.traits.within_bounds());
        assert!(star
            .traits
            .iter()
            .all(|(k, v)| (v - k.def().default).abs() >= 0.1 - 1e-9));
    }

    #[test]
    fn test_apply_sets_phenotype_and_lifespan() {
        let engine = engine();
        let mut agent = Agent::new(Uuid::nil(), Vec2::ZERO, Digit::One);
        agent.base_max_age_ms = 100_000.0;
        let mut record = GeneticsRecord::default();
        record.traits.set(TraitKind::Lifespan, 1.2);
        record.markers.insert(Marker::AncientBloodline);
        record.markers.insert(Marker::VoidTouched);
        engine.apply_to_agent(&mut agent, record);
        assert!((agent.phenotype.lifespan - 1.2 * 1.15).abs() < 1e-12);
        assert_eq!(agent.phenotype.gravity_resistance, 0.5);
        assert!((agent.max_age_ms - 100_000.0 * 1.38).abs() < 1e-6);
    }

    #[test]
    fn test_mutate_directions() {
        let mut engine = engine();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = Agent::new(Uuid::nil(), Vec2::ZERO, Digit::Zero);
        for _ in 0..50 {
            let m = engine.mutate(&mut agent, MutationKind::Beneficial, &mut rng);
            assert!(m.after >= m.before);
            let m = engine.mutate(&mut agent, MutationKind::Harmful, &mut rng);
            assert!(m.after <= m.before);
        }
        assert!(agent.genetics.traits.within_bounds());
        assert_eq!(agent.genetics.mutations.len(), 100);
    }

    #[test]
    fn test_quality_and_similarity() {
        let base = GeneticsRecord::default();
        assert_eq!(quality(&base), GeneticQuality::Average);
        let mut best = GeneticsRecord::default();
        let mut worst = GeneticsRecord::default();
        for kind in TraitKind::ALL {
            best.traits.set(kind, kind.def().max);
            worst.traits.set(kind, kind.def().min);
        }
        assert_eq!(quality(&best), GeneticQuality::Exceptional);
        assert_eq!(quality(&worst), GeneticQuality::Deficient);
        assert_eq!(similarity(&base, &base), 1.0);
        assert!(similarity(&best, &worst) < similarity(&base, &best));
    }
}
