use crate::{normalize_name, ParseNameError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use uuid::Uuid;

pub const TRAIT_COUNT: usize = 12;

/// Heritable continuous traits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitKind {
    Speed,
    Agility,
    Size,
    GlowIntensity,
    GlowFrequency,
    EnergyEfficiency,
    Lifespan,
    Resilience,
    Sociability,
    Curiosity,
    Fertility,
    MaturitySpeed,
}

/// Bounds and inheritance parameters of one trait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitDef {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub mutation_rate: f64,
    pub mutation_range: f64,
    pub dominance: f64,
}

impl TraitDef {
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

const fn def(
    min: f64,
    max: f64,
    default: f64,
    mutation_rate: f64,
    mutation_range: f64,
    dominance: f64,
) -> TraitDef {
    TraitDef {
        min,
        max,
        default,
        mutation_rate,
        mutation_range,
        dominance,
    }
}

impl TraitKind {
    pub const ALL: [TraitKind; TRAIT_COUNT] = [
        TraitKind::Speed,
        TraitKind::Agility,
        TraitKind::Size,
        TraitKind::GlowIntensity,
        TraitKind::GlowFrequency,
        TraitKind::EnergyEfficiency,
        TraitKind::Lifespan,
        TraitKind::Resilience,
        TraitKind::Sociability,
        TraitKind::Curiosity,
        TraitKind::Fertility,
        TraitKind::MaturitySpeed,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TraitKind::Speed => "speed",
            TraitKind::Agility => "agility",
            TraitKind::Size => "size",
            TraitKind::GlowIntensity => "glow_intensity",
            TraitKind::GlowFrequency => "glow_frequency",
            TraitKind::EnergyEfficiency => "energy_efficiency",
            TraitKind::Lifespan => "lifespan",
            TraitKind::Resilience => "resilience",
            TraitKind::Sociability => "sociability",
            TraitKind::Curiosity => "curiosity",
            TraitKind::Fertility => "fertility",
            TraitKind::MaturitySpeed => "maturity_speed",
        }
    }

    #[must_use]
    pub fn def(self) -> TraitDef {
        match self {
            TraitKind::Speed => def(0.6, 1.5, 1.0, 0.15, 0.1, 0.5),
            TraitKind::Agility => def(0.7, 1.4, 1.0, 0.12, 0.08, 0.5),
            TraitKind::Size => def(0.7, 1.4, 1.0, 0.1, 0.1, 0.6),
            TraitKind::GlowIntensity => def(0.5, 1.8, 1.0, 0.2, 0.15, 0.7),
            TraitKind::GlowFrequency => def(0.6, 1.6, 1.0, 0.18, 0.12, 0.5),
            TraitKind::EnergyEfficiency => def(0.7, 1.4, 1.0, 0.1, 0.08, 0.65),
            TraitKind::Lifespan => def(0.8, 1.3, 1.0, 0.08, 0.06, 0.55),
            TraitKind::Resilience => def(0.7, 1.5, 1.0, 0.12, 0.1, 0.6),
            TraitKind::Sociability => def(0.4, 1.6, 1.0, 0.2, 0.15, 0.5),
            TraitKind::Curiosity => def(0.5, 1.5, 1.0, 0.18, 0.12, 0.55),
            TraitKind::Fertility => def(0.6, 1.5, 1.0, 0.1, 0.1, 0.6),
            TraitKind::MaturitySpeed => def(0.8, 1.3, 1.0, 0.08, 0.05, 0.5),
        }
    }
}

impl FromStr for TraitKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        TraitKind::ALL
            .into_iter()
            .find(|t| normalize_name(t.name()) == wanted)
            .ok_or_else(|| ParseNameError::new("trait", s))
    }
}

/// One value per [`TraitKind`], indexable by kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitValues {
    values: [f64; TRAIT_COUNT],
}

impl TraitValues {
    /// Every trait at its declared default.
    #[must_use]
    pub fn defaults() -> Self {
        let mut values = [0.0; TRAIT_COUNT];
        for kind in TraitKind::ALL {
            values[kind.index()] = kind.def().default;
        }
        Self { values }
    }

    /// Every trait set to `value`, clamped to its bounds.
    #[must_use]
    pub fn uniform(value: f64) -> Self {
        let mut values = [0.0; TRAIT_COUNT];
        for kind in TraitKind::ALL {
            values[kind.index()] = kind.def().clamp(value);
        }
        Self { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraitKind, f64)> + '_ {
        TraitKind::ALL.into_iter().map(|k| (k, self.values[k.index()]))
    }

    #[must_use]
    pub fn get(&self, kind: TraitKind) -> f64 {
        self.values[kind.index()]
    }

    /// Sets a trait, clamping it to the declared range.
    pub fn set(&mut self, kind: TraitKind, value: f64) {
        self.values[kind.index()] = kind.def().clamp(value);
    }

    #[must_use]
    pub fn within_bounds(&self) -> bool {
        self.iter().all(|(k, v)| {
            let d = k.def();
            v >= d.min && v <= d.max
        })
    }
}

impl Default for TraitValues {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Index<TraitKind> for TraitValues {
    type Output = f64;

    fn index(&self, kind: TraitKind) -> &f64 {
        &self.values[kind.index()]
    }
}

impl IndexMut<TraitKind> for TraitValues {
    fn index_mut(&mut self, kind: TraitKind) -> &mut f64 {
        &mut self.values[kind.index()]
    }
}

/// Boolean genetic flags with independent inheritance odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Longer lived.
    AncientBloodline,
    /// Partially immune to gravity wells.
    VoidTouched,
    /// Brighter glow.
    Starborn,
    /// Wanders further.
    CosmicWanderer,
}

impl Marker {
    pub const ALL: [Marker; 4] = [
        Marker::AncientBloodline,
        Marker::VoidTouched,
        Marker::Starborn,
        Marker::CosmicWanderer,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Marker::AncientBloodline => "ancient_bloodline",
            Marker::VoidTouched => "void_touched",
            Marker::Starborn => "starborn",
            Marker::CosmicWanderer => "cosmic_wanderer",
        }
    }

    /// Probability that a parent carrying the marker passes it on.
    #[must_use]
    pub fn inherit_chance(self) -> f64 {
        match self {
            Marker::AncientBloodline => 0.3,
            Marker::VoidTouched => 0.15,
            Marker::Starborn => 0.25,
            Marker::CosmicWanderer => 0.2,
        }
    }

    /// Global stat multiplier reported for the marker.
    #[must_use]
    pub fn effect_multiplier(self) -> f64 {
        match self {
            Marker::AncientBloodline => 1.1,
            Marker::VoidTouched => 0.95,
            Marker::Starborn => 1.05,
            Marker::CosmicWanderer => 1.0,
        }
    }
}

impl FromStr for Marker {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        Marker::ALL
            .into_iter()
            .find(|m| normalize_name(m.name()) == wanted)
            .ok_or_else(|| ParseNameError::new("marker", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Applied during breeding.
    Inherited,
    Beneficial,
    Harmful,
    Extreme,
    Random,
}

/// A single applied mutation, kept on the record for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub trait_kind: TraitKind,
    pub kind: MutationKind,
    pub before: f64,
    pub after: f64,
}

/// Full heritable state of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticsRecord {
    pub traits: TraitValues,
    pub markers: BTreeSet<Marker>,
    pub generation: u32,
    /// Both parent ids, or `None` for organically spawned agents.
    pub parents: Option<(Uuid, Uuid)>,
    pub lineage_id: Uuid,
    pub mutations: Vec<MutationRecord>,
}

impl Default for GeneticsRecord {
    fn default() -> Self {
        Self {
            traits: TraitValues::defaults(),
            markers: BTreeSet::new(),
            generation: 0,
            parents: None,
            lineage_id: Uuid::nil(),
            mutations: Vec::new(),
        }
    }
}

impl GeneticsRecord {
    #[must_use]
    pub fn trait_value(&self, kind: TraitKind) -> f64 {
        self.traits.get(kind)
    }

    #[must_use]
    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}

/// Environmental conditions at breeding time that scale mutation odds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BreedingEnvironment {
    pub near_gravity_well: bool,
    pub near_ancient_well: bool,
    pub cosmic_event: bool,
}

/// Five-band summary of how far a record sits above or below the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneticQuality {
    Deficient,
    Weak,
    Average,
    Superior,
    Exceptional,
}

impl GeneticQuality {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > 0.3 {
            GeneticQuality::Exceptional
        } else if score > 0.1 {
            GeneticQuality::Superior
        } else if score > -0.1 {
            GeneticQuality::Average
        } else if score > -0.3 {
            GeneticQuality::Weak
        } else {
            GeneticQuality::Deficient
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            GeneticQuality::Deficient => "deficient",
            GeneticQuality::Weak => "weak",
            GeneticQuality::Average => "average",
            GeneticQuality::Superior => "superior",
            GeneticQuality::Exceptional => "exceptional",
        }
    }
}
