use crate::{normalize_name, ParseNameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mobile hunter sub-types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterKind {
    Hunter,
    /// Waits in place and strikes only inside its ambush range.
    Lurker,
    Drifter,
    /// Periodically bursts toward close prey at double chase speed.
    Nova,
}

/// Movement and hunting parameters of one hunter sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HunterProfile {
    pub speed: f64,
    pub detect_radius: f64,
    pub chase_radius: f64,
    pub catch_radius: f64,
    pub chase_speed: f64,
    pub max_prey: u32,
    pub hunt_cooldown_ms: f64,
    pub satiation_max: f64,
    /// Satiation lost per second.
    pub satiation_decay: f64,
    pub ambush_radius: Option<f64>,
    pub burst: Option<BurstProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BurstProfile {
    pub radius: f64,
    pub duration_ms: f64,
    pub cooldown_ms: f64,
}

impl HunterKind {
    pub const ALL: [HunterKind; 4] = [
        HunterKind::Hunter,
        HunterKind::Lurker,
        HunterKind::Drifter,
        HunterKind::Nova,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            HunterKind::Hunter => "hunter",
            HunterKind::Lurker => "lurker",
            HunterKind::Drifter => "drifter",
            HunterKind::Nova => "nova",
        }
    }

    #[must_use]
    pub fn profile(self) -> HunterProfile {
        match self {
            HunterKind::Hunter => HunterProfile {
                speed: 0.08,
                detect_radius: 200.0,
                chase_radius: 300.0,
                catch_radius: 25.0,
                chase_speed: 0.15,
                max_prey: 3,
                hunt_cooldown_ms: 3000.0,
                satiation_max: 100.0,
                satiation_decay: 0.5,
                ambush_radius: None,
                burst: None,
            },
            HunterKind::Lurker => HunterProfile {
                speed: 0.02,
                detect_radius: 120.0,
                chase_radius: 150.0,
                catch_radius: 30.0,
                chase_speed: 0.25,
                max_prey: 1,
                hunt_cooldown_ms: 5000.0,
                satiation_max: 80.0,
                satiation_decay: 0.3,
                ambush_radius: Some(80.0),
                burst: None,
            },
            HunterKind::Drifter => HunterProfile {
                speed: 0.03,
                detect_radius: 300.0,
                chase_radius: 350.0,
                catch_radius: 40.0,
                chase_speed: 0.06,
                max_prey: 5,
                hunt_cooldown_ms: 2000.0,
                satiation_max: 150.0,
                satiation_decay: 0.8,
                ambush_radius: None,
                burst: None,
            },
            HunterKind::Nova => HunterProfile {
                speed: 0.01,
                detect_radius: 250.0,
                chase_radius: 100.0,
                catch_radius: 80.0,
                chase_speed: 0.4,
                max_prey: 8,
                hunt_cooldown_ms: 8000.0,
                satiation_max: 60.0,
                satiation_decay: 1.0,
                ambush_radius: None,
                burst: Some(BurstProfile {
                    radius: 100.0,
                    duration_ms: 500.0,
                    cooldown_ms: 10_000.0,
                }),
            },
        }
    }
}

impl FromStr for HunterKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        HunterKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ParseNameError::new("hunter", s))
    }
}

/// Archetype tag used in events, statistics and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "archetype", content = "kind", rename_all = "snake_case")]
pub enum PredatorKind {
    GravityWell,
    Hunter(HunterKind),
    Shadow,
    Serpent,
}

impl fmt::Display for PredatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredatorKind::GravityWell => write!(f, "gravity_well"),
            PredatorKind::Hunter(kind) => write!(f, "{}", kind.name()),
            PredatorKind::Shadow => write!(f, "shadow"),
            PredatorKind::Serpent => write!(f, "serpent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellState {
    Active,
    Hurt,
    Dormant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HunterState {
    Spawning,
    Patrol,
    Detect,
    Chase,
    Strike,
    Feed,
    Retreat,
    Dormant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowState {
    Spawning,
    Active,
    Fleeing,
    Purifying,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerpentState {
    Entering,
    Hunting,
    Feeding,
    Fleeing,
    Leaving,
    Gone,
}

/// Any predator state, for events and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredatorState {
    Well(WellState),
    Hunter(HunterState),
    Shadow(ShadowState),
    Serpent(SerpentState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_lurker_ambushes_and_only_nova_bursts() {
        for kind in HunterKind::ALL {
            let p = kind.profile();
            assert_eq!(p.ambush_radius.is_some(), kind == HunterKind::Lurker);
            assert_eq!(p.burst.is_some(), kind == HunterKind::Nova);
            assert!(p.catch_radius < p.detect_radius);
        }
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(PredatorKind::Hunter(HunterKind::Nova).to_string(), "nova");
        assert_eq!(PredatorKind::GravityWell.to_string(), "gravity_well");
        assert_eq!("Drifter".parse::<HunterKind>(), Ok(HunterKind::Drifter));
    }
}
