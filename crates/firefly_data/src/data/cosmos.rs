use crate::{normalize_name, ParseNameError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stationary energy sources agents forage from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyWellKind {
    Standard,
    /// High output, small reserve, fast recovery.
    Volatile,
    /// Never runs dry.
    Ancient,
}

/// Output and reach of one energy well kind. Rates are per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyWellProfile {
    /// `None` for an inexhaustible well.
    pub capacity: Option<f64>,
    pub regen_rate: f64,
    pub output_rate: f64,
    pub attract_radius: f64,
    pub attract_strength: f64,
}

impl EnergyWellKind {
    pub const ALL: [EnergyWellKind; 3] = [
        EnergyWellKind::Standard,
        EnergyWellKind::Volatile,
        EnergyWellKind::Ancient,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            EnergyWellKind::Standard => "standard",
            EnergyWellKind::Volatile => "volatile",
            EnergyWellKind::Ancient => "ancient",
        }
    }

    #[must_use]
    pub fn profile(self) -> EnergyWellProfile {
        match self {
            EnergyWellKind::Standard => EnergyWellProfile {
                capacity: Some(100.0),
                regen_rate: 0.5,
                output_rate: 2.0,
                attract_radius: 120.0,
                attract_strength: 0.008,
            },
            EnergyWellKind::Volatile => EnergyWellProfile {
                capacity: Some(60.0),
                regen_rate: 1.5,
                output_rate: 5.0,
                attract_radius: 80.0,
                attract_strength: 0.015,
            },
            EnergyWellKind::Ancient => EnergyWellProfile {
                capacity: None,
                regen_rate: 0.0,
                output_rate: 1.0,
                attract_radius: 200.0,
                attract_strength: 0.005,
            },
        }
    }
}

impl fmt::Display for EnergyWellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EnergyWellKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        EnergyWellKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ParseNameError::new("energy well", s))
    }
}

/// Arena-wide events rolled by the cosmic scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmicKind {
    /// A bright wave sweeps down the arena and charges what it passes.
    SolarFlare,
    /// Drifting vortices swirl agents around.
    VoidStorm,
}

/// Scheduling parameters of one cosmic event kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosmicProfile {
    /// Relative weight when several kinds are eligible.
    pub weight: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    /// Minimum time between two starts of this kind.
    pub cooldown_ms: f64,
    /// Kinds this one may run alongside.
    pub overlaps: &'static [CosmicKind],
}

impl CosmicKind {
    pub const ALL: [CosmicKind; 2] = [CosmicKind::SolarFlare, CosmicKind::VoidStorm];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CosmicKind::SolarFlare => "solarflare",
            CosmicKind::VoidStorm => "voidstorm",
        }
    }

    #[must_use]
    pub fn profile(self) -> CosmicProfile {
        match self {
            CosmicKind::SolarFlare => CosmicProfile {
                weight: 0.3,
                min_duration_ms: 5000.0,
                max_duration_ms: 15_000.0,
                cooldown_ms: 60_000.0,
                overlaps: &[],
            },
            CosmicKind::VoidStorm => CosmicProfile {
                weight: 0.15,
                min_duration_ms: 8000.0,
                max_duration_ms: 20_000.0,
                cooldown_ms: 120_000.0,
                overlaps: &[],
            },
        }
    }

    /// Two kinds may share the sky when either one allows the other.
    #[must_use]
    pub fn can_overlap(self, other: CosmicKind) -> bool {
        self.profile().overlaps.contains(&other) || other.profile().overlaps.contains(&self)
    }
}

impl fmt::Display for CosmicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CosmicKind::SolarFlare => f.write_str("solar_flare"),
            CosmicKind::VoidStorm => f.write_str("void_storm"),
        }
    }
}

impl FromStr for CosmicKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        CosmicKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ParseNameError::new("cosmic event", s))
    }
}
