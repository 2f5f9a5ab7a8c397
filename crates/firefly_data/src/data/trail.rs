use super::agent::Vec2;
use crate::{normalize_name, ParseNameError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailKind {
    Food,
    Danger,
    Mating,
    /// Generic path marker; the only kind that also steers its own depositor.
    Path,
    Swarm,
}

/// Per-kind trail parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailDef {
    pub color: (u8, u8, u8),
    pub max_strength: f64,
    /// Fraction of `max_strength` lost per second.
    pub decay_rate: f64,
    pub radius: f64,
    /// Signed: negative repels.
    pub force: f64,
    pub deposit: f64,
    pub ttl_ms: f64,
    pub mature_only: bool,
}

impl TrailKind {
    pub const ALL: [TrailKind; 5] = [
        TrailKind::Food,
        TrailKind::Danger,
        TrailKind::Mating,
        TrailKind::Path,
        TrailKind::Swarm,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            TrailKind::Food => "food",
            TrailKind::Danger => "danger",
            TrailKind::Mating => "mating",
            TrailKind::Path => "path",
            TrailKind::Swarm => "swarm",
        }
    }

    #[must_use]
    pub fn def(self) -> TrailDef {
        match self {
            TrailKind::Food => TrailDef {
                color: (100, 255, 100),
                max_strength: 100.0,
                decay_rate: 0.02,
                radius: 30.0,
                force: 0.003,
                deposit: 5.0,
                ttl_ms: 30_000.0,
                mature_only: false,
            },
            TrailKind::Danger => TrailDef {
                color: (255, 60, 60),
                max_strength: 150.0,
                decay_rate: 0.05,
                radius: 50.0,
                force: -0.008,
                deposit: 20.0,
                ttl_ms: 15_000.0,
                mature_only: false,
            },
            TrailKind::Mating => TrailDef {
                color: (255, 120, 220),
                max_strength: 80.0,
                decay_rate: 0.03,
                radius: 60.0,
                force: 0.004,
                deposit: 3.0,
                ttl_ms: 20_000.0,
                mature_only: true,
            },
            TrailKind::Path => TrailDef {
                color: (120, 160, 255),
                max_strength: 50.0,
                decay_rate: 0.01,
                radius: 20.0,
                force: 0.001,
                deposit: 2.0,
                ttl_ms: 60_000.0,
                mature_only: false,
            },
            TrailKind::Swarm => TrailDef {
                color: (255, 210, 80),
                max_strength: 120.0,
                decay_rate: 0.025,
                radius: 80.0,
                force: 0.005,
                deposit: 8.0,
                ttl_ms: 25_000.0,
                mature_only: false,
            },
        }
    }

    #[must_use]
    pub fn repels(self) -> bool {
        self.def().force < 0.0
    }
}

impl FromStr for TrailKind {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        if wanted == "trail" {
            return Ok(TrailKind::Path);
        }
        TrailKind::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ParseNameError::new("trail kind", s))
    }
}

/// A chemical marker in the pheromone field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trail {
    pub id: u64,
    pub pos: Vec2,
    pub kind: TrailKind,
    pub strength: f64,
    pub depositor: Option<Uuid>,
    pub created_ms: f64,
    pub refreshed_ms: f64,
    pub ttl_ms: f64,
}

impl Trail {
    #[must_use]
    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.strength <= 0.0 || now_ms - self.created_ms >= self.ttl_ms
    }

    #[must_use]
    pub fn strength_fraction(&self) -> f64 {
        (self.strength / self.kind.def().max_strength).clamp(0.0, 1.0)
    }
}

/// Behaviour categories a pheromone query triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorFlags {
    pub seeking_food: bool,
    pub fleeing_danger: bool,
    pub seeking_mate: bool,
    pub following_path: bool,
    pub joining_swarm: bool,
}

impl BehaviorFlags {
    pub fn raise(&mut self, kind: TrailKind) {
        match kind {
            TrailKind::Food => self.seeking_food = true,
            TrailKind::Danger => self.fleeing_danger = true,
            TrailKind::Mating => self.seeking_mate = true,
            TrailKind::Path => self.following_path = true,
            TrailKind::Swarm => self.joining_swarm = true,
        }
    }

    #[must_use]
    pub fn is_set(&self, kind: TrailKind) -> bool {
        match kind {
            TrailKind::Food => self.seeking_food,
            TrailKind::Danger => self.fleeing_danger,
            TrailKind::Mating => self.seeking_mate,
            TrailKind::Path => self.following_path,
            TrailKind::Swarm => self.joining_swarm,
        }
    }

    #[must_use]
    pub fn any(&self) -> bool {
        TrailKind::ALL.into_iter().any(|k| self.is_set(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_danger_repels() {
        for kind in TrailKind::ALL {
            assert_eq!(kind.repels(), kind == TrailKind::Danger);
        }
    }

    #[test]
    fn test_parse_accepts_trail_alias() {
        assert_eq!("trail".parse::<TrailKind>(), Ok(TrailKind::Path));
        assert_eq!("Danger".parse::<TrailKind>(), Ok(TrailKind::Danger));
        assert!("smoke".parse::<TrailKind>().is_err());
    }

    #[test]
    fn test_flags_raise() {
        let mut flags = BehaviorFlags::default();
        assert!(!flags.any());
        flags.raise(TrailKind::Mating);
        assert!(flags.seeking_mate);
        assert!(flags.is_set(TrailKind::Mating));
        assert!(flags.any());
    }
}
