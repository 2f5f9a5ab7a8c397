use crate::{normalize_name, ParseNameError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Behaviour profile an agent may temporarily adopt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum House {
    /// Network building: cohesion toward a few neighbours.
    Web,
    /// Protective: escorts and feeds the weakest neighbour.
    Shield,
    /// Trail leaving: drops long-lived path marks.
    Forge,
    /// Pattern walking along a parametric curve.
    Script,
    /// Levitating and fading.
    Cloud,
    /// Stealth and avoidance.
    DarkArts,
}

impl House {
    pub const ALL: [House; 6] = [
        House::Web,
        House::Shield,
        House::Forge,
        House::Script,
        House::Cloud,
        House::DarkArts,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            House::Web => "web",
            House::Shield => "shield",
            House::Forge => "forge",
            House::Script => "script",
            House::Cloud => "cloud",
            House::DarkArts => "dark_arts",
        }
    }

    #[must_use]
    pub fn speed_multiplier(self) -> f64 {
        match self {
            House::Web => 0.8,
            House::Shield => 1.1,
            House::Forge => 0.9,
            House::Script => 1.2,
            House::Cloud => 0.7,
            House::DarkArts => 1.3,
        }
    }

    /// Gravity resistance granted while the profile is active.
    #[must_use]
    pub fn gravity_resistance(self) -> f64 {
        match self {
            House::Cloud => 0.5,
            _ => 0.0,
        }
    }
}

impl FromStr for House {
    type Err = ParseNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_name(s);
        House::ALL
            .into_iter()
            .find(|h| normalize_name(h.name()) == wanted)
            .ok_or_else(|| ParseNameError::new("house", s))
    }
}

/// Parametric curves followed by `House::Script` agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptPattern {
    Zigzag,
    Spiral,
    Square,
    Sine,
}

impl ScriptPattern {
    pub const ALL: [ScriptPattern; 4] = [
        ScriptPattern::Zigzag,
        ScriptPattern::Spiral,
        ScriptPattern::Square,
        ScriptPattern::Sine,
    ];
}

/// Fixed relative-position patterns for constellations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationPattern {
    Triangle,
    Square,
    Line,
    Diamond,
    Star,
    Ring,
    Arrow,
    /// Spells out "10".
    Binary,
}

const TRIANGLE: [(f64, f64); 3] = [(0.5, 0.0), (0.0, 1.0), (1.0, 1.0)];
const SQUARE: [(f64, f64); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
const LINE: [(f64, f64); 4] = [(0.0, 0.5), (0.33, 0.5), (0.66, 0.5), (1.0, 0.5)];
const DIAMOND: [(f64, f64); 4] = [(0.5, 0.0), (1.0, 0.5), (0.5, 1.0), (0.0, 0.5)];
const STAR: [(f64, f64); 5] = [(0.5, 0.0), (0.5, 0.5), (1.0, 0.5), (0.0, 0.5), (0.5, 1.0)];
const RING: [(f64, f64); 6] = [
    (0.5, 0.0),
    (0.93, 0.25),
    (0.93, 0.75),
    (0.5, 1.0),
    (0.07, 0.75),
    (0.07, 0.25),
];
const ARROW: [(f64, f64); 7] = [
    (0.0, 0.5),
    (0.5, 0.0),
    (0.5, 0.3),
    (1.0, 0.3),
    (1.0, 0.7),
    (0.5, 0.7),
    (0.5, 1.0),
];
const BINARY: [(f64, f64); 7] = [
    (0.0, 0.2),
    (0.0, 0.8),
    (0.4, 0.0),
    (0.7, 0.0),
    (0.85, 0.5),
    (0.7, 1.0),
    (0.4, 1.0),
];

impl FormationPattern {
    pub const ALL: [FormationPattern; 8] = [
        FormationPattern::Triangle,
        FormationPattern::Square,
        FormationPattern::Line,
        FormationPattern::Diamond,
        FormationPattern::Star,
        FormationPattern::Ring,
        FormationPattern::Arrow,
        FormationPattern::Binary,
    ];

    /// Slot positions in a unit square, `(0, 0)` top-left.
    #[must_use]
    pub fn points(self) -> &'static [(f64, f64)] {
        match self {
            FormationPattern::Triangle => &TRIANGLE,
            FormationPattern::Square => &SQUARE,
            FormationPattern::Line => &LINE,
            FormationPattern::Diamond => &DIAMOND,
            FormationPattern::Star => &STAR,
            FormationPattern::Ring => &RING,
            FormationPattern::Arrow => &ARROW,
            FormationPattern::Binary => &BINARY,
        }
    }

    #[must_use]
    pub fn slots(self) -> usize {
        self.points().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationPhase {
    Forming,
    Holding,
    Dispersing,
}

/// Rare variants rolled at birth (or, for ancients, earned with age).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RareKind {
    /// Attracts ones and feeds nearby agents. Purifies shadows.
    Golden,
    /// Shields neighbours from predators.
    Diamond,
    /// Teleports short distances.
    Glitch,
    /// Old and slow; shares energy.
    Ancient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_house_names_parse() {
        assert_eq!("dark-arts".parse::<House>(), Ok(House::DarkArts));
        assert_eq!("Dark Arts".parse::<House>(), Ok(House::DarkArts));
        assert_eq!("SHIELD".parse::<House>(), Ok(House::Shield));
        let err = "moon".parse::<House>().unwrap_err();
        assert_eq!(err.to_string(), "unknown house name: moon");
    }

    #[test]
    fn test_pattern_slot_counts() {
        let counts: Vec<usize> = FormationPattern::ALL.iter().map(|p| p.slots()).collect();
        assert_eq!(counts, vec![3, 4, 4, 4, 5, 6, 7, 7]);
        for p in FormationPattern::ALL {
            assert!(p
                .points()
                .iter()
                .all(|&(x, y)| (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y)));
        }
    }
}
