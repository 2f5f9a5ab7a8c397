use super::agent::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// Named stretch of the simulated day.
pub enum DayPeriod {
    Dawn,
    Morning,
    Afternoon,
    Dusk,
    Evening,
    Night,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// One-shot effect fired when a period begins.
pub enum PeriodEvent {
    /// Mature agents receive an energy boost.
    Awakening,
    /// Agents gather more tightly for a while.
    Gathering,
    /// Quiet phase; no mechanical effect beyond the period's multipliers.
    Dreaming,
}

impl DayPeriod {
    pub const ALL: [DayPeriod; 6] = [
        DayPeriod::Dawn,
        DayPeriod::Morning,
        DayPeriod::Afternoon,
        DayPeriod::Dusk,
        DayPeriod::Evening,
        DayPeriod::Night,
    ];

    /// Period covering a normalised time of day in `[0, 1)`.
    #[must_use]
    pub fn at(time: f64) -> Self {
        let t = time.rem_euclid(1.0);
        if (0.20..0.29).contains(&t) {
            DayPeriod::Dawn
        } else if (0.29..0.50).contains(&t) {
            DayPeriod::Morning
        } else if (0.50..0.71).contains(&t) {
            DayPeriod::Afternoon
        } else if (0.71..0.83).contains(&t) {
            DayPeriod::Dusk
        } else if (0.83..0.96).contains(&t) {
            DayPeriod::Evening
        } else {
            DayPeriod::Night
        }
    }

    /// Normalised time at which the period starts.
    #[must_use]
    pub fn start(self) -> f64 {
        match self {
            DayPeriod::Dawn => 0.20,
            DayPeriod::Morning => 0.29,
            DayPeriod::Afternoon => 0.50,
            DayPeriod::Dusk => 0.71,
            DayPeriod::Evening => 0.83,
            DayPeriod::Night => 0.96,
        }
    }

    #[must_use]
    pub fn activity(self) -> f64 {
        match self {
            DayPeriod::Dawn => 0.9,
            DayPeriod::Morning => 0.6,
            DayPeriod::Afternoon => 0.5,
            DayPeriod::Dusk => 1.2,
            DayPeriod::Evening => 1.0,
            DayPeriod::Night => 0.8,
        }
    }

    #[must_use]
    pub fn glow(self) -> f64 {
        match self {
            DayPeriod::Dawn => 0.8,
            DayPeriod::Morning => 0.5,
            DayPeriod::Afternoon => 0.4,
            DayPeriod::Dusk => 0.9,
            DayPeriod::Evening => 1.0,
            DayPeriod::Night => 1.2,
        }
    }

    #[must_use]
    pub fn event(self) -> Option<PeriodEvent> {
        match self {
            DayPeriod::Dawn => Some(PeriodEvent::Awakening),
            DayPeriod::Dusk => Some(PeriodEvent::Gathering),
            DayPeriod::Night => Some(PeriodEvent::Dreaming),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[default]
    Clear,
    Windy,
    Stormy,
    Calm,
}

impl Weather {
    pub const ALL: [Weather; 4] = [Weather::Clear, Weather::Windy, Weather::Stormy, Weather::Calm];

    #[must_use]
    pub fn wind_strength(self) -> f64 {
        match self {
            Weather::Windy => 0.02,
            Weather::Stormy => 0.05,
            Weather::Clear | Weather::Calm => 0.0,
        }
    }

    /// Decorative particles per tick, surfaced for the presentation layer.
    #[must_use]
    pub fn particle_rate(self) -> f64 {
        match self {
            Weather::Windy => 0.1,
            Weather::Stormy => 0.3,
            Weather::Clear | Weather::Calm => 0.0,
        }
    }

    #[must_use]
    pub fn visibility(self) -> f64 {
        match self {
            Weather::Stormy => 0.7,
            _ => 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
/// Global conditions computed once per tick and read by every subsystem.
pub struct EnvironmentSnapshot {
    /// Normalised time of day in `[0, 1)`.
    pub time_of_day: f64,
    /// Current day period.
    pub period: DayPeriod,
    /// Current weather.
    pub weather: Weather,
    /// Wind force applied to every drifting agent per tick.
    pub wind: Vec2,
    /// Period activity multiplier.
    pub activity: f64,
    /// Period glow multiplier, dimmed by weather visibility.
    pub glow: f64,
    /// True while the gathering event is running.
    pub gathering: bool,
    /// True once no interaction has arrived for the inactivity threshold.
    pub inactive: bool,
}

impl Default for EnvironmentSnapshot {
    fn default() -> Self {
        Self {
            time_of_day: 0.5,
            period: DayPeriod::Afternoon,
            weather: Weather::Clear,
            wind: Vec2::ZERO,
            activity: 1.0,
            glow: 1.0,
            gathering: false,
            inactive: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
/// Aggregated statistics for the whole ecosystem.
pub struct EcosystemStats {
    /// Number of ticks advanced so far.
    pub tick: u64,
    /// Simulated milliseconds since the ecosystem was created.
    pub age_ms: f64,
    /// Agents in any state other than `Dead`.
    pub population: usize,
    /// Mature agents.
    pub mature: usize,
    /// Agents carrying digit 1.
    pub ones: usize,
    /// Agents carrying digit 0.
    pub zeros: usize,
    /// Agents per tier, indexed by tier.
    pub tiers: [usize; 5],
    /// Highest generation among present agents.
    pub max_generation: u32,
    /// Mean energy of present agents.
    pub avg_energy: f64,
    /// Total births since start.
    pub births: u64,
    /// Total deaths since start, keyed by cause.
    pub deaths: HashMap<String, u64>,
    /// Agents converted by shadows.
    pub conversions: u64,
    /// Live trails in the pheromone field.
    pub active_trails: usize,
    /// Predators currently present, by archetype name.
    pub predators: HashMap<String, usize>,
    /// Formations currently active.
    pub formations: usize,
    /// Swarms currently active.
    pub swarms: usize,
    /// Planets currently orbiting.
    pub planets: usize,
    /// Completed breedings recorded by the genetics engine.
    pub breedings: u64,
    /// Applied mutations recorded by the genetics engine.
    pub mutations: u64,
    /// Current day period.
    pub period: Option<DayPeriod>,
    /// Current weather.
    pub weather: Option<Weather>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_boundaries() {
        assert_eq!(DayPeriod::at(0.0), DayPeriod::Night);
        assert_eq!(DayPeriod::at(0.2), DayPeriod::Dawn);
        assert_eq!(DayPeriod::at(0.289), DayPeriod::Dawn);
        assert_eq!(DayPeriod::at(0.29), DayPeriod::Morning);
        assert_eq!(DayPeriod::at(0.75), DayPeriod::Dusk);
        assert_eq!(DayPeriod::at(0.97), DayPeriod::Night);
        assert_eq!(DayPeriod::at(1.25), DayPeriod::Dawn);
    }

    #[test]
    fn test_every_period_starts_inside_itself() {
        for p in DayPeriod::ALL {
            assert_eq!(DayPeriod::at(p.start()), p);
        }
    }
}
