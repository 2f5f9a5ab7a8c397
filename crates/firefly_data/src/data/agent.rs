use super::genetics::GeneticsRecord;
use super::social::{House, RareKind};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use uuid::Uuid;

/// Plain 2-D vector in arena pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn from_angle(angle: f64) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn length_sq(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    #[must_use]
    pub fn distance(self, other: Vec2) -> f64 {
        (other - self).length()
    }

    #[must_use]
    pub fn distance_sq(self, other: Vec2) -> f64 {
        (other - self).length_sq()
    }

    /// Unit vector, or zero for a (near) zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < f64::EPSILON {
            Vec2::ZERO
        } else {
            self * (1.0 / len)
        }
    }

    /// Rescales to at most `max` length.
    #[must_use]
    pub fn clamp_length(self, max: f64) -> Self {
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max / len)
        } else {
            self
        }
    }

    #[must_use]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Vec2) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// The binary trait every agent carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Digit {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1")]
    One,
}

impl Digit {
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Digit::Zero => Digit::One,
            Digit::One => Digit::Zero,
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Digit::Zero => 0,
            Digit::One => 1,
        }
    }

    #[must_use]
    pub fn from_value(value: u8) -> Self {
        if value == 0 {
            Digit::Zero
        } else {
            Digit::One
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeState {
    Spawning,
    Mature,
    Dying,
    Dead,
}

impl LifeState {
    #[must_use]
    pub fn is_mature(self) -> bool {
        self == LifeState::Mature
    }

    /// Still occupies the arena (anything but `Dead`).
    #[must_use]
    pub fn is_present(self) -> bool {
        self != LifeState::Dead
    }
}

/// Evolution tier. Ordered so `tier >= Tier::Charged` reads naturally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Basic,
    Charged,
    Radiant,
    Prismatic,
    Ascended,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Basic,
        Tier::Charged,
        Tier::Radiant,
        Tier::Prismatic,
        Tier::Ascended,
    ];

    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn life_multiplier(self) -> f64 {
        match self {
            Tier::Basic => 1.0,
            Tier::Charged => 1.5,
            Tier::Radiant => 2.0,
            Tier::Prismatic => 3.0,
            Tier::Ascended => 5.0,
        }
    }

    #[must_use]
    pub fn gravity_resistance(self) -> f64 {
        match self {
            Tier::Basic => 0.0,
            Tier::Charged => 0.15,
            Tier::Radiant => 0.3,
            Tier::Prismatic => 0.5,
            Tier::Ascended => 0.75,
        }
    }

    /// Collisions needed to leave this tier; `None` at the top.
    #[must_use]
    pub fn evolve_threshold(self) -> Option<u32> {
        match self {
            Tier::Basic => Some(3),
            Tier::Charged => Some(5),
            Tier::Radiant => Some(8),
            Tier::Prismatic => Some(12),
            Tier::Ascended => None,
        }
    }

    #[must_use]
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Basic => Some(Tier::Charged),
            Tier::Charged => Some(Tier::Radiant),
            Tier::Radiant => Some(Tier::Prismatic),
            Tier::Prismatic => Some(Tier::Ascended),
            Tier::Ascended => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Starvation,
    OldAge,
    GravityWell,
    Hunter,
    Serpent,
    /// Removed by an explicit call on the coordinator.
    Forced,
}

/// Affiliations and visual flags other subsystems attach to an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentMarkers {
    pub house: Option<House>,
    pub constellation_id: Option<u64>,
    pub swarm_id: Option<u64>,
    pub rare: Option<RareKind>,
    /// Converted by a shadow.
    pub corrupted: bool,
    pub stealth: bool,
    /// Marked by a void storm vortex; carries extra gravity resistance.
    pub void_touched: bool,
}

/// Multipliers read by integration. The transient ones are reset every tick
/// and rewritten by the subsystems; conversion effects and autonomy persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentModifiers {
    pub activity: f64,
    pub glow: f64,
    pub opacity: f64,
    pub speed: f64,
    pub autonomy_boost: f64,
    /// Ageing rate; below 1 inside a null world.
    pub time_dilation: f64,
    pub protected_by_planet: bool,
    /// Inside an energy well's pull this tick.
    pub near_energy_well: bool,
    /// Extra gravity resistance granted by a shadow conversion.
    pub resistance_bonus: f64,
    pub decay_multiplier: f64,
    pub pulse_ms: f64,
}

impl AgentModifiers {
    pub fn reset_transient(&mut self) {
        self.activity = 1.0;
        self.glow = 1.0;
        self.opacity = 1.0;
        self.speed = 1.0;
        self.time_dilation = 1.0;
        self.protected_by_planet = false;
        self.near_energy_well = false;
    }
}

impl Default for AgentModifiers {
    fn default() -> Self {
        Self {
            activity: 1.0,
            glow: 1.0,
            opacity: 1.0,
            speed: 1.0,
            autonomy_boost: 1.0,
            time_dilation: 1.0,
            protected_by_planet: false,
            near_energy_well: false,
            resistance_bonus: 0.0,
            decay_multiplier: 1.0,
            pulse_ms: 0.0,
        }
    }
}

/// Expressed values derived from the genetics record by the genetics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    pub speed: f64,
    pub agility: f64,
    pub size: f64,
    pub glow_intensity: f64,
    pub glow_frequency: f64,
    pub energy_efficiency: f64,
    pub lifespan: f64,
    pub resilience: f64,
    pub sociability: f64,
    pub curiosity: f64,
    pub fertility: f64,
    pub maturity_speed: f64,
    pub gravity_resistance: f64,
    pub wander: f64,
}

impl Default for Phenotype {
    fn default() -> Self {
        Self {
            speed: 1.0,
            agility: 1.0,
            size: 1.0,
            glow_intensity: 1.0,
            glow_frequency: 1.0,
            energy_efficiency: 1.0,
            lifespan: 1.0,
            resilience: 1.0,
            sociability: 1.0,
            curiosity: 1.0,
            fertility: 1.0,
            maturity_speed: 1.0,
            gravity_resistance: 0.0,
            wander: 1.0,
        }
    }
}

/// A firefly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Forces accumulated this tick, cleared by integration.
    pub acc: Vec2,
    pub digit: Digit,
    pub energy: f64,
    /// Milliseconds in the current life stage.
    pub age_ms: f64,
    /// Lifespan before tier and genetic multipliers.
    pub base_max_age_ms: f64,
    pub max_age_ms: f64,
    pub state: LifeState,
    pub tier: Tier,
    pub evolution_points: u32,
    pub base_speed: f64,
    pub wobble_phase: f64,
    pub collision_cooldown_ms: f64,
    pub reproduction_cooldown_ms: f64,
    pub deposit_timer_ms: f64,
    /// Set while a predator is close; drives danger-trail deposits.
    pub alarm_ms: f64,
    pub genetics: GeneticsRecord,
    pub phenotype: Phenotype,
    pub markers: AgentMarkers,
    pub modifiers: AgentModifiers,
    pub death_cause: Option<DeathCause>,
}

impl Agent {
    pub const MAX_ENERGY: f64 = 100.0;

    /// A newborn in `Spawning` with default genetics. The caller fills in the rest.
    #[must_use]
    pub fn new(id: Uuid, pos: Vec2, digit: Digit) -> Self {
        Self {
            id,
            pos,
            vel: Vec2::ZERO,
            acc: Vec2::ZERO,
            digit,
            energy: Self::MAX_ENERGY,
            age_ms: 0.0,
            base_max_age_ms: 180_000.0,
            max_age_ms: 180_000.0,
            state: LifeState::Spawning,
            tier: Tier::Basic,
            evolution_points: 0,
            base_speed: 0.45,
            wobble_phase: 0.0,
            collision_cooldown_ms: 0.0,
            reproduction_cooldown_ms: 0.0,
            deposit_timer_ms: 0.0,
            alarm_ms: 0.0,
            genetics: GeneticsRecord::default(),
            phenotype: Phenotype::default(),
            markers: AgentMarkers::default(),
            modifiers: AgentModifiers::default(),
            death_cause: None,
        }
    }

    #[must_use]
    pub fn is_mature(&self) -> bool {
        self.state.is_mature()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self.state, LifeState::Spawning | LifeState::Mature)
    }

    #[must_use]
    pub fn generation(&self) -> u32 {
        self.genetics.generation
    }

    #[must_use]
    pub fn lineage_id(&self) -> Uuid {
        self.genetics.lineage_id
    }

    #[must_use]
    pub fn in_formation(&self) -> bool {
        self.markers.constellation_id.is_some()
    }

    /// Total resistance to gravity-well pull, capped below full immunity.
    #[must_use]
    pub fn gravity_resistance(&self) -> f64 {
        let house = self.markers.house.map_or(0.0, House::gravity_resistance);
        (self.tier.gravity_resistance()
            + self.phenotype.gravity_resistance
            + self.modifiers.resistance_bonus
            + house)
            .clamp(0.0, 0.95)
    }

    /// Remaining life as a fraction of `max_age_ms`.
    #[must_use]
    pub fn life_fraction(&self) -> f64 {
        if self.max_age_ms <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age_ms / self.max_age_ms).clamp(0.0, 1.0)
    }

    /// Recomputes `max_age_ms` from the base lifespan, tier and phenotype.
    pub fn refresh_max_age(&mut self) {
        self.max_age_ms =
            self.base_max_age_ms * self.tier.life_multiplier() * self.phenotype.lifespan;
    }

    /// Marks the agent dead. Returns `false` when it was already dead.
    pub fn kill(&mut self, cause: DeathCause) -> bool {
        if self.state == LifeState::Dead {
            return false;
        }
        self.state = LifeState::Dead;
        self.death_cause = Some(cause);
        self.markers.constellation_id = None;
        self.markers.swarm_id = None;
        true
    }

    pub fn apply_force(&mut self, force: Vec2) {
        if force.is_finite() {
            self.acc += force;
        }
    }

    pub fn add_energy(&mut self, amount: f64) {
        self.energy = (self.energy + amount).clamp(0.0, Self::MAX_ENERGY);
    }
}
