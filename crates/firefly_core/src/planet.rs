//! Planets born from ascended sacrifices to the gravity well.

use crate::config::PlanetConfig;
use crate::context::TickContext;
use firefly_data::{Digit, LiveEvent, Vec2};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    pub id: u64,
    /// `Zero` is a null world (slows ageing), `One` a unity sphere (speeds agents up).
    pub digit: Digit,
    pub pos: Vec2,
    pub angle: f64,
    pub orbit_radius: f64,
    /// Radians per millisecond.
    pub orbit_speed: f64,
    pub age_ms: f64,
    pub maturing_ms: f64,
    pub protect_radius: f64,
    /// Energy per second restored to protected agents.
    pub healing: f64,
}

impl Planet {
    pub fn new(
        id: u64,
        center: Vec2,
        digit: Digit,
        angle: f64,
        orbit_speed: f64,
        config: &PlanetConfig,
    ) -> Self {
        let (protect_radius, healing) = match digit {
            Digit::Zero => (config.null_radius, config.null_healing),
            Digit::One => (config.unity_radius, config.unity_healing),
        };
        let mut planet = Self {
            id,
            digit,
            pos: center,
            angle,
            orbit_radius: config.orbit_radius,
            orbit_speed,
            age_ms: 0.0,
            maturing_ms: config.maturing_ms,
            protect_radius,
            healing,
        };
        planet.place(center);
        planet
    }

    #[must_use]
    pub fn is_mature(&self) -> bool {
        self.age_ms >= self.maturing_ms
    }

    /// Mature planets shelter agents inside their protection radius.
    #[must_use]
    pub fn protects(&self, pos: Vec2) -> bool {
        self.is_mature() && self.pos.distance_sq(pos) <= self.protect_radius * self.protect_radius
    }

    fn place(&mut self, center: Vec2) {
        self.pos = center + Vec2::from_angle(self.angle) * self.orbit_radius;
    }

    pub fn advance(&mut self, center: Vec2, dt_ms: f64) {
        self.age_ms += dt_ms;
        self.angle = (self.angle + self.orbit_speed * dt_ms).rem_euclid(std::f64::consts::TAU);
        self.place(center);
    }
}

/// Owns the planets and their id counter.
#[derive(Debug, Clone)]
pub struct PlanetSystem {
    config: PlanetConfig,
    planets: Vec<Planet>,
    next_id: u64,
}

impl PlanetSystem {
    pub fn new(config: &PlanetConfig) -> Self {
        Self {
            config: config.clone(),
            planets: Vec::new(),
            next_id: 1,
        }
    }

    #[must_use]
    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.planets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planets.is_empty()
    }

    /// Adds a planet orbiting `center`. The oldest is dropped beyond the cap.
    pub fn birth<R: Rng>(
        &mut self,
        center: Vec2,
        digit: Digit,
        tick: u64,
        rng: &mut R,
    ) -> Option<LiveEvent> {
        if !self.config.enabled || self.config.max_planets == 0 {
            return None;
        }
        if self.planets.len() >= self.config.max_planets {
            let removed = self.planets.remove(0);
            tracing::debug!(planet = removed.id, "Oldest planet collapsed");
        }
        let id = self.next_id;
        self.next_id += 1;
        let angle = rng.gen_range(0.0..std::f64::consts::TAU);
        let speed = if self.config.max_orbit_speed > self.config.min_orbit_speed {
            rng.gen_range(self.config.min_orbit_speed..self.config.max_orbit_speed)
        } else {
            self.config.min_orbit_speed
        };
        self.planets
            .push(Planet::new(id, center, digit, angle, speed, &self.config));
        tracing::info!(planet = id, digit = digit.value(), "Planet born");
        Some(LiveEvent::PlanetBorn {
            planet_id: id,
            digit,
            tick,
        })
    }

    pub fn update(&mut self, center: Vec2, dt_ms: f64) {
        for planet in &mut self.planets {
            planet.advance(center, dt_ms);
        }
    }
}

/// Shelters, heals and modifies agents inside mature planets' protection.
pub fn apply_planet_effects<R: Rng>(ctx: &mut TickContext<'_, R>) {
    if ctx.planets.is_empty() {
        return;
    }
    let seconds = ctx.clock.seconds();
    let dilation = ctx.config.planets.null_time_dilation;
    let unity_speed = ctx.config.planets.unity_speed;

    for agent in ctx.agents.iter_mut().filter(|a| a.is_alive()) {
        let pos = agent.pos;
        for planet in ctx.planets.iter().filter(|p| p.protects(pos)) {
            agent.modifiers.protected_by_planet = true;
            agent.add_energy(planet.healing * seconds);
            match planet.digit {
                Digit::Zero => {
                    agent.modifiers.time_dilation = agent.modifiers.time_dilation.min(dilation);
                }
                Digit::One => {
                    agent.modifiers.speed = agent.modifiers.speed.max(unity_speed);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_planet_protects_only_when_mature() {
        let config = PlanetConfig::default();
        let mut planet = Planet::new(1, Vec2::new(500.0, 400.0), Digit::Zero, 0.0, 0.0, &config);
        assert_eq!(planet.pos, Vec2::new(680.0, 400.0));
        assert!(!planet.protects(planet.pos));
        planet.advance(Vec2::new(500.0, 400.0), 3000.0);
        assert!(planet.protects(Vec2::new(700.0, 400.0)));
        assert!(!planet.protects(Vec2::new(900.0, 400.0)));
    }

    #[test]
    fn test_sixth_planet_replaces_oldest() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut system = PlanetSystem::new(&PlanetConfig::default());
        for _ in 0..6 {
            assert!(system
                .birth(Vec2::new(100.0, 100.0), Digit::One, 0, &mut rng)
                .is_some());
        }
        assert_eq!(system.len(), 5);
        assert_eq!(system.planets()[0].id, 2);
    }

    #[test]
    fn test_orbit_keeps_radius() {
        let config = PlanetConfig::default();
        let center = Vec2::new(300.0, 300.0);
        let mut planet = Planet::new(1, center, Digit::One, 1.0, 0.0004, &config);
        for _ in 0..100 {
            planet.advance(center, 16.0);
        }
        assert!((planet.pos.distance(center) - config.orbit_radius).abs() < 1e-6);
        assert!((planet.angle - (1.0 + 0.0004 * 1600.0)).abs() < 1e-9);
    }
}
