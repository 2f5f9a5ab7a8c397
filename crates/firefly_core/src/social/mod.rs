//! Group behaviour layered on top of individual agents.
//!
//! Runs after the predators each tick, in this order: swarming, constellations,
//! house personalities, reproduction, rare variants.

pub mod constellation;
pub mod personality;
pub mod reproduction;
pub mod swarm;

pub use constellation::{ConstellationSystem, Formation};
pub use personality::{Personality, PersonalitySystem};
pub use reproduction::{is_reproduction_ready, reproduce};
pub use swarm::{Swarm, SwarmSystem};

use firefly_data::{Agent, Vec2};

/// Mature and not already committed to a constellation.
pub(crate) fn is_free(agent: &Agent) -> bool {
    agent.is_mature() && agent.markers.constellation_id.is_none()
}

/// Mean position of the given points.
pub(crate) fn mean(points: impl Iterator<Item = Vec2>) -> Option<Vec2> {
    let (sum, n) = points.fold((Vec2::ZERO, 0usize), |(s, n), p| (s + p, n + 1));
    (n > 0).then(|| sum * (1.0 / n as f64))
}
