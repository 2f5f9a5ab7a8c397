//! # Firefly Core
//!
//! The simulation engine behind the firefly ecosystem: a population of
//! binary-digit agents that age, evolve, breed, leave pheromone trails and
//! are hunted, all inside one deterministic tick.
//!
//! This crate contains:
//! - Genetics (breeding, mutation, markers) and lineage tracking
//! - The pheromone field and the spatial hash used for neighbour queries
//! - Agent lifecycle: ageing, energy, tiers, collisions, integration
//! - Four predator archetypes behind one [`predators::Predator`] contract
//! - The social layer: constellations, house personalities, swarms, mitosis
//! - Rare variants, orbiting planets, day/night and weather
//! - Energy wells to forage from and scheduled cosmic events
//! - The interaction gateway that turns pointer input into forces
//! - Metrics collection and structured logging
//!
//! ## Architecture
//!
//! The coordinator owns every collection and lends them out once per phase
//! through a [`context::TickContext`]. Subsystems keep only their own state
//! (formation lists, cooldowns, trail grids) and refer to agents by id, so an
//! agent removed in one phase is silently skipped by the next.
//!
//! ## Example
//!
//! ```
//! use firefly_core::config::GeneticsConfig;
//! use firefly_core::genetics::GeneticsEngine;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut engine = GeneticsEngine::new(&GeneticsConfig::default());
//! let a = engine.create_default(&mut rng);
//! let b = engine.create_star_seed(&mut rng);
//! let child = engine.breed(&a, &b, &Default::default(), &mut rng);
//! assert_eq!(child.generation, 1);
//! assert!(child.traits.within_bounds());
//! ```

/// Agent collection with an id index
pub mod agents;
/// Configuration for every subsystem
pub mod config;
/// Per-tick context and side-effect output
pub mod context;
/// Solar flares and void storms
pub mod cosmic;
/// Stationary foraging spots
pub mod energy_well;
/// Day/night cycle, weather and inactivity detection
pub mod environment;
/// Breeding, mutation and markers
pub mod genetics;
/// Pointer and touch input
pub mod interaction;
/// Ageing, energy, collisions and movement
pub mod lifecycle;
/// Ancestry DAG
pub mod lineage;
/// Tick metrics and logging setup
pub mod metrics;
/// Decaying chemical trails
pub mod pheromone;
/// Planets born from ascended sacrifices
pub mod planet;
/// Gravity well, hunters, shadows and serpents
pub mod predators;
/// Golden, diamond, glitch and ancient variants
pub mod rare;
/// Presentation views
pub mod snapshot;
/// Constellations, personalities, reproduction and swarms
pub mod social;
/// Uniform grid for neighbour queries
pub mod spatial_hash;

pub use agents::AgentStore;
pub use config::AppConfig;
pub use context::{Clock, SpawnRequest, TickContext, TickOutput};
pub use cosmic::CosmicScheduler;
pub use energy_well::EnergyWellSystem;
pub use environment::Environment;
pub use genetics::GeneticsEngine;
pub use interaction::{GatewayCommand, InteractionGateway};
pub use lineage::LineageStore;
pub use metrics::{init_logging, Metrics};
pub use pheromone::PheromoneField;
pub use planet::PlanetSystem;
pub use predators::{Predator, PredatorManager};
pub use spatial_hash::SpatialHash;
