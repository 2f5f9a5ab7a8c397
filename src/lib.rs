//! Headless host for the firefly ecosystem.
//!
//! The engine lives in `firefly_core`; this crate owns the [`Ecosystem`]
//! coordinator that holds every collection and runs one tick at a time, and
//! re-exports the engine modules under [`model`].
//!
//! ```
//! use fireflies_lib::model::config::AppConfig;
//! use fireflies_lib::Ecosystem;
//!
//! let mut config = AppConfig::default();
//! config.arena.seed = Some(11);
//! let mut eco = Ecosystem::new(config);
//! for _ in 0..10 {
//!     eco.update(16.0);
//! }
//! assert_eq!(eco.tick(), 10);
//! assert!(eco.stats().population > 0);
//! ```

pub mod model;

pub use model::ecosystem::{Ecosystem, EcosystemStats};
