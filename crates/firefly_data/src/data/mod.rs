//! Core data structures for the firefly ecosystem.

pub mod agent;
pub mod cosmos;
pub mod environment;
pub mod events;
pub mod genetics;
pub mod predator;
pub mod social;
pub mod trail;
