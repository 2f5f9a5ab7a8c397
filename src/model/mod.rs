pub use firefly_core::predators::Predator;
pub mod agents {
    pub use firefly_core::agents::*;
}
pub mod config {
    pub use firefly_core::config::*;
}
pub mod context {
    pub use firefly_core::context::*;
}
pub mod environment {
    pub use firefly_core::environment::*;
}
pub mod genetics {
    pub use firefly_core::genetics::*;
}
pub mod interaction {
    pub use firefly_core::interaction::*;
}
pub mod lifecycle {
    pub use firefly_core::lifecycle::*;
}
pub mod lineage {
    pub use firefly_core::lineage::*;
}
pub mod metrics {
    pub use firefly_core::metrics::*;
}
pub mod pheromone {
    pub use firefly_core::pheromone::*;
}
pub mod planet {
    pub use firefly_core::planet::*;
}
pub mod predators {
    pub use firefly_core::predators::*;
}
pub mod rare {
    pub use firefly_core::rare::*;
}
pub mod snapshot {
    pub use firefly_core::snapshot::*;
}
pub mod social {
    pub use firefly_core::social::*;
}
pub mod spatial_hash {
    pub use firefly_core::spatial_hash::*;
}

pub mod state {
    pub use firefly_data::*;
}

pub mod ecosystem;
