//! Run metrics and logging setup.
//!
//! The engine itself only emits `tracing` events; hosts decide whether to
//! install a subscriber through [`init_logging`].

use firefly_data::LiveEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Collector for tick timings and per-event counters.
pub struct Metrics {
    tick_count: AtomicU64,
    agent_count: AtomicU64,
    trail_count: AtomicU64,
    slowest_tick_us: AtomicU64,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            agent_count: AtomicU64::new(0),
            trail_count: AtomicU64::new(0),
            slowest_tick_us: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick with its wall-clock duration.
    pub fn record_tick(&self, duration: Duration, agents: usize, trails: usize) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.agent_count.store(agents as u64, Ordering::Relaxed);
        self.trail_count.store(trails as u64, Ordering::Relaxed);
        self.slowest_tick_us
            .fetch_max(duration.as_micros() as u64, Ordering::Relaxed);

        if tick % 1000 == 0 {
            tracing::info!(
                tick,
                agents,
                trails,
                duration_us = duration.as_micros() as u64,
                "Ecosystem tick"
            );
        }
    }

    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Counts a drained event under its variant name.
    pub fn record_event(&self, event: &LiveEvent) {
        self.increment_counter(event_name(event));
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn agent_count(&self) -> u64 {
        self.agent_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn trail_count(&self) -> u64 {
        self.trail_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn slowest_tick(&self) -> Duration {
        Duration::from_micros(self.slowest_tick_us.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_event(&self, event_type: &str, details: &str) {
        tracing::info!(event_type, details, "Ecosystem milestone");
    }

    pub fn log_warning(&self, message: &str) {
        tracing::warn!(message);
    }
}

/// Stable snake_case name of an event variant.
#[must_use]
pub fn event_name(event: &LiveEvent) -> &'static str {
    match event {
        LiveEvent::Birth { .. } => "birth",
        LiveEvent::Death { .. } => "death",
        LiveEvent::Collision { .. } => "collision",
        LiveEvent::Evolution { .. } => "evolution",
        LiveEvent::Consumed { .. } => "consumed",
        LiveEvent::Converted { .. } => "converted",
        LiveEvent::ShadowPurified { .. } => "shadow_purified",
        LiveEvent::PredatorStateChanged { .. } => "predator_state_changed",
        LiveEvent::PredatorSpawned { .. } => "predator_spawned",
        LiveEvent::PredatorRemoved { .. } => "predator_removed",
        LiveEvent::FormationStarted { .. } => "formation_started",
        LiveEvent::FormationEnded { .. } => "formation_ended",
        LiveEvent::FormationSignal { .. } => "formation_signal",
        LiveEvent::SwarmFormed { .. } => "swarm_formed",
        LiveEvent::SwarmDispersed { .. } => "swarm_dispersed",
        LiveEvent::HouseAssigned { .. } => "house_assigned",
        LiveEvent::HouseExpired { .. } => "house_expired",
        LiveEvent::RareEmerged { .. } => "rare_emerged",
        LiveEvent::PlanetBorn { .. } => "planet_born",
        LiveEvent::PeriodChanged { .. } => "period_changed",
        LiveEvent::WeatherChanged { .. } => "weather_changed",
        LiveEvent::EnergyWellDepleted { .. } => "energy_well_depleted",
        LiveEvent::EnergyWellRestored { .. } => "energy_well_restored",
        LiveEvent::CosmicEventStarted { .. } => "cosmic_event_started",
        LiveEvent::CosmicEventEnded { .. } => "cosmic_event_ended",
    }
}

/// Installs a global fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// A second call leaves the first subscriber in place.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_record_tick() {
        let metrics = Metrics::new();
        metrics.record_tick(Duration::from_millis(2), 40, 12);
        metrics.record_tick(Duration::from_millis(5), 41, 10);
        assert_eq!(metrics.tick_count(), 2);
        assert_eq!(metrics.agent_count(), 41);
        assert_eq!(metrics.trail_count(), 10);
        assert_eq!(metrics.slowest_tick(), Duration::from_millis(5));
    }

    #[test]
    fn test_events_are_counted_by_name() {
        let metrics = Metrics::new();
        let event = LiveEvent::FormationEnded {
            formation_id: 3,
            tick: 9,
        };
        metrics.record_event(&event);
        metrics.record_event(&event);
        metrics.record_event(&LiveEvent::Converted {
            shadow_id: 1,
            agent: Uuid::nil(),
            tick: 9,
        });
        assert_eq!(metrics.counter("formation_ended"), 2);
        assert_eq!(metrics.counter("converted"), 1);
        assert_eq!(metrics.counter("birth"), 0);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        init_logging();
        init_logging();
    }
}
