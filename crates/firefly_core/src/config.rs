//! Configuration for every subsystem of the ecosystem.
//!
//! All parameters live in one nested [`AppConfig`] that maps onto a TOML file.
//! Every section is `#[serde(default)]`, so a file only needs to name what it
//! overrides.
//!
//! ## Example `fireflies.toml`
//!
//! ```toml
//! [arena]
//! width = 1600.0
//! height = 900.0
//! seed = 42
//!
//! [genetics]
//! global_mutation_rate = 0.2
//!
//! [personality]
//! dominant_house = "shield"
//! ```

use firefly_data::{Digit, House};
use serde::{Deserialize, Serialize};

/// Arena bounds, population limits and tick clamping.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
    pub seed: Option<u64>,
    pub initial_population: usize,
    pub min_population: usize,
    pub max_population: usize,
    /// Base per-tick chance of a replacement spawn while under `min_population`.
    pub replacement_rate: f64,
    /// Agents wrap once they are this far beyond an edge.
    pub edge_padding: f64,
    pub max_dt_ms: f64,
    /// Spatial hash cell size for agent queries.
    pub cell_size: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            seed: None,
            initial_population: 20,
            min_population: 10,
            max_population: 50,
            replacement_rate: 0.02,
            edge_padding: 50.0,
            max_dt_ms: 250.0,
            cell_size: 50.0,
        }
    }
}

/// Lifecycle, movement and collision parameters for individual agents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub birth_ms: f64,
    pub growth_ms: f64,
    pub dying_ms: f64,
    pub min_base_speed: f64,
    pub max_base_speed: f64,
    pub min_max_age_ms: f64,
    pub max_max_age_ms: f64,
    /// Mature energy loss per 16 ms frame at tier 0.
    pub energy_decay: f64,
    pub collision_radius: f64,
    pub collision_cooldown_ms: f64,
    pub merge_energy: f64,
    pub desperation_exponent: f64,
    pub impulse_chance: f64,
    pub impulse_desperation_chance: f64,
    pub impulse_strength: f64,
    /// Extra speed at full desperation (1.5 gives 2.5x).
    pub desperation_speed_boost: f64,
    pub wobble_amplitude: f64,
    /// Speed beyond which accumulated forces are damped back.
    pub overspeed_factor: f64,
    pub overspeed_damping: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            birth_ms: 3500.0,
            growth_ms: 12_000.0,
            dying_ms: 1000.0,
            min_base_speed: 0.3,
            max_base_speed: 0.6,
            min_max_age_ms: 120_000.0,
            max_max_age_ms: 240_000.0,
            energy_decay: 0.006,
            collision_radius: 25.0,
            collision_cooldown_ms: 2000.0,
            merge_energy: 35.0,
            desperation_exponent: 2.5,
            impulse_chance: 0.008,
            impulse_desperation_chance: 0.04,
            impulse_strength: 0.15,
            desperation_speed_boost: 1.5,
            wobble_amplitude: 0.5,
            overspeed_factor: 4.0,
            overspeed_damping: 0.95,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GeneticsConfig {
    pub enabled: bool,
    pub global_mutation_rate: f64,
    /// Per-trait mutation probability never exceeds this.
    pub mutation_cap: f64,
    pub environmental_mutation: bool,
    pub near_well_multiplier: f64,
    pub ancient_well_multiplier: f64,
    pub cosmic_event_multiplier: f64,
    /// Distance to the gravity well counted as "near" when breeding.
    pub near_well_radius: f64,
    pub default_jitter: f64,
    pub star_seed_jitter: f64,
    /// Weight of the larger parent value under dominant inheritance.
    pub dominant_weight: f64,
    /// Half-width of the noise added to blended values.
    pub blend_noise: f64,
    pub track_lineage: bool,
    pub lineage_capacity: usize,
    pub eviction_fraction: f64,
    pub max_ancestry_depth: usize,
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global_mutation_rate: 0.15,
            mutation_cap: 0.5,
            environmental_mutation: true,
            near_well_multiplier: 2.0,
            ancient_well_multiplier: 1.3,
            cosmic_event_multiplier: 1.5,
            near_well_radius: 300.0,
            default_jitter: 0.1,
            star_seed_jitter: 0.3,
            dominant_weight: 0.7,
            blend_noise: 0.05,
            track_lineage: true,
            lineage_capacity: 1000,
            eviction_fraction: 0.2,
            max_ancestry_depth: 10,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PheromoneConfig {
    pub enabled: bool,
    pub cell_size: f64,
    pub max_trails_per_cell: usize,
    pub merge_radius: f64,
    pub decay_interval_ms: f64,
    /// Minimum time between deposits by one agent.
    pub deposit_interval_ms: f64,
    pub path_deposit_chance: f64,
    /// Agents within this range of a planet lay food trails.
    pub food_planet_radius: f64,
}

impl Default for PheromoneConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cell_size: 40.0,
            max_trails_per_cell: 10,
            merge_radius: 15.0,
            decay_interval_ms: 100.0,
            deposit_interval_ms: 500.0,
            path_deposit_chance: 0.3,
            food_planet_radius: 150.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GravityWellConfig {
    pub enabled: bool,
    pub base_size: f64,
    pub min_size: f64,
    pub max_size: f64,
    pub growth_rate: f64,
    pub shrink_rate: f64,
    pub base_radius: f64,
    pub radius_per_size: f64,
    pub strength: f64,
    pub horizon_factor: f64,
    pub max_health: f64,
    /// Health regained per second.
    pub regen_rate: f64,
    pub star_damage: f64,
    pub damage_shrink: f64,
    pub hurt_ms: f64,
    pub respawn_ms: f64,
    pub symbiosis_range: f64,
    pub symbiosis_bonus: f64,
    pub symbiosis_falloff: f64,
    /// Pull multiplier for agents inside a planet's protection.
    pub planet_shield: f64,
    pub swarm_defense_count: usize,
    pub swarm_defense_radius: f64,
}

impl Default for GravityWellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_size: 60.0,
            min_size: 20.0,
            max_size: 150.0,
            growth_rate: 8.0,
            shrink_rate: 6.0,
            base_radius: 150.0,
            radius_per_size: 1.5,
            strength: 0.08,
            horizon_factor: 0.5,
            max_health: 100.0,
            regen_rate: 0.5,
            star_damage: 25.0,
            damage_shrink: 5.0,
            hurt_ms: 500.0,
            respawn_ms: 10_000.0,
            symbiosis_range: 400.0,
            symbiosis_bonus: 0.75,
            symbiosis_falloff: 0.5,
            planet_shield: 0.2,
            swarm_defense_count: 12,
            swarm_defense_radius: 60.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HunterConfig {
    pub enabled: bool,
    /// Sub-types spawned at start, by name.
    pub initial: Vec<String>,
    pub birth_ms: f64,
    pub patrol_wait_min_ms: f64,
    pub patrol_wait_max_ms: f64,
    pub friction: f64,
    pub bounds_margin: f64,
    pub catch_satiation: f64,
    pub retreat_prey_count: usize,
    pub recover_prey_count: usize,
    pub retreat_speed: f64,
    pub dormant_speed: f64,
    pub wake_fraction: f64,
    /// Fraction of catch attempts that fail inside a diamond's shield.
    pub diamond_shield: f64,
}

impl Default for HunterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial: vec!["hunter".to_string(), "lurker".to_string()],
            birth_ms: 1500.0,
            patrol_wait_min_ms: 2000.0,
            patrol_wait_max_ms: 5000.0,
            friction: 0.98,
            bounds_margin: 50.0,
            catch_satiation: 20.0,
            retreat_prey_count: 10,
            recover_prey_count: 5,
            retreat_speed: 1.5,
            dormant_speed: 0.2,
            wake_fraction: 0.7,
            diamond_shield: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ShadowConfig {
    pub enabled: bool,
    pub max_shadows: usize,
    pub spawn_chance: f64,
    pub min_ecosystem_age_ms: f64,
    pub spawning_ms: f64,
    pub base_speed: f64,
    pub energy: f64,
    /// Energy lost per millisecond.
    pub energy_decay: f64,
    pub conversion_energy: f64,
    pub gravity_immunity: f64,
    pub hunt_radius: f64,
    pub hunt_force: f64,
    pub conversion_radius: f64,
    pub conversion_chance: f64,
    pub conversion_cooldown_ms: f64,
    pub victim_decay_multiplier: f64,
    pub victim_resistance: f64,
    pub flee_radius: f64,
    pub flee_release: f64,
    pub flee_force: f64,
    pub touch_radius: f64,
    pub touches_to_purify: u32,
    pub planet_avoid_radius: f64,
    pub planet_avoid_force: f64,
    pub absorb_rate: f64,
    pub absorb_threshold: f64,
    pub purifying_ms: f64,
    pub damping: f64,
    pub swarm_defense_count: usize,
    pub swarm_defense_radius: f64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_shadows: 3,
            spawn_chance: 0.00005,
            min_ecosystem_age_ms: 60_000.0,
            spawning_ms: 2000.0,
            base_speed: 0.04,
            energy: 150.0,
            energy_decay: 0.02,
            conversion_energy: 20.0,
            gravity_immunity: 0.9,
            hunt_radius: 300.0,
            hunt_force: 0.002,
            conversion_radius: 60.0,
            conversion_chance: 0.003,
            conversion_cooldown_ms: 5000.0,
            victim_decay_multiplier: 0.5,
            victim_resistance: 0.5,
            flee_radius: 100.0,
            flee_release: 200.0,
            flee_force: 0.005,
            touch_radius: 40.0,
            touches_to_purify: 3,
            planet_avoid_radius: 150.0,
            planet_avoid_force: 0.003,
            absorb_rate: 0.5,
            absorb_threshold: 200.0,
            purifying_ms: 3000.0,
            damping: 0.98,
            swarm_defense_count: 10,
            swarm_defense_radius: 50.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SerpentConfig {
    pub enabled: bool,
    pub segments: usize,
    pub segment_spacing: f64,
    pub spring: f64,
    pub speed: f64,
    pub turn_rate: f64,
    pub wave_amplitude: f64,
    pub wave_frequency: f64,
    pub detect_radius: f64,
    pub consume_radius: f64,
    pub wake_radius: f64,
    pub wake_strength: f64,
    pub health: f64,
    /// Health lost per millisecond.
    pub health_decay: f64,
    pub meal_health: f64,
    pub feeding_ms: f64,
    pub entering_ms: f64,
    pub swarm_defense_count: usize,
    pub swarm_defense_radius: f64,
    pub flee_ms: f64,
    pub flee_speed: f64,
    pub min_lifespan_ms: f64,
    pub max_lifespan_ms: f64,
    pub exit_margin: f64,
    pub edge_margin: f64,
    pub spawn_cooldown_ms: f64,
    pub min_ecosystem_age_ms: f64,
    pub min_population: usize,
}

impl Default for SerpentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            segments: 8,
            segment_spacing: 25.0,
            spring: 0.3,
            speed: 0.03,
            turn_rate: 0.002,
            wave_amplitude: 30.0,
            wave_frequency: 0.003,
            detect_radius: 200.0,
            consume_radius: 20.0,
            wake_radius: 100.0,
            wake_strength: 0.008,
            health: 100.0,
            health_decay: 0.005,
            meal_health: 15.0,
            feeding_ms: 500.0,
            entering_ms: 2000.0,
            swarm_defense_count: 8,
            swarm_defense_radius: 80.0,
            flee_ms: 5000.0,
            flee_speed: 1.5,
            min_lifespan_ms: 30_000.0,
            max_lifespan_ms: 90_000.0,
            exit_margin: 150.0,
            edge_margin: 100.0,
            spawn_cooldown_ms: 180_000.0,
            min_ecosystem_age_ms: 120_000.0,
            min_population: 20,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConstellationConfig {
    pub enabled: bool,
    pub chance: f64,
    pub min_members: usize,
    pub max_members: usize,
    pub radius: f64,
    pub duration_ms: f64,
    pub glow_boost: f64,
    pub twinkle_speed: f64,
    pub twinkle_intensity: f64,
    pub max_active: usize,
    pub forming_ms: f64,
    pub forming_tolerance: f64,
    pub forming_force: f64,
    pub forming_damping: f64,
    pub holding_force: f64,
    pub holding_damping: f64,
    pub min_drift: f64,
    pub max_drift: f64,
    pub signal_chance: f64,
    pub signal_cooldown_ms: f64,
    pub response_min_ms: f64,
    pub response_max_ms: f64,
    pub pulse_ms: f64,
    pub dispersing_ms: f64,
    /// Formations with fewer live members dissolve.
    pub min_live_members: usize,
}

impl Default for ConstellationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chance: 0.0003,
            min_members: 4,
            max_members: 7,
            radius: 100.0,
            duration_ms: 4000.0,
            glow_boost: 1.5,
            twinkle_speed: 0.003,
            twinkle_intensity: 0.4,
            max_active: 2,
            forming_ms: 1500.0,
            forming_tolerance: 10.0,
            forming_force: 0.08,
            forming_damping: 0.9,
            holding_force: 0.03,
            holding_damping: 0.92,
            min_drift: 0.3,
            max_drift: 0.7,
            signal_chance: 0.01,
            signal_cooldown_ms: 2000.0,
            response_min_ms: 300.0,
            response_max_ms: 500.0,
            pulse_ms: 800.0,
            dispersing_ms: 500.0,
            min_live_members: 3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PersonalityConfig {
    pub enabled: bool,
    /// Per mature agent per tick, multiplied by `assignment_scale`.
    pub assignment_chance: f64,
    pub assignment_scale: f64,
    pub duration_ms: f64,
    pub duration_jitter_ms: f64,
    pub dominant_house: Option<House>,
    pub dominant_weight: f64,
    pub web_radius: f64,
    pub web_links: usize,
    pub web_force: f64,
    pub shield_radius: f64,
    pub shield_weak_energy: f64,
    pub shield_force: f64,
    pub shield_follow_distance: f64,
    pub shield_transfer_radius: f64,
    pub shield_transfer: f64,
    pub shield_min_energy: f64,
    pub forge_mark_chance: f64,
    pub forge_mark_ttl_ms: f64,
    pub script_cycle_ms: f64,
    pub script_force: f64,
    pub cloud_lift: f64,
    pub cloud_opacity: f64,
    pub dark_stealth_ms: f64,
    pub dark_cycle_ms: f64,
    pub dark_repel_radius: f64,
    pub dark_repel_force: f64,
}

impl Default for PersonalityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assignment_chance: 0.15,
            assignment_scale: 0.01,
            duration_ms: 30_000.0,
            duration_jitter_ms: 10_000.0,
            dominant_house: None,
            dominant_weight: 0.6,
            web_radius: 120.0,
            web_links: 3,
            web_force: 0.01,
            shield_radius: 160.0,
            shield_weak_energy: 50.0,
            shield_force: 0.03,
            shield_follow_distance: 30.0,
            shield_transfer_radius: 40.0,
            shield_transfer: 0.1,
            shield_min_energy: 60.0,
            forge_mark_chance: 0.01,
            forge_mark_ttl_ms: 45_000.0,
            script_cycle_ms: 5000.0,
            script_force: 0.02,
            cloud_lift: -0.003,
            cloud_opacity: 0.6,
            dark_stealth_ms: 3000.0,
            dark_cycle_ms: 8000.0,
            dark_repel_radius: 100.0,
            dark_repel_force: 0.02,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReproductionConfig {
    pub enabled: bool,
    pub min_energy: f64,
    pub min_mature_age_ms: f64,
    pub min_tier: u8,
    pub cooldown_ms: f64,
    pub chance: f64,
    pub energy_cost: f64,
    pub offspring_energy_fraction: f64,
    pub spawn_offset: f64,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_energy: 85.0,
            min_mature_age_ms: 20_000.0,
            min_tier: 1,
            cooldown_ms: 30_000.0,
            chance: 0.0002,
            energy_cost: 60.0,
            offspring_energy_fraction: 0.4,
            spawn_offset: 30.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    pub enabled: bool,
    pub separation_radius: f64,
    pub separation_force: f64,
    pub alignment_radius: f64,
    pub alignment_force: f64,
    pub cohesion_radius: f64,
    pub cohesion_force: f64,
    pub formation_chance: f64,
    pub min_members: usize,
    pub formation_radius: f64,
    pub duration_ms: f64,
    pub speed_boost: f64,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            separation_radius: 25.0,
            separation_force: 0.04,
            alignment_radius: 60.0,
            alignment_force: 0.02,
            cohesion_radius: 80.0,
            cohesion_force: 0.015,
            formation_chance: 0.001,
            min_members: 4,
            formation_radius: 120.0,
            duration_ms: 8000.0,
            speed_boost: 1.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RareConfig {
    pub enabled: bool,
    pub golden_chance: f64,
    pub diamond_chance: f64,
    pub glitch_chance: f64,
    pub ancient_age_ms: f64,
    pub ancient_chance: f64,
    pub golden_attract_radius: f64,
    pub golden_attract_force: f64,
    pub golden_feed_radius: f64,
    pub golden_feed: f64,
    pub diamond_shield_radius: f64,
    pub glitch_teleport_chance: f64,
    pub glitch_teleport_range: f64,
    pub ancient_share_radius: f64,
    pub ancient_share: f64,
    pub ancient_speed: f64,
}

impl Default for RareConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            golden_chance: 0.02,
            diamond_chance: 0.02,
            glitch_chance: 0.01,
            ancient_age_ms: 60_000.0,
            ancient_chance: 0.001,
            golden_attract_radius: 150.0,
            golden_attract_force: 0.003,
            golden_feed_radius: 80.0,
            golden_feed: 0.05,
            diamond_shield_radius: 60.0,
            glitch_teleport_chance: 0.003,
            glitch_teleport_range: 200.0,
            ancient_share_radius: 100.0,
            ancient_share: 0.05,
            ancient_speed: 0.6,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlanetConfig {
    pub enabled: bool,
    pub max_planets: usize,
    pub orbit_radius: f64,
    pub min_orbit_speed: f64,
    pub max_orbit_speed: f64,
    pub maturing_ms: f64,
    pub null_radius: f64,
    pub null_healing: f64,
    pub null_time_dilation: f64,
    pub unity_radius: f64,
    pub unity_healing: f64,
    pub unity_speed: f64,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_planets: 5,
            orbit_radius: 180.0,
            min_orbit_speed: 0.0003,
            max_orbit_speed: 0.0005,
            maturing_ms: 3000.0,
            null_radius: 120.0,
            null_healing: 0.5,
            null_time_dilation: 0.4,
            unity_radius: 100.0,
            unity_healing: 0.8,
            unity_speed: 1.5,
        }
    }
}

/// Stationary energy sources agents forage from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnergyWellConfig {
    pub enabled: bool,
    /// Kinds placed at start, by name.
    pub initial: Vec<String>,
    pub max_wells: usize,
    /// Per-frame chance of a new well while below `max_wells`.
    pub spawn_chance: f64,
    /// Kinds drawn from for random spawns.
    pub kinds: Vec<String>,
    pub base_size: f64,
    pub birth_ms: f64,
    pub depleted_ms: f64,
    /// Share of capacity a depleted well comes back with.
    pub restore_fraction: f64,
}

impl Default for EnergyWellConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial: vec!["standard".to_string()],
            max_wells: 3,
            spawn_chance: 0.0005,
            kinds: vec![
                "standard".to_string(),
                "volatile".to_string(),
                "ancient".to_string(),
            ],
            base_size: 25.0,
            birth_ms: 2000.0,
            depleted_ms: 5000.0,
            restore_fraction: 0.3,
        }
    }
}

/// Rolls for solar flares and void storms.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CosmicConfig {
    pub enabled: bool,
    pub check_interval_ms: f64,
    /// Chance that a check starts anything at all.
    pub base_chance: f64,
    pub max_concurrent: usize,
    /// Energy a flare wave gives each agent it passes, at full intensity.
    pub flare_energy: f64,
    /// Height of the flare wave band.
    pub flare_band: f64,
    /// Chance that a tier 2+ agent hit by the wave earns an evolution point, at full intensity.
    pub flare_evolution_chance: f64,
    pub vortex_min_radius: f64,
    pub vortex_max_radius: f64,
    pub vortex_min_life_ms: f64,
    pub vortex_max_life_ms: f64,
    /// Per-frame chance, at full intensity, that an agent near a vortex core is marked.
    pub void_touch_chance: f64,
    pub void_resistance: f64,
}

impl Default for CosmicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_ms: 15_000.0,
            base_chance: 0.06,
            max_concurrent: 2,
            flare_energy: 20.0,
            flare_band: 200.0,
            flare_evolution_chance: 0.1,
            vortex_min_radius: 80.0,
            vortex_max_radius: 200.0,
            vortex_min_life_ms: 3000.0,
            vortex_max_life_ms: 8000.0,
            void_touch_chance: 0.001,
            void_resistance: 0.3,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub enabled: bool,
    pub day_length_ms: f64,
    /// Normalised time of day at start.
    pub start_time: f64,
    pub weather_change_chance: f64,
    pub awakening_energy: f64,
    pub gathering_ms: f64,
    pub gathering_cohesion: f64,
    pub inactivity_ms: f64,
    pub autonomy_boost: f64,
    pub wander_chance: f64,
    pub wander_force: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            day_length_ms: 120_000.0,
            start_time: 0.75,
            weather_change_chance: 0.0001,
            awakening_energy: 20.0,
            gathering_ms: 10_000.0,
            gathering_cohesion: 2.0,
            inactivity_ms: 5000.0,
            autonomy_boost: 1.5,
            wander_chance: 0.002,
            wander_force: 0.02,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    pub attraction_radius: f64,
    pub attraction_force: f64,
    pub repel_force: f64,
    pub drag_width: f64,
    pub drag_force: f64,
    pub drag_persistence_ms: f64,
    pub drag_max_points: usize,
    pub spawn_cooldown_ms: f64,
    pub hold_charge_ms: f64,
    pub burst_radius: f64,
    pub burst_force: f64,
    pub burst_min_charge: f64,
    pub passive_force: f64,
    pub tap_ms: f64,
    pub long_press_ms: f64,
    /// Star strikes land within this multiple of the event horizon.
    pub strike_reach: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            attraction_radius: 150.0,
            attraction_force: 0.08,
            repel_force: 0.12,
            drag_width: 100.0,
            drag_force: 0.05,
            drag_persistence_ms: 500.0,
            drag_max_points: 50,
            spawn_cooldown_ms: 500.0,
            hold_charge_ms: 1500.0,
            burst_radius: 200.0,
            burst_force: 0.3,
            burst_min_charge: 0.8,
            passive_force: 0.002,
            tap_ms: 300.0,
            long_press_ms: 800.0,
            strike_reach: 2.0,
        }
    }
}

/// What the binary digit does. It never touches trait values.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DigitConvention {
    pub flicker_enabled: bool,
    pub flicker_spawning: f64,
    pub flicker_mature: f64,
    pub flicker_desperation: f64,
    /// Meals of this digit grow the gravity well; the other digit shrinks it.
    pub gravity_growth_digit: Digit,
    pub shadow_target_digit: Digit,
    pub collision_rules: bool,
}

impl Default for DigitConvention {
    fn default() -> Self {
        Self {
            flicker_enabled: true,
            flicker_spawning: 0.0005,
            flicker_mature: 0.0003,
            flicker_desperation: 0.003,
            gravity_growth_digit: Digit::One,
            shadow_target_digit: Digit::Zero,
            collision_rules: true,
        }
    }
}

/// Root configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub arena: ArenaConfig,
    pub agent: AgentConfig,
    pub genetics: GeneticsConfig,
    pub pheromones: PheromoneConfig,
    pub gravity_well: GravityWellConfig,
    pub hunters: HunterConfig,
    pub shadows: ShadowConfig,
    pub serpent: SerpentConfig,
    pub constellation: ConstellationConfig,
    pub personality: PersonalityConfig,
    pub reproduction: ReproductionConfig,
    pub swarm: SwarmConfig,
    pub rare: RareConfig,
    pub planets: PlanetConfig,
    pub energy_wells: EnergyWellConfig,
    pub cosmic: CosmicConfig,
    pub environment: EnvironmentConfig,
    pub interaction: InteractionConfig,
    pub digit: DigitConvention,
}

fn unit(v: f64) -> bool {
    (0.0..=1.0).contains(&v)
}

impl AppConfig {
    /// Validates all configuration parameters, reporting the first failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        let a = &self.arena;
        anyhow::ensure!(a.width > 0.0 && a.height > 0.0, "Arena size must be positive");
        anyhow::ensure!(
            a.width <= 100_000.0 && a.height <= 100_000.0,
            "Arena too large (max 100000 px per side)"
        );
        anyhow::ensure!(a.cell_size > 0.0, "Arena cell size must be positive");
        anyhow::ensure!(
            a.min_population <= a.max_population,
            "Minimum population must not exceed maximum population"
        );
        anyhow::ensure!(
            a.initial_population <= a.max_population,
            "Initial population must not exceed maximum population"
        );
        anyhow::ensure!(unit(a.replacement_rate), "Replacement rate must be in [0.0, 1.0]");
        anyhow::ensure!(a.max_dt_ms > 0.0, "Max tick duration must be positive");

        let ag = &self.agent;
        anyhow::ensure!(
            ag.birth_ms >= 0.0 && ag.growth_ms >= 0.0 && ag.dying_ms >= 0.0,
            "Lifecycle durations must be non-negative"
        );
        anyhow::ensure!(
            ag.min_base_speed > 0.0 && ag.min_base_speed <= ag.max_base_speed,
            "Base speed range must be positive and ordered"
        );
        anyhow::ensure!(
            ag.min_max_age_ms > 0.0 && ag.min_max_age_ms <= ag.max_max_age_ms,
            "Max age range must be positive and ordered"
        );
        anyhow::ensure!(ag.energy_decay >= 0.0, "Energy decay must be non-negative");
        anyhow::ensure!(ag.collision_radius >= 0.0, "Collision radius must be non-negative");
        anyhow::ensure!(
            unit(ag.overspeed_damping),
            "Overspeed damping must be in [0.0, 1.0]"
        );

        let g = &self.genetics;
        anyhow::ensure!(
            unit(g.global_mutation_rate),
            "Global mutation rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(unit(g.mutation_cap), "Mutation cap must be in [0.0, 1.0]");
        anyhow::ensure!(
            g.near_well_multiplier >= 0.0
                && g.ancient_well_multiplier >= 0.0
                && g.cosmic_event_multiplier >= 0.0,
            "Environmental mutation multipliers must be non-negative"
        );
        anyhow::ensure!(unit(g.dominant_weight), "Dominant weight must be in [0.0, 1.0]");
        anyhow::ensure!(g.blend_noise >= 0.0, "Blend noise must be non-negative");
        anyhow::ensure!(g.lineage_capacity > 0, "Lineage capacity must be positive");
        anyhow::ensure!(
            g.eviction_fraction > 0.0 && g.eviction_fraction <= 1.0,
            "Eviction fraction must be in (0.0, 1.0]"
        );

        let p = &self.pheromones;
        anyhow::ensure!(p.cell_size > 0.0, "Pheromone cell size must be positive");
        anyhow::ensure!(p.max_trails_per_cell > 0, "Trails per cell must be positive");
        anyhow::ensure!(p.merge_radius >= 0.0, "Merge radius must be non-negative");
        anyhow::ensure!(unit(p.path_deposit_chance), "Path deposit chance must be in [0.0, 1.0]");

        let w = &self.gravity_well;
        anyhow::ensure!(
            w.min_size > 0.0 && w.min_size <= w.base_size && w.base_size <= w.max_size,
            "Gravity well sizes must satisfy 0 < min <= base <= max"
        );
        anyhow::ensure!(w.max_health > 0.0, "Gravity well health must be positive");
        anyhow::ensure!(unit(w.planet_shield), "Planet shield must be in [0.0, 1.0]");

        let h = &self.hunters;
        for name in &h.initial {
            name.parse::<firefly_data::HunterKind>()?;
        }
        anyhow::ensure!(
            h.patrol_wait_min_ms <= h.patrol_wait_max_ms,
            "Patrol wait range must be ordered"
        );
        anyhow::ensure!(unit(h.friction), "Hunter friction must be in [0.0, 1.0]");
        anyhow::ensure!(unit(h.wake_fraction), "Wake fraction must be in [0.0, 1.0]");
        anyhow::ensure!(unit(h.diamond_shield), "Diamond shield must be in [0.0, 1.0]");
        anyhow::ensure!(
            h.recover_prey_count <= h.retreat_prey_count,
            "Retreat recovery count must not exceed the retreat threshold"
        );

        let s = &self.shadows;
        anyhow::ensure!(unit(s.spawn_chance), "Shadow spawn chance must be in [0.0, 1.0]");
        anyhow::ensure!(
            unit(s.conversion_chance),
            "Shadow conversion chance must be in [0.0, 1.0]"
        );
        anyhow::ensure!(s.touches_to_purify > 0, "Touches to purify must be positive");
        anyhow::ensure!(unit(s.gravity_immunity), "Gravity immunity must be in [0.0, 1.0]");

        let sp = &self.serpent;
        anyhow::ensure!(sp.segments > 0, "Serpent needs at least one segment");
        anyhow::ensure!(
            sp.min_lifespan_ms <= sp.max_lifespan_ms,
            "Serpent lifespan range must be ordered"
        );
        anyhow::ensure!(unit(sp.spring), "Serpent spring must be in [0.0, 1.0]");

        let c = &self.constellation;
        anyhow::ensure!(unit(c.chance), "Constellation chance must be in [0.0, 1.0]");
        anyhow::ensure!(
            c.min_members >= 3 && c.min_members <= c.max_members && c.max_members <= 7,
            "Constellation members must satisfy 3 <= min <= max <= 7"
        );
        anyhow::ensure!(
            c.min_live_members <= c.min_members,
            "Minimum live members must not exceed minimum members"
        );
        anyhow::ensure!(
            c.response_min_ms <= c.response_max_ms && c.min_drift <= c.max_drift,
            "Constellation ranges must be ordered"
        );

        let pe = &self.personality;
        anyhow::ensure!(
            unit(pe.assignment_chance * pe.assignment_scale),
            "House assignment chance must be in [0.0, 1.0]"
        );
        anyhow::ensure!(unit(pe.dominant_weight), "Dominant weight must be in [0.0, 1.0]");
        anyhow::ensure!(pe.script_cycle_ms > 0.0, "Script cycle must be positive");
        anyhow::ensure!(
            pe.dark_stealth_ms <= pe.dark_cycle_ms && pe.dark_cycle_ms > 0.0,
            "Stealth window must fit inside its cycle"
        );

        let r = &self.reproduction;
        anyhow::ensure!(unit(r.chance), "Reproduction chance must be in [0.0, 1.0]");
        anyhow::ensure!(r.energy_cost >= 0.0, "Reproduction cost must be non-negative");
        anyhow::ensure!(
            unit(r.offspring_energy_fraction),
            "Offspring energy fraction must be in [0.0, 1.0]"
        );
        anyhow::ensure!(r.min_tier <= 4, "Reproduction tier must be in [0, 4]");

        let sw = &self.swarm;
        anyhow::ensure!(unit(sw.formation_chance), "Swarm chance must be in [0.0, 1.0]");
        anyhow::ensure!(sw.min_members >= 2, "Swarms need at least two members");

        let ra = &self.rare;
        anyhow::ensure!(
            ra.golden_chance + ra.diamond_chance + ra.glitch_chance <= 1.0,
            "Rare variant chances must sum to at most 1.0"
        );
        anyhow::ensure!(unit(ra.ancient_chance), "Ancient chance must be in [0.0, 1.0]");

        let pl = &self.planets;
        anyhow::ensure!(
            pl.min_orbit_speed <= pl.max_orbit_speed,
            "Planet orbit speed range must be ordered"
        );
        anyhow::ensure!(
            pl.null_time_dilation > 0.0 && pl.null_time_dilation <= 1.0,
            "Time dilation must be in (0.0, 1.0]"
        );

        let ew = &self.energy_wells;
        for name in ew.initial.iter().chain(&ew.kinds) {
            name.parse::<firefly_data::EnergyWellKind>()?;
        }
        anyhow::ensure!(unit(ew.spawn_chance), "Well spawn chance must be in [0.0, 1.0]");
        anyhow::ensure!(ew.base_size > 0.0, "Well size must be positive");
        anyhow::ensure!(
            unit(ew.restore_fraction),
            "Well restore fraction must be in [0.0, 1.0]"
        );

        let co = &self.cosmic;
        anyhow::ensure!(co.check_interval_ms > 0.0, "Cosmic check interval must be positive");
        anyhow::ensure!(unit(co.base_chance), "Cosmic chance must be in [0.0, 1.0]");
        anyhow::ensure!(
            co.vortex_min_radius > 0.0 && co.vortex_min_radius <= co.vortex_max_radius,
            "Vortex radius range must be positive and ordered"
        );
        anyhow::ensure!(
            co.vortex_min_life_ms <= co.vortex_max_life_ms,
            "Vortex lifetime range must be ordered"
        );
        anyhow::ensure!(
            unit(co.flare_evolution_chance) && unit(co.void_touch_chance),
            "Cosmic chances must be in [0.0, 1.0]"
        );

        let e = &self.environment;
        anyhow::ensure!(e.day_length_ms > 0.0, "Day length must be positive");
        anyhow::ensure!(
            (0.0..1.0).contains(&e.start_time),
            "Start time must be in [0.0, 1.0)"
        );
        anyhow::ensure!(
            unit(e.weather_change_chance),
            "Weather change chance must be in [0.0, 1.0]"
        );

        let i = &self.interaction;
        anyhow::ensure!(i.attraction_radius > 0.0, "Attraction radius must be positive");
        anyhow::ensure!(i.hold_charge_ms > 0.0, "Hold charge time must be positive");
        anyhow::ensure!(unit(i.burst_min_charge), "Burst charge must be in [0.0, 1.0]");

        let d = &self.digit;
        anyhow::ensure!(
            unit(d.flicker_spawning) && unit(d.flicker_mature + d.flicker_desperation),
            "Flicker chances must be in [0.0, 1.0]"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Digest of the behaviour-relevant sections. The seed is left out.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.agent).as_bytes());
        hasher.update(format!("{:?}", self.genetics).as_bytes());
        hasher.update(format!("{:?}", self.pheromones).as_bytes());
        hasher.update(format!("{:?}", self.gravity_well).as_bytes());
        hasher.update(format!("{:?}", self.hunters).as_bytes());
        hasher.update(format!("{:?}", self.shadows).as_bytes());
        hasher.update(format!("{:?}", self.serpent).as_bytes());
        hasher.update(format!("{:?}", self.constellation).as_bytes());
        hasher.update(format!("{:?}", self.personality).as_bytes());
        hasher.update(format!("{:?}", self.reproduction).as_bytes());
        hasher.update(format!("{:?}", self.swarm).as_bytes());
        hasher.update(format!("{:?}", self.rare).as_bytes());
        hasher.update(format!("{:?}", self.planets).as_bytes());
        hasher.update(format!("{:?}", self.energy_wells).as_bytes());
        hasher.update(format!("{:?}", self.cosmic).as_bytes());
        hasher.update(format!("{:?}", self.environment).as_bytes());
        hasher.update(format!("{:?}", self.digit).as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_population_bounds() {
        let config = AppConfig {
            arena: ArenaConfig {
                min_population: 60,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mutation_rate() {
        let config = AppConfig {
            genetics: GeneticsConfig {
                global_mutation_rate: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_hunter_name_rejected() {
        let config = AppConfig {
            hunters: HunterConfig {
                initial: vec!["kraken".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("kraken"));
    }

    #[test]
    fn test_unknown_well_kind_rejected() {
        let config = AppConfig::from_toml("[energy_wells]\nkinds = [\"standard\", \"geyser\"]\n");
        let err = config.unwrap_err();
        assert!(err.to_string().contains("geyser"));
    }

    #[test]
    fn test_gravity_well_sizes_ordered() {
        let config = AppConfig {
            gravity_well: GravityWellConfig {
                base_size: 200.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_overrides_only_named_fields() {
        let config = AppConfig::from_toml(
            r#"
            [arena]
            seed = 7
            width = 640.0

            [personality]
            dominant_house = "dark_arts"

            [digit]
            gravity_growth_digit = "0"
            "#,
        )
        .expect("valid toml");
        assert_eq!(config.arena.seed, Some(7));
        assert_eq!(config.arena.width, 640.0);
        assert_eq!(config.arena.height, ArenaConfig::default().height);
        assert_eq!(config.personality.dominant_house, Some(House::DarkArts));
        assert_eq!(config.digit.gravity_growth_digit, Digit::Zero);
        assert_eq!(config.agent, AgentConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        assert!(AppConfig::from_toml("[constellation]\nmin_members = 2\n").is_err());
    }

    #[test]
    fn test_fingerprint_ignores_seed() {
        let mut a = AppConfig::default();
        let b = AppConfig::default();
        a.arena.seed = Some(99);
        assert_eq!(a.fingerprint(), b.fingerprint());
        a.genetics.global_mutation_rate = 0.3;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
