use crate::agents::AgentStore;
use crate::config::EnvironmentConfig;
use crate::context::{Clock, TickOutput};
use firefly_data::{DayPeriod, EnvironmentSnapshot, LiveEvent, PeriodEvent, Vec2, Weather};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Day/night cycle, weather and the user-inactivity detector.
///
/// Runs first every tick. The rest of the tick reads the resulting
/// [`EnvironmentSnapshot`] rather than this struct.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Environment {
    pub enabled: bool,
    /// Normalised time of day in `[0, 1)`.
    pub time_of_day: f64,
    pub period: DayPeriod,
    pub weather: Weather,
    pub wind_angle: f64,
    /// Remaining gathering time.
    pub gathering_ms: f64,
    /// Simulated time since the last gateway event.
    pub idle_ms: f64,
    pub inactive: bool,
}

impl Environment {
    pub fn new(config: &EnvironmentConfig) -> Self {
        let time = config.start_time.rem_euclid(1.0);
        Self {
            enabled: config.enabled,
            time_of_day: time,
            period: DayPeriod::at(time),
            weather: Weather::Clear,
            wind_angle: 0.0,
            gathering_ms: 0.0,
            idle_ms: 0.0,
            inactive: false,
        }
    }

    /// Jumps to a normalised time without firing the period's entry event.
    pub fn set_time(&mut self, time: f64) {
        self.time_of_day = time.rem_euclid(1.0);
        self.period = DayPeriod::at(self.time_of_day);
    }

    /// Resets the inactivity timer. Called for every gateway event.
    pub fn register_activity(&mut self) {
        self.idle_ms = 0.0;
    }

    #[must_use]
    pub fn wind(&self) -> Vec2 {
        Vec2::from_angle(self.wind_angle) * self.weather.wind_strength()
    }

    #[must_use]
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        if !self.enabled {
            return EnvironmentSnapshot {
                time_of_day: self.time_of_day,
                period: self.period,
                ..EnvironmentSnapshot::default()
            };
        }
        EnvironmentSnapshot {
            time_of_day: self.time_of_day,
            period: self.period,
            weather: self.weather,
            wind: self.wind(),
            activity: self.period.activity(),
            glow: self.period.glow() * self.weather.visibility(),
            gathering: self.gathering_ms > 0.0,
            inactive: self.inactive,
        }
    }

    /// Advances the clock and weather, fires period events and scales every
    /// agent's activity and glow.
    pub fn update<R: Rng>(
        &mut self,
        config: &EnvironmentConfig,
        clock: Clock,
        agents: &mut AgentStore,
        rng: &mut R,
        out: &mut TickOutput,
    ) {
        if !self.enabled {
            return;
        }
        let dt = clock.dt_ms;
        self.gathering_ms = (self.gathering_ms - dt).max(0.0);

        if config.day_length_ms > 0.0 {
            self.time_of_day = (self.time_of_day + dt / config.day_length_ms).rem_euclid(1.0);
        }
        let period = DayPeriod::at(self.time_of_day);
        if period != self.period {
            self.period = period;
            tracing::info!(?period, tick = clock.tick, "Day period changed");
            out.emit(LiveEvent::PeriodChanged {
                period,
                tick: clock.tick,
            });
            match period.event() {
                Some(PeriodEvent::Awakening) => {
                    for agent in agents.iter_mut().filter(|a| a.is_mature()) {
                        agent.add_energy(config.awakening_energy);
                    }
                }
                Some(PeriodEvent::Gathering) => self.gathering_ms = config.gathering_ms,
                Some(PeriodEvent::Dreaming) | None => {}
            }
        }

        if rng.gen::<f64>() < config.weather_change_chance {
            let choices: Vec<Weather> = Weather::ALL
                .into_iter()
                .filter(|w| *w != self.weather)
                .collect();
            self.weather = choices[rng.gen_range(0..choices.len())];
            self.wind_angle = rng.gen_range(0.0..std::f64::consts::TAU);
            tracing::info!(weather = ?self.weather, tick = clock.tick, "Weather changed");
            out.emit(LiveEvent::WeatherChanged {
                weather: self.weather,
                tick: clock.tick,
            });
        }

        self.idle_ms += dt;
        let inactive = self.idle_ms >= config.inactivity_ms;
        if inactive != self.inactive {
            self.inactive = inactive;
            let boost = if inactive { config.autonomy_boost } else { 1.0 };
            for agent in agents.iter_mut().filter(|a| a.is_mature()) {
                agent.modifiers.autonomy_boost = boost;
            }
            tracing::debug!(inactive, "Autonomy mode toggled");
        }

        let activity = self.period.activity();
        let glow = self.period.glow() * self.weather.visibility();
        let frames = clock.frames();
        for agent in agents.iter_mut() {
            if !agent.state.is_present() {
                continue;
            }
            agent.modifiers.activity *= activity * agent.modifiers.autonomy_boost;
            agent.modifiers.glow *= glow;
            if self.inactive && agent.is_mature() && rng.gen::<f64>() < config.wander_chance {
                let angle = rng.gen_range(0.0..std::f64::consts::TAU);
                agent.apply_force(Vec2::from_angle(angle) * (config.wander_force * frames));
            }
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(&EnvironmentConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firefly_data::{Agent, Digit, LifeState};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use uuid::Uuid;

    fn world(energy: f64) -> AgentStore {
        let mut agents = AgentStore::new();
        let mut a = Agent::new(Uuid::from_u128(1), Vec2::new(10.0, 10.0), Digit::One);
        a.state = LifeState::Mature;
        a.energy = energy;
        agents.push(a);
        agents
    }

    fn step(env: &mut Environment, config: &EnvironmentConfig, dt: f64, agents: &mut AgentStore) -> TickOutput {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut out = TickOutput::default();
        env.update(config, Clock::new(1, 0.0, dt), agents, &mut rng, &mut out);
        out
    }

    #[test]
    fn test_dawn_awakens_mature_agents() {
        let config = EnvironmentConfig {
            weather_change_chance: 0.0,
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(&config);
        env.set_time(0.199);
        let mut agents = world(50.0);

        let out = step(&mut env, &config, 240.0, &mut agents);

        assert_eq!(env.period, DayPeriod::Dawn);
        assert_eq!(agents.as_slice()[0].energy, 70.0);
        assert!(matches!(
            out.events.as_slice(),
            [LiveEvent::PeriodChanged { period: DayPeriod::Dawn, .. }]
        ));
    }

    #[test]
    fn test_dusk_starts_gathering() {
        let config = EnvironmentConfig {
            weather_change_chance: 0.0,
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(&config);
        env.set_time(0.709);
        let mut agents = world(50.0);
        step(&mut env, &config, 240.0, &mut agents);
        assert!(env.snapshot().gathering);
        assert!((env.snapshot().activity - 1.2).abs() < 1e-12);

        step(&mut env, &config, 10_000.0, &mut agents);
        assert!(!env.snapshot().gathering);
    }

    #[test]
    fn test_inactivity_boosts_autonomy_until_activity() {
        let config = EnvironmentConfig {
            weather_change_chance: 0.0,
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(&config);
        let mut agents = world(50.0);

        step(&mut env, &config, 4000.0, &mut agents);
        assert!(!env.inactive);
        step(&mut env, &config, 1500.0, &mut agents);
        assert!(env.inactive);
        assert_eq!(agents.as_slice()[0].modifiers.autonomy_boost, 1.5);

        env.register_activity();
        step(&mut env, &config, 16.0, &mut agents);
        assert!(!env.inactive);
        assert_eq!(agents.as_slice()[0].modifiers.autonomy_boost, 1.0);
    }

    #[test]
    fn test_weather_change_always_differs() {
        let config = EnvironmentConfig {
            weather_change_chance: 1.0,
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(&config);
        let mut agents = AgentStore::new();
        for _ in 0..10 {
            let before = env.weather;
            let out = step(&mut env, &config, 16.0, &mut agents);
            assert_ne!(env.weather, before);
            assert!(out
                .events
                .iter()
                .any(|e| matches!(e, LiveEvent::WeatherChanged { .. })));
        }
    }

    #[test]
    fn test_disabled_environment_is_neutral() {
        let config = EnvironmentConfig {
            enabled: false,
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(&config);
        let mut agents = world(50.0);
        let out = step(&mut env, &config, 60_000.0, &mut agents);
        assert!(out.events.is_empty());
        let snap = env.snapshot();
        assert_eq!((snap.activity, snap.glow, snap.wind), (1.0, 1.0, Vec2::ZERO));
    }
}
