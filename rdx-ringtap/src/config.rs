//! Defines all configuration structures for a Ringtap session.
//!
//! `RingtapConfig` is the raw, deserializable form. It is typically layered
//! from an optional TOML file and `RINGTAP_*` environment variables with the
//! `config` crate. Before anything runs, it must pass `validate`, which yields
//! the `SessionConfig` the controller actually consumes. A config that fails
//! validation never starts a session.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prefix for environment variable overrides, e.g. `RINGTAP_TARGET_COUNT=7`.
pub const ENV_PREFIX: &str = "RINGTAP";

/// Errors that prevent a session from being constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target_count must be at least 1")]
    NoTargets,
    #[error("{field} must be a positive, finite number of seconds (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("min_active_time ({min}s) exceeds initial_active_time ({initial}s)")]
    WindowOrder { min: f64, initial: f64 },
    #[error("starting_lives must be at least 1")]
    NoLives,
    #[error("palette must contain at least one color")]
    EmptyPalette,
    #[error("a custom clock resolution needs a non-zero tick rate")]
    ZeroTickRate,
    #[error("{ticks_per_second} ticks per second is finer than the clock can resolve")]
    TickRateTooHigh { ticks_per_second: u64 },
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// The top-level configuration for a Ringtap session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RingtapConfig {
    /// The tick speed of the real-time `SystemClock`.
    pub resolution: ClockResolution,
    /// Number of targets in the pool.
    pub target_count: u8,
    /// Activation window of the first round, in seconds.
    pub initial_active_time: f64,
    /// The window never shrinks below this, in seconds.
    pub min_active_time: f64,
    /// How much the window shrinks after each survived round, in seconds.
    pub time_decay_per_round: f64,
    /// Quiet gap between a resolution and the next activation, in seconds.
    pub inter_round_pause: f64,
    /// How long each intro token is held, in seconds.
    pub intro_step_time: f64,
    pub starting_lives: u32,
    /// Fixed RNG seed for reproducible sessions. Random when absent.
    pub seed: Option<u64>,
    /// Accent colors; one is picked per session.
    pub palette: Vec<String>,
    /// Where the leaderboard is persisted. In-memory only when absent.
    pub highscore_path: Option<PathBuf>,
}

/// Defines the operational speed of the `SystemClock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockResolution {
    /// ~60 ticks per second. Suitable for real-time play.
    High,
    /// ~30 ticks per second.
    Medium,
    /// ~1 tick per second. Only useful for watching the state machine crawl.
    Low,
    /// A user-defined speed in ticks per second.
    Custom { ticks_per_second: u64 },
}

impl ClockResolution {
    pub fn ticks_per_second(self) -> u64 {
        match self {
            ClockResolution::High => 60,
            ClockResolution::Medium => 30,
            ClockResolution::Low => 1,
            ClockResolution::Custom { ticks_per_second } => ticks_per_second,
        }
    }

    /// Time between two ticks. `validate` rejects rates that make this zero.
    pub fn period(self) -> Duration {
        let rate = u32::try_from(self.ticks_per_second().max(1)).unwrap_or(u32::MAX);
        Duration::from_secs(1) / rate
    }
}

/// A validated session configuration with all timings as `Duration`s.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub target_count: u8,
    pub initial_active_time: Duration,
    pub min_active_time: Duration,
    pub time_decay_per_round: Duration,
    pub inter_round_pause: Duration,
    pub intro_step_time: Duration,
    pub starting_lives: u32,
    pub palette: Vec<String>,
}

// --- Default value functions ---

fn default_palette() -> Vec<String> {
    ["#ff4d6d", "#ffb703", "#06d6a0", "#118ab2", "#8338ec", "#fb5607"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

impl Default for RingtapConfig {
    fn default() -> Self {
        Self {
            resolution: ClockResolution::High,
            target_count: 5,
            initial_active_time: 1.5,
            min_active_time: 0.4,
            time_decay_per_round: 0.02,
            inter_round_pause: 0.4,
            intro_step_time: 0.75,
            starting_lives: 3,
            seed: None,
            palette: default_palette(),
            highscore_path: None,
        }
    }
}

impl RingtapConfig {
    /// Loads configuration from an optional TOML file, then applies
    /// `RINGTAP_*` environment overrides. Missing keys take their defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Parses configuration from TOML text, without environment overrides.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Checks every invariant and converts timings to `Duration`s.
    pub fn validate(&self) -> Result<SessionConfig, ConfigError> {
        if self.target_count == 0 {
            return Err(ConfigError::NoTargets);
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if self.palette.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        if self.resolution.ticks_per_second() == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.resolution.period().is_zero() {
            return Err(ConfigError::TickRateTooHigh {
                ticks_per_second: self.resolution.ticks_per_second(),
            });
        }

        let initial_active_time = positive_secs("initial_active_time", self.initial_active_time)?;
        let min_active_time = positive_secs("min_active_time", self.min_active_time)?;
        if min_active_time > initial_active_time {
            return Err(ConfigError::WindowOrder {
                min: self.min_active_time,
                initial: self.initial_active_time,
            });
        }

        Ok(SessionConfig {
            target_count: self.target_count,
            initial_active_time,
            min_active_time,
            time_decay_per_round: positive_secs("time_decay_per_round", self.time_decay_per_round)?,
            inter_round_pause: positive_secs("inter_round_pause", self.inter_round_pause)?,
            intro_step_time: positive_secs("intro_step_time", self.intro_step_time)?,
            starting_lives: self.starting_lives,
            palette: self.palette.clone(),
        })
    }
}

fn positive_secs(field: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::NonPositive { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let session = RingtapConfig::default().validate().expect("defaults are valid");
        assert_eq!(session.target_count, 5);
        assert_eq!(session.initial_active_time, Duration::from_millis(1_500));
        assert_eq!(session.min_active_time, Duration::from_millis(400));
        assert_eq!(session.time_decay_per_round, Duration::from_millis(20));
        assert_eq!(session.starting_lives, 3);
    }

    #[test]
    fn rejects_zero_targets() {
        let config = RingtapConfig {
            target_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoTargets)));
    }

    #[test]
    fn rejects_min_window_above_initial() {
        let config = RingtapConfig {
            min_active_time: 2.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::WindowOrder { .. })));
    }

    #[test]
    fn rejects_non_positive_and_non_finite_timings() {
        for (pause, decay) in [(0.0, 0.02), (-1.0, 0.02), (0.4, f64::NAN), (0.4, f64::INFINITY)] {
            let config = RingtapConfig {
                inter_round_pause: pause,
                time_decay_per_round: decay,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::NonPositive { .. })),
                "pause={pause} decay={decay}"
            );
        }
    }

    #[test]
    fn rejects_zero_lives_and_empty_palette() {
        let no_lives = RingtapConfig {
            starting_lives: 0,
            ..Default::default()
        };
        assert!(matches!(no_lives.validate(), Err(ConfigError::NoLives)));

        let no_colors = RingtapConfig {
            palette: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(no_colors.validate(), Err(ConfigError::EmptyPalette)));
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let config = RingtapConfig::from_toml_str(
            r#"
            target_count = 8
            starting_lives = 5
            resolution = "medium"
            seed = 42
            "#,
        )
        .expect("parses");
        assert_eq!(config.target_count, 8);
        assert_eq!(config.starting_lives, 5);
        assert_eq!(config.resolution, ClockResolution::Medium);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.initial_active_time, 1.5);
    }

    #[test]
    fn custom_resolution_period() {
        let res = ClockResolution::Custom { ticks_per_second: 120 };
        assert_eq!(res.period(), Duration::from_secs(1) / 120);
        assert_eq!(ClockResolution::Low.period(), Duration::from_secs(1));
    }

    #[test]
    fn rejects_tick_rates_the_clock_cannot_schedule() {
        let zero = RingtapConfig {
            resolution: ClockResolution::Custom { ticks_per_second: 0 },
            ..Default::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTickRate)));

        for ticks_per_second in [2_000_000_000, u64::from(u32::MAX) + 1, u64::MAX] {
            let config = RingtapConfig {
                resolution: ClockResolution::Custom { ticks_per_second },
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::TickRateTooHigh { .. })),
                "rate {ticks_per_second}"
            );
        }

        // One nanosecond per tick is still a real period.
        let finest = RingtapConfig {
            resolution: ClockResolution::Custom {
                ticks_per_second: 1_000_000_000,
            },
            ..Default::default()
        };
        assert!(finest.validate().is_ok());
        assert_eq!(finest.resolution.period(), Duration::from_nanos(1));
    }
}
