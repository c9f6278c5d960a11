use std::str::FromStr;
use std::time::Duration;

use crate::game::constants::{flee, grid, split};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("bucket_edge ({bucket_edge}) must not exceed the board size ({width}x{height})")]
    BucketLargerThanBoard {
        bucket_edge: f32,
        width: f32,
        height: f32,
    },
}

/// Navigation and decision tunables
#[derive(Debug, Clone, PartialEq)]
pub struct BotConfig {
    /// World units per cost-grid bucket edge
    pub bucket_edge: f32,
    /// Cost at or above which a bucket is impassable
    pub do_not_pass: f32,
    /// Minimum time between two split commands
    pub split_cooldown: Duration,
    /// Distance of the flee target along the reflected bearing
    pub flee_distance: f32,
    /// Look-ahead distance multiplier applied to `bucket_edge`
    pub lookahead_factor: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bucket_edge: grid::BUCKET_EDGE,
            do_not_pass: grid::DO_NOT_PASS,
            split_cooldown: Duration::from_millis(split::COOLDOWN_MS),
            flee_distance: flee::DISTANCE,
            lookahead_factor: grid::LOOKAHEAD_FACTOR,
        }
    }
}

impl BotConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(edge) = env_positive::<f32>("BOT_BUCKET_EDGE") {
            config.bucket_edge = edge;
        }
        if let Some(threshold) = env_positive::<f32>("BOT_DO_NOT_PASS") {
            config.do_not_pass = threshold;
        }
        if let Some(ms) = env_parse::<u64>("BOT_SPLIT_COOLDOWN_MS") {
            config.split_cooldown = Duration::from_millis(ms);
        }
        if let Some(distance) = env_positive::<f32>("BOT_FLEE_DISTANCE") {
            config.flee_distance = distance;
        }
        if let Some(factor) = env_positive::<f32>("BOT_LOOKAHEAD_FACTOR") {
            config.lookahead_factor = factor;
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("bucket_edge", self.bucket_edge as f64)?;
        positive("do_not_pass", self.do_not_pass as f64)?;
        positive("flee_distance", self.flee_distance as f64)?;
        positive("lookahead_factor", self.lookahead_factor as f64)?;
        Ok(())
    }

    /// Distance below which the bot steers straight at its objective
    #[inline]
    pub fn direct_move_distance(&self, own_size: i32) -> f32 {
        own_size as f32 + self.bucket_edge * self.lookahead_factor
    }
}

/// Local arena settings for the headless driver
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxConfig {
    pub width: f32,
    pub height: f32,
    pub food_count: usize,
    pub player_count: usize,
    pub virus_count: usize,
    /// Fixed RNG seed; random when unset
    pub seed: Option<u64>,
    /// Ticks per second
    pub tick_rate: u32,
    /// Metrics endpoint port, 0 disables it
    pub metrics_port: u16,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            width: 11_180.0,
            height: 11_180.0,
            food_count: 500,
            player_count: 24,
            virus_count: 12,
            seed: None,
            tick_rate: 25,
            metrics_port: 9090,
        }
    }
}

impl SandboxConfig {
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Some(width) = env_positive::<f32>("SANDBOX_WIDTH") {
            config.width = width;
        }
        if let Some(height) = env_positive::<f32>("SANDBOX_HEIGHT") {
            config.height = height;
        }
        if let Some(count) = env_parse::<usize>("SANDBOX_FOOD") {
            config.food_count = count;
        }
        if let Some(count) = env_parse::<usize>("SANDBOX_PLAYERS") {
            config.player_count = count;
        }
        if let Some(count) = env_parse::<usize>("SANDBOX_VIRUSES") {
            config.virus_count = count;
        }
        if let Some(seed) = env_parse::<u64>("SANDBOX_SEED") {
            config.seed = Some(seed);
        }
        if let Some(rate) = env_parse::<u32>("SANDBOX_TICK_RATE") {
            if (1..=240).contains(&rate) {
                config.tick_rate = rate;
            } else {
                tracing::warn!("SANDBOX_TICK_RATE must be 1-240, using default");
            }
        }
        if let Some(port) = env_parse::<u16>("METRICS_PORT") {
            config.metrics_port = port;
        }

        config
    }

    pub fn validate(&self, bot: &BotConfig) -> Result<(), ConfigError> {
        positive("width", self.width as f64)?;
        positive("height", self.height as f64)?;
        positive("tick_rate", self.tick_rate as f64)?;
        if bot.bucket_edge > self.width || bot.bucket_edge > self.height {
            return Err(ConfigError::BucketLargerThanBoard {
                bucket_edge: bot.bucket_edge,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate.max(1) as u64)
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!("Invalid {} '{}', using default", key, raw);
            None
        }
    }
}

fn env_positive<T: FromStr + PartialOrd + Default>(key: &str) -> Option<T> {
    let parsed = env_parse::<T>(key)?;
    if parsed > T::default() {
        Some(parsed)
    } else {
        tracing::warn!("{} must be > 0, using default", key);
        None
    }
}
