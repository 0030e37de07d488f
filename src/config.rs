//! Server Configuration
//!
//! Defaults describe the stock game: an 800x600 world on port 3000, 100 ms
//! ticks, a spawn every 2 s. Every value can be overridden from the
//! environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::game::combat::{LEGACY_HIT_RADIUS, POINTS_PER_KILL};
use crate::game::director::{DirectorConfig, ENEMY_SPEED};
use crate::game::map::WorldBounds;
use crate::game::tick::TickConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable did not parse.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// World dimensions.
    pub bounds: WorldBounds,
    /// Tick cadences.
    pub tick: TickConfig,
    /// Enemy step per movement tick.
    pub enemy_speed: f64,
    /// Radius of legacy position-based hits.
    pub hit_radius: f64,
    /// Score credited per kill.
    pub points_per_kill: u32,
    /// Accept legacy `bullet` hit reports.
    pub legacy_proximity_hits: bool,
    /// Fixed RNG seed; clock-seeded when `None`.
    pub rng_seed: Option<u64>,
    /// Outbound queue depth per connection.
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 1000,
            bounds: WorldBounds::default(),
            tick: TickConfig::default(),
            enemy_speed: ENEMY_SPEED,
            hit_radius: LEGACY_HIT_RADIUS,
            points_per_kill: POINTS_PER_KILL,
            legacy_proximity_hits: false,
            rng_seed: None,
            outbound_buffer: 64,
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `MYSTIC_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse(&lookup, "MYSTIC_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(max) = parse(&lookup, "MYSTIC_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(width) = parse(&lookup, "MYSTIC_WORLD_WIDTH")? {
            config.bounds.width = positive("MYSTIC_WORLD_WIDTH", width)?;
        }
        if let Some(height) = parse(&lookup, "MYSTIC_WORLD_HEIGHT")? {
            config.bounds.height = positive("MYSTIC_WORLD_HEIGHT", height)?;
        }
        if let Some(ms) = parse(&lookup, "MYSTIC_TICK_MS")? {
            config.tick.tick_interval = millis("MYSTIC_TICK_MS", ms)?;
        }
        if let Some(ms) = parse(&lookup, "MYSTIC_SPAWN_MS")? {
            config.tick.spawn_interval = millis("MYSTIC_SPAWN_MS", ms)?;
        }
        if let Some(ms) = parse(&lookup, "MYSTIC_BROADCAST_MS")? {
            config.tick.broadcast_interval = millis("MYSTIC_BROADCAST_MS", ms)?;
        }
        if let Some(speed) = parse(&lookup, "MYSTIC_ENEMY_SPEED")? {
            config.enemy_speed = positive("MYSTIC_ENEMY_SPEED", speed)?;
        }
        if let Some(radius) = parse(&lookup, "MYSTIC_HIT_RADIUS")? {
            config.hit_radius = positive("MYSTIC_HIT_RADIUS", radius)?;
        }
        if let Some(points) = parse(&lookup, "MYSTIC_POINTS_PER_KILL")? {
            config.points_per_kill = points;
        }
        if let Some(raw) = lookup("MYSTIC_LEGACY_PROXIMITY_HITS") {
            config.legacy_proximity_hits = parse_flag("MYSTIC_LEGACY_PROXIMITY_HITS", &raw)?;
        }
        if let Some(seed) = parse(&lookup, "MYSTIC_RNG_SEED")? {
            config.rng_seed = Some(seed);
        }
        if let Some(depth) = parse::<usize, _>(&lookup, "MYSTIC_OUTBOUND_BUFFER")? {
            if depth == 0 {
                return Err(invalid("MYSTIC_OUTBOUND_BUFFER", depth.to_string()));
            }
            config.outbound_buffer = depth;
        }

        Ok(config)
    }

    /// Enemy director settings derived from this config.
    pub fn director(&self) -> DirectorConfig {
        DirectorConfig {
            bounds: self.bounds,
            enemy_speed: self.enemy_speed,
        }
    }
}

fn invalid(var: &'static str, value: String) -> ConfigError {
    ConfigError::InvalidValue { var, value }
}

fn parse<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| invalid(var, raw)),
    }
}

fn positive(var: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(invalid(var, value.to_string()))
    }
}

fn millis(var: &'static str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(invalid(var, ms.to_string()));
    }
    Ok(Duration::from_millis(ms))
}

fn parse_flag(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(var, raw.to_string())),
    }
}
