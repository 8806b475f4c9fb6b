//! Server configuration from environment.

use std::env;
use std::time::Duration;

use land_core::CYCLE_PERIOD;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    /// Land detector cycle period (ms)
    pub cycle_ms: u64,
    /// Parameter persistence flush interval (s)
    pub param_flush_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_path: "data/land_detector.db".to_string(),
            database_max_connections: 4,
            cycle_ms: CYCLE_PERIOD.as_millis() as u64,
            param_flush_secs: 1,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_parse("LAND_PORT").unwrap_or(defaults.server_port),
            database_path: env::var("LAND_DATABASE_PATH").unwrap_or(defaults.database_path),
            database_max_connections: env_parse("LAND_DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database_max_connections),
            cycle_ms: env_parse("LAND_CYCLE_MS").unwrap_or(defaults.cycle_ms),
            param_flush_secs: env_parse("LAND_PARAM_FLUSH_SECS")
                .unwrap_or(defaults.param_flush_secs),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_ms == 0 {
            return Err(ConfigError::Zero { key: "LAND_CYCLE_MS" });
        }
        if self.param_flush_secs == 0 {
            return Err(ConfigError::Zero { key: "LAND_PARAM_FLUSH_SECS" });
        }
        if self.database_max_connections == 0 {
            return Err(ConfigError::Zero { key: "LAND_DATABASE_MAX_CONNECTIONS" });
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "LAND_DATABASE_PATH",
                value: self.database_path.clone(),
            });
        }
        Ok(())
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_ms)
    }

    pub fn param_flush_interval(&self) -> Duration {
        Duration::from_secs(self.param_flush_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}, using default", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
        assert_eq!(Config::default().cycle_period(), CYCLE_PERIOD);
        assert_eq!(CYCLE_PERIOD, Duration::from_millis(50));
    }

    #[test]
    fn zero_cycle_rejected() {
        let config = Config {
            cycle_ms: 0,
            ..Config::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero { key: "LAND_CYCLE_MS" })
        );
    }

    #[test]
    fn blank_database_path_rejected() {
        let config = Config {
            database_path: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "LAND_DATABASE_PATH", .. })
        ));
    }
}
