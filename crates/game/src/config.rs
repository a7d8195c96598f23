//! Game configuration files.
//!
//! Configuration is plain JSON. Missing fields fall back to their defaults,
//! and the player section is validated before it is handed to a controller.

use std::path::Path;

use serde::{Deserialize, Serialize};
use strider_physics::movement::ConfigError;
use strider_physics::PlayerConfig;
use thiserror::Error;

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid player config: {0}")]
    Invalid(#[from] ConfigError),
}

/// How server corrections are blended into a client's transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    /// Corrections farther than this snap instead of warping (meters).
    pub max_warp_distance: f32,

    /// Ticks a warp is spread over.
    pub warp_ticks: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            max_warp_distance: 3.0,
            warp_ticks: 3,
        }
    }
}

/// Everything a simulation needs, as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Movement physics configuration.
    pub player: PlayerConfig,

    pub replication: ReplicationConfig,

    /// Mouse sensitivity.
    pub mouse_sensitivity: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            player: PlayerConfig::default(),
            replication: ReplicationConfig::default(),
            mouse_sensitivity: 2.0,
        }
    }
}

impl SimulationConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        let config: Self = serde_json::from_str(json)?;
        config.player.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        log::debug!("loading config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read a bare player config file.
pub fn load_player_config(path: impl AsRef<Path>) -> Result<PlayerConfig, LoadError> {
    let json = std::fs::read_to_string(path)?;
    let config: PlayerConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = SimulationConfig::from_json("{}").unwrap();
        assert_eq!(config.player, PlayerConfig::default());
        assert_eq!(config.replication.warp_ticks, 3);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{ "player": { "mass": 120.0 }, "replication": { "max_warp_distance": 1.5 } }"#;
        let config = SimulationConfig::from_json(json).unwrap();
        assert_eq!(config.player.mass, 120.0);
        assert_eq!(config.player.max_forward_speed, PlayerConfig::default().max_forward_speed);
        assert_eq!(config.replication.max_warp_distance, 1.5);
        assert_eq!(config.replication.warp_ticks, 3);
    }

    #[test]
    fn test_json_round_trip() {
        let config = SimulationConfig {
            player: PlayerConfig::agile(),
            mouse_sensitivity: 2.0,
            ..Default::default()
        };
        let parsed = SimulationConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_player_rejected() {
        let err = SimulationConfig::from_json(r#"{ "player": { "mass": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, LoadError::Invalid(_)));

        let err = SimulationConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_player_config("/nonexistent/strider/player.json").unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
