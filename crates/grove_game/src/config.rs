//! Simulation tunables. Every field has a default, so an empty JSON object is
//! a valid config file.

use std::path::Path;

use grove_core::ThresholdMetric;
use serde::Deserialize;

use crate::collision::PickupPolicy;
use crate::error::{read_json, LoadError};

#[derive(Debug, Clone, Deserialize)]
pub struct SimConfig {
    #[serde(default = "default_follow_strength")]
    pub follow_strength: f32,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: f32,
    #[serde(default = "default_gesture_threshold")]
    pub gesture_threshold: f32,
    #[serde(default)]
    pub gesture_metric: ThresholdMetric,
    #[serde(default = "default_player_speed")]
    pub player_speed: f32,
    #[serde(default = "default_player_size")]
    pub player_size: f32,
    #[serde(default = "default_sway_rate")]
    pub sway_rate: f32,
    #[serde(default = "default_sway_amplitude")]
    pub sway_amplitude: f32,
    #[serde(default = "default_loot_size")]
    pub loot_size: f32,
    #[serde(default = "default_tree_size")]
    pub tree_size: f32,
    #[serde(default)]
    pub pickup_policy: PickupPolicy,
    #[serde(default = "default_inventory_slots")]
    pub inventory_slots: usize,
    #[serde(default = "default_max_delta_ms")]
    pub max_delta_ms: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            follow_strength: default_follow_strength(),
            min_zoom: default_min_zoom(),
            chunk_size: default_chunk_size(),
            gesture_threshold: default_gesture_threshold(),
            gesture_metric: ThresholdMetric::default(),
            player_speed: default_player_speed(),
            player_size: default_player_size(),
            sway_rate: default_sway_rate(),
            sway_amplitude: default_sway_amplitude(),
            loot_size: default_loot_size(),
            tree_size: default_tree_size(),
            pickup_policy: PickupPolicy::default(),
            inventory_slots: default_inventory_slots(),
            max_delta_ms: default_max_delta_ms(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<SimConfig, LoadError> {
    let config: SimConfig = read_json(path)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &SimConfig) -> Result<(), LoadError> {
    let positive = [
        ("min_zoom", config.min_zoom),
        ("chunk_size", config.chunk_size),
        ("player_size", config.player_size),
        ("loot_size", config.loot_size),
        ("tree_size", config.tree_size),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(LoadError::Validation(format!(
                "Config validation failed: {name} must be a positive number, got {value}"
            )));
        }
    }

    let non_negative = [
        ("follow_strength", config.follow_strength),
        ("gesture_threshold", config.gesture_threshold),
        ("player_speed", config.player_speed),
        ("sway_rate", config.sway_rate),
        ("sway_amplitude", config.sway_amplitude),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(LoadError::Validation(format!(
                "Config validation failed: {name} must be >= 0, got {value}"
            )));
        }
    }

    if !config.max_delta_ms.is_finite() || config.max_delta_ms < 1.0 {
        return Err(LoadError::Validation(
            "Config validation failed: max_delta_ms must be >= 1".to_string(),
        ));
    }
    if config.inventory_slots == 0 {
        log::warn!("Config has zero inventory slots; loot can never be picked up");
    }
    Ok(())
}

const fn default_follow_strength() -> f32 {
    0.008
}

const fn default_min_zoom() -> f32 {
    0.1
}

const fn default_chunk_size() -> f32 {
    512.0
}

const fn default_gesture_threshold() -> f32 {
    grove_core::gesture::DEFAULT_MOVE_THRESHOLD
}

const fn default_player_speed() -> f32 {
    0.3
}

const fn default_player_size() -> f32 {
    128.0
}

const fn default_sway_rate() -> f32 {
    0.01
}

const fn default_sway_amplitude() -> f32 {
    0.08
}

const fn default_loot_size() -> f32 {
    48.0
}

const fn default_tree_size() -> f32 {
    196.0
}

const fn default_inventory_slots() -> usize {
    5
}

const fn default_max_delta_ms() -> f64 {
    250.0
}
