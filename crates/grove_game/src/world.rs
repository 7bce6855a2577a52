use std::collections::HashSet;
use std::path::{Path, PathBuf};

use grove_core::math::Rect;
use serde::Deserialize;

use crate::entities::EntityKind;
use crate::error::{read_json, LoadError};

pub const WORLD_FILE_VERSION: &str = "0.1";

#[derive(Debug, Deserialize, Clone)]
pub struct WorldFile {
    pub version: String,
    pub world_id: String,
    #[serde(default)]
    pub bounds: Option<WorldBounds>,
    #[serde(default)]
    pub player: PlayerStart,
    #[serde(default)]
    pub camera: WorldCamera,
    #[serde(default)]
    pub trees: Vec<Placement>,
    #[serde(default)]
    pub loot: Vec<Placement>,
    #[serde(default)]
    pub sprites: Vec<SpriteAsset>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq)]
pub struct PlayerStart {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct WorldCamera {
    #[serde(default = "default_zoom")]
    pub zoom: f32,
    #[serde(default = "default_follow")]
    pub follow: bool,
}

impl Default for WorldCamera {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
            follow: default_follow(),
        }
    }
}

/// A tree or loot item. Missing sizes fall back to the per-kind default.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
}

impl Placement {
    pub fn rect(&self, default_size: f32) -> Rect {
        Rect::new(
            self.x,
            self.y,
            self.width.unwrap_or(default_size),
            self.height.unwrap_or(default_size),
        )
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SpriteAsset {
    pub kind: EntityKind,
    pub path: PathBuf,
}

pub fn load_world_from_path(world_path: &Path) -> Result<WorldFile, LoadError> {
    let mut world: WorldFile = read_json(world_path)?;
    validate_world(&world)?;

    // sprite paths are relative to the world file
    if let Some(dir) = world_path.parent() {
        for sprite in &mut world.sprites {
            if sprite.path.is_relative() {
                sprite.path = dir.join(&sprite.path);
            }
        }
    }
    Ok(world)
}

fn validate_world(world: &WorldFile) -> Result<(), LoadError> {
    let fail = |msg: String| Err(LoadError::Validation(format!("World validation failed: {msg}")));

    if world.version != WORLD_FILE_VERSION {
        return fail(format!(
            "unsupported version '{}', expected '{}'",
            world.version, WORLD_FILE_VERSION
        ));
    }
    if let Some(bounds) = world.bounds {
        if !(bounds.width.is_finite() && bounds.height.is_finite())
            || bounds.width <= 0.0
            || bounds.height <= 0.0
        {
            return fail("bounds must be positive".to_string());
        }
    }
    if !(world.player.x.is_finite() && world.player.y.is_finite()) {
        return fail("player start must be finite".to_string());
    }
    if !world.camera.zoom.is_finite() || world.camera.zoom <= 0.0 {
        return fail(format!("camera zoom must be > 0, got {}", world.camera.zoom));
    }

    for (label, placements) in [("tree", &world.trees), ("loot", &world.loot)] {
        for (index, placement) in placements.iter().enumerate() {
            if !(placement.x.is_finite() && placement.y.is_finite()) {
                return fail(format!("{label} #{index} has a non-finite position"));
            }
            for size in [placement.width, placement.height].into_iter().flatten() {
                if !size.is_finite() || size < 0.0 {
                    return fail(format!("{label} #{index} has an invalid size {size}"));
                }
            }
        }
    }

    let mut kinds = HashSet::new();
    for sprite in &world.sprites {
        if !kinds.insert(sprite.kind) {
            return fail(format!("duplicate sprite for {:?}", sprite.kind));
        }
    }

    if world.trees.is_empty() && world.loot.is_empty() {
        log::warn!(
            "World '{}' has no trees and no loot. This is allowed but often accidental.",
            world.world_id
        );
    }
    Ok(())
}

/// Deterministic built-in layout used when no world file is given: a grid
/// of trees with loot scattered between them.
pub fn demo_world() -> WorldFile {
    let mut trees = Vec::new();
    let mut loot = Vec::new();
    for row in 0..6 {
        for col in 0..8 {
            let x = 300.0 + col as f32 * 450.0 + if row % 2 == 0 { 0.0 } else { 180.0 };
            let y = 250.0 + row as f32 * 420.0;
            trees.push(Placement {
                x,
                y,
                width: None,
                height: None,
            });
            if (row + col) % 3 == 0 {
                loot.push(Placement {
                    x: x + 230.0,
                    y: y + 60.0,
                    width: None,
                    height: None,
                });
            }
        }
    }
    // a short trail straight ahead of the start position
    for step in 0..4 {
        loot.push(Placement {
            x: 1700.0 + step as f32 * 90.0,
            y: 1340.0,
            width: None,
            height: None,
        });
    }

    WorldFile {
        version: WORLD_FILE_VERSION.to_string(),
        world_id: "demo_grove".to_string(),
        bounds: Some(WorldBounds {
            width: 4000.0,
            height: 3000.0,
        }),
        player: PlayerStart {
            x: 1500.0,
            y: 1300.0,
        },
        camera: WorldCamera::default(),
        trees,
        loot,
        sprites: Vec::new(),
    }
}

const fn default_zoom() -> f32 {
    1.0
}

const fn default_follow() -> bool {
    true
}
