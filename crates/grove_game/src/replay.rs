use std::path::Path;

use grove_core::{Key, PointerEvent};
use serde::Deserialize;

use crate::error::{read_json, LoadError};
use crate::simulation::FrameInput;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_delta_ms")]
    pub default_delta_ms: f64,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub delta_ms: Option<f64>,
    /// Key names held during the frame ("ArrowUp", "w", ...).
    #[serde(default)]
    pub keys: Vec<String>,
    /// Pointer events delivered before the frame runs. Only the first
    /// repetition receives them.
    #[serde(default)]
    pub pointer: Vec<PointerEvent>,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<FrameInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let held: Vec<Key> = frame
                .keys
                .iter()
                .filter_map(|name| Key::from_name(name))
                .collect();
            let delta_ms = frame.delta_ms.unwrap_or(self.default_delta_ms);
            for repetition in 0..frame.repeat.max(1) {
                out.push(FrameInput {
                    delta_ms,
                    held: held.clone(),
                    pointer: if repetition == 0 {
                        frame.pointer.clone()
                    } else {
                        Vec::new()
                    },
                });
            }
        }
        out
    }

    pub fn total_ms(&self) -> f64 {
        self.expanded_inputs().iter().map(|f| f.delta_ms).sum()
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, LoadError> {
    let replay: ReplaySequence = read_json(path)?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), LoadError> {
    if !replay.default_delta_ms.is_finite() || replay.default_delta_ms < 0.0 {
        return Err(LoadError::Validation(
            "Replay validation failed: default_delta_ms must be >= 0".to_string(),
        ));
    }
    if replay.frames.is_empty() {
        return Err(LoadError::Validation(
            "Replay validation failed: frames list is empty".to_string(),
        ));
    }
    for (index, frame) in replay.frames.iter().enumerate() {
        if let Some(delta) = frame.delta_ms {
            if !delta.is_finite() || delta < 0.0 {
                return Err(LoadError::Validation(format!(
                    "Replay validation failed: frame {index} has invalid delta_ms {delta}"
                )));
            }
        }
        if let Some(name) = frame.keys.iter().find(|n| Key::from_name(n).is_none()) {
            return Err(LoadError::Validation(format!(
                "Replay validation failed: frame {index} holds unknown key '{name}'"
            )));
        }
    }
    Ok(())
}

fn default_delta_ms() -> f64 {
    1000.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "grove_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(
            &path,
            r#"{
              "frames": [
                { "keys": ["d"], "repeat": 3 },
                { "delta_ms": 33, "pointer": [ { "type": "down", "x": 5, "y": 6 } ], "repeat": 2 }
              ]
            }"#,
        )
        .expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 5);
        assert_eq!(expanded[0].held, vec![Key::D]);
        assert!((expanded[0].delta_ms - 1000.0 / 60.0).abs() < 1e-9);
        assert_eq!(expanded[3].delta_ms, 33.0);
        assert_eq!(
            expanded[3].pointer,
            vec![PointerEvent::Down { x: 5.0, y: 6.0 }]
        );
        assert!(expanded[4].pointer.is_empty());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_unknown_keys() {
        let path = temp_file_path("unknown_key");
        fs::write(&path, r#"{ "frames": [ { "keys": ["F13"] } ] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("unknown key should fail");
        assert!(err.to_string().contains("unknown key 'F13'"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_empty_frames() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("empty frames should fail");
        assert!(err.to_string().contains("frames list is empty"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn replay_rejects_negative_delta() {
        let path = temp_file_path("negative");
        fs::write(&path, r#"{ "frames": [ { "delta_ms": -1 } ] }"#).expect("write replay file");
        let err = load_replay_from_path(&path).expect_err("negative delta should fail");
        assert!(err.to_string().contains("invalid delta_ms"));
        let _ = fs::remove_file(path);
    }
}
