use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub(crate) const TUNING_FILE_NAME: &str = "tuning.json";

/// Gameplay constants. Missing keys keep their defaults; unknown keys are
/// rejected so typos surface at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Tuning {
    pub seed: u64,
    pub player_spawn: [f32; 3],
    pub player_speed: f32,
    pub player_turn_speed: f32,
    pub player_footprint: [f32; 3],
    pub player_bound: f32,
    pub npc_soft_bound: f32,
    pub heading_change_chance: f32,
    pub heading_jitter_degrees: f32,
    pub ai_update_radius: f32,
    pub interaction_radius: f32,
    pub npc_freeze_seconds: f32,
    pub dialogue_timeout_seconds: f32,
    pub door_swing_seconds: f32,
    pub message_duration_ms: u32,
    pub visibility_near: f32,
    pub visibility_far: f32,
    pub cull_inflate: f32,
    pub camera_follow_distance: f32,
    pub camera_height: f32,
    pub camera_pitch: f32,
    pub eye_height: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            seed: 0x4841_4d4c,
            player_spawn: [0.0, 0.0, 20.0],
            player_speed: 6.0,
            player_turn_speed: 2.4,
            player_footprint: [1.0, 2.0, 1.0],
            player_bound: 48.0,
            npc_soft_bound: 40.0,
            heading_change_chance: 0.02,
            heading_jitter_degrees: 45.0,
            ai_update_radius: 50.0,
            interaction_radius: 2.0,
            npc_freeze_seconds: 30.0,
            dialogue_timeout_seconds: 8.0,
            door_swing_seconds: 1.0,
            message_duration_ms: 2500,
            visibility_near: 3.0,
            visibility_far: 60.0,
            cull_inflate: 1.2,
            camera_follow_distance: 8.0,
            camera_height: 4.0,
            camera_pitch: -0.35,
            eye_height: 1.6,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum TuningError {
    #[error("failed to read tuning file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse tuning file {path} at {json_path}: {message}")]
    Parse {
        path: PathBuf,
        json_path: String,
        message: String,
    },
    #[error("invalid tuning value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Loads `path` if it exists, otherwise returns the defaults.
pub(crate) fn load_tuning(path: &Path) -> Result<Tuning, TuningError> {
    if !path.is_file() {
        return Ok(Tuning::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| TuningError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tuning(&raw, path)
}

pub(crate) fn parse_tuning(raw: &str, path: &Path) -> Result<Tuning, TuningError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let tuning = serde_path_to_error::deserialize::<_, Tuning>(&mut deserializer).map_err(
        |error| {
            let json_path = error.path().to_string();
            TuningError::Parse {
                path: path.to_path_buf(),
                json_path,
                message: error.into_inner().to_string(),
            }
        },
    )?;
    tuning.validate()?;
    Ok(tuning)
}

impl Tuning {
    fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("player_speed", self.player_speed),
            ("player_bound", self.player_bound),
            ("npc_soft_bound", self.npc_soft_bound),
            ("interaction_radius", self.interaction_radius),
            ("dialogue_timeout_seconds", self.dialogue_timeout_seconds),
            ("door_swing_seconds", self.door_swing_seconds),
            ("visibility_far", self.visibility_far),
            ("cull_inflate", self.cull_inflate),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::Invalid {
                    field,
                    reason: format!("expected a finite value > 0, got {value}"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.heading_change_chance) {
            return Err(TuningError::Invalid {
                field: "heading_change_chance",
                reason: format!("expected 0..=1, got {}", self.heading_change_chance),
            });
        }
        if self.player_footprint.iter().any(|extent| *extent <= 0.0) {
            return Err(TuningError::Invalid {
                field: "player_footprint",
                reason: "every extent must be > 0".to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn heading_jitter_radians(&self) -> f32 {
        self.heading_jitter_degrees.to_radians()
    }
}

/// Whole ticks covering `seconds` at the given fixed step, at least one.
pub(crate) fn seconds_to_ticks(seconds: f32, fixed_dt_seconds: f32) -> u64 {
    if fixed_dt_seconds <= 0.0 {
        return 1;
    }
    ((seconds / fixed_dt_seconds).round() as u64).max(1)
}
