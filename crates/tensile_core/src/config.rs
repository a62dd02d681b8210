//! Scene and simulation configuration.
//!
//! Everything here is an immutable value handed to the scene at construction.
//! There is no process-wide configuration state.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::notes::{normalize_note_name, note_to_hz};

/// Physical constants for one string. Fixed after the string is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationParameters {
    /// linear-density-like mass coefficient (m)
    pub mass: f64,
    /// tension coefficient (t)
    pub tension: f64,
    /// multiplicative per-step energy loss, in (0, 1]
    pub damp: f64,
    /// fixed integration timestep
    pub time_step: f64,
    /// largest displacement a pluck may reach, in scene units
    pub max_magnitude: f64,
    /// baseline length per segment, in scene units
    pub pixels_per_segment: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            mass: 20.0,
            tension: 10.0,
            damp: 0.995,
            time_step: 30.0,
            max_magnitude: 60.0,
            pixels_per_segment: 12.0,
        }
    }
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("mass", self.mass),
            ("tension", self.tension),
            ("timeStep", self.time_step),
            ("maxMagnitude", self.max_magnitude),
            ("pixelsPerSegment", self.pixels_per_segment),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    field,
                    value,
                    reason: "must be a positive number",
                });
            }
        }
        if !(self.damp > 0.0 && self.damp <= 1.0) {
            return Err(ConfigError::InvalidParameter {
                field: "damp",
                value: self.damp,
                reason: "must be in (0, 1]",
            });
        }
        Ok(())
    }
}

/// A string as laid out on the source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StringDefinition {
    /// start point in source-image pixels
    pub start: [f64; 2],
    /// end point in source-image pixels
    pub end: [f64; 2],
    /// note name, e.g. "C3" or "F#4"
    pub note: String,
}

impl StringDefinition {
    pub fn new(start: [f64; 2], end: [f64; 2], note: &str) -> Self {
        Self {
            start,
            end,
            note: note.to_string(),
        }
    }
}

/// Unit-space rectangle of the source image that must stay visible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRect {
    pub top_left: [f64; 2],
    pub bottom_right: [f64; 2],
}

impl Default for ViewportRect {
    fn default() -> Self {
        Self {
            top_left: [0.0, 0.0],
            bottom_right: [1.0, 1.0],
        }
    }
}

/// A string ready to be built: unit-space endpoints and a tone frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedString {
    pub start_unit: Point,
    pub end_unit: Point,
    pub frequency: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    /// width of the background image the string coordinates refer to
    pub source_width: f64,
    /// height of the background image the string coordinates refer to
    pub source_height: f64,
    pub viewport: ViewportRect,
    /// number of audio contexts to create before reusing them round-robin
    pub audio_contexts: usize,
    /// simulation ticks per second
    pub frame_rate: f64,
    /// most recent pointer positions kept for hit-testing
    pub max_pointer_segments: usize,
    pub simulation: SimulationParameters,
    pub strings: Vec<StringDefinition>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            source_width: 4032.0,
            source_height: 3024.0,
            viewport: ViewportRect::default(),
            audio_contexts: 4,
            frame_rate: 60.0,
            max_pointer_segments: 50_000,
            simulation: SimulationParameters::default(),
            strings: default_strings(),
        }
    }
}

/// Telephone wires over the default background photo.
fn default_strings() -> Vec<StringDefinition> {
    vec![
        // left edge to centre pole, upper group
        StringDefinition::new([0.0, 612.0], [1611.0, 511.0], "C3"),
        StringDefinition::new([0.0, 660.0], [1651.0, 574.0], "D3"),
        StringDefinition::new([0.0, 697.0], [1670.0, 622.0], "E3"),
        // centre pole to right edge
        StringDefinition::new([1628.0, 514.0], [4032.0, 113.0], "F3"),
        StringDefinition::new([1707.0, 571.0], [4032.0, 205.0], "G3"),
        StringDefinition::new([1719.0, 622.0], [4032.0, 282.0], "A3"),
        // left edge to centre pole, lower group
        StringDefinition::new([0.0, 1218.0], [1650.0, 1110.0], "B3"),
        StringDefinition::new([0.0, 1246.0], [1648.0, 1146.0], "C4"),
        // centre pole to right, lower group
        StringDefinition::new([1650.0, 1110.0], [3527.0, 1107.0], "D4"),
        StringDefinition::new([1648.0, 1146.0], [3516.0, 1127.0], "E4"),
        // diagonal
        StringDefinition::new([137.0, 1394.0], [1654.0, 579.0], "F4"),
        // right side, mostly vertical
        StringDefinition::new([3254.0, 0.0], [3659.0, 711.0], "G4"),
        StringDefinition::new([3395.0, 0.0], [4032.0, 1278.0], "A4"),
        StringDefinition::new([3566.0, 0.0], [4032.0, 942.0], "B4"),
    ]
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(SceneConfig)).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.source_width > 0.0 && self.source_height > 0.0) {
            return Err(ConfigError::InvalidParameter {
                field: "sourceWidth/sourceHeight",
                value: self.source_width.min(self.source_height),
                reason: "must be a positive number",
            });
        }
        if self.audio_contexts < 1 {
            return Err(ConfigError::NoAudioContexts);
        }
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::InvalidParameter {
                field: "frameRate",
                value: self.frame_rate,
                reason: "must be a positive number",
            });
        }
        self.simulation.validate()?;
        for (index, string) in self.strings.iter().enumerate() {
            if note_to_hz(&string.note).is_none() {
                return Err(ConfigError::UnknownNote {
                    index,
                    note: string.note.clone(),
                });
            }
        }
        Ok(())
    }

    /// Replace every string's note. The list is applied only when its length
    /// matches the number of strings; returns whether it was applied.
    pub fn apply_notes<S: AsRef<str>>(&mut self, notes: &[S]) -> bool {
        if notes.len() != self.strings.len() {
            tracing::warn!(
                given = notes.len(),
                expected = self.strings.len(),
                "ignoring note list with the wrong length"
            );
            return false;
        }
        for (string, note) in self.strings.iter_mut().zip(notes) {
            string.note = normalize_note_name(note.as_ref());
        }
        true
    }

    /// Milliseconds between ticks, truncated like a browser interval timer.
    pub fn tick_interval_ms(&self) -> u64 {
        (1000.0 / self.frame_rate).floor().max(1.0) as u64
    }

    /// Convert a point in source-image pixels to unit coordinates.
    pub fn scalarize(&self, point: [f64; 2]) -> Point {
        Point::new(point[0] / self.source_width, point[1] / self.source_height)
    }

    pub fn source_aspect_ratio(&self) -> f64 {
        self.source_width / self.source_height
    }

    pub fn resolve_strings(&self) -> Result<Vec<ResolvedString>, ConfigError> {
        self.strings
            .iter()
            .enumerate()
            .map(|(index, string)| {
                let frequency =
                    note_to_hz(&string.note).ok_or_else(|| ConfigError::UnknownNote {
                        index,
                        note: string.note.clone(),
                    })?;
                Ok(ResolvedString {
                    start_unit: self.scalarize(string.start),
                    end_unit: self.scalarize(string.end),
                    frequency,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The scene JSON could not be parsed
    Parse(String),
    /// A numeric parameter is out of range
    InvalidParameter {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// A string names a note missing from the note table
    UnknownNote { index: usize, note: String },
    /// At least one audio context is required
    NoAudioContexts,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(message) => write!(f, "Failed to parse scene config: {}", message),
            ConfigError::InvalidParameter {
                field,
                value,
                reason,
            } => write!(f, "Invalid {} = {}: {}", field, value, reason),
            ConfigError::UnknownNote { index, note } => {
                write!(f, "String {} uses unknown note '{}'", index, note)
            }
            ConfigError::NoAudioContexts => write!(f, "Need at least one audio context"),
        }
    }
}

impl std::error::Error for ConfigError {}
