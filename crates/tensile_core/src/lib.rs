//! Tensile string core library
//!
//! This crate provides the per-string physics and interaction engine: the wave
//! solver, the hold/release state machine and the mapping from vibration to
//! audio control targets. It is a pure library with no audio, window or device
//! concerns. Those live behind the traits in [`emitter`] and [`viewport`].

pub mod audio_mapper;
pub mod config;
pub mod emitter;
pub mod interaction;
pub mod notes;
pub mod path;
pub mod pointer;
pub mod scene;
pub mod segment;
pub mod solver;
pub mod string;
pub mod viewport;

/// Scene-space point. Scene coordinates grow rightward in x and downward in y.
pub type Point = glam::DVec2;

// Re-export commonly used items
pub use audio_mapper::AudioTargets;
pub use config::{ConfigError, SceneConfig, SimulationParameters, StringDefinition};
pub use emitter::AudioEmitter;
pub use interaction::{HoldOutcome, InteractionController, StringMode};
pub use scene::Scene;
pub use segment::Segment;
pub use solver::Peak;
pub use string::StringInstance;
pub use viewport::{Viewport, ViewportMapper};
