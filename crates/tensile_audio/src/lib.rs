//! Audio output and live scheduling for tensile strings.
//!
//! Strings talk to audio through [`emitter::ToneEmitter`], which pushes voice
//! commands into a pooled [`context::AudioContext`]. The audio side renders
//! those voices either to a `cpal` stream ([`engine`]) or offline ([`render`]).

pub mod commands;
pub mod context;
pub mod emitter;
pub mod engine;
pub mod render;
pub mod runtime;
pub mod script;
pub mod voice;

pub use context::{AudioContext, ContextPool, MixBus};
pub use emitter::ToneEmitter;
pub use engine::AudioEngine;
pub use render::{OfflineRenderer, RenderSettings, Rendered};
pub use runtime::{Runtime, StringRunner, TickTask};
pub use script::Pluck;
