use std::sync::Arc;

use tensile_core::AudioEmitter;

use crate::commands::{VoiceCommand, VoiceId};
use crate::context::{AudioContext, ContextPool};

/// One string's voice in a pooled audio context.
///
/// The context is acquired on first use, not at construction, so a scene can
/// be built before the audio device is allowed to run.
pub struct ToneEmitter {
  pool: Arc<ContextPool>,
  frequency: f32,
  binding: Option<(Arc<AudioContext>, VoiceId)>,
  playing: bool,
}

impl ToneEmitter {
  pub fn new(pool: Arc<ContextPool>, frequency: f32) -> Self {
    Self {
      pool,
      frequency,
      binding: None,
      playing: false,
    }
  }

  pub fn frequency(&self) -> f32 {
    self.frequency
  }

  pub fn is_playing(&self) -> bool {
    self.playing
  }

  /// Context id and voice slot, once configured.
  pub fn voice(&self) -> Option<(usize, VoiceId)> {
    self
      .binding
      .as_ref()
      .map(|(context, voice)| (context.id(), *voice))
  }

  fn send(&self, command: impl FnOnce(VoiceId) -> VoiceCommand) {
    if let Some((context, voice)) = &self.binding {
      context.send(command(*voice));
    }
  }
}

impl AudioEmitter for ToneEmitter {
  fn configure(&mut self) {
    if self.binding.is_some() {
      return;
    }
    let context = self.pool.acquire();
    let voice = context.allocate_voice();
    context.send(VoiceCommand::Configure {
      voice,
      frequency: self.frequency,
    });
    tracing::trace!(context = context.id(), voice, frequency = self.frequency, "voice configured");
    self.binding = Some((context, voice));
  }

  fn is_configured(&self) -> bool {
    self.binding.is_some()
  }

  fn start(&mut self) {
    if self.playing {
      return;
    }
    self.configure();
    self.send(|voice| VoiceCommand::Start { voice });
    self.playing = true;
  }

  fn stop(&mut self) {
    if !self.playing {
      return;
    }
    self.send(|voice| VoiceCommand::Stop { voice });
    self.playing = false;
  }

  fn update(&mut self, gain: f32, pan: f32) {
    self.send(|voice| VoiceCommand::Update { voice, gain, pan });
  }
}
