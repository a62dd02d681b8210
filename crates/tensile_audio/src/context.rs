//! Audio contexts and the pool that hands them out.
//!
//! A context is one independent voice bank. The simulation side holds an
//! [`AudioContext`] and pushes [`VoiceCommand`]s into it; the audio side owns
//! the matching [`ContextMixer`], which drains those commands and renders the
//! voices. Every mixer is summed by a single [`MixBus`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use anyhow::bail;
use parking_lot::Mutex;

use crate::commands::{
  CommandConsumer, CommandProducer, VOICES_PER_CONTEXT, VoiceCommand, VoiceId, create_command_queue,
};
use crate::voice::Voice;

/// Scales the summed voices so a full scene stays below clipping
const OUTPUT_ATTENUATION: f32 = 0.25;

/// Simulation-side handle of one context.
pub struct AudioContext {
  id: usize,
  command_tx: Mutex<CommandProducer>,
  next_voice: AtomicUsize,
  dropped_commands: AtomicU64,
}

impl std::fmt::Debug for AudioContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AudioContext")
      .field("id", &self.id)
      .field("voices", &self.voice_count())
      .field("dropped_commands", &self.dropped_commands())
      .finish()
  }
}

impl AudioContext {
  /// Create a context and the mixer that renders it.
  pub fn new(id: usize, sample_rate: f32) -> (Self, ContextMixer) {
    let (command_tx, command_rx) = create_command_queue();
    let context = Self {
      id,
      command_tx: Mutex::new(command_tx),
      next_voice: AtomicUsize::new(0),
      dropped_commands: AtomicU64::new(0),
    };
    (context, ContextMixer::new(id, sample_rate, command_rx))
  }

  pub fn id(&self) -> usize {
    self.id
  }

  /// Reserve the next voice slot in this context.
  pub fn allocate_voice(&self) -> VoiceId {
    self.next_voice.fetch_add(1, Ordering::Relaxed)
  }

  pub fn voice_count(&self) -> usize {
    self.next_voice.load(Ordering::Relaxed)
  }

  /// Queue a command for the mixer. A full queue drops the command.
  pub fn send(&self, command: VoiceCommand) -> bool {
    let mut tx = self.command_tx.lock();
    match tx.push(command) {
      Ok(()) => true,
      Err(_) => {
        let dropped = self.dropped_commands.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(context = self.id, dropped, "command queue full, dropping command");
        false
      }
    }
  }

  pub fn dropped_commands(&self) -> u64 {
    self.dropped_commands.load(Ordering::Relaxed)
  }
}

/// Audio-side half of a context. Owns the voices.
pub struct ContextMixer {
  id: usize,
  sample_rate: f32,
  command_rx: CommandConsumer,
  voices: Vec<Voice>,
}

impl ContextMixer {
  fn new(id: usize, sample_rate: f32, command_rx: CommandConsumer) -> Self {
    Self {
      id,
      sample_rate,
      command_rx,
      voices: Vec::with_capacity(VOICES_PER_CONTEXT),
    }
  }

  pub fn id(&self) -> usize {
    self.id
  }

  pub fn voices(&self) -> &[Voice] {
    &self.voices
  }

  /// Apply every pending command.
  pub fn process_commands(&mut self) {
    while let Ok(command) = self.command_rx.pop() {
      self.apply(command);
    }
  }

  fn apply(&mut self, command: VoiceCommand) {
    if let VoiceCommand::Configure { voice, frequency } = command {
      if let Some(existing) = self.voices.get_mut(voice) {
        existing.retune(frequency, self.sample_rate);
      } else {
        let sample_rate = self.sample_rate;
        self
          .voices
          .resize_with(voice + 1, || Voice::new(0.0, sample_rate));
        self.voices[voice].retune(frequency, sample_rate);
      }
      return;
    }

    let Some(target) = self.voices.get_mut(command.voice()) else {
      return;
    };
    match command {
      VoiceCommand::Start { .. } => target.start(),
      VoiceCommand::Stop { .. } => target.stop(),
      VoiceCommand::Update { gain, pan, .. } => target.set_targets(gain, pan),
      VoiceCommand::Configure { .. } => {}
    }
  }

  #[inline]
  pub fn next_frame(&mut self) -> [f32; 2] {
    let mut out = [0.0f32; 2];
    for voice in &mut self.voices {
      let [left, right] = voice.next_frame();
      out[0] += left;
      out[1] += right;
    }
    out
  }
}

/// Sums every context's voices into interleaved output buffers.
pub struct MixBus {
  mixers: Vec<ContextMixer>,
  sample_rate: f32,
}

impl MixBus {
  pub fn new(mixers: Vec<ContextMixer>, sample_rate: f32) -> Self {
    Self {
      mixers,
      sample_rate,
    }
  }

  pub fn sample_rate(&self) -> f32 {
    self.sample_rate
  }

  pub fn mixers(&self) -> &[ContextMixer] {
    &self.mixers
  }

  pub fn process_commands(&mut self) {
    for mixer in &mut self.mixers {
      mixer.process_commands();
    }
  }

  #[inline]
  pub fn next_frame(&mut self) -> [f32; 2] {
    let mut out = [0.0f32; 2];
    for mixer in &mut self.mixers {
      let [left, right] = mixer.next_frame();
      out[0] += left;
      out[1] += right;
    }
    [out[0] * OUTPUT_ATTENUATION, out[1] * OUTPUT_ATTENUATION]
  }

  /// Fill an interleaved buffer of `channels` channels. Mono output gets the
  /// average of left and right; channels past the second are silent.
  #[profiling::function]
  pub fn render(&mut self, output: &mut [f32], channels: usize) {
    self.process_commands();
    if channels == 0 {
      return;
    }
    for frame in output.chunks_mut(channels) {
      let [left, right] = self.next_frame();
      match frame {
        [mono] => *mono = (left + right) * 0.5,
        [l, r, rest @ ..] => {
          *l = left;
          *r = right;
          rest.fill(0.0);
        }
        [] => {}
      }
    }
  }
}

/// A capped set of contexts handed out round-robin.
///
/// Every context is created up front. Acquiring cycles through them, so once
/// there are more strings than contexts, strings share.
pub struct ContextPool {
  contexts: Vec<Arc<AudioContext>>,
  next: AtomicUsize,
}

impl ContextPool {
  /// Create `max_contexts` contexts and the bus that renders them.
  pub fn new(max_contexts: usize, sample_rate: f32) -> anyhow::Result<(Self, MixBus)> {
    if max_contexts < 1 {
      bail!("need at least one audio context");
    }

    let (contexts, mixers): (Vec<_>, Vec<_>) = (0..max_contexts)
      .map(|id| {
        let (context, mixer) = AudioContext::new(id, sample_rate);
        (Arc::new(context), mixer)
      })
      .unzip();

    tracing::debug!(contexts = max_contexts, sample_rate, "audio contexts created");

    let pool = Self {
      contexts,
      next: AtomicUsize::new(0),
    };
    Ok((pool, MixBus::new(mixers, sample_rate)))
  }

  pub fn len(&self) -> usize {
    self.contexts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.contexts.is_empty()
  }

  pub fn contexts(&self) -> &[Arc<AudioContext>] {
    &self.contexts
  }

  /// Next context in round-robin order.
  pub fn acquire(&self) -> Arc<AudioContext> {
    let index = self.next.fetch_add(1, Ordering::Relaxed) % self.contexts.len();
    let context = &self.contexts[index];
    if context.voice_count() > 0 {
      tracing::debug!(context = index, "reusing audio context");
    }
    context.clone()
  }

  /// Total commands dropped across all contexts.
  pub fn dropped_commands(&self) -> u64 {
    self.contexts.iter().map(|c| c.dropped_commands()).sum()
  }
}
