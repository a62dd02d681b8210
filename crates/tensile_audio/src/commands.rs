//! Command queue types for audio thread communication.
//!
//! Each audio context owns one queue. Emitters on the simulation side push
//! commands; the context's mixer drains them at the start of every callback.

/// Index of a voice within its context.
pub type VoiceId = usize;

/// Commands sent to a context's mixer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoiceCommand {
  /// Create (or retune) a voice. The voice starts silent and disconnected.
  Configure { voice: VoiceId, frequency: f32 },

  /// Connect the voice to the output.
  Start { voice: VoiceId },

  /// Ramp the voice's gain to zero, then disconnect it.
  Stop { voice: VoiceId },

  /// New gain/pan targets, reached linearly over one frame.
  Update { voice: VoiceId, gain: f32, pan: f32 },
}

impl VoiceCommand {
  pub fn voice(&self) -> VoiceId {
    match *self {
      VoiceCommand::Configure { voice, .. }
      | VoiceCommand::Start { voice }
      | VoiceCommand::Stop { voice }
      | VoiceCommand::Update { voice, .. } => voice,
    }
  }
}

/// Capacity for each context's command queue (simulation → audio)
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Voices preallocated per context so the audio thread never grows its voice list
pub const VOICES_PER_CONTEXT: usize = 64;

/// Producer end of a context's command queue
pub type CommandProducer = rtrb::Producer<VoiceCommand>;
/// Consumer end of a context's command queue
pub type CommandConsumer = rtrb::Consumer<VoiceCommand>;

pub fn create_command_queue() -> (CommandProducer, CommandConsumer) {
  rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}
