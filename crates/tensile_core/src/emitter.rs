//! The audio surface a string drives.
//!
//! Implementations own oscillator lifecycle, hardware resource pooling and
//! click-free ramping. The core only ever hands them instantaneous targets.

/// Tone output for one string.
///
/// Every method is fire-and-forget and must not block.
pub trait AudioEmitter: Send {
    /// Acquire the underlying synthesis resources. Idempotent.
    ///
    /// Called lazily on the first `start` because audio output is typically
    /// unavailable until the user has interacted with the scene. No handle is
    /// returned: the emitter keeps its own binding and `is_configured` reports
    /// whether it has one.
    fn configure(&mut self);

    fn is_configured(&self) -> bool;

    /// Connect the tone to the output. Configures first if needed.
    fn start(&mut self);

    /// Fade the tone out and disconnect it.
    fn stop(&mut self);

    /// New targets: `gain` in `[0, 1]`, `pan` in `[-1, 1]` (left to right).
    fn update(&mut self, gain: f32, pan: f32);
}

/// Emitter that produces no sound, for headless simulation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentEmitter {
    configured: bool,
}

impl AudioEmitter for SilentEmitter {
    fn configure(&mut self) {
        self.configured = true;
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn start(&mut self) {
        self.configure();
    }

    fn stop(&mut self) {}

    fn update(&mut self, _gain: f32, _pan: f32) {}
}
