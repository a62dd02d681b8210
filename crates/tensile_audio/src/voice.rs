//! A single string's tone: triangle oscillator, gain and stereo pan.

/// Time over which gain and pan move to a new target. One animation frame.
pub const RAMP_SECONDS: f32 = 1.0 / 60.0;

/// Linear ramp toward a target over a fixed number of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ramp {
  value: f32,
  target: f32,
  increment: f32,
  remaining: u32,
}

impl Ramp {
  pub fn new(value: f32) -> Self {
    Self {
      value,
      target: value,
      increment: 0.0,
      remaining: 0,
    }
  }

  pub fn value(&self) -> f32 {
    self.value
  }

  pub fn target(&self) -> f32 {
    self.target
  }

  pub fn is_settled(&self) -> bool {
    self.remaining == 0
  }

  /// Start a new ramp from the current value. A zero-length ramp jumps.
  pub fn ramp_to(&mut self, target: f32, samples: u32) {
    self.target = target;
    if samples == 0 {
      self.value = target;
      self.increment = 0.0;
      self.remaining = 0;
    } else {
      self.increment = (target - self.value) / samples as f32;
      self.remaining = samples;
    }
  }

  #[inline]
  pub fn next(&mut self) -> f32 {
    if self.remaining > 0 {
      self.remaining -= 1;
      // Land exactly on the target to avoid accumulated drift
      self.value = if self.remaining == 0 {
        self.target
      } else {
        self.value + self.increment
      };
    }
    self.value
  }
}

/// Naive triangle, `phase` in `[0, 1)`, output in `[-1, 1]`.
#[inline(always)]
pub fn triangle(phase: f32) -> f32 {
  if phase < 0.5 {
    4.0 * phase - 1.0
  } else {
    3.0 - 4.0 * phase
  }
}

/// Equal-power left/right gains for `pan` in `[-1, 1]`.
#[inline(always)]
pub fn equal_power(pan: f32) -> (f32, f32) {
  // -1..1 -> 0..1 (0 = full left, 1 = full right)
  let pan_norm = ((pan.clamp(-1.0, 1.0)) + 1.0) * 0.5;
  ((1.0 - pan_norm).sqrt(), pan_norm.sqrt())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
  frequency: f32,
  phase: f32,
  phase_increment: f32,
  gain: Ramp,
  pan: Ramp,
  ramp_samples: u32,
  connected: bool,
  /// Fading out after a stop; disconnects once the gain ramp settles
  releasing: bool,
}

impl Voice {
  pub fn new(frequency: f32, sample_rate: f32) -> Self {
    let mut voice = Self {
      frequency,
      phase: 0.0,
      phase_increment: 0.0,
      gain: Ramp::new(0.0),
      pan: Ramp::new(0.0),
      ramp_samples: 0,
      connected: false,
      releasing: false,
    };
    voice.retune(frequency, sample_rate);
    voice
  }

  pub fn retune(&mut self, frequency: f32, sample_rate: f32) {
    self.frequency = frequency;
    if sample_rate > 0.0 {
      self.phase_increment = (frequency / sample_rate).clamp(0.0, 0.5);
      self.ramp_samples = (sample_rate * RAMP_SECONDS).round() as u32;
    } else {
      self.phase_increment = 0.0;
      self.ramp_samples = 0;
    }
  }

  pub fn frequency(&self) -> f32 {
    self.frequency
  }

  pub fn gain(&self) -> f32 {
    self.gain.value()
  }

  pub fn pan(&self) -> f32 {
    self.pan.value()
  }

  pub fn is_connected(&self) -> bool {
    self.connected
  }

  pub fn ramp_samples(&self) -> u32 {
    self.ramp_samples
  }

  pub fn start(&mut self) {
    self.connected = true;
    self.releasing = false;
  }

  pub fn stop(&mut self) {
    if !self.connected {
      return;
    }
    self.gain.ramp_to(0.0, self.ramp_samples);
    self.releasing = true;
  }

  /// Ramp toward new targets. While releasing only the pan follows; the gain
  /// keeps fading out.
  pub fn set_targets(&mut self, gain: f32, pan: f32) {
    if !self.releasing {
      self.gain.ramp_to(gain.clamp(0.0, 1.0), self.ramp_samples);
    }
    self.pan.ramp_to(pan.clamp(-1.0, 1.0), self.ramp_samples);
  }

  /// Render one stereo frame. The oscillator keeps running while disconnected.
  #[inline]
  pub fn next_frame(&mut self) -> [f32; 2] {
    let gain = self.gain.next();
    let pan = self.pan.next();
    let sample = triangle(self.phase);

    self.phase += self.phase_increment;
    if self.phase >= 1.0 {
      self.phase -= 1.0;
    }

    if !self.connected {
      return [0.0, 0.0];
    }
    if self.releasing && self.gain.is_settled() {
      self.connected = false;
      self.releasing = false;
    }

    let (left, right) = equal_power(pan);
    let out = sample * gain;
    [out * left, out * right]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE_RATE: f32 = 48_000.0;

  #[test]
  fn test_ramp_reaches_target_exactly() {
    let mut ramp = Ramp::new(0.0);
    ramp.ramp_to(1.0, 4);
    let values: Vec<f32> = (0..6).map(|_| ramp.next()).collect();
    assert_eq!(values, vec![0.25, 0.5, 0.75, 1.0, 1.0, 1.0]);
    assert!(ramp.is_settled());
  }

  #[test]
  fn test_zero_length_ramp_jumps() {
    let mut ramp = Ramp::new(0.3);
    ramp.ramp_to(0.9, 0);
    assert_eq!(ramp.value(), 0.9);
    assert!(ramp.is_settled());
  }

  #[test]
  fn test_equal_power_pan() {
    let (l, r) = equal_power(0.0);
    assert!((l - r).abs() < 1e-6);
    assert!((l * l + r * r - 1.0).abs() < 1e-6);
    assert_eq!(equal_power(-1.0), (1.0, 0.0));
    assert_eq!(equal_power(1.0), (0.0, 1.0));
  }

  #[test]
  fn test_triangle_shape() {
    assert_eq!(triangle(0.0), -1.0);
    assert_eq!(triangle(0.25), 0.0);
    assert_eq!(triangle(0.5), 1.0);
    assert_eq!(triangle(0.75), 0.0);
  }

  #[test]
  fn test_ramp_length_is_one_frame() {
    let voice = Voice::new(220.0, SAMPLE_RATE);
    assert_eq!(voice.ramp_samples(), 800);
  }

  #[test]
  fn test_disconnected_voice_is_silent() {
    let mut voice = Voice::new(220.0, SAMPLE_RATE);
    voice.set_targets(1.0, 0.0);
    for _ in 0..2000 {
      assert_eq!(voice.next_frame(), [0.0, 0.0]);
    }
    assert_eq!(voice.gain(), 1.0);
  }

  #[test]
  fn test_stop_fades_then_disconnects() {
    let mut voice = Voice::new(220.0, SAMPLE_RATE);
    voice.start();
    voice.set_targets(1.0, 0.0);
    for _ in 0..800 {
      voice.next_frame();
    }
    assert_eq!(voice.gain(), 1.0);

    voice.stop();
    voice.set_targets(1.0, 0.5);
    for _ in 0..799 {
      voice.next_frame();
    }
    assert!(voice.is_connected());
    voice.next_frame();
    assert!(!voice.is_connected());
    assert_eq!(voice.gain(), 0.0);
    assert_eq!(voice.pan(), 0.5);
  }

  #[test]
  fn test_start_reconnects_after_stop() {
    let mut voice = Voice::new(220.0, SAMPLE_RATE);
    voice.start();
    voice.stop();
    voice.start();
    voice.set_targets(0.5, 0.0);
    let peak = (0..1000)
      .map(|_| voice.next_frame()[0].abs())
      .fold(0.0f32, f32::max);
    assert!(peak > 0.1);
  }
}
