//! Offline rendering: run a scene against scripted plucks without an audio
//! device and capture the mixed output.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use hound::{WavSpec, WavWriter};
use tensile_core::{Scene, SceneConfig, Viewport};

use crate::context::{ContextPool, MixBus};
use crate::emitter::ToneEmitter;
use crate::script::{self, Pluck};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
  pub sample_rate: u32,
  pub duration_ms: u64,
  /// Scene window the strings are laid out in
  pub window: (f64, f64),
}

impl Default for RenderSettings {
  fn default() -> Self {
    Self {
      sample_rate: 48_000,
      duration_ms: 3_000,
      window: (1280.0, 960.0),
    }
  }
}

/// Interleaved stereo samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
  pub sample_rate: u32,
  pub samples: Vec<f32>,
}

impl Rendered {
  pub fn frames(&self) -> usize {
    self.samples.len() / 2
  }

  /// Largest absolute sample in `[start, end)` frames.
  pub fn peak(&self, start: usize, end: usize) -> f32 {
    let end = end.min(self.frames());
    if start >= end {
      return 0.0;
    }
    self.samples[start * 2..end * 2]
      .iter()
      .fold(0.0f32, |peak, s| peak.max(s.abs()))
  }

  pub fn write_wav(&self, path: &Path) -> anyhow::Result<()> {
    let spec = WavSpec {
      channels: 2,
      sample_rate: self.sample_rate,
      bits_per_sample: 32,
      sample_format: hound::SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
      .with_context(|| format!("failed to create {}", path.display()))?;
    for sample in &self.samples {
      writer.write_sample(*sample)?;
    }
    writer
      .finalize()
      .with_context(|| format!("failed to finalize {}", path.display()))?;
    Ok(())
  }
}

/// Drives a scene and its mix bus in lockstep, one animation frame at a time.
pub struct OfflineRenderer {
  scene: Scene,
  bus: MixBus,
  pool: Arc<ContextPool>,
  settings: RenderSettings,
  tick_ms: u64,
}

impl OfflineRenderer {
  pub fn new(config: &SceneConfig, settings: RenderSettings) -> anyhow::Result<Self> {
    let (pool, bus) = ContextPool::new(config.audio_contexts, settings.sample_rate as f32)?;
    let pool = Arc::new(pool);

    let viewport = Viewport::for_scene(config, settings.window.0, settings.window.1);
    let scene = Scene::new(config, viewport, |_, resolved| {
      Box::new(ToneEmitter::new(pool.clone(), resolved.frequency))
    })
    .context("invalid scene")?;

    Ok(Self {
      scene,
      bus,
      pool,
      settings,
      tick_ms: config.tick_interval_ms().max(1),
    })
  }

  pub fn scene(&self) -> &Scene {
    &self.scene
  }

  pub fn pool(&self) -> &ContextPool {
    &self.pool
  }

  /// Run the whole timeline and return the mixed audio.
  #[profiling::function]
  pub fn render(&mut self, plucks: &[Pluck]) -> Rendered {
    let sample_rate = self.settings.sample_rate as u64;
    let total_frames = (self.settings.duration_ms * sample_rate / 1000) as usize;
    let mut samples = vec![0.0f32; total_frames * 2];

    let mut rendered = 0usize;
    let mut now_ms = 0u64;
    while rendered < total_frames {
      let next_ms = now_ms + self.tick_ms;
      let actions = script::actions_between(plucks, now_ms, next_ms);
      script::apply(&self.scene, &actions);
      self.scene.tick_all();

      let until = ((next_ms * sample_rate / 1000) as usize).min(total_frames);
      self.bus.render(&mut samples[rendered * 2..until * 2], 2);
      rendered = until;
      now_ms = next_ms;
    }

    tracing::debug!(
      frames = total_frames,
      dropped_commands = self.pool.dropped_commands(),
      "offline render finished"
    );

    Rendered {
      sample_rate: self.settings.sample_rate,
      samples,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tensile_core::StringDefinition;

  fn one_string_config() -> SceneConfig {
    SceneConfig {
      source_width: 1000.0,
      source_height: 1000.0,
      audio_contexts: 1,
      strings: vec![StringDefinition::new([0.0, 500.0], [1000.0, 500.0], "A3")],
      ..Default::default()
    }
  }

  fn settings(duration_ms: u64) -> RenderSettings {
    RenderSettings {
      sample_rate: 8_000,
      duration_ms,
      window: (1000.0, 1000.0),
    }
  }

  #[test]
  fn test_untouched_scene_is_silent() {
    let mut renderer = OfflineRenderer::new(&one_string_config(), settings(500)).unwrap();
    let rendered = renderer.render(&[]);
    assert_eq!(rendered.frames(), 4_000);
    assert_eq!(rendered.peak(0, rendered.frames()), 0.0);
  }

  #[test]
  fn test_pluck_is_silent_until_release() {
    let mut renderer = OfflineRenderer::new(&one_string_config(), settings(1_000)).unwrap();
    let plucks = [Pluck::new(0, 0.5, 40.0).at(200)];
    let rendered = renderer.render(&plucks);

    // Held from 200ms, released on the frame starting at 288ms
    assert_eq!(rendered.peak(0, 2_300), 0.0);
    assert!(rendered.peak(2_400, 4_000) > 0.01);
  }

  #[test]
  fn test_missing_string_is_skipped() {
    let mut renderer = OfflineRenderer::new(&one_string_config(), settings(200)).unwrap();
    let rendered = renderer.render(&[Pluck::new(7, 0.5, 40.0)]);
    assert_eq!(rendered.peak(0, rendered.frames()), 0.0);
  }
}
