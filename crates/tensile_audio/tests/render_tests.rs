//! Offline rendering of the built-in scene.
//!
//! No audio device is touched: the mixer is pulled directly and the result is
//! checked for silence, stereo placement and WAV output.

use tensile_audio::{OfflineRenderer, Pluck, RenderSettings};
use tensile_core::{AudioEmitter, SceneConfig, StringDefinition};

const SAMPLE_RATE: u32 = 8_000;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn settings(duration_ms: u64) -> RenderSettings {
  RenderSettings {
    sample_rate: SAMPLE_RATE,
    duration_ms,
    window: (1000.0, 1000.0),
  }
}

/// A single horizontal string across a square source image.
fn single_string() -> SceneConfig {
  SceneConfig {
    source_width: 1000.0,
    source_height: 1000.0,
    audio_contexts: 1,
    strings: vec![StringDefinition::new([0.0, 500.0], [1000.0, 500.0], "C4")],
    ..Default::default()
  }
}

fn channel_energy(samples: &[f32], channel: usize) -> f32 {
  samples.chunks(2).map(|frame| frame[channel] * frame[channel]).sum()
}

// ─── Scene ────────────────────────────────────────────────────────────────────

#[test]
fn test_default_scene_renders_every_string() {
  let config = SceneConfig::default();
  let mut renderer = OfflineRenderer::new(&config, settings(600)).unwrap();
  assert_eq!(renderer.scene().strings().len(), 14);
  assert_eq!(renderer.pool().len(), 4);

  let plucks: Vec<Pluck> = (0..14)
    .map(|i| Pluck::new(i, 0.5, 30.0).at(i as u64 * 16))
    .collect();
  let rendered = renderer.render(&plucks);

  assert!(rendered.peak(0, rendered.frames()) > 0.01);
  assert_eq!(renderer.pool().dropped_commands(), 0);
  for string in renderer.scene().strings() {
    assert!(string.lock().emitter().is_configured());
  }
}

#[test]
fn test_decay_after_release() {
  let mut renderer = OfflineRenderer::new(&single_string(), settings(6_000)).unwrap();
  let rendered = renderer.render(&[Pluck::new(0, 0.5, 50.0)]);

  let second = SAMPLE_RATE as usize;
  let early = rendered.peak(0, second);
  let late = rendered.peak(5 * second, 6 * second);
  assert!(early > 0.01);
  assert!(late < early / 2.0, "early {early}, late {late}");
}

// ─── Stereo ───────────────────────────────────────────────────────────────────

#[test]
fn test_pluck_near_end_pans_toward_it() {
  let mut left = OfflineRenderer::new(&single_string(), settings(400)).unwrap();
  let rendered = left.render(&[Pluck::new(0, 0.1, 40.0)]);
  assert!(channel_energy(&rendered.samples, 0) > channel_energy(&rendered.samples, 1));

  let mut right = OfflineRenderer::new(&single_string(), settings(400)).unwrap();
  let rendered = right.render(&[Pluck::new(0, 0.9, 40.0)]);
  assert!(channel_energy(&rendered.samples, 1) > channel_energy(&rendered.samples, 0));
}

// ─── WAV ──────────────────────────────────────────────────────────────────────

#[test]
fn test_write_wav() {
  let mut renderer = OfflineRenderer::new(&single_string(), settings(250)).unwrap();
  let rendered = renderer.render(&[Pluck::new(0, 0.5, 40.0)]);

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("pluck.wav");
  rendered.write_wav(&path).unwrap();

  let reader = hound::WavReader::open(&path).unwrap();
  let spec = reader.spec();
  assert_eq!(spec.channels, 2);
  assert_eq!(spec.sample_rate, SAMPLE_RATE);
  assert_eq!(spec.sample_format, hound::SampleFormat::Float);
  assert_eq!(reader.len() as usize, rendered.samples.len());
}
