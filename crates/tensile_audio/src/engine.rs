use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Host, HostId, SizedSample};

use crate::context::{ContextPool, MixBus};

/// A running output stream rendering a pool of contexts.
///
/// Dropping the engine stops the stream.
pub struct AudioEngine {
  _stream: cpal::Stream,
  pool: Arc<ContextPool>,
  sample_rate: f32,
  channels: u16,
}

impl AudioEngine {
  /// Open the preferred host's default output device and start rendering.
  pub fn start(max_contexts: usize) -> anyhow::Result<Self> {
    let host = get_host_by_preference();
    let device = host
      .default_output_device()
      .ok_or_else(|| anyhow!("no audio output device found"))?;
    let supported = device
      .default_output_config()
      .context("failed to get default output config")?;

    let sample_rate = supported.sample_rate();
    let channels = supported.channels();
    let config = cpal::StreamConfig {
      channels,
      sample_rate,
      buffer_size: cpal::BufferSize::Default,
    };

    let (pool, bus) = ContextPool::new(max_contexts, sample_rate as f32)?;
    let stream = build_output_stream(&device, &config, supported.sample_format(), bus)?;
    stream.play().context("failed to start output stream")?;

    tracing::info!(sample_rate, channels, contexts = max_contexts, "audio engine started");

    Ok(Self {
      _stream: stream,
      pool: Arc::new(pool),
      sample_rate: sample_rate as f32,
      channels,
    })
  }

  pub fn pool(&self) -> Arc<ContextPool> {
    self.pool.clone()
  }

  pub fn sample_rate(&self) -> f32 {
    self.sample_rate
  }

  pub fn channels(&self) -> u16 {
    self.channels
  }
}

/// Build output stream with the appropriate sample format
fn build_output_stream(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  sample_format: cpal::SampleFormat,
  bus: MixBus,
) -> anyhow::Result<cpal::Stream> {
  match sample_format {
    cpal::SampleFormat::I8 => make_stream::<i8>(device, config, bus),
    cpal::SampleFormat::I16 => make_stream::<i16>(device, config, bus),
    cpal::SampleFormat::I32 => make_stream::<i32>(device, config, bus),
    cpal::SampleFormat::F32 => make_stream::<f32>(device, config, bus),
    _ => bail!("unsupported output sample format: {sample_format:?}"),
  }
}

pub fn make_stream<T>(
  device: &cpal::Device,
  config: &cpal::StreamConfig,
  mut bus: MixBus,
) -> anyhow::Result<cpal::Stream>
where
  T: SizedSample + FromSample<f32>,
{
  let num_channels = config.channels as usize;
  let err_fn = |err| tracing::error!("output stream error: {err}");

  let mut scratch: Vec<f32> = Vec::new();
  let stream = device
    .build_output_stream(
      config,
      move |output: &mut [T], _info: &cpal::OutputCallbackInfo| {
        profiling::scope!("audio_callback");

        // Grows once to the device's buffer size, then reused
        scratch.resize(output.len(), 0.0);
        bus.render(&mut scratch, num_channels);
        for (out, sample) in output.iter_mut().zip(&scratch) {
          *out = T::from_sample(*sample);
        }
      },
      err_fn,
      None,
    )
    .context("failed to build output stream")?;

  Ok(stream)
}

pub fn get_host_by_preference() -> Host {
  #[cfg(target_os = "windows")]
  {
    if let Ok(wasapi) = cpal::host_from_id(HostId::Wasapi) {
      tracing::info!("Using WASAPI");
      return wasapi;
    }
  }

  #[cfg(target_os = "macos")]
  {
    if let Ok(coreaudio_host) = cpal::host_from_id(HostId::CoreAudio) {
      tracing::info!("Using CoreAudio");
      return coreaudio_host;
    }
  }

  #[cfg(target_os = "linux")]
  {
    if let Ok(jack_host) = cpal::host_from_id(HostId::Jack) {
      tracing::info!("Using JACK");
      return jack_host;
    }

    if let Ok(alsa_host) = cpal::host_from_id(HostId::Alsa) {
      tracing::info!("Using ALSA");
      return alsa_host;
    }
  }

  let default_host = cpal::default_host();
  tracing::info!("Using default host: {:?}", default_host.id());
  default_host
}
