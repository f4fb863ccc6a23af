use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, FromSample, Sample, SampleFormat, SizedSample, StreamConfig, SupportedStreamConfig,
    SupportedStreamConfigRange,
};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::{EngineError, OutputBackend, SessionMonitor};
use crate::synth::Synth;

/// Plays sessions on a cpal output device.
pub struct CpalBackend {
    device_name: Option<String>,
    buffer_frames: u32,
}

impl CpalBackend {
    pub fn new(device_name: Option<String>, buffer_frames: u32) -> Self {
        Self {
            device_name,
            buffer_frames,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.device.clone(), config.buffer_frames)
    }

    fn device(&self) -> Result<cpal::Device, EngineError> {
        let host = cpal::default_host();
        match &self.device_name {
            Some(wanted) => host
                .output_devices()?
                .find(|d| d.name().map(|n| &n == wanted).unwrap_or(false))
                .ok_or_else(|| EngineError::DeviceNotFound(wanted.clone())),
            None => host
                .default_output_device()
                .ok_or(EngineError::NoOutputDevice),
        }
    }
}

/// Names of the host's output devices, for `--device` discovery.
pub fn list_output_devices() -> Result<Vec<String>, EngineError> {
    let host = cpal::default_host();
    Ok(host
        .output_devices()?
        .filter_map(|d| d.name().ok())
        .collect())
}

/// A mono config at the device's default rate if the device offers one,
/// otherwise the default config.
fn pick_config(device: &cpal::Device) -> Result<SupportedStreamConfig, EngineError> {
    let default = device.default_output_config()?;
    if default.channels() == 1 {
        return Ok(default);
    }
    Ok(prefer_mono(default, device.supported_output_configs()))
}

/// Mono variant of `default` from `ranges`, keeping its rate and format.
/// Falls back to `default` when the ranges cannot be listed.
fn prefer_mono<I>(
    default: SupportedStreamConfig,
    ranges: Result<I, cpal::SupportedStreamConfigsError>,
) -> SupportedStreamConfig
where
    I: Iterator<Item = SupportedStreamConfigRange>,
{
    let ranges = match ranges {
        Ok(ranges) => ranges,
        Err(e) => {
            log::warn!("Could not list output configs ({e}), using the default");
            return default;
        }
    };
    let rate = default.sample_rate();
    let mono = ranges.into_iter().find(|c| {
        c.channels() == 1
            && c.sample_format() == default.sample_format()
            && c.min_sample_rate() <= rate
            && rate <= c.max_sample_rate()
    });
    match mono {
        Some(range) => range.with_sample_rate(rate),
        None => default,
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    format: SampleFormat,
    synth: Synth,
    monitor: Arc<SessionMonitor>,
) -> Result<cpal::Stream, EngineError> {
    match format {
        SampleFormat::F32 => build_typed::<f32>(device, config, synth, monitor),
        SampleFormat::I16 => build_typed::<i16>(device, config, synth, monitor),
        SampleFormat::U16 => build_typed::<u16>(device, config, synth, monitor),
        other => Err(EngineError::UnsupportedSampleFormat(other)),
    }
}

fn build_typed<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut synth: Synth,
    monitor: Arc<SessionMonitor>,
) -> Result<cpal::Stream, EngineError>
where
    T: SizedSample + FromSample<f32>,
{
    let channels = (config.channels as usize).max(1);
    let err_monitor = Arc::clone(&monitor);

    let audio_callback = move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        for frame in data.chunks_mut(channels) {
            frame.fill(T::from_sample(synth.next_sample()));
        }
        monitor.add_frames((data.len() / channels) as u64);
    };
    let err_fn = move |err: cpal::StreamError| {
        log::error!("stream error: {err}");
        err_monitor.mark_faulted();
    };

    Ok(device.build_output_stream(config, audio_callback, err_fn, None)?)
}

impl OutputBackend for CpalBackend {
    type Stream = cpal::Stream;

    fn open<F>(
        &mut self,
        mut build: F,
        monitor: Arc<SessionMonitor>,
    ) -> Result<(cpal::Stream, u32), EngineError>
    where
        F: FnMut(u32) -> Synth,
    {
        let device = self.device()?;
        let supported = pick_config(&device)?;
        let format = supported.sample_format();
        let mut config: StreamConfig = supported.into();
        let rate = config.sample_rate.0;

        config.buffer_size = BufferSize::Fixed(self.buffer_frames);
        let stream = match build_stream(&device, &config, format, build(rate), Arc::clone(&monitor)) {
            Ok(stream) => stream,
            Err(EngineError::BuildStream(e)) => {
                log::warn!(
                    "Buffer of {} frames refused ({e}), using host default",
                    self.buffer_frames
                );
                config.buffer_size = BufferSize::Default;
                build_stream(&device, &config, format, build(rate), monitor)?
            }
            Err(e) => return Err(e),
        };
        stream.play()?;

        log::info!(
            "Audio: {} @ {}Hz, {} ch, {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            rate,
            config.channels,
            format
        );
        Ok((stream, rate))
    }
}
