use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio_io::CpalBackend;
use crate::config::EngineConfig;
use crate::dsp::NoiseSource;
use crate::models::VoiceId;
use crate::synth::Synth;

/// Why an output stream could not be opened.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("no output device available")]
    NoOutputDevice,
    #[error("output device `{0}` not found")]
    DeviceNotFound(String),
    #[error("failed to enumerate output devices: {0}")]
    Devices(#[from] cpal::DevicesError),
    #[error("no default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
    #[error("unsupported sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
}

/// Counters shared between the audio callback and the control thread.
#[derive(Debug, Default)]
pub struct SessionMonitor {
    frames: AtomicU64,
    faulted: AtomicBool,
}

impl SessionMonitor {
    pub fn add_frames(&self, n: u64) {
        self.frames.fetch_add(n, Ordering::Relaxed);
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn mark_faulted(&self) {
        self.faulted.store(true, Ordering::Release);
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }
}

/// Something that can run a [`Synth`] on an output device.
pub trait OutputBackend {
    /// Playing stream; dropping it releases the device.
    type Stream;

    /// Open and start a stream, returning it with its sample rate.
    ///
    /// `build` receives the device rate. It may be called more than once when
    /// the first stream configuration is refused; only the last synth is kept.
    fn open<F>(
        &mut self,
        build: F,
        monitor: Arc<SessionMonitor>,
    ) -> Result<(Self::Stream, u32), EngineError>
    where
        F: FnMut(u32) -> Synth;
}

struct ActiveSession<S> {
    _stream: S,
    voice: VoiceId,
    sample_rate: u32,
    monitor: Arc<SessionMonitor>,
}

/// Owns the live output stream, if any, and the current voice selection.
///
/// Dropping the engine stops playback.
pub struct AmbientEngine<B: OutputBackend = CpalBackend> {
    backend: B,
    config: EngineConfig,
    selected: VoiceId,
    seed: Option<u64>,
    session: Option<ActiveSession<B::Stream>>,
}

impl AmbientEngine<CpalBackend> {
    pub fn new(config: EngineConfig) -> Self {
        let backend = CpalBackend::from_config(&config);
        Self::with_backend(backend, config)
    }
}

impl<B: OutputBackend> AmbientEngine<B> {
    pub fn with_backend(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            selected: config.default_voice,
            config,
            seed: None,
            session: None,
        }
    }

    /// Seed every session's noise source with `seed` instead of OS entropy.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start `voice` from fresh state, replacing any running session.
    ///
    /// Returns whether audio is now playing. Device failures are logged, not
    /// returned.
    pub fn start(&mut self, voice: VoiceId) -> bool {
        self.stop();
        self.selected = voice;

        let monitor = Arc::new(SessionMonitor::default());
        let config = &self.config;
        let seed = self.seed;
        let build = |rate: u32| {
            let noise = seed.map_or_else(NoiseSource::from_entropy, NoiseSource::seeded);
            Synth::with_noise(voice, rate, config, noise)
        };

        match self.backend.open(build, Arc::clone(&monitor)) {
            Ok((stream, sample_rate)) => {
                log::info!("Playing {} at {sample_rate} Hz", voice.info().name);
                self.session = Some(ActiveSession {
                    _stream: stream,
                    voice,
                    sample_rate,
                    monitor,
                });
                true
            }
            Err(e) => {
                log::warn!("Could not start {voice}: {e}");
                false
            }
        }
    }

    /// Release the stream. No-op when nothing is playing.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            log::info!(
                "Stopped {} after {} frames",
                session.voice,
                session.monitor.frames()
            );
        }
    }

    /// Select a voice, restarting playback if a session is live.
    pub fn set_voice(&mut self, voice: VoiceId) {
        if self.session.is_some() {
            self.start(voice);
        } else {
            self.selected = voice;
        }
    }

    /// Play/stop button. Returns the new playing state.
    pub fn toggle(&mut self) -> bool {
        if self.is_playing() {
            self.stop();
            false
        } else {
            self.start(self.selected)
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.monitor.is_faulted())
    }

    pub fn voice(&self) -> VoiceId {
        self.selected
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.session.as_ref().map(|s| s.sample_rate)
    }

    /// Frames produced by the live session, 0 when stopped.
    pub fn frames_rendered(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.monitor.frames())
    }
}

impl<B: OutputBackend> Drop for AmbientEngine<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
