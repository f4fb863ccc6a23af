use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{BeatClock, EngineConfig};
use crate::dsp::NoiseSource;
use crate::models::VoiceId;
use crate::overlay::KickOverlay;
use crate::voices::{create_voice, Frame, Voice, VoiceKind};

/// One playback session: a voice, its noise source and the output stage.
///
/// Created fresh on every start; nothing carries over between sessions.
pub struct Synth {
    voice: VoiceKind,
    noise: NoiseSource,
    kick: KickOverlay,
    master_gain: f32,
    sample_rate: f64,
    origin: f64,
    frames: u64,
}

fn beat_origin(clock: BeatClock) -> f64 {
    match clock {
        BeatClock::Wall => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0),
        BeatClock::Session => 0.0,
    }
}

impl Synth {
    pub fn new(voice: VoiceId, sample_rate: u32, config: &EngineConfig) -> Self {
        Self::with_noise(voice, sample_rate, config, NoiseSource::from_entropy())
    }

    pub fn with_noise(
        voice: VoiceId,
        sample_rate: u32,
        config: &EngineConfig,
        noise: NoiseSource,
    ) -> Self {
        Self {
            voice: create_voice(voice),
            noise,
            kick: KickOverlay::new(&config.beat),
            master_gain: config.master_gain,
            sample_rate: sample_rate.max(1) as f64,
            origin: beat_origin(config.beat_clock),
            frames: 0,
        }
    }

    /// Override the beat-clock time of the first frame.
    pub fn with_origin(mut self, origin: f64) -> Self {
        self.origin = origin;
        self
    }

    pub fn voice(&self) -> VoiceId {
        self.voice.id()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate as u32
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Beat-clock time of the next frame.
    pub fn time(&self) -> f64 {
        self.origin + self.frames as f64 / self.sample_rate
    }

    /// Voice plus kick at master gain, before the limiter.
    fn mix(&mut self) -> f32 {
        let time = self.time();
        let white = self.noise.white();
        let mut frame = Frame {
            time,
            sample_rate: self.sample_rate,
            white,
            noise: &mut self.noise,
        };
        let voiced = self.voice.next_sample(&mut frame);
        self.frames += 1;
        (voiced + self.kick.sample(time)) * self.master_gain
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let s = self.mix();
        if s.is_finite() {
            s.clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Fill an interleaved buffer, writing the mono sample to every channel.
    pub fn process_block(&mut self, buffer: &mut [f32], channels: usize) {
        for frame in buffer.chunks_mut(channels.max(1)) {
            frame.fill(self.next_sample());
        }
    }
}
