//! The shared 120 bpm kick mixed into every voice.

use std::f64::consts::TAU;

use crate::config::BeatConfig;

const KICK_BASE_FREQ: f64 = 50.0;
const KICK_PITCH_SLIDE: f64 = 10.0;
const KICK_DECAY: f64 = 15.0;

/// Decaying sine sweep retriggered every beat interval.
///
/// Stateless: the output is a function of the beat-clock time alone.
#[derive(Clone, Copy, Debug)]
pub struct KickOverlay {
    interval: f64,
    level: f32,
    enabled: bool,
}

impl KickOverlay {
    pub fn new(beat: &BeatConfig) -> Self {
        Self {
            interval: beat.interval(),
            level: beat.level,
            enabled: beat.enabled,
        }
    }

    /// Kick sample at beat-clock time `t` seconds.
    #[inline]
    pub fn sample(&self, t: f64) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        let tau = t.rem_euclid(self.interval);
        let freq = KICK_BASE_FREQ * (-tau * KICK_PITCH_SLIDE).exp();
        let osc = (TAU * freq * tau).sin();
        (osc * (-tau * KICK_DECAY).exp()) as f32 * self.level
    }
}

impl Default for KickOverlay {
    fn default() -> Self {
        Self::new(&BeatConfig::default())
    }
}
