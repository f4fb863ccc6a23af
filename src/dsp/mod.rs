use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::TAU;

/// Uniform white noise in [-1, 1).
pub struct NoiseSource {
    rng: StdRng,
}

impl NoiseSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    pub fn white(&mut self) -> f32 {
        self.rng.gen::<f32>() * 2.0 - 1.0
    }
}

/// `y[n] = (y[n-1] + k·x[n]) / (1 + k)`
#[derive(Clone, Copy, Debug)]
pub struct OnePole {
    k: f32,
    last_out: f32,
}

impl OnePole {
    pub fn new(k: f32) -> Self {
        Self { k, last_out: 0.0 }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.last_out = (self.last_out + self.k * x) / (1.0 + self.k);
        self.last_out
    }
}

/// Paul Kellet's refined pink noise filter.
#[derive(Clone, Copy, Debug, Default)]
pub struct PinkFilter {
    b0: f32,
    b1: f32,
    b2: f32,
    b3: f32,
    b4: f32,
    b5: f32,
    b6: f32,
}

impl PinkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unscaled output; the caller applies the post-gain.
    #[inline]
    pub fn process(&mut self, w: f32) -> f32 {
        self.b0 = 0.99886 * self.b0 + w * 0.0555179;
        self.b1 = 0.99332 * self.b1 + w * 0.0750759;
        self.b2 = 0.96900 * self.b2 + w * 0.1538520;
        self.b3 = 0.86650 * self.b3 + w * 0.3104856;
        self.b4 = 0.55000 * self.b4 + w * 0.5329522;
        self.b5 = -0.7616 * self.b5 - w * 0.0168980;
        let out = self.b0 + self.b1 + self.b2 + self.b3 + self.b4 + self.b5 + self.b6 + w * 0.5362;
        self.b6 = w * 0.115926;
        out
    }
}

/// Phase accumulator counting cycles.
///
/// Never wrapped: several voices take detuned partials (`1.01`, `1.02`, `1.5`
/// times the phase) which would jump at a wrap point. An `f64` count keeps
/// sub-nanocycle resolution for many hours of playback.
#[derive(Clone, Copy, Debug, Default)]
pub struct Phasor {
    phase: f64,
}

impl Phasor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one sample at `freq` Hz and return the new phase in cycles.
    #[inline]
    pub fn advance(&mut self, freq: f64, sample_rate: f64) -> f64 {
        self.phase += freq / sample_rate;
        self.phase
    }
}

/// `sin(2π·cycles)`
#[inline]
pub fn sine(cycles: f64) -> f32 {
    (TAU * cycles).sin() as f32
}

/// `sin(2π·t/period)` with the period reduced first, so epoch-sized `t`
/// keeps its precision.
#[inline]
pub fn lfo(t: f64, period: f64) -> f32 {
    sine(t.rem_euclid(period) / period)
}
