use std::f64::consts::TAU;

use crate::dsp::{lfo, sine, NoiseSource, OnePole, Phasor, PinkFilter};
use crate::models::VoiceId;

/// Per-sample inputs shared by every voice.
pub struct Frame<'a> {
    /// Beat-clock time of this sample in seconds.
    pub time: f64,
    pub sample_rate: f64,
    /// Uniform draw in [-1, 1) for this sample.
    pub white: f32,
    /// For voices that need a second independent draw.
    pub noise: &'a mut NoiseSource,
}

pub trait Voice: Send {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32;
}

pub struct BrownNoiseVoice {
    filter: OnePole,
}

pub struct PinkNoiseVoice {
    filter: PinkFilter,
}

pub struct WhiteNoiseVoice;

/// Two near-unison sines on one phase accumulator.
pub struct BinauralVoice {
    carrier: f64,
    detune: f64,
    amp: f32,
    phase: Phasor,
}

pub struct OceanVoice;

pub struct DroneVoice {
    phase: Phasor,
}

pub struct WindVoice {
    filter: OnePole,
}

pub struct InterstellarVoice {
    phase: Phasor,
}

pub struct OppenheimerVoice {
    phase: Phasor,
}

pub struct PulseVoice {
    phase: Phasor,
}

pub struct LibraryVoice;

impl BrownNoiseVoice {
    pub fn new() -> Self {
        Self {
            filter: OnePole::new(0.02),
        }
    }
}

impl PinkNoiseVoice {
    pub fn new() -> Self {
        Self {
            filter: PinkFilter::new(),
        }
    }
}

impl BinauralVoice {
    pub fn alpha() -> Self {
        Self::new(440.0, 1.02, 0.1)
    }

    pub fn theta() -> Self {
        Self::new(220.0, 1.01, 0.15)
    }

    pub fn new(carrier: f64, detune: f64, amp: f32) -> Self {
        Self {
            carrier,
            detune,
            amp,
            phase: Phasor::new(),
        }
    }
}

impl DroneVoice {
    pub fn new() -> Self {
        Self { phase: Phasor::new() }
    }
}

impl WindVoice {
    pub fn new() -> Self {
        Self {
            filter: OnePole::new(0.01),
        }
    }
}

impl InterstellarVoice {
    pub fn new() -> Self {
        Self { phase: Phasor::new() }
    }
}

impl OppenheimerVoice {
    pub fn new() -> Self {
        Self { phase: Phasor::new() }
    }
}

impl PulseVoice {
    pub fn new() -> Self {
        Self { phase: Phasor::new() }
    }
}

impl Voice for BrownNoiseVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        self.filter.process(frame.white) * 5.5
    }
}

impl Voice for PinkNoiseVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        self.filter.process(frame.white) * 0.11
    }
}

impl Voice for WhiteNoiseVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        frame.white * 0.2
    }
}

impl Voice for BinauralVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        let phase = self.phase.advance(self.carrier, frame.sample_rate);
        sine(phase) * self.amp + sine(phase * self.detune) * self.amp
    }
}

impl Voice for OceanVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        // 8 s swell rescaled to [0, 1]
        let swell = lfo(frame.time, 8.0) * 0.5 + 0.5;
        frame.white * swell * 0.3
    }
}

impl Voice for DroneVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        let phase = self.phase.advance(60.0, frame.sample_rate);
        sine(phase) * 0.3 + frame.noise.white() * 0.05
    }
}

impl Voice for WindVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        let gust = lfo(frame.time, 12.0) * 0.3 + 0.7;
        self.filter.process(frame.white) * gust * 6.0
    }
}

impl Voice for InterstellarVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        let phase = self.phase.advance(65.41, frame.sample_rate);
        let pulse = lfo(frame.time, 0.8).powi(8);
        let organ = sine(phase) * 0.2 + sine(phase * 2.0) * 0.1 + sine(phase * 1.5) * 0.05;
        organ * (0.6 + pulse * 0.4) + frame.white * 0.01
    }
}

impl Voice for OppenheimerVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        let t = frame.time;
        let tick = lfo(t, 1.0 / 3.0).powi(64);
        let swell = lfo(t, 10.0) * 0.5 + 0.5;
        // vibrato: 5 rad/s, ±5 Hz
        let vibrato = lfo(t, TAU / 5.0) as f64 * 5.0;
        let phase = self.phase.advance(440.0 + vibrato, frame.sample_rate);
        sine(phase) * 0.1 * swell + tick * 0.1 + frame.noise.white() * 0.02 * swell
    }
}

impl Voice for PulseVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        let gate = if lfo(frame.time, 0.5) > 0.9 { 1.0 } else { 0.0 };
        let phase = self.phase.advance(330.0, frame.sample_rate);
        sine(phase) * gate * 0.2
    }
}

impl Voice for LibraryVoice {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        frame.white * 0.02
    }
}

pub enum VoiceKind {
    Brown(BrownNoiseVoice),
    Pink(PinkNoiseVoice),
    White(WhiteNoiseVoice),
    Ocean(OceanVoice),
    Alpha(BinauralVoice),
    Theta(BinauralVoice),
    Drone(DroneVoice),
    Wind(WindVoice),
    Interstellar(InterstellarVoice),
    Oppenheimer(OppenheimerVoice),
    Pulse(PulseVoice),
    Library(LibraryVoice),
}

impl VoiceKind {
    pub fn id(&self) -> VoiceId {
        match self {
            VoiceKind::Brown(_) => VoiceId::Brown,
            VoiceKind::Pink(_) => VoiceId::Pink,
            VoiceKind::White(_) => VoiceId::White,
            VoiceKind::Ocean(_) => VoiceId::Ocean,
            VoiceKind::Alpha(_) => VoiceId::Alpha,
            VoiceKind::Theta(_) => VoiceId::Theta,
            VoiceKind::Drone(_) => VoiceId::Drone,
            VoiceKind::Wind(_) => VoiceId::Wind,
            VoiceKind::Interstellar(_) => VoiceId::Interstellar,
            VoiceKind::Oppenheimer(_) => VoiceId::Oppenheimer,
            VoiceKind::Pulse(_) => VoiceId::Pulse,
            VoiceKind::Library(_) => VoiceId::Library,
        }
    }
}

impl Voice for VoiceKind {
    fn next_sample(&mut self, frame: &mut Frame<'_>) -> f32 {
        match self {
            VoiceKind::Brown(v) => v.next_sample(frame),
            VoiceKind::Pink(v) => v.next_sample(frame),
            VoiceKind::White(v) => v.next_sample(frame),
            VoiceKind::Ocean(v) => v.next_sample(frame),
            VoiceKind::Alpha(v) => v.next_sample(frame),
            VoiceKind::Theta(v) => v.next_sample(frame),
            VoiceKind::Drone(v) => v.next_sample(frame),
            VoiceKind::Wind(v) => v.next_sample(frame),
            VoiceKind::Interstellar(v) => v.next_sample(frame),
            VoiceKind::Oppenheimer(v) => v.next_sample(frame),
            VoiceKind::Pulse(v) => v.next_sample(frame),
            VoiceKind::Library(v) => v.next_sample(frame),
        }
    }
}

/// Fresh voice with zeroed filter and phase state.
pub fn create_voice(id: VoiceId) -> VoiceKind {
    match id {
        VoiceId::Brown => VoiceKind::Brown(BrownNoiseVoice::new()),
        VoiceId::Pink => VoiceKind::Pink(PinkNoiseVoice::new()),
        VoiceId::White => VoiceKind::White(WhiteNoiseVoice),
        VoiceId::Ocean => VoiceKind::Ocean(OceanVoice),
        VoiceId::Alpha => VoiceKind::Alpha(BinauralVoice::alpha()),
        VoiceId::Theta => VoiceKind::Theta(BinauralVoice::theta()),
        VoiceId::Drone => VoiceKind::Drone(DroneVoice::new()),
        VoiceId::Wind => VoiceKind::Wind(WindVoice::new()),
        VoiceId::Interstellar => VoiceKind::Interstellar(InterstellarVoice::new()),
        VoiceId::Oppenheimer => VoiceKind::Oppenheimer(OppenheimerVoice::new()),
        VoiceId::Pulse => VoiceKind::Pulse(PulseVoice::new()),
        VoiceId::Library => VoiceKind::Library(LibraryVoice),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48_000.0;

    /// Raw voice output (no kick, no master gain) starting at time 0.
    fn render(id: VoiceId, seed: u64, n: usize) -> Vec<f32> {
        let mut voice = create_voice(id);
        let mut noise = NoiseSource::seeded(seed);
        (0..n)
            .map(|i| {
                let white = noise.white();
                let mut frame = Frame {
                    time: i as f64 / SR,
                    sample_rate: SR,
                    white,
                    noise: &mut noise,
                };
                voice.next_sample(&mut frame)
            })
            .collect()
    }

    /// `(t, white, second draw)` per sample, in the order the voices consume
    /// them. `second` is `None` for voices that only use `white`.
    fn draws(seed: u64, n: usize, second: bool) -> Vec<(f64, f64, Option<f64>)> {
        let mut noise = NoiseSource::seeded(seed);
        (0..n)
            .map(|i| {
                let white = noise.white() as f64;
                let extra = second.then(|| noise.white() as f64);
                (i as f64 / SR, white, extra)
            })
            .collect()
    }

    fn sin2pi(x: f64) -> f64 {
        (TAU * x).sin()
    }

    fn assert_tracks(id: VoiceId, out: &[f32], reference: &[f64]) {
        assert_eq!(out.len(), reference.len());
        let worst = out
            .iter()
            .zip(reference)
            .map(|(o, r)| (*o as f64 - r).abs())
            .fold(0.0f64, f64::max);
        assert!(worst < 1e-4, "{id}: max error {worst}");
    }

    /// One-pole lowpass with `k = 0.01` under a 12 s gust envelope.
    fn wind_reference(seed: u64, n: usize) -> (Vec<f64>, Vec<f64>) {
        let mut y = 0.0f64;
        draws(seed, n, false)
            .into_iter()
            .map(|(t, w, _)| {
                y = (y + 0.01 * w) / 1.01;
                let gust = sin2pi(t / 12.0) * 0.3 + 0.7;
                (y * gust * 6.0, y)
            })
            .unzip()
    }

    fn mean_square(samples: &[f32]) -> f64 {
        samples.iter().map(|&s| (s as f64) * (s as f64)).sum::<f64>() / samples.len() as f64
    }

    #[test]
    fn create_voice_matches_id() {
        for id in VoiceId::ALL {
            assert_eq!(create_voice(id).id(), id);
        }
    }

    #[test]
    fn white_power_matches_gain() {
        let out = render(VoiceId::White, 1, 100_000);
        let expected = 0.2f64.powi(2) / 3.0;
        let got = mean_square(&out);
        assert!((got - expected).abs() < expected * 0.05, "{got} vs {expected}");
    }

    #[test]
    fn brown_power_matches_one_pole_gain() {
        let out = render(VoiceId::Brown, 2, 480_000);
        // stationary variance of y = a·y + g·x with var(x) = 1/3
        let a = 1.0 / 1.02f64;
        let g = 0.02 / 1.02f64;
        let expected = 5.5f64.powi(2) * g * g / 3.0 / (1.0 - a * a);
        let got = mean_square(&out[2_000..]);
        assert!((got - expected).abs() < expected * 0.1, "{got} vs {expected}");
    }

    #[test]
    fn pink_power_matches_kellet_response() {
        let out = render(VoiceId::Pink, 3, 960_000);
        let poles: [(f64, f64); 6] = [
            (0.99886, 0.0555179),
            (0.99332, 0.0750759),
            (0.96900, 0.1538520),
            (0.86650, 0.3104856),
            (0.55000, 0.5329522),
            (-0.7616, -0.0168980),
        ];
        let mut powers = [1.0f64; 6];
        let mut energy = 0.0;
        for m in 0..100_000 {
            let mut h: f64 = poles.iter().zip(&powers).map(|((_, g), p)| g * p).sum();
            if m == 0 {
                h += 0.5362;
            } else if m == 1 {
                h += 0.115926;
            }
            energy += h * h;
            for (p, (a, _)) in powers.iter_mut().zip(&poles) {
                *p *= a;
            }
        }
        let expected = 0.11f64.powi(2) * energy / 3.0;
        let got = mean_square(&out[20_000..]);
        assert!((got - expected).abs() < expected * 0.2, "{got} vs {expected}");
    }

    #[test]
    fn pulse_duty_cycle_follows_gate() {
        let out = render(VoiceId::Pulse, 4, 4 * SR as usize);
        let on = out.iter().filter(|s| **s != 0.0).count() as f64 / out.len() as f64;
        let expected = (std::f64::consts::PI - 2.0 * 0.9f64.asin()) / TAU;
        assert!((on - expected).abs() < expected * 0.1, "{on} vs {expected}");
    }

    #[test]
    fn binaural_pairs_stay_within_summed_amplitude() {
        for (id, amp) in [(VoiceId::Alpha, 0.2f32), (VoiceId::Theta, 0.3)] {
            let out = render(id, 5, 48_000);
            let peak = out.iter().fold(0.0f32, |m, s| m.max(s.abs()));
            assert!(peak <= amp + 1e-6);
            // the detuned pair beats, so it gets close to the sum at some point
            assert!(peak > amp * 0.9, "{id}: {peak}");
        }
    }

    #[test]
    fn ocean_swell_silences_the_trough() {
        // envelope minimum sits at t = 6 s of each 8 s cycle
        let out = render(VoiceId::Ocean, 6, 8 * SR as usize);
        let trough = &out[(5.99 * SR) as usize..(6.01 * SR) as usize];
        let crest = &out[(1.99 * SR) as usize..(2.01 * SR) as usize];
        assert!(trough.iter().all(|s| s.abs() < 0.001));
        assert!(crest.iter().any(|s| s.abs() > 0.2));
    }

    #[test]
    fn wind_follows_filtered_gusts() {
        let n = 2 * SR as usize;
        let (reference, _) = wind_reference(8, n);
        assert_tracks(VoiceId::Wind, &render(VoiceId::Wind, 8, n), &reference);
    }

    #[test]
    fn wind_gust_bottoms_out_at_nine_seconds() {
        let n = 12 * SR as usize;
        let out = render(VoiceId::Wind, 9, n);
        let (_, filtered) = wind_reference(9, n);
        // envelope = output / (6 · filtered), skipping near-zero filter output
        let envelope: Vec<(f64, f64)> = out
            .iter()
            .zip(&filtered)
            .enumerate()
            .filter(|(_, (_, y))| y.abs() > 0.02)
            .map(|(i, (o, y))| (i as f64 / SR, *o as f64 / (6.0 * y)))
            .collect();
        let (t_min, low) = envelope
            .iter()
            .copied()
            .fold((0.0, f64::MAX), |m, e| if e.1 < m.1 { e } else { m });
        let (t_max, high) = envelope
            .iter()
            .copied()
            .fold((0.0, f64::MIN), |m, e| if e.1 > m.1 { e } else { m });
        assert!((t_min - 9.0).abs() < 0.1, "trough at {t_min}");
        assert!((low - 0.4).abs() < 1e-3, "trough {low}");
        assert!((t_max - 3.0).abs() < 0.1, "crest at {t_max}");
        assert!((high - 1.0).abs() < 1e-3, "crest {high}");
    }

    #[test]
    fn drone_is_sixty_hertz_plus_second_draw() {
        let n = SR as usize;
        let reference: Vec<f64> = draws(10, n, true)
            .into_iter()
            .enumerate()
            .map(|(i, (_, _, extra))| {
                let phase = (i + 1) as f64 * 60.0 / SR;
                sin2pi(phase) * 0.3 + extra.unwrap_or_default() * 0.05
            })
            .collect();
        assert_tracks(VoiceId::Drone, &render(VoiceId::Drone, 10, n), &reference);
    }

    #[test]
    fn interstellar_organ_swells_with_pulse() {
        let n = 4 * SR as usize;
        let reference: Vec<f64> = draws(11, n, false)
            .into_iter()
            .enumerate()
            .map(|(i, (t, w, _))| {
                let phase = (i + 1) as f64 * 65.41 / SR;
                let pulse = sin2pi(t * 1.25).powi(8);
                let organ = sin2pi(phase) * 0.2
                    + sin2pi(phase * 2.0) * 0.1
                    + sin2pi(phase * 1.5) * 0.05;
                organ * (0.6 + pulse * 0.4) + w * 0.01
            })
            .collect();
        assert_tracks(
            VoiceId::Interstellar,
            &render(VoiceId::Interstellar, 11, n),
            &reference,
        );
    }

    #[test]
    fn oppenheimer_ticks_over_vibrato_swell() {
        let n = 4 * SR as usize;
        let mut phase = 0.0f64;
        let reference: Vec<f64> = draws(12, n, true)
            .into_iter()
            .map(|(t, _, extra)| {
                let tick = sin2pi(t * 3.0).powi(64);
                let swell = sin2pi(t * 0.1) * 0.5 + 0.5;
                let vibrato = (t * 5.0).sin() * 5.0;
                phase += (440.0 + vibrato) / SR;
                sin2pi(phase) * 0.1 * swell
                    + tick * 0.1
                    + extra.unwrap_or_default() * 0.02 * swell
            })
            .collect();
        assert_tracks(
            VoiceId::Oppenheimer,
            &render(VoiceId::Oppenheimer, 12, n),
            &reference,
        );
    }

    #[test]
    fn library_hiss_is_quiet() {
        let out = render(VoiceId::Library, 7, 48_000);
        assert!(out.iter().all(|s| s.abs() <= 0.02));
    }
}
