use hound::{SampleFormat, WavSpec, WavWriter};
use std::io;
use std::path::Path;

use crate::synth::Synth;

const BLOCK_FRAMES: usize = 512;
/// Largest mono 16-bit payload a WAV data chunk can describe.
const MAX_FRAMES: u64 = (u32::MAX / 2) as u64;

/// Render `seconds` of `synth` into a mono 16-bit WAV at the synth's rate.
///
/// Returns the number of frames written. Negative durations write an empty
/// file; non-finite or oversized ones are rejected before the file is created.
pub fn render_to_wav<P: AsRef<Path>>(
    synth: &mut Synth,
    seconds: f64,
    out_path: P,
) -> Result<u64, hound::Error> {
    let out_path = out_path.as_ref();
    let sample_rate = synth.sample_rate();
    let wanted = seconds.max(0.0) * sample_rate as f64;
    if seconds.is_nan() || !wanted.is_finite() || wanted.round() > MAX_FRAMES as f64 {
        return Err(hound::Error::IoError(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot render {seconds}s at {sample_rate} Hz"),
        )));
    }
    let target_frames = wanted.round() as u64;

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(out_path, spec)?;
    let start_time = std::time::Instant::now();
    let mut remaining = target_frames;
    let mut buffer = [0.0f32; BLOCK_FRAMES];
    while remaining > 0 {
        let frames = (BLOCK_FRAMES as u64).min(remaining) as usize;
        synth.process_block(&mut buffer[..frames], 1);
        for sample in &buffer[..frames] {
            writer.write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
        }
        remaining -= frames as u64;
    }
    writer.finalize()?;

    log::info!(
        "Rendered {} frames of {} to {} in {:.2}s",
        target_frames,
        synth.voice(),
        out_path.display(),
        start_time.elapsed().as_secs_f32()
    );
    Ok(target_frames)
}
