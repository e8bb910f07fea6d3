//! 16-bit PCM WAV input and output.
//!
//! This is the only place integer samples meet the normalized engine.

use std::path::Path;

use hound::{SampleFormat, WavSpec};
use tracing::debug;

use crate::{
    error::{PitchShiftError, Result},
    float::{real, Float},
};

/// Reads a 16-bit integer WAV file as mono.
///
/// Stereo files are downmixed by averaging each left/right pair. Returns the
/// sample rate and the samples.
pub fn load(p: impl AsRef<Path>) -> Result<(u32, Vec<i16>)> {
    let mut reader = hound::WavReader::open(&p)?;
    let spec = reader.spec();
    debug!(?spec, path = %p.as_ref().display(), "reading wav");

    if spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        return Err(PitchShiftError::UnsupportedFormat(format!(
            "{}-bit {:?} samples, expected 16-bit integer",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let buf = reader.samples::<i16>().collect::<std::result::Result<Vec<_>, _>>()?;
    let buf = match spec.channels {
        1 => buf,
        2 => buf
            .chunks_exact(2)
            .map(|pair| ((pair[0] as i32 + pair[1] as i32) >> 1) as i16)
            .collect(),
        n => {
            return Err(PitchShiftError::UnsupportedFormat(format!(
                "{} channels, expected mono or stereo",
                n
            )))
        }
    };
    Ok((spec.sample_rate, buf))
}

/// Writes mono 16-bit integer samples.
pub fn save(p: impl AsRef<Path>, sample_rate: u32, buf: &[i16]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&p, spec)?;
    for &x in buf {
        writer.write_sample(x)?;
    }
    writer.finalize()?;
    debug!(samples = buf.len(), path = %p.as_ref().display(), "wrote wav");
    Ok(())
}

/// Integer PCM to the normalized range `[-1, 1]`.
pub fn to_sample<T: Float>(x: i16) -> T {
    T::from_i16(x).map_or_else(T::nan, |x| x / real(i16::MAX as usize))
}

/// Normalized sample back to integer PCM, rounded and clamped. NaN becomes
/// silence.
pub fn from_sample<T: Float>(x: T) -> i16 {
    if x.is_nan() {
        return 0;
    }
    let scale: T = real(i16::MAX as usize);
    let lowest = -scale - T::one();
    (x * scale)
        .round()
        .max(lowest)
        .min(scale)
        .to_i16()
        .unwrap_or(0)
}
