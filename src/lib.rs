pub mod config;
pub mod error;
pub mod fft;
pub mod float;
pub mod pitch_shift;
pub mod wav;
pub mod windows;

pub use config::PitchShiftConfig;
pub use error::{PitchShiftError, Result};
pub use pitch_shift::{PitchShifter, HOP_COUNT};

/// Root mean square of a buffer.
pub fn power<T: float::Float + std::iter::Sum>(buf: &[T]) -> T {
    if buf.is_empty() {
        return T::zero();
    }
    (buf.iter().map(|&x| x.powi(2)).sum::<T>() / float::real(buf.len())).sqrt()
}
