use std::sync::Arc;

use rustfft::{num_complex::Complex, num_traits::Zero, Length};

use crate::{
    error::{PitchShiftError, Result},
    float::Float,
};

/// Forward/inverse plan pair for one frame length.
///
/// Plans are immutable and cheap to clone, so several engines may share one.
/// Scratch space is always supplied by the caller and must not be shared
/// between concurrent transforms.
#[derive(Clone)]
pub struct Fft<T: Float> {
    forward: Arc<dyn rustfft::Fft<T>>,
    inverse: Arc<dyn rustfft::Fft<T>>,
}

#[allow(clippy::len_without_is_empty)]
impl<T: Float> Fft<T> {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(PitchShiftError::TransformUnavailable { frame_size: size });
        }

        let mut planner = rustfft::FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        if forward.len() != size || inverse.len() != size {
            return Err(PitchShiftError::TransformUnavailable { frame_size: size });
        }

        Ok(Self { forward, inverse })
    }

    /// Frame length the plans were built for.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Number of half-spectrum bins, `len / 2 + 1`.
    pub fn half_len(&self) -> usize {
        self.len() / 2 + 1
    }

    /// Scratch length that fits both directions.
    pub fn scratch_len(&self) -> usize {
        self.forward
            .get_inplace_scratch_len()
            .max(self.inverse.get_inplace_scratch_len())
    }

    /// Transforms a real frame. Afterwards `spectrum[..half_len()]` holds the
    /// half spectrum; the rest is its conjugate mirror.
    pub fn forward_real(
        &self,
        frame: &[T],
        spectrum: &mut [Complex<T>],
        scratch: &mut [Complex<T>],
    ) {
        debug_assert_eq!(frame.len(), self.len());
        for (dst, &x) in spectrum.iter_mut().zip(frame.iter()) {
            *dst = Complex::new(x, T::zero());
        }
        self.forward.process_with_scratch(spectrum, scratch);
    }

    /// Transforms the half spectrum in `spectrum[..half_len()]` back to a real
    /// frame. Bins past the half spectrum are discarded and rebuilt from it.
    ///
    /// The result is not normalized: a forward/inverse round trip scales the
    /// frame by `len()`.
    pub fn inverse_real(
        &self,
        spectrum: &mut [Complex<T>],
        frame: &mut [T],
        scratch: &mut [Complex<T>],
    ) {
        debug_assert_eq!(frame.len(), self.len());
        spectrum[self.half_len()..].fill(Complex::zero());
        fill_right_part_of_spectrum(spectrum);
        self.inverse.process_with_scratch(spectrum, scratch);
        for (dst, x) in frame.iter_mut().zip(spectrum.iter()) {
            *dst = x.re;
        }
    }
}

/// Mirrors the lower half of a spectrum into the upper half as complex
/// conjugates, making it the spectrum of a real signal.
pub fn fill_right_part_of_spectrum<T: Float>(spectrum: &mut [Complex<T>]) {
    let len = spectrum.len();
    for i in 1..(len + 1) / 2 {
        spectrum[len - i] = spectrum[i].conj();
    }
}
