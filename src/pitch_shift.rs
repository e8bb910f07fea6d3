//! Streaming phase-vocoder pitch shifter.
//!
//! Samples go in and come out one at a time. Every `hop_size` samples the most
//! recent `frame_size` inputs are windowed, transformed, moved to new bins
//! scaled by the pitch ratio, resynthesized with phase-continuous accumulators
//! and overlap-added into the output. Nothing derived from the input appears
//! before `latency = frame_size - hop_size` output samples.

use rustfft::{
    num_complex::Complex,
    num_traits::{self, Zero},
};
use tracing::debug;

use crate::{
    error::{PitchShiftError, Result},
    fft::Fft,
    float::{real, Float},
    windows::{hann_window, squared_overlap_gain},
};

/// Oversampling factor: frames advance by `frame_size / HOP_COUNT` samples.
pub const HOP_COUNT: usize = 4;

/// Every buffer a stream owns. Allocated and released as one unit.
struct Buffers<T> {
    input_fifo: Vec<T>,
    output_fifo: Vec<T>,
    window: Vec<T>,
    last_phase: Vec<T>,
    phase_sum: Vec<T>,
    output_accumulator: Vec<T>,
    synthesized_frequency: Vec<T>,
    synthesized_magnitude: Vec<T>,
    frame: Vec<T>,
    spectrum: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T: Float> Buffers<T> {
    fn allocate(frame_size: usize, scratch_len: usize) -> Result<Self> {
        let half = frame_size / 2 + 1;
        let mut window = zeroed(frame_size, T::zero())?;
        window.copy_from_slice(&hann_window(frame_size));

        Ok(Self {
            input_fifo: zeroed(frame_size, T::zero())?,
            output_fifo: zeroed(frame_size, T::zero())?,
            window,
            last_phase: zeroed(half, T::zero())?,
            phase_sum: zeroed(half, T::zero())?,
            output_accumulator: zeroed(frame_size, T::zero())?,
            synthesized_frequency: zeroed(frame_size, T::zero())?,
            synthesized_magnitude: zeroed(frame_size, T::zero())?,
            frame: zeroed(frame_size, T::zero())?,
            spectrum: zeroed(frame_size, Complex::zero())?,
            scratch: zeroed(scratch_len, Complex::zero())?,
        })
    }

    fn clear(&mut self) {
        for buf in [
            &mut self.input_fifo,
            &mut self.output_fifo,
            &mut self.last_phase,
            &mut self.phase_sum,
            &mut self.output_accumulator,
            &mut self.synthesized_frequency,
            &mut self.synthesized_magnitude,
            &mut self.frame,
        ] {
            buf.fill(T::zero());
        }
        self.spectrum.fill(Complex::zero());
    }
}

fn zeroed<V: Clone>(len: usize, value: V) -> Result<Vec<V>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| PitchShiftError::Allocation { len })?;
    buf.resize(len, value);
    Ok(buf)
}

/// Pitch shifter state for one mono stream.
///
/// Not meant to be shared between threads while processing; independent
/// streams each own a `PitchShifter` (the [`Fft`] plan may be shared).
pub struct PitchShifter<T: Float> {
    fft: Fft<T>,
    buffers: Buffers<T>,
    frame_size: usize,
    hop_size: usize,
    latency: usize,
    sample_rate: u32,
    bin_width: T,
    expected_phase_increment: T,
    normalization: T,
    overlap_cursor: usize,
}

impl<T: Float> PitchShifter<T> {
    /// Creates a shifter analysing `frame_size` samples at a time.
    ///
    /// Odd frame sizes are rounded up to the next even size.
    pub fn new(frame_size: usize, sample_rate: u32) -> Result<Self> {
        if frame_size == 0 {
            return Err(PitchShiftError::InvalidConfiguration(
                "frame size must be positive".to_string(),
            ));
        }
        let frame_size = frame_size + frame_size % 2;
        if frame_size < HOP_COUNT {
            return Err(PitchShiftError::InvalidConfiguration(format!(
                "frame size {} is shorter than the overlap factor {}",
                frame_size, HOP_COUNT
            )));
        }
        Self::with_fft(Fft::new(frame_size)?, sample_rate)
    }

    /// Creates a shifter over an existing plan; the frame size is the plan's
    /// length.
    pub fn with_fft(fft: Fft<T>, sample_rate: u32) -> Result<Self> {
        let frame_size = fft.len();
        if frame_size % 2 != 0 || frame_size < HOP_COUNT {
            return Err(PitchShiftError::InvalidConfiguration(format!(
                "frame size {} must be even and at least {}",
                frame_size, HOP_COUNT
            )));
        }
        if sample_rate == 0 {
            return Err(PitchShiftError::InvalidConfiguration(
                "sample rate must be positive".to_string(),
            ));
        }

        let buffers = Buffers::allocate(frame_size, fft.scratch_len())?;

        let hop_size = frame_size / HOP_COUNT;
        let latency = frame_size - hop_size;
        let half = frame_size / 2 + 1;
        let hop_count: T = real(HOP_COUNT);
        let two = T::one() + T::one();
        let normalization = two / (real::<T>(half) * hop_count)
            / squared_overlap_gain(&buffers.window, hop_size);

        debug!(frame_size, hop_size, latency, sample_rate, "created pitch shifter");

        Ok(Self {
            fft,
            buffers,
            frame_size,
            hop_size,
            latency,
            sample_rate,
            bin_width: real::<T>(sample_rate as usize) / real(frame_size),
            expected_phase_increment: T::TAU() / hop_count,
            normalization,
            overlap_cursor: latency,
        })
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    /// Samples of history kept in the input FIFO, `frame_size - hop_size`.
    /// No input-derived signal is emitted before this many outputs.
    pub fn latency(&self) -> usize {
        self.latency
    }

    /// End-to-end alignment: at a pitch ratio of 1, output sample `i`
    /// reproduces input sample `i - delay()`. One hop longer than
    /// [`latency`](Self::latency) since a cycle's output is emitted over the
    /// hop that follows it.
    pub fn delay(&self) -> usize {
        self.latency + self.hop_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Width of one analysis bin in Hz.
    pub fn bin_width(&self) -> T {
        self.bin_width
    }

    /// Returns the shifter to the state it had right after construction.
    pub fn reset(&mut self) {
        self.buffers.clear();
        self.overlap_cursor = self.latency;
    }

    /// Pushes one input sample and returns the output sample for the same
    /// stream position.
    pub fn process_sample(&mut self, pitch_ratio: T, sample: T) -> T {
        let buffers = &mut self.buffers;
        buffers.input_fifo[self.overlap_cursor] = sample;
        let output = buffers.output_fifo[self.overlap_cursor - self.latency];

        self.overlap_cursor += 1;
        if self.overlap_cursor >= self.frame_size {
            self.overlap_cursor = self.latency;
            self.run_cycle(pitch_ratio);
        }

        output
    }

    /// Shifts `input` into `output`, which must have the same length.
    ///
    /// Splitting a stream across any number of calls produces the same
    /// samples as a single call.
    pub fn process(&mut self, pitch_ratio: T, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), output.len());
        for (dst, &x) in output.iter_mut().zip(input.iter()) {
            *dst = self.process_sample(pitch_ratio, x);
        }
    }

    /// Shifts `buffer` in place. Each position is read before it is
    /// overwritten with its output.
    pub fn process_in_place(&mut self, pitch_ratio: T, buffer: &mut [T]) {
        for x in buffer.iter_mut() {
            *x = self.process_sample(pitch_ratio, *x);
        }
    }

    /// Runs one analysis/resynthesis cycle over the current input frame.
    fn run_cycle(&mut self, pitch_ratio: T) {
        self.analyze();
        self.remap_bins(pitch_ratio);
        self.synthesize();
    }

    /// Windows the input frame and transforms it into `spectrum`.
    fn analyze(&mut self) {
        let fft = &self.fft;
        let buffers = &mut self.buffers;
        for ((dst, &x), &w) in buffers
            .frame
            .iter_mut()
            .zip(buffers.input_fifo.iter())
            .zip(buffers.window.iter())
        {
            *dst = x * w;
        }
        fft.forward_real(&buffers.frame, &mut buffers.spectrum, &mut buffers.scratch);
    }

    /// Measures each bin's true frequency and moves the bin to its
    /// pitch-shifted destination.
    ///
    /// Magnitudes landing on the same destination add up; the frequency of the
    /// last source bin wins.
    fn remap_bins(&mut self, pitch_ratio: T) {
        let half = self.frame_size / 2 + 1;
        let expected = self.expected_phase_increment;
        let pitch_weight = pitch_ratio * self.bin_width;
        let deviation_weight = real::<T>(HOP_COUNT) / T::TAU() * pitch_weight;
        let buffers = &mut self.buffers;

        buffers.synthesized_magnitude.fill(T::zero());
        buffers.synthesized_frequency.fill(T::zero());

        for k in 0..half {
            let bin = buffers.spectrum[k];
            let magnitude = (bin.re * bin.re + bin.im * bin.im).sqrt();
            let phase = bin.im.atan2(bin.re);
            let k_real: T = real(k);

            let delta_phase = wrap_phase(phase - buffers.last_phase[k] - k_real * expected);
            buffers.last_phase[k] = phase;

            match destination_bin(k, pitch_ratio) {
                Some(index) if index < half => {
                    buffers.synthesized_magnitude[index] =
                        buffers.synthesized_magnitude[index] + magnitude;
                    buffers.synthesized_frequency[index] =
                        k_real * pitch_weight + deviation_weight * delta_phase;
                }
                _ => {}
            }
        }
    }

    /// Rebuilds a frame from the remapped bins and overlap-adds it.
    fn synthesize(&mut self) {
        let half = self.frame_size / 2 + 1;
        let hop = self.hop_size;
        let tail = self.frame_size - hop;
        let phase_per_hz = self.expected_phase_increment / self.bin_width;
        let normalization = self.normalization;
        let fft = &self.fft;
        let buffers = &mut self.buffers;

        for k in 0..half {
            // folded back to the principal range; the angle is unchanged
            let advanced = buffers.phase_sum[k] + phase_per_hz * buffers.synthesized_frequency[k];
            buffers.phase_sum[k] = wrap_phase(advanced);
            let (sin, cos) = buffers.phase_sum[k].sin_cos();
            let magnitude = buffers.synthesized_magnitude[k];
            buffers.spectrum[k] = Complex::new(cos * magnitude, sin * magnitude);
        }
        fft.inverse_real(&mut buffers.spectrum, &mut buffers.frame, &mut buffers.scratch);

        for ((acc, &w), &x) in buffers
            .output_accumulator
            .iter_mut()
            .zip(buffers.window.iter())
            .zip(buffers.frame.iter())
        {
            *acc = *acc + w * x * normalization;
        }

        buffers.output_fifo[..hop].copy_from_slice(&buffers.output_accumulator[..hop]);
        buffers.output_accumulator.copy_within(hop.., 0);
        buffers.output_accumulator[tail..].fill(T::zero());
        buffers.input_fifo.copy_within(hop.., 0);
    }
}

/// Folds a phase deviation into `[-π, π]`.
///
/// The quotient `delta / π` is truncated toward zero and, when odd, moved one
/// further away from zero; `π` times that even quotient is subtracted.
pub fn wrap_phase<T: Float>(delta: T) -> T {
    let two = T::one() + T::one();
    let quotient = (delta / T::PI()).trunc();
    let parity = num_traits::Float::abs(quotient % two);
    let quotient = if quotient >= T::zero() {
        quotient + parity
    } else {
        quotient - parity
    };
    delta - T::PI() * quotient
}

/// Destination bin of analysis bin `k`: `k * pitch_ratio` truncated toward
/// zero. `None` when the product is not representable as an index.
pub fn destination_bin<T: Float>(k: usize, pitch_ratio: T) -> Option<usize> {
    (real::<T>(k) * pitch_ratio).to_usize()
}
