use crate::float::{real, Float};

/// Periodic Hann window: `0.5 * (1 - cos(2πi / size))`.
pub fn hann_window<T: Float>(size: usize) -> Vec<T> {
    let half = T::one() / (T::one() + T::one());
    (0..size)
        .map(|i| half * (T::one() - (real::<T>(i) * T::TAU() / real(size)).cos()))
        .collect()
}

/// Average gain of overlap-adding `window²` every `hop_size` samples.
///
/// A window applied once on analysis and once on synthesis contributes
/// `Σ w[k]² / hop_size` to every output sample in steady state: 3/2 for a Hann
/// window at four-fold overlap.
pub fn squared_overlap_gain<T: Float>(window: &[T], hop_size: usize) -> T {
    assert!(hop_size > 0);
    let energy = window.iter().fold(T::zero(), |acc, &w| acc + w * w);
    energy / real(hop_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hann_starts_at_zero_and_peaks_in_the_middle() {
        let window = hann_window::<f64>(8);
        assert_eq!(window.len(), 8);
        assert_relative_eq!(window[0], 0.0);
        assert_relative_eq!(window[4], 1.0);
        assert_relative_eq!(window[2], window[6]);
    }

    #[test]
    fn hann_overlap_gain_at_four_fold_overlap() {
        let window = hann_window::<f64>(1024);
        assert_relative_eq!(squared_overlap_gain(&window, 256), 1.5, epsilon = 1e-12);
    }
}
