use rustfft::{num_traits, FftNum};

/// Sample type of the engine. `f32` and `f64` both qualify.
pub trait Float: FftNum + num_traits::Float + num_traits::FloatConst {}

impl<T: FftNum + num_traits::Float + num_traits::FloatConst> Float for T {}

/// Converts an index or a count into the sample type.
///
/// Both float widths represent every `usize` (possibly rounded), so the NaN
/// fallback is never taken for them.
pub fn real<T: Float>(n: usize) -> T {
    T::from_usize(n).unwrap_or_else(T::nan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_counts() {
        assert_eq!(real::<f32>(2206), 2206.0);
        assert_eq!(real::<f64>(0), 0.0);
    }
}
