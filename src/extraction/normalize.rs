//! Percentile contrast stretch.
//!
//! Raw sensor images are usually dim and low-contrast. The stretch maps the
//! low percentile intensity to 0 and the high percentile to 255, clamping
//! everything outside that band.

const DEFAULT_LOW_PCT: f64 = 5.0;
const DEFAULT_HIGH_PCT: f64 = 95.0;

/// Linear percentile stretch over 8-bit grayscale pixels.
#[derive(Debug, Clone, Copy)]
pub struct PercentileStretch {
    low_pct: f64,
    high_pct: f64,
}

impl PercentileStretch {
    /// Creates a stretch between two percentiles in [0, 100].
    ///
    /// A NaN percentile falls back to the default 5 / 95.
    pub fn new(low_pct: f64, high_pct: f64) -> Self {
        let low_pct = if low_pct.is_nan() { DEFAULT_LOW_PCT } else { low_pct };
        let high_pct = if high_pct.is_nan() { DEFAULT_HIGH_PCT } else { high_pct };

        let low_pct = low_pct.clamp(0.0, 100.0);
        let high_pct = high_pct.clamp(low_pct, 100.0);
        Self { low_pct, high_pct }
    }

    /// Returns the (low, high) percentile intensities, or `None` for an
    /// empty buffer.
    pub fn bounds(&self, pixels: &[u8]) -> Option<(f32, f32)> {
        if pixels.is_empty() {
            return None;
        }

        let mut histogram = [0usize; 256];
        for &p in pixels {
            histogram[p as usize] += 1;
        }

        let low = percentile(&histogram, pixels.len(), self.low_pct);
        let high = percentile(&histogram, pixels.len(), self.high_pct);
        Some((low as f32, high as f32))
    }

    /// Applies the stretch.
    ///
    /// A flat image (zero spread between the percentiles) yields all zeros.
    pub fn apply(&self, pixels: &[u8]) -> Vec<u8> {
        let Some((low, high)) = self.bounds(pixels) else {
            return Vec::new();
        };

        let spread = high - low;
        if spread <= 0.0 {
            return vec![0; pixels.len()];
        }

        pixels
            .iter()
            .map(|&p| ((p as f32 - low) / spread * 255.0).clamp(0.0, 255.0) as u8)
            .collect()
    }
}

impl Default for PercentileStretch {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_PCT, DEFAULT_HIGH_PCT)
    }
}

/// Percentile with linear interpolation between the closest ranks.
fn percentile(histogram: &[usize; 256], count: usize, pct: f64) -> f64 {
    let rank = pct / 100.0 * (count - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    let lo = order_statistic(histogram, lower) as f64;
    let hi = order_statistic(histogram, upper) as f64;
    lo + (hi - lo) * fraction
}

/// Value at zero-based position `k` of the sorted pixels.
fn order_statistic(histogram: &[usize; 256], k: usize) -> u8 {
    let mut seen = 0;
    for (value, &n) in histogram.iter().enumerate() {
        seen += n;
        if seen > k {
            return value as u8;
        }
    }
    u8::MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bounds_interpolate() {
        let pixels: Vec<u8> = (0..=100).collect();
        let (low, high) = PercentileStretch::default().bounds(&pixels).unwrap();

        assert!((low - 5.0).abs() < 1e-4);
        assert!((high - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_between_ranks() {
        // rank for p5 over 4 values is 0.15
        let pixels = vec![10, 20, 30, 40];
        let (low, _) = PercentileStretch::default().bounds(&pixels).unwrap();

        assert!((low - 11.5).abs() < 1e-4);
    }

    #[test]
    fn test_empty_input() {
        let stretch = PercentileStretch::default();
        assert!(stretch.bounds(&[]).is_none());
        assert!(stretch.apply(&[]).is_empty());
    }

    #[test]
    fn test_flat_image_is_zeroed() {
        let out = PercentileStretch::default().apply(&[137u8; 64]);
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_stretch_saturates_tails() {
        let pixels: Vec<u8> = (0..=100).collect();
        let out = PercentileStretch::default().apply(&pixels);

        assert_eq!(out[0], 0);
        assert_eq!(out[5], 0);
        assert_eq!(out[50], 127);
        assert_eq!(out[95], 255);
        assert_eq!(out[100], 255);
    }

    #[test]
    fn test_nan_percentiles_use_defaults() {
        let pixels: Vec<u8> = (0..=100).collect();

        let stretch = PercentileStretch::new(f64::NAN, f64::NAN);

        assert_eq!(
            stretch.bounds(&pixels),
            PercentileStretch::default().bounds(&pixels)
        );
        assert_eq!(
            PercentileStretch::new(f64::NEG_INFINITY, f64::INFINITY).bounds(&pixels),
            Some((0.0, 100.0))
        );
    }

    proptest! {
        #[test]
        fn prop_flat_images_normalize_to_zero(value in any::<u8>(), len in 1usize..512) {
            let out = PercentileStretch::default().apply(&vec![value; len]);
            prop_assert!(out.iter().all(|&v| v == 0));
        }

        #[test]
        fn prop_stretch_is_monotonic_and_pinned(
            pixels in prop::collection::vec(any::<u8>(), 2..1024)
        ) {
            let stretch = PercentileStretch::default();
            let (low, high) = stretch.bounds(&pixels).unwrap();
            let out = stretch.apply(&pixels);

            prop_assert_eq!(out.len(), pixels.len());
            if high > low {
                for (&p, &o) in pixels.iter().zip(out.iter()) {
                    if p as f32 <= low {
                        prop_assert_eq!(o, 0);
                    }
                    if p as f32 >= high {
                        prop_assert_eq!(o, 255);
                    }
                }
                let mut pairs: Vec<(u8, u8)> =
                    pixels.iter().copied().zip(out.iter().copied()).collect();
                pairs.sort();
                prop_assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
            }
        }
    }
}
