//! Downsampling policy for ranged queries.
//!
//! A ranged query scans every reading newer than `now - window` and must
//! return a bounded number of points for charting. The number of raw
//! readings is *estimated* from the nominal ingest cadence rather than
//! counted, so the scan stays a single streaming pass:
//!
//! - `expected = window_minutes * samples_per_minute`
//! - if `expected <= max_output`, every reading is returned
//! - otherwise every `round(expected / max_output)`-th reading is returned,
//!   starting with the first one in the window
//!
//! When a device reports slower or faster than the nominal cadence the
//! output is proportionally shorter or longer; it is not renormalized.
//!
//! # Example
//!
//! ```
//! use co2sense_store::Downsample;
//!
//! let policy = Downsample::default();
//! assert_eq!(policy.expected_samples(10), 60);
//! assert_eq!(policy.stride(10), None);
//! assert_eq!(policy.stride(120), Some(12));
//! ```

/// Milliseconds per minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// Default upper bound on the number of points a ranged query returns.
pub const DEFAULT_MAX_OUTPUT: u32 = 60;

/// Default ingest cadence: one reading every 10 seconds.
pub const DEFAULT_SAMPLES_PER_MINUTE: u32 = 6;

/// Parameters of the fixed-stride decimation applied by ranged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downsample {
    /// Target maximum number of returned readings.
    pub max_output: u32,
    /// Nominal number of readings a device produces per minute.
    pub samples_per_minute: u32,
}

impl Default for Downsample {
    fn default() -> Self {
        Self {
            max_output: DEFAULT_MAX_OUTPUT,
            samples_per_minute: DEFAULT_SAMPLES_PER_MINUTE,
        }
    }
}

impl Downsample {
    /// Estimated number of raw readings in a window of `window_minutes`.
    pub fn expected_samples(&self, window_minutes: u32) -> u64 {
        u64::from(window_minutes) * u64::from(self.samples_per_minute)
    }

    /// The decimation stride for a window, or `None` when every reading
    /// should be returned.
    pub fn stride(&self, window_minutes: u32) -> Option<usize> {
        let expected = self.expected_samples(window_minutes);
        let max_output = u64::from(self.max_output.max(1));

        if expected <= max_output {
            return None;
        }

        let ratio = (expected as f64 / max_output as f64).round() as usize;
        Some(ratio.max(1))
    }

    /// A fresh [`Sampler`] for one scan over a window.
    pub fn sampler(&self, window_minutes: u32) -> Sampler {
        Sampler::new(self.stride(window_minutes))
    }
}

/// Exclusive lower key bound of a window ending at `now_ms`.
pub fn window_start(now_ms: i64, window_minutes: u32) -> i64 {
    now_ms.saturating_sub(i64::from(window_minutes).saturating_mul(MILLIS_PER_MINUTE))
}

/// Streaming fixed-stride selector.
///
/// Keeps a counter that starts at 1. An entry is admitted when the
/// counter is 1; the counter then advances until it reaches the stride and
/// wraps back to 1. Holds no entries, only the counter.
#[derive(Debug, Clone)]
pub struct Sampler {
    stride: usize,
    counter: usize,
}

impl Sampler {
    /// A sampler admitting every `stride`-th entry (`None` admits all).
    pub fn new(stride: Option<usize>) -> Self {
        Self {
            stride: stride.unwrap_or(1).max(1),
            counter: 1,
        }
    }

    /// Decide whether the next entry in the stream is kept.
    pub fn admit(&mut self) -> bool {
        let keep = self.counter == 1;
        if self.counter < self.stride {
            self.counter += 1;
        } else {
            self.counter = 1;
        }
        keep
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn admitted(stride: Option<usize>, n: usize) -> Vec<usize> {
        let mut sampler = Sampler::new(stride);
        (0..n).filter(|_| sampler.admit()).collect()
    }

    #[test]
    fn test_default_policy() {
        let policy = Downsample::default();
        assert_eq!(policy.max_output, 60);
        assert_eq!(policy.samples_per_minute, 6);
    }

    #[test]
    fn test_stride_boundary() {
        let policy = Downsample::default();
        // 10 minutes is exactly 60 expected samples: no decimation.
        assert_eq!(policy.stride(10), None);
        assert_eq!(policy.stride(11), Some(1));
        assert_eq!(policy.stride(0), None);
    }

    #[test]
    fn test_stride_rounding() {
        let policy = Downsample::default();
        assert_eq!(policy.stride(60), Some(6));
        assert_eq!(policy.stride(120), Some(12));
        // 150 expected / 60 = 2.5, rounds half away from zero.
        assert_eq!(policy.stride(25), Some(3));
        // 138 / 60 = 2.3
        assert_eq!(policy.stride(23), Some(2));
        assert_eq!(policy.stride(10_080), Some(1008));
    }

    #[test]
    fn test_stride_custom_policy() {
        let policy = Downsample {
            max_output: 100,
            samples_per_minute: 1,
        };
        assert_eq!(policy.stride(100), None);
        assert_eq!(policy.stride(1440), Some(14));
    }

    #[test]
    fn test_zero_max_output_does_not_divide_by_zero() {
        let policy = Downsample {
            max_output: 0,
            samples_per_minute: 6,
        };
        assert_eq!(policy.stride(1), Some(6));
    }

    #[test]
    fn test_sampler_admits_all_without_stride() {
        assert_eq!(admitted(None, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(admitted(Some(1), 3), vec![0, 1, 2]);
    }

    #[test]
    fn test_sampler_stride_walk() {
        assert_eq!(admitted(Some(3), 10), vec![0, 3, 6, 9]);
        assert_eq!(admitted(Some(12), 720).len(), 60);
    }

    #[test]
    fn test_window_start() {
        assert_eq!(window_start(1_000_000, 10), 400_000);
        assert_eq!(window_start(0, 1), -60_000);
        assert_eq!(window_start(i64::MIN, 1), i64::MIN);
    }

    proptest! {
        #[test]
        fn sampler_keeps_every_stride_th_entry(stride in 1usize..50, n in 0usize..2000) {
            let kept = admitted(Some(stride), n);
            prop_assert_eq!(kept.len(), n.div_ceil(stride));
            for (i, index) in kept.iter().enumerate() {
                prop_assert_eq!(*index, i * stride);
            }
        }

        #[test]
        fn nominal_density_stays_near_max_output(window in 11u32..20_000) {
            let policy = Downsample::default();
            let expected = policy.expected_samples(window) as usize;
            let stride = policy.stride(window).unwrap();
            let kept = expected.div_ceil(stride);
            // Rounding the stride moves the count by at most a third either way.
            prop_assert!(kept <= 90, "window {} kept {}", window, kept);
            prop_assert!(kept >= 40, "window {} kept {}", window, kept);
        }
    }
}
