//! Fixed-Size Rolling Window for Per-Node Vibration History
//!
//! ## Overview
//!
//! Each node keeps the acceleration magnitudes of its most recent readings in
//! a ring buffer whose capacity is fixed at compile time through const
//! generics. The window feeds the rolling statistics of the feature vector,
//! so its semantics must match the offline feature preparation exactly:
//!
//! - Samples are kept in arrival order, oldest first
//! - Once full, each push evicts exactly the oldest sample
//! - Statistics are computed over whatever is currently held (the window
//!   "warms up" over its first `N` samples instead of waiting to fill)
//!
//! ### Memory Layout
//!
//! ```text
//! RollingWindow<5> after 7 pushes (values a..g):
//! ┌─────┬─────┬─────┬─────┬─────┐
//! │  f  │  g  │  c  │  d  │  e  │  ← physical slots
//! └─────┴─────┴─────┴─────┴─────┘
//!              ↑
//!              └── write_pos = 2, also the oldest sample once full
//!
//! Logical view (iter): c, d, e, f, g
//! ```
//!
//! `push()` is O(1) and never allocates; statistics are O(N).
//!
//! ## Usage Example
//!
//! ```rust
//! use railguard_core::buffer::RollingWindow;
//!
//! let mut window = RollingWindow::<3>::new();
//! for value in [9.8, 9.9, 10.1, 10.0] {
//!     window.push(value);
//! }
//!
//! let values: Vec<f64> = window.iter().copied().collect();
//! assert_eq!(values, vec![9.9, 10.1, 10.0]);
//! ```

/// Summary statistics over a window's current contents
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowStats {
    /// Number of samples summarized
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divisor N), 0 below two samples
    pub std_dev: f64,
    /// Root mean square
    pub rms: f64,
    /// Max minus min
    pub range: f64,
}

/// Fixed-size ring buffer of `f64` samples
///
/// ## Internal Invariants
///
/// - `write_pos < N`
/// - `len <= N`
/// - Logical index 0 is always the oldest sample
///
/// This type is not thread-safe; the node store wraps each window in its own
/// mutex.
#[derive(Debug, Clone)]
pub struct RollingWindow<const N: usize> {
    data: [f64; N],
    write_pos: usize,
    len: usize,
}

impl<const N: usize> RollingWindow<N> {
    /// Creates a new empty window
    pub const fn new() -> Self {
        Self {
            data: [0.0; N],
            write_pos: 0,
            len: 0,
        }
    }

    /// Adds a sample, overwriting the oldest one when full
    pub fn push(&mut self, value: f64) {
        self.data[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) % N;

        if self.len < N {
            self.len += 1;
        }
    }

    /// Number of stored samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if window is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if window is full
    pub fn is_full(&self) -> bool {
        self.len == N
    }

    /// Maximum number of samples held
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most recent sample
    pub fn last(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }

        let idx = if self.write_pos == 0 { N - 1 } else { self.write_pos - 1 };
        Some(self.data[idx])
    }

    /// Iterate over samples from oldest to newest
    pub fn iter(&self) -> RollingWindowIter<'_, N> {
        RollingWindowIter {
            window: self,
            index: 0,
        }
    }

    /// Drop all samples
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    /// Arithmetic mean, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.iter().sum::<f64>() / self.len as f64)
    }

    /// Population standard deviation of the current contents
    ///
    /// Uses divisor N (not N-1) and returns 0 with fewer than two samples.
    pub fn std_dev(&self) -> f64 {
        if self.len < 2 {
            return 0.0;
        }

        let n = self.len as f64;
        let mean = self.iter().sum::<f64>() / n;
        let variance = self.iter().map(|&x| (x - mean) * (x - mean)).sum::<f64>() / n;

        libm::sqrt(variance)
    }

    /// Full summary of the current contents
    pub fn stats(&self) -> WindowStats {
        let Some(mean) = self.mean() else {
            return WindowStats::default();
        };

        let n = self.len as f64;
        let sum_squares: f64 = self.iter().map(|&x| x * x).sum();
        let min = self.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        WindowStats {
            count: self.len,
            mean,
            std_dev: self.std_dev(),
            rms: libm::sqrt(sum_squares / n),
            range: max - min,
        }
    }

    /// Gets a sample by logical index (0 = oldest, len-1 = newest)
    ///
    /// Before the window fills, logical and physical indices match. Once
    /// full, the oldest sample sits at `write_pos`:
    ///
    /// ```text
    /// Physical: [D, E, A, B, C]  (write_pos = 2)
    /// Logical:  [A, B, C, D, E]
    /// ```
    pub fn get(&self, index: usize) -> Option<f64> {
        if index >= self.len {
            return None;
        }

        let actual_index = if self.len < N {
            index
        } else {
            (self.write_pos + index) % N
        };

        Some(self.data[actual_index])
    }
}

/// Iterator over window contents, oldest first
pub struct RollingWindowIter<'a, const N: usize> {
    window: &'a RollingWindow<N>,
    index: usize,
}

impl<'a, const N: usize> Iterator for RollingWindowIter<'a, N> {
    type Item = &'a f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.window.len {
            return None;
        }

        let actual_index = if self.window.len < N {
            self.index
        } else {
            (self.window.write_pos + self.index) % N
        };
        self.index += 1;

        Some(&self.window.data[actual_index])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.window.len - self.index;
        (remaining, Some(remaining))
    }
}

impl<const N: usize> Default for RollingWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    #[test]
    fn empty_window() {
        let window: RollingWindow<5> = RollingWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
        assert!(window.last().is_none());
        assert!(window.mean().is_none());
        assert_eq!(window.std_dev(), 0.0);
        assert_eq!(window.stats(), WindowStats::default());
    }

    #[test]
    fn circular_overwrite() {
        let mut window = RollingWindow::<3>::new();

        for i in 0..5 {
            window.push(i as f64);
        }

        assert_eq!(window.len(), 3);
        assert!(window.is_full());
        assert_eq!(window.last(), Some(4.0));

        // 0 and 1 were evicted first
        let values: Vec<f64> = window.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0]);
        assert_eq!(window.get(0), Some(2.0));
        assert_eq!(window.get(3), None);
    }

    #[test]
    fn single_sample_has_zero_spread() {
        let mut window = RollingWindow::<40>::new();
        window.push(12.5);
        assert_eq!(window.std_dev(), 0.0);
    }

    #[test]
    fn population_std_dev() {
        let mut window = RollingWindow::<8>::new();
        for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            window.push(value);
        }

        // Textbook example: population sigma is exactly 2
        assert!((window.std_dev() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn stats_summary() {
        let mut window = RollingWindow::<4>::new();
        for value in [3.0, 4.0] {
            window.push(value);
        }

        let stats = window.stats();
        assert_eq!(stats.count, 2);
        assert!((stats.mean - 3.5).abs() < 1e-12);
        assert!((stats.std_dev - 0.5).abs() < 1e-12);
        assert!((stats.rms - (12.5f64).sqrt()).abs() < 1e-12);
        assert!((stats.range - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clear_resets() {
        let mut window = RollingWindow::<3>::new();
        window.push(1.0);
        window.push(2.0);
        window.clear();

        assert!(window.is_empty());
        window.push(7.0);
        assert_eq!(window.iter().copied().collect::<Vec<_>>(), vec![7.0]);
    }

    proptest! {
        #[test]
        fn keeps_most_recent_in_order(values in proptest::collection::vec(-100.0f64..100.0, 0..200)) {
            let mut window = RollingWindow::<40>::new();
            for &value in &values {
                window.push(value);
                prop_assert!(window.len() <= 40);
            }

            let start = values.len().saturating_sub(40);
            let held: Vec<f64> = window.iter().copied().collect();
            prop_assert_eq!(held, values[start..].to_vec());
        }

        #[test]
        fn std_dev_never_negative(values in proptest::collection::vec(-1e3f64..1e3, 0..80)) {
            let mut window = RollingWindow::<40>::new();
            for &value in &values {
                window.push(value);
            }
            prop_assert!(window.std_dev() >= 0.0);
        }
    }
}
