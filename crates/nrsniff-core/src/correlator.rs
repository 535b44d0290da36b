//! Streaming matched-filter correlator.
//!
//! Slides a known reference waveform over the input and reports peaks of
//! the power-normalized cross-correlation. The reference is conjugated
//! and energy-normalized once at construction, so an exact occurrence of
//! the reference in the stream scores 1.0 regardless of its amplitude.
//!
//! ## Example
//!
//! ```rust
//! use nrsniff_core::correlator::SyncCorrelator;
//! use num_complex::Complex64;
//!
//! let reference = vec![
//!     Complex64::new(1.0, 0.0),
//!     Complex64::new(-1.0, 0.0),
//!     Complex64::new(1.0, 0.0),
//!     Complex64::new(-1.0, 0.0),
//! ];
//! let mut correlator = SyncCorrelator::new(&reference, 0.9);
//! let mut signal = vec![Complex64::new(0.0, 0.0); 16];
//! signal.extend_from_slice(&reference);
//! let peaks = correlator.process(&signal);
//! assert_eq!(peaks.len(), 1);
//! assert_eq!(peaks[0].index, 16);
//! ```

use num_complex::Complex64;
use std::collections::VecDeque;

use crate::types::IQSample;

/// Windows with less power than this are treated as silence.
const POWER_FLOOR: f64 = 1e-12;

/// One correlation peak above threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyncPeak {
    /// Global index of the first sample of the match.
    pub index: u64,
    /// Normalized correlation magnitude in [0, 1].
    pub correlation: f64,
    /// Carrier phase at the match, in radians.
    pub phase: f64,
}

/// Sliding normalized cross-correlator with peak suppression.
#[derive(Debug, Clone)]
pub struct SyncCorrelator {
    /// Conjugated, energy-normalized reference.
    reference: Vec<Complex64>,
    threshold: f64,
    /// Minimum spacing between reported peaks, in samples.
    min_spacing: u64,
    window: VecDeque<IQSample>,
    powers: VecDeque<f64>,
    window_power: f64,
    processed: u64,
    last_peak: Option<u64>,
    total_peaks: u64,
}

impl SyncCorrelator {
    /// Create a correlator for `reference` with a detection `threshold`
    /// on the normalized correlation (0..1).
    pub fn new(reference: &[IQSample], threshold: f64) -> Self {
        assert!(!reference.is_empty(), "reference must not be empty");
        let energy: f64 = reference.iter().map(|s| s.norm_sqr()).sum();
        let scale = if energy > 0.0 { 1.0 / energy.sqrt() } else { 1.0 };
        let reference: Vec<Complex64> =
            reference.iter().map(|s| s.conj() * scale).collect();
        let len = reference.len();

        Self {
            reference,
            threshold,
            min_spacing: len as u64,
            window: VecDeque::with_capacity(len),
            powers: VecDeque::with_capacity(len),
            window_power: 0.0,
            processed: 0,
            last_peak: None,
            total_peaks: 0,
        }
    }

    /// Override the minimum spacing between reported peaks.
    pub fn with_min_spacing(mut self, spacing: u64) -> Self {
        self.min_spacing = spacing.max(1);
        self
    }

    /// Reference length in samples.
    pub fn reference_len(&self) -> usize {
        self.reference.len()
    }

    /// Total peaks reported since construction.
    pub fn total_peaks(&self) -> u64 {
        self.total_peaks
    }

    /// Push a block of samples, returning any peaks it produced.
    pub fn process(&mut self, input: &[IQSample]) -> Vec<SyncPeak> {
        let len = self.reference.len();
        let mut peaks = Vec::new();

        for &sample in input {
            let p = sample.norm_sqr();
            self.window.push_back(sample);
            self.powers.push_back(p);
            self.window_power += p;
            if self.window.len() > len {
                self.window.pop_front();
                self.window_power -= self.powers.pop_front().unwrap_or(0.0);
            }
            self.processed += 1;

            if self.window.len() < len || self.window_power < POWER_FLOOR {
                continue;
            }

            let mut acc = Complex64::new(0.0, 0.0);
            for (r, w) in self.reference.iter().zip(self.window.iter()) {
                acc += r * w;
            }
            let correlation = acc.norm() / self.window_power.sqrt();
            if correlation < self.threshold {
                continue;
            }

            let start = self.processed - len as u64;
            if let Some(last) = self.last_peak {
                if start.saturating_sub(last) < self.min_spacing {
                    continue;
                }
            }
            self.last_peak = Some(start);
            self.total_peaks += 1;
            peaks.push(SyncPeak {
                index: start,
                correlation,
                phase: acc.arg(),
            });
        }

        peaks
    }

    /// Reset streaming state, keeping the reference and threshold.
    pub fn reset(&mut self) {
        self.window.clear();
        self.powers.clear();
        self.window_power = 0.0;
        self.processed = 0;
        self.last_peak = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bpsk(bits: &[i8]) -> Vec<Complex64> {
        bits.iter()
            .map(|&b| Complex64::new(b as f64, 0.0))
            .collect()
    }

    #[test]
    fn test_exact_match_scores_unity() {
        let reference = bpsk(&[1, -1, 1, 1, -1, -1, 1, -1]);
        let mut correlator = SyncCorrelator::new(&reference, 0.9);
        let peaks = correlator.process(&reference);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 0);
        assert_relative_eq!(peaks[0].correlation, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_amplitude_invariant() {
        let reference = bpsk(&[1, -1, 1, 1, -1, -1, 1, -1]);
        let mut correlator = SyncCorrelator::new(&reference, 0.9);
        let scaled: Vec<Complex64> = reference.iter().map(|s| s * 0.01).collect();
        let peaks = correlator.process(&scaled);
        assert_eq!(peaks.len(), 1);
        assert_relative_eq!(peaks[0].correlation, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_offset_reported() {
        let reference = bpsk(&[1, -1, -1, 1, -1, 1, 1, 1]);
        let mut correlator = SyncCorrelator::new(&reference, 0.9);
        let mut signal = vec![Complex64::new(0.0, 0.0); 25];
        signal.extend_from_slice(&reference);
        signal.extend(vec![Complex64::new(0.0, 0.0); 10]);
        let peaks = correlator.process(&signal);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 25);
    }

    #[test]
    fn test_detection_across_block_boundary() {
        let reference = bpsk(&[1, -1, -1, 1, -1, 1, 1, 1]);
        let mut correlator = SyncCorrelator::new(&reference, 0.9);
        let mut signal = vec![Complex64::new(0.0, 0.0); 12];
        signal.extend_from_slice(&reference);

        let mut peaks = Vec::new();
        for block in signal.chunks(5) {
            peaks.extend(correlator.process(block));
        }
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 12);
    }

    #[test]
    fn test_spacing_suppresses_adjacent_peaks() {
        let reference = bpsk(&[1, 1, 1, 1]);
        // Constant-envelope reference correlates highly with a long run of
        // ones at every lag; spacing keeps reports sparse.
        let mut correlator = SyncCorrelator::new(&reference, 0.99);
        let signal = bpsk(&[1; 16]);
        let peaks = correlator.process(&signal);
        assert!(!peaks.is_empty());
        for pair in peaks.windows(2) {
            assert!(pair[1].index - pair[0].index >= 4);
        }
    }

    #[test]
    fn test_silence_produces_no_peaks() {
        let reference = bpsk(&[1, -1, 1, -1]);
        let mut correlator = SyncCorrelator::new(&reference, 0.5);
        let silence = vec![Complex64::new(0.0, 0.0); 64];
        assert!(correlator.process(&silence).is_empty());
        assert_eq!(correlator.total_peaks(), 0);
    }

    #[test]
    fn test_reset_clears_history() {
        let reference = bpsk(&[1, -1, 1, -1]);
        let mut correlator = SyncCorrelator::new(&reference, 0.9);
        let _ = correlator.process(&reference);
        correlator.reset();
        let peaks = correlator.process(&reference);
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 0, "indices restart after reset");
    }
}
