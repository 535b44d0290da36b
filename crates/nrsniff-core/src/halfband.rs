//! Halfband decimation.
//!
//! Rate reduction between the capture rate and the bandwidth-part grid is
//! done in decimate-by-two stages. A halfband FIR has every second tap
//! equal to zero, which halves the multiply count; chaining stages covers
//! any power-of-two factor. This is why grid widths round up to powers of
//! two instead of the theoretical minimum.
//!
//! ## Example
//!
//! ```rust
//! use nrsniff_core::halfband::DecimationChain;
//! use num_complex::Complex64;
//!
//! let mut chain = DecimationChain::new(4).unwrap();
//! let input = vec![Complex64::new(1.0, 0.0); 400];
//! let output = chain.process(&input);
//! assert_eq!(output.len(), 100);
//! ```

use num_complex::Complex64;
use std::f64::consts::PI;

use crate::types::{IQSample, PhyError, PhyResult};

/// Default tap count per halfband stage (odd, center tap 0.5).
const HALFBAND_TAPS: usize = 31;

/// Design a windowed-sinc halfband lowpass.
///
/// `num_taps` must be odd; the center tap is 0.5 and taps at even offsets
/// from the center are zero by construction.
pub fn design_halfband(num_taps: usize) -> Vec<f64> {
    debug_assert!(num_taps % 2 == 1, "halfband filters have odd length");
    let center = (num_taps / 2) as i64;
    (0..num_taps as i64)
        .map(|i| {
            let m = i - center;
            if m == 0 {
                0.5
            } else if m % 2 == 0 {
                0.0
            } else {
                // sinc(m/2) with a Hamming window.
                let x = PI * m as f64 / 2.0;
                let window =
                    0.54 - 0.46 * (2.0 * PI * i as f64 / (num_taps as f64 - 1.0)).cos();
                0.5 * (x.sin() / x) * window
            }
        })
        .collect()
}

/// One decimate-by-two halfband FIR stage with streaming history.
#[derive(Debug, Clone)]
pub struct HalfbandStage {
    taps: Vec<f64>,
    history: Vec<IQSample>,
    phase: usize,
}

impl HalfbandStage {
    /// Create a stage with the default tap count.
    pub fn new() -> Self {
        Self::with_taps(design_halfband(HALFBAND_TAPS))
    }

    /// Create a stage with custom taps.
    pub fn with_taps(taps: Vec<f64>) -> Self {
        let len = taps.len();
        Self {
            taps,
            history: vec![Complex64::new(0.0, 0.0); len],
            phase: 0,
        }
    }

    /// Filter and keep every second sample.
    pub fn process(&mut self, input: &[IQSample]) -> Vec<IQSample> {
        let mut output = Vec::with_capacity(input.len() / 2 + 1);
        for &sample in input {
            self.history.rotate_right(1);
            self.history[0] = sample;

            self.phase += 1;
            if self.phase == 2 {
                self.phase = 0;
                let mut sum = Complex64::new(0.0, 0.0);
                for (i, &tap) in self.taps.iter().enumerate() {
                    if tap != 0.0 {
                        sum += self.history[i] * tap;
                    }
                }
                output.push(sum);
            }
        }
        output
    }

    /// Reset streaming state.
    pub fn reset(&mut self) {
        self.history.fill(Complex64::new(0.0, 0.0));
        self.phase = 0;
    }
}

impl Default for HalfbandStage {
    fn default() -> Self {
        Self::new()
    }
}

/// A chain of halfband stages covering a power-of-two decimation factor.
///
/// A factor of 1 is a passthrough.
#[derive(Debug, Clone, Default)]
pub struct DecimationChain {
    stages: Vec<HalfbandStage>,
}

impl DecimationChain {
    /// Build a chain for the given factor. Fails unless the factor is a
    /// power of two.
    pub fn new(factor: u64) -> PhyResult<Self> {
        if factor == 0 || !factor.is_power_of_two() {
            return Err(PhyError::InvalidDecimation(factor));
        }
        let stages = (0..factor.trailing_zeros())
            .map(|_| HalfbandStage::new())
            .collect();
        Ok(Self { stages })
    }

    /// Overall decimation factor.
    pub fn factor(&self) -> u64 {
        1 << self.stages.len()
    }

    /// Run a block through every stage.
    pub fn process(&mut self, input: &[IQSample]) -> Vec<IQSample> {
        if self.stages.is_empty() {
            return input.to_vec();
        }
        let mut buf = self.stages[0].process(input);
        for stage in self.stages.iter_mut().skip(1) {
            buf = stage.process(&buf);
        }
        buf
    }

    /// Reset streaming state in all stages.
    pub fn reset(&mut self) {
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}
