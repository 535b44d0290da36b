//! Core sample types for the acquisition frontend.
//!
//! All in-memory processing uses `num_complex::Complex64`; on-disk capture
//! formats are converted at the file boundary (see [`crate::iqfile`]).

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// A buffer of I/Q samples
pub type IQBuffer = Vec<IQSample>;

/// Result type for PHY-side operations
pub type PhyResult<T> = Result<T, PhyError>;

/// Errors that can occur while building or running PHY components
#[derive(Debug, Clone, thiserror::Error)]
pub enum PhyError {
    #[error("invalid numerology: {0}. Must be between 0 and 4")]
    InvalidNumerology(u8),

    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(u64),

    #[error(
        "sample rate {input} Hz is not a power-of-two multiple of the \
         bandwidth part rate {bwp} Hz"
    )]
    RateMismatch { input: u64, bwp: u64 },

    #[error("subcarrier requirement must be non-zero")]
    EmptyGrid,

    #[error("decimation factor {0} is not a power of two")]
    InvalidDecimation(u64),

    #[error("grid width {0} is not a power of two covering the PSS")]
    GridTooNarrow(usize),

    #[error("invalid N_ID(2): {0}. Must be 0, 1 or 2")]
    InvalidNid2(u8),

    #[error("no bandwidth part attached to the PHY")]
    MissingBandwidthPart,
}

/// Compute the average power of a block of samples.
pub fn average_power(samples: &[IQSample]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.norm_sqr()).sum::<f64>() / samples.len() as f64
}

/// Total energy (sum of squared magnitudes) of a block of samples.
pub fn energy(samples: &[IQSample]) -> f64 {
    samples.iter().map(|s| s.norm_sqr()).sum()
}
