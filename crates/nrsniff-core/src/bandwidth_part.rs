//! Bandwidth part descriptor.
//!
//! A bandwidth part is the subcarrier grid the synchronizer works on: a
//! contiguous frequency region sized for one numerology. The constructor
//! picks the narrowest power-of-two grid that covers both the requested
//! minimum sample rate and the minimum subcarrier count, so the receive
//! chain can reach the grid rate with halfband decimation stages.
//!
//! ## Example
//!
//! ```rust
//! use nrsniff_core::bandwidth_part::BandwidthPart;
//!
//! // 240 SSB subcarriers at 30 kHz spacing (numerology 1)
//! let bwp = BandwidthPart::new(7_680_000, 1, 240).unwrap();
//! assert_eq!(bwp.fft_size(), 256);
//! assert_eq!(bwp.scs_hz(), 30_000);
//! assert_eq!(bwp.sample_rate(), 7_680_000);
//! ```

use crate::params::{scs_hz, MAX_NUMEROLOGY};
use crate::types::{PhyError, PhyResult};

/// Subcarrier grid for one numerology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandwidthPart {
    sample_rate: u64,
    numerology: u8,
    fft_size: usize,
    scs_hz: u64,
}

impl BandwidthPart {
    /// Build a grid covering at least `min_sample_rate` and
    /// `min_subcarriers` at the given numerology.
    ///
    /// The grid width is rounded up to the next power of two; the grid
    /// sample rate is `width × scs`.
    pub fn new(min_sample_rate: u64, numerology: u8, min_subcarriers: usize) -> PhyResult<Self> {
        if numerology > MAX_NUMEROLOGY {
            return Err(PhyError::InvalidNumerology(numerology));
        }
        if min_subcarriers == 0 {
            return Err(PhyError::EmptyGrid);
        }
        if min_sample_rate == 0 {
            return Err(PhyError::InvalidSampleRate(min_sample_rate));
        }

        let scs = scs_hz(numerology);
        // Subcarriers needed to cover the requested rate, rounded up.
        let for_rate = min_sample_rate.div_ceil(scs) as usize;
        let fft_size = for_rate.max(min_subcarriers).next_power_of_two();

        Ok(Self {
            sample_rate: fft_size as u64 * scs,
            numerology,
            fft_size,
            scs_hz: scs,
        })
    }

    /// Grid sample rate in Hz.
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// Numerology index μ.
    pub fn numerology(&self) -> u8 {
        self.numerology
    }

    /// Grid width in subcarriers (always a power of two).
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Grid width in subcarriers.
    pub fn num_subcarriers(&self) -> usize {
        self.fft_size
    }

    /// Subcarrier spacing in Hz.
    pub fn scs_hz(&self) -> u64 {
        self.scs_hz
    }

    /// Occupied bandwidth of the grid in Hz.
    pub fn bandwidth_hz(&self) -> u64 {
        self.fft_size as u64 * self.scs_hz
    }
}
