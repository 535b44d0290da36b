//! PHY constants for SSB acquisition.
//!
//! The SSB occupies 20 resource blocks (240 subcarriers) regardless of
//! numerology; its subcarrier spacing scales as 15 kHz × 2^μ. The grid the
//! synchronizer operates on is widened to 256 subcarriers so the receive
//! chain can reach it with halfband (power-of-two) decimation steps.

/// Subcarrier spacing for numerology 0, in Hz.
pub const SCS_BASE_HZ: u64 = 15_000;

/// Highest numerology defined for the NR frame structure.
pub const MAX_NUMEROLOGY: u8 = 4;

/// Subcarriers spanned by the SSB: 20 resource blocks × 12.
pub const SSB_SUBCARRIERS: usize = 240;

/// Sample rate covering the SSB at numerology 0 with a 256-point grid.
///
/// 240 subcarriers at 15 kHz would need 3.6 MHz; 3.84 MHz (256 subcarriers)
/// keeps the grid a power of two for the halfband decimators. Scale by
/// 2^numerology for higher spacings.
pub const SSB_BASE_RATE: u64 = 3_840_000;

/// Nominal SSB repetition interval in seconds.
///
/// Transmitters may schedule the burst anywhere in its window, so this is a
/// cadence for chunking the input, not a timing guarantee.
pub const SSB_PERIOD: f64 = 0.008;

/// Length of the primary synchronization sequence in subcarriers.
pub const PSS_LENGTH: usize = 127;

/// Subcarrier spacing in Hz for a numerology.
///
/// Callers must have validated `numerology <= MAX_NUMEROLOGY`.
pub fn scs_hz(numerology: u8) -> u64 {
    SCS_BASE_HZ << numerology
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scs_scaling() {
        assert_eq!(scs_hz(0), 15_000);
        assert_eq!(scs_hz(1), 30_000);
        assert_eq!(scs_hz(4), 240_000);
    }

    #[test]
    fn test_ssb_grid_covers_ssb() {
        // 256-point grid at base rate covers the 240 SSB subcarriers.
        assert!(SSB_BASE_RATE / SCS_BASE_HZ >= SSB_SUBCARRIERS as u64);
        assert_eq!(SSB_BASE_RATE / SCS_BASE_HZ, 256);
    }
}
