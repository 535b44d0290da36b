//! Primary synchronization sequence generation.
//!
//! The PSS is a 127-element BPSK m-sequence; the three cell-identity
//! hypotheses N_ID(2) ∈ {0, 1, 2} are cyclic shifts of one generator
//! output. The synchronizer matched-filters against time-domain replicas
//! rendered by placing the sequence on the center subcarriers of the
//! bandwidth-part grid and inverse-transforming once at startup.
//!
//! ## Example
//!
//! ```rust
//! use nrsniff_core::pss;
//!
//! let d0 = pss::sequence(0).unwrap();
//! let d1 = pss::sequence(1).unwrap();
//! // m-sequence shifts are nearly orthogonal
//! let cross: f64 = d0.iter().zip(d1.iter()).map(|(a, b)| a * b).sum();
//! assert!(cross.abs() < 2.0);
//! ```

use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::params::PSS_LENGTH;
use crate::types::{IQBuffer, PhyError, PhyResult};

/// Cyclic shift applied per N_ID(2) hypothesis.
const NID2_SHIFT: usize = 43;

/// Generate the BPSK PSS sequence for one N_ID(2) hypothesis.
///
/// Values are ±1.0; length is [`PSS_LENGTH`].
pub fn sequence(nid2: u8) -> PhyResult<Vec<f64>> {
    if nid2 > 2 {
        return Err(PhyError::InvalidNid2(nid2));
    }

    // x(i+7) = (x(i+4) + x(i)) mod 2, seeded per TS 38.211 7.4.2.2.
    let mut x = [0u8; PSS_LENGTH];
    x[..7].copy_from_slice(&[0, 1, 1, 0, 1, 1, 1]);
    for i in 0..PSS_LENGTH - 7 {
        x[i + 7] = (x[i + 4] + x[i]) % 2;
    }

    let shift = NID2_SHIFT * nid2 as usize;
    Ok((0..PSS_LENGTH)
        .map(|n| 1.0 - 2.0 * x[(n + shift) % PSS_LENGTH] as f64)
        .collect())
}

/// Render the PSS for one N_ID(2) as a unit-energy time-domain replica.
///
/// The 127 BPSK values are mapped onto the subcarriers centered on DC of
/// an `fft_size`-point grid and inverse-transformed. `fft_size` must be a
/// power of two at least 128 (the bandwidth-part grid guarantees this).
pub fn time_replica(nid2: u8, fft_size: usize) -> PhyResult<IQBuffer> {
    if !fft_size.is_power_of_two() || fft_size < 128 {
        return Err(PhyError::GridTooNarrow(fft_size));
    }
    let d = sequence(nid2)?;

    let mut grid = vec![Complex64::new(0.0, 0.0); fft_size];
    for (n, &v) in d.iter().enumerate() {
        // Subcarrier offsets -63..=63 relative to DC.
        let k = n as i64 - (PSS_LENGTH as i64 - 1) / 2;
        let bin = k.rem_euclid(fft_size as i64) as usize;
        grid[bin] = Complex64::new(v, 0.0);
    }

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_inverse(fft_size).process(&mut grid);

    // Normalize to unit energy so correlation magnitudes are comparable
    // across grid sizes.
    let energy: f64 = grid.iter().map(|s| s.norm_sqr()).sum();
    let scale = 1.0 / energy.sqrt();
    for s in grid.iter_mut() {
        *s *= scale;
    }

    Ok(grid)
}
