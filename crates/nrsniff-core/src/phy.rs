//! Shared PHY state.
//!
//! The acquisition controller and the synchronization stage both need the
//! SSB bandwidth part: the controller sizes and attaches it at init, the
//! syncer reads it to build its decimation chain and PSS replicas. The
//! `Phy` struct is that shared attachment point, handed around as
//! `Arc<Mutex<Phy>>`.

use crate::bandwidth_part::BandwidthPart;
use crate::types::{PhyError, PhyResult};

/// PHY-layer state shared between acquisition and synchronization.
#[derive(Debug, Clone, Default)]
pub struct Phy {
    ssb_bwp: Option<BandwidthPart>,
}

impl Phy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the bandwidth part the SSB search operates on.
    pub fn attach_ssb_bwp(&mut self, bwp: BandwidthPart) {
        self.ssb_bwp = Some(bwp);
    }

    /// The attached SSB bandwidth part, if any.
    pub fn ssb_bwp(&self) -> Option<&BandwidthPart> {
        self.ssb_bwp.as_ref()
    }

    /// The attached SSB bandwidth part, or an error when missing.
    pub fn require_ssb_bwp(&self) -> PhyResult<&BandwidthPart> {
        self.ssb_bwp.as_ref().ok_or(PhyError::MissingBandwidthPart)
    }
}
