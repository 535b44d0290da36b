//! SSB synchronization stage.
//!
//! The syncer is the sink the acquisition controller wires its source to.
//! Each incoming chunk is halfband-decimated from the capture rate down
//! to the bandwidth-part rate, then matched-filtered against the three
//! PSS replicas (N_ID(2) = 0, 1, 2). Candidate detections are logged,
//! counted and kept in a short history for inspection; SSS confirmation
//! and PBCH decoding happen downstream and are not this stage's job.
//!
//! ## Example
//!
//! ```rust
//! use nrsniff_core::bandwidth_part::BandwidthPart;
//! use nrsniff_core::params::{SSB_BASE_RATE, SSB_SUBCARRIERS};
//! use nrsniff_core::phy::Phy;
//! use nrsniff_core::syncer::Syncer;
//!
//! let mut phy = Phy::new();
//! phy.attach_ssb_bwp(BandwidthPart::new(SSB_BASE_RATE, 0, SSB_SUBCARRIERS).unwrap());
//!
//! // 30.72 Msps capture decimates by 8 down to the 3.84 MHz grid.
//! let syncer = Syncer::new(30_720_000, &phy).unwrap();
//! assert_eq!(syncer.decimation_factor(), 8);
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bandwidth_part::BandwidthPart;
use crate::correlator::SyncCorrelator;
use crate::halfband::DecimationChain;
use crate::observe::metrics::SnifferMetrics;
use crate::phy::Phy;
use crate::pss;
use crate::sink::SampleSink;
use crate::types::{IQSample, PhyError, PhyResult};

/// Default normalized-correlation threshold for PSS candidates.
const DEFAULT_PSS_THRESHOLD: f64 = 0.8;

/// Detections kept for inspection before old ones are discarded.
const DETECTION_HISTORY: usize = 64;

/// One PSS candidate found in the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SsbDetection {
    /// Cell identity hypothesis N_ID(2).
    pub nid2: u8,
    /// Sample index at the bandwidth-part rate.
    pub index: u64,
    /// Normalized correlation magnitude.
    pub correlation: f64,
}

/// Decimate-and-correlate synchronization stage.
pub struct Syncer {
    sample_rate: u64,
    bwp: BandwidthPart,
    chain: DecimationChain,
    correlators: Vec<(u8, SyncCorrelator)>,
    recent: VecDeque<SsbDetection>,
    total_detections: u64,
    metrics: Option<Arc<SnifferMetrics>>,
}

impl Syncer {
    /// Build a syncer for a capture at `sample_rate`, using the bandwidth
    /// part attached to `phy`.
    ///
    /// The capture rate must be a power-of-two multiple of the grid rate
    /// so the halfband chain can bridge them.
    pub fn new(sample_rate: u64, phy: &Phy) -> PhyResult<Self> {
        Self::with_threshold(sample_rate, phy, DEFAULT_PSS_THRESHOLD)
    }

    /// Like [`Syncer::new`] with an explicit detection threshold.
    pub fn with_threshold(sample_rate: u64, phy: &Phy, threshold: f64) -> PhyResult<Self> {
        let bwp = *phy.require_ssb_bwp()?;
        if sample_rate == 0 {
            return Err(PhyError::InvalidSampleRate(sample_rate));
        }
        let grid_rate = bwp.sample_rate();
        if sample_rate % grid_rate != 0 {
            return Err(PhyError::RateMismatch {
                input: sample_rate,
                bwp: grid_rate,
            });
        }
        let factor = sample_rate / grid_rate;
        let chain = DecimationChain::new(factor).map_err(|_| PhyError::RateMismatch {
            input: sample_rate,
            bwp: grid_rate,
        })?;

        let mut correlators = Vec::with_capacity(3);
        for nid2 in 0..3u8 {
            let replica = pss::time_replica(nid2, bwp.fft_size())?;
            correlators.push((nid2, SyncCorrelator::new(&replica, threshold)));
        }

        debug!(
            sample_rate,
            grid_rate,
            factor,
            fft_size = bwp.fft_size(),
            "syncer ready"
        );

        Ok(Self {
            sample_rate,
            bwp,
            chain,
            correlators,
            recent: VecDeque::with_capacity(DETECTION_HISTORY),
            total_detections: 0,
            metrics: None,
        })
    }

    /// Attach a metrics handle; detections will be counted on it.
    pub fn with_metrics(mut self, metrics: Arc<SnifferMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Capture sample rate this syncer expects.
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// The grid the search operates on.
    pub fn bandwidth_part(&self) -> &BandwidthPart {
        &self.bwp
    }

    /// Capture-rate to grid-rate decimation factor.
    pub fn decimation_factor(&self) -> u64 {
        self.chain.factor()
    }

    /// Total PSS candidates seen since construction.
    pub fn total_detections(&self) -> u64 {
        self.total_detections
    }

    /// The most recent detections, oldest first.
    pub fn recent_detections(&self) -> Vec<SsbDetection> {
        self.recent.iter().copied().collect()
    }

    fn record(&mut self, detection: SsbDetection) {
        info!(
            nid2 = detection.nid2,
            index = detection.index,
            correlation = detection.correlation,
            "PSS candidate"
        );
        self.total_detections += 1;
        if let Some(metrics) = &self.metrics {
            metrics.sync_detections.inc();
        }
        if self.recent.len() == DETECTION_HISTORY {
            self.recent.pop_front();
        }
        self.recent.push_back(detection);
    }
}

impl SampleSink for Syncer {
    fn process(&mut self, samples: &[IQSample]) {
        let decimated = self.chain.process(samples);
        let mut found = Vec::new();
        for (nid2, correlator) in self.correlators.iter_mut() {
            for peak in correlator.process(&decimated) {
                found.push(SsbDetection {
                    nid2: *nid2,
                    index: peak.index,
                    correlation: peak.correlation,
                });
            }
        }
        for detection in found {
            self.record(detection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{SSB_BASE_RATE, SSB_SUBCARRIERS};
    use num_complex::Complex64;

    fn phy_with_ssb_grid() -> Phy {
        let mut phy = Phy::new();
        phy.attach_ssb_bwp(BandwidthPart::new(SSB_BASE_RATE, 0, SSB_SUBCARRIERS).unwrap());
        phy
    }

    #[test]
    fn test_requires_bandwidth_part() {
        let phy = Phy::new();
        assert!(matches!(
            Syncer::new(SSB_BASE_RATE, &phy),
            Err(PhyError::MissingBandwidthPart)
        ));
    }

    #[test]
    fn test_rejects_incompatible_rates() {
        let phy = phy_with_ssb_grid();
        // Not a multiple of the grid rate.
        assert!(matches!(
            Syncer::new(5_000_000, &phy),
            Err(PhyError::RateMismatch { .. })
        ));
        // A multiple, but not a power of two.
        assert!(matches!(
            Syncer::new(3 * SSB_BASE_RATE, &phy),
            Err(PhyError::RateMismatch { .. })
        ));
    }

    #[test]
    fn test_decimation_factor() {
        let phy = phy_with_ssb_grid();
        assert_eq!(Syncer::new(SSB_BASE_RATE, &phy).unwrap().decimation_factor(), 1);
        assert_eq!(
            Syncer::new(8 * SSB_BASE_RATE, &phy).unwrap().decimation_factor(),
            8
        );
    }

    #[test]
    fn test_detects_embedded_pss() {
        let phy = phy_with_ssb_grid();
        // Capture already at the grid rate: the chain passes through and
        // the replica arrives at the correlator unchanged.
        let mut syncer = Syncer::with_threshold(SSB_BASE_RATE, &phy, 0.9).unwrap();

        let replica = pss::time_replica(1, 256).unwrap();
        let mut signal = vec![Complex64::new(0.0, 0.0); 300];
        signal.extend_from_slice(&replica);
        signal.extend(vec![Complex64::new(0.0, 0.0); 300]);

        syncer.process(&signal);

        assert_eq!(syncer.total_detections(), 1);
        let detections = syncer.recent_detections();
        assert_eq!(detections[0].nid2, 1);
        assert_eq!(detections[0].index, 300);
        assert!(detections[0].correlation > 0.99);
    }

    #[test]
    fn test_silence_yields_nothing() {
        let phy = phy_with_ssb_grid();
        let mut syncer = Syncer::new(SSB_BASE_RATE, &phy).unwrap();
        syncer.process(&vec![Complex64::new(0.0, 0.0); 4096]);
        assert_eq!(syncer.total_detections(), 0);
        assert!(syncer.recent_detections().is_empty());
    }

    #[test]
    fn test_metrics_hook_counts_detections() {
        let phy = phy_with_ssb_grid();
        let metrics = Arc::new(SnifferMetrics::new());
        let mut syncer = Syncer::with_threshold(SSB_BASE_RATE, &phy, 0.9)
            .unwrap()
            .with_metrics(metrics.clone());

        let replica = pss::time_replica(0, 256).unwrap();
        let mut signal = vec![Complex64::new(0.0, 0.0); 256];
        signal.extend_from_slice(&replica);
        signal.extend(vec![Complex64::new(0.0, 0.0); 256]);
        syncer.process(&signal);

        assert_eq!(metrics.sync_detections.get(), 1);
    }
}
