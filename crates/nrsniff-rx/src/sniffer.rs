//! The acquisition controller.
//!
//! A `Sniffer` owns one sample source (radio or capture file), wires it
//! to the synchronization stage at construction, and drives the blocking
//! pull loop: one `work` call per nominal SSB period until stopped. Both
//! construction paths converge on one initializer so the grid sizing and
//! wiring invariants hold identically wherever samples originate — a
//! sizing mismatch would silently prevent the synchronizer from ever
//! detecting anything.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nrsniff_rx::sniffer::Sniffer;
//!
//! let mut sniffer = Sniffer::from_file(3_840_000, "capture.cf32", 0)?;
//! // Blocks until the capture is exhausted.
//! sniffer.start()?;
//! # Ok::<(), nrsniff_rx::sniffer::SnifferError>(())
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, trace};

use nrsniff_core::bandwidth_part::BandwidthPart;
use nrsniff_core::observe::metrics::SnifferMetrics;
use nrsniff_core::params::{MAX_NUMEROLOGY, SSB_BASE_RATE, SSB_PERIOD, SSB_SUBCARRIERS};
use nrsniff_core::phy::Phy;
use nrsniff_core::syncer::Syncer;
use nrsniff_core::types::PhyError;

use crate::config::{ConfigError, SnifferConfig, SourceConfig};
use crate::file::FileSource;
use crate::radio::RadioSource;
use crate::source::{SampleSource, SourceError};

/// Errors from constructing or running a [`Sniffer`].
#[derive(Debug, thiserror::Error)]
pub enum SnifferError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("phy error: {0}")]
    Phy(#[from] PhyError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Samples per pull for a capture rate: one nominal SSB period, never
/// less than one sample.
pub fn samples_per_chunk(sample_rate: u64) -> usize {
    ((sample_rate as f64 * SSB_PERIOD).round() as usize).max(1)
}

/// Acquisition controller: owns a source, feeds the synchronizer.
pub struct Sniffer {
    sample_rate: u64,
    numerology: u8,
    running: Arc<AtomicBool>,
    source: Box<dyn SampleSource>,
    phy: Phy,
    metrics: Arc<SnifferMetrics>,
}

impl Sniffer {
    /// Capture live samples from an SDR front-end.
    ///
    /// Fails if the device cannot be opened and tuned with the given
    /// parameters; a failed instance must not be started.
    pub fn from_radio(
        sample_rate: u64,
        frequency: f64,
        rf_args: &str,
        numerology: u8,
    ) -> Result<Self, SnifferError> {
        let source = RadioSource::new(sample_rate, frequency, rf_args)?;
        Self::from_source(Box::new(source), numerology)
    }

    /// Replay a recorded IQ capture.
    ///
    /// Fails if the file cannot be opened or read.
    pub fn from_file(
        sample_rate: u64,
        path: impl AsRef<Path>,
        numerology: u8,
    ) -> Result<Self, SnifferError> {
        let source = FileSource::new(sample_rate, path)?;
        Self::from_source(Box::new(source), numerology)
    }

    /// Build from configuration, dispatching on the source mode.
    pub fn from_config(config: &SnifferConfig) -> Result<Self, SnifferError> {
        config.validate()?;
        match &config.source {
            SourceConfig::Radio { frequency, rf_args } => {
                Self::from_radio(config.sample_rate, *frequency, rf_args, config.numerology)
            }
            SourceConfig::File { path } => {
                Self::from_file(config.sample_rate, path, config.numerology)
            }
        }
    }

    /// The shared initializer both modes converge on: build the
    /// synchronizer, size and attach the SSB bandwidth part, register
    /// termination, connect source to pipeline.
    pub fn from_source(
        mut source: Box<dyn SampleSource>,
        numerology: u8,
    ) -> Result<Self, SnifferError> {
        if numerology > MAX_NUMEROLOGY {
            return Err(PhyError::InvalidNumerology(numerology).into());
        }
        let sample_rate = source.sample_rate();
        if sample_rate == 0 {
            return Err(PhyError::InvalidSampleRate(sample_rate).into());
        }

        // Grid covering the 240 SSB subcarriers; 256 after power-of-two
        // rounding for the halfband chain.
        let mut phy = Phy::new();
        phy.attach_ssb_bwp(BandwidthPart::new(
            SSB_BASE_RATE << numerology,
            numerology,
            SSB_SUBCARRIERS,
        )?);

        let metrics = Arc::new(SnifferMetrics::new());
        let syncer = Syncer::new(sample_rate, &phy)?.with_metrics(metrics.clone());

        // End-of-stream flips the run flag; the store is atomic because a
        // radio driver may deliver the signal from its capture thread.
        let running = Arc::new(AtomicBool::new(false));
        let flag = running.clone();
        let ends = metrics.clone();
        source.set_on_end(Box::new(move || {
            debug!("end of stream signalled");
            ends.stream_ends.inc();
            flag.store(false, Ordering::Release);
        }));

        source.connect(Box::new(syncer));

        Ok(Self {
            sample_rate,
            numerology,
            running,
            source,
            phy,
            metrics,
        })
    }

    /// Run the acquisition loop. Blocks the calling thread until the
    /// stream ends or [`Sniffer::stop`] is called.
    ///
    /// A mid-stream pull failure is fatal and distinct from a graceful
    /// end of stream: the error propagates, the loop aborts, and
    /// `running` is deliberately left set so callers can tell "broke"
    /// from "finished". Call [`Sniffer::stop`] while cleaning up after an
    /// error return.
    pub fn start(&mut self) -> Result<(), SnifferError> {
        self.running.store(true, Ordering::Release);
        let chunk = samples_per_chunk(self.sample_rate);
        info!(
            sample_rate = self.sample_rate,
            numerology = self.numerology,
            samples_per_chunk = chunk,
            "acquisition started"
        );

        while self.running.load(Ordering::Acquire) {
            let pull_started = Instant::now();
            if let Err(e) = self.source.work(chunk) {
                self.metrics.source_errors.inc();
                error!(error = %e, "pull failed, aborting acquisition");
                return Err(e.into());
            }
            let elapsed_us = pull_started.elapsed().as_secs_f64() * 1e6;
            self.metrics.chunks_pulled.inc();
            self.metrics.samples_requested.inc_by(chunk as u64);
            self.metrics.work_latency_us.observe(elapsed_us);
            trace!(elapsed_us, "chunk delivered");
        }

        debug!("acquisition stopped");
        Ok(())
    }

    /// Request the loop to stop before its next pull. Idempotent, and
    /// safe to call from the end-of-stream callback or another thread.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            debug!("stop requested");
        }
    }

    /// Whether the pull loop is (still) supposed to run.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Capture sample rate in Hz.
    pub fn sample_rate(&self) -> u64 {
        self.sample_rate
    }

    /// SSB numerology μ.
    pub fn numerology(&self) -> u8 {
        self.numerology
    }

    /// Samples pulled per loop iteration.
    pub fn chunk_size(&self) -> usize {
        samples_per_chunk(self.sample_rate)
    }

    /// PHY state built at initialization.
    pub fn phy(&self) -> &Phy {
        &self.phy
    }

    /// Metrics handle for this instance.
    pub fn metrics(&self) -> &Arc<SnifferMetrics> {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{EndCallback, SourceResult};
    use nrsniff_core::sink::SampleSink;
    use num_complex::Complex64;
    use std::sync::atomic::AtomicU64;

    /// Source that delivers zeros and follows a scripted lifecycle.
    struct ScriptedSource {
        sample_rate: u64,
        pulls: Arc<AtomicU64>,
        /// Fire the end callback at the end of every k-th pull.
        end_every: Option<u64>,
        /// Fail the k-th pull.
        fail_on: Option<u64>,
        sink: Option<Box<dyn SampleSink>>,
        on_end: Option<EndCallback>,
    }

    impl ScriptedSource {
        fn new(sample_rate: u64, end_every: Option<u64>, fail_on: Option<u64>) -> Self {
            Self {
                sample_rate,
                pulls: Arc::new(AtomicU64::new(0)),
                end_every,
                fail_on,
                sink: None,
                on_end: None,
            }
        }

        fn pull_counter(&self) -> Arc<AtomicU64> {
            self.pulls.clone()
        }
    }

    impl SampleSource for ScriptedSource {
        fn connect(&mut self, sink: Box<dyn SampleSink>) {
            self.sink = Some(sink);
        }

        fn set_on_end(&mut self, callback: EndCallback) {
            self.on_end = Some(callback);
        }

        fn work(&mut self, num_samples: usize) -> SourceResult<()> {
            let k = self.pulls.fetch_add(1, Ordering::SeqCst) + 1;
            if Some(k) == self.fail_on {
                return Err(SourceError::Hardware("injected failure".into()));
            }
            if let Some(sink) = self.sink.as_mut() {
                sink.process(&vec![Complex64::new(0.0, 0.0); num_samples]);
            }
            if let Some(every) = self.end_every {
                if k % every == 0 {
                    if let Some(on_end) = self.on_end.as_mut() {
                        on_end();
                    }
                }
            }
            Ok(())
        }

        fn sample_rate(&self) -> u64 {
            self.sample_rate
        }
    }

    const RATE: u64 = 3_840_000;

    #[test]
    fn test_chunk_size_formula() {
        // The canonical sizing scenario: 3.84 Msps, 8 ms period.
        assert_eq!(samples_per_chunk(3_840_000), 30_720);
        assert_eq!(samples_per_chunk(7_680_000), 61_440);
        assert_eq!(samples_per_chunk(61_440_000), 491_520);
        // Degenerate rates still pull at least one sample.
        assert_eq!(samples_per_chunk(1), 1);
        assert_eq!(samples_per_chunk(100), 1);
    }

    #[test]
    fn test_chunk_size_matches_rounding() {
        for rate in [1_920_000u64, 3_840_000, 11_520_000, 23_040_000] {
            let expected = (rate as f64 * SSB_PERIOD).round() as usize;
            assert_eq!(samples_per_chunk(rate), expected.max(1));
        }
    }

    #[test]
    fn test_end_of_stream_stops_after_exact_pulls() {
        let source = ScriptedSource::new(RATE, Some(2), None);
        let pulls = source.pull_counter();
        let mut sniffer = Sniffer::from_source(Box::new(source), 0).unwrap();

        sniffer.start().unwrap();

        assert_eq!(pulls.load(Ordering::SeqCst), 2);
        assert!(!sniffer.is_running());
        let snapshot = sniffer.metrics().snapshot();
        assert_eq!(snapshot.chunks_pulled, 2);
        assert_eq!(snapshot.stream_ends, 1);
        assert_eq!(snapshot.samples_requested, 2 * 30_720);
    }

    #[test]
    fn test_stop_before_start_is_safe() {
        let source = ScriptedSource::new(RATE, Some(1), None);
        let pulls = source.pull_counter();
        let mut sniffer = Sniffer::from_source(Box::new(source), 0).unwrap();

        sniffer.stop();
        assert!(!sniffer.is_running());

        // A later start still runs normally.
        sniffer.start().unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_stop_is_idempotent() {
        let source = ScriptedSource::new(RATE, Some(1), None);
        let mut sniffer = Sniffer::from_source(Box::new(source), 0).unwrap();
        sniffer.stop();
        sniffer.stop();
        assert!(!sniffer.is_running());
        sniffer.start().unwrap();
        assert!(!sniffer.is_running());
    }

    #[test]
    fn test_restart_after_end_of_stream() {
        let source = ScriptedSource::new(RATE, Some(1), None);
        let pulls = source.pull_counter();
        let mut sniffer = Sniffer::from_source(Box::new(source), 0).unwrap();

        sniffer.start().unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 1);

        sniffer.start().unwrap();
        assert_eq!(pulls.load(Ordering::SeqCst), 2);
        assert_eq!(sniffer.metrics().snapshot().stream_ends, 2);
    }

    #[test]
    fn test_pull_failure_is_fatal_and_distinct() {
        let source = ScriptedSource::new(RATE, None, Some(1));
        let mut sniffer = Sniffer::from_source(Box::new(source), 0).unwrap();

        let result = sniffer.start();
        assert!(matches!(result, Err(SnifferError::Source(_))));
        // The loop aborted without the stop transition: callers must
        // clean up explicitly.
        assert!(sniffer.is_running());
        assert_eq!(sniffer.metrics().snapshot().source_errors, 1);
        assert_eq!(sniffer.metrics().snapshot().stream_ends, 0);

        sniffer.stop();
        assert!(!sniffer.is_running());
    }

    #[test]
    fn test_invalid_numerology_rejected_before_wiring() {
        let source = ScriptedSource::new(RATE, Some(1), None);
        let result = Sniffer::from_source(Box::new(source), 9);
        assert!(matches!(
            result,
            Err(SnifferError::Phy(PhyError::InvalidNumerology(9)))
        ));
    }

    #[test]
    fn test_incompatible_rate_rejected() {
        // 5 Msps is not a power-of-two multiple of the 3.84 MHz grid.
        let source = ScriptedSource::new(5_000_000, Some(1), None);
        let result = Sniffer::from_source(Box::new(source), 0);
        assert!(matches!(
            result,
            Err(SnifferError::Phy(PhyError::RateMismatch { .. }))
        ));
    }

    #[test]
    fn test_zero_rate_rejected() {
        let source = ScriptedSource::new(0, Some(1), None);
        let result = Sniffer::from_source(Box::new(source), 0);
        assert!(matches!(
            result,
            Err(SnifferError::Phy(PhyError::InvalidSampleRate(0)))
        ));
    }

    #[test]
    fn test_grid_attached_during_init() {
        let source = ScriptedSource::new(30_720_000, Some(1), None);
        let sniffer = Sniffer::from_source(Box::new(source), 1).unwrap();
        let bwp = sniffer.phy().ssb_bwp().unwrap();
        assert_eq!(bwp.fft_size(), 256);
        assert_eq!(bwp.sample_rate(), 7_680_000);
        assert_eq!(sniffer.chunk_size(), 245_760);
    }

    #[test]
    fn test_from_config_missing_file_fails_at_construction() {
        let config = SnifferConfig {
            sample_rate: RATE,
            numerology: 0,
            source: SourceConfig::File {
                path: "/nonexistent/capture.cf32".into(),
            },
            ..Default::default()
        };
        assert!(matches!(
            Sniffer::from_config(&config),
            Err(SnifferError::Source(SourceError::Io(_)))
        ));
    }

    #[test]
    fn test_from_config_rejects_invalid_before_opening() {
        let config = SnifferConfig {
            sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            Sniffer::from_config(&config),
            Err(SnifferError::Config(_))
        ));
    }
}
