//! # nrsniff Core
//!
//! PHY-side building blocks for the nrsniff SSB acquisition frontend:
//!
//! - **Types**: complex I/Q sample aliases and PHY error types
//! - **Bandwidth part**: subcarrier-grid sizing for a given numerology
//! - **PSS**: primary synchronization sequence generation and replicas
//! - **Decimation**: halfband filter chains for power-of-two rate steps
//! - **Syncer**: the synchronization stage fed by a sample source
//! - **Sinks**: downstream consumers (null, file recording)
//! - **IQ files**: raw interleaved capture reading and writing
//! - **Observe**: structured logging and acquisition metrics
//!
//! ## Signal Flow
//!
//! ```text
//! Source (SDR / capture file)
//!    │  work(n) — fixed 8 ms chunks
//!    ▼
//! Syncer: halfband decimate → PSS correlate (N_ID(2) = 0,1,2)
//!    │
//!    ▼
//! detections (logged + counted)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use nrsniff_core::bandwidth_part::BandwidthPart;
//! use nrsniff_core::params::{SSB_BASE_RATE, SSB_SUBCARRIERS};
//!
//! // Grid for the SSB at 15 kHz subcarrier spacing (numerology 0)
//! let bwp = BandwidthPart::new(SSB_BASE_RATE, 0, SSB_SUBCARRIERS).unwrap();
//! assert_eq!(bwp.fft_size(), 256);
//! assert_eq!(bwp.sample_rate(), 3_840_000);
//! ```

pub mod bandwidth_part;
pub mod correlator;
pub mod halfband;
pub mod iqfile;
pub mod observe;
pub mod params;
pub mod phy;
pub mod pss;
pub mod sink;
pub mod syncer;
pub mod types;

pub use bandwidth_part::BandwidthPart;
pub use phy::Phy;
pub use sink::{FileSink, NullSink, SampleSink};
pub use syncer::{SsbDetection, Syncer};
pub use types::{IQBuffer, IQSample, PhyError, PhyResult};
