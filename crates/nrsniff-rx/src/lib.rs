//! # nrsniff RX
//!
//! Sample acquisition for the nrsniff SSB frontend: the pull-driven
//! [`SampleSource`] contract with its radio and capture-file
//! implementations, YAML configuration, and the [`Sniffer`] controller
//! that owns a source, wires it to the synchronization stage and runs
//! the blocking pull loop.
//!
//! ## Example
//!
//! ```rust,no_run
//! use nrsniff_rx::config::SnifferConfig;
//! use nrsniff_rx::sniffer::Sniffer;
//! use nrsniff_core::observe::init_logging;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SnifferConfig::load()?;
//! init_logging(&config.logging);
//!
//! let mut sniffer = Sniffer::from_config(&config)?;
//! sniffer.start()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod file;
pub mod radio;
pub mod sniffer;
pub mod source;

pub use config::{ConfigError, SnifferConfig, SourceConfig};
pub use file::FileSource;
pub use radio::RadioSource;
pub use sniffer::{samples_per_chunk, Sniffer, SnifferError};
pub use source::{EndCallback, SampleSource, SourceError, SourceResult};
