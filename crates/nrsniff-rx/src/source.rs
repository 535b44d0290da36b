//! The sample source contract.
//!
//! Both source variants — live radio and recorded capture — expose one
//! pull interface so the acquisition loop never branches on where samples
//! come from:
//!
//! - `connect` wires the source's output to a downstream sink, once;
//! - `work(n)` synchronously delivers `n` samples into that sink and only
//!   then returns;
//! - `set_on_end` installs the callback fired when the source determines
//!   no more samples will ever be available.
//!
//! File sources invoke the callback on the same call stack as `work`.
//! A radio driver with an internal capture thread may invoke it from that
//! thread, which is why the callback must be `Send` and why the
//! controller keeps its run flag atomic.

use nrsniff_core::sink::SampleSink;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors surfaced by sample sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("driver unavailable: {0}")]
    DriverUnavailable(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("hardware error: {0}")]
    Hardware(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source has no connected sink")]
    NotConnected,
}

/// Callback fired on end of stream.
pub type EndCallback = Box<dyn FnMut() + Send>;

/// A pull-driven producer of I/Q samples.
pub trait SampleSource: Send {
    /// Wire the output to a downstream consumer. Called once, before the
    /// first `work`.
    fn connect(&mut self, sink: Box<dyn SampleSink>);

    /// Install the end-of-stream callback.
    fn set_on_end(&mut self, callback: EndCallback);

    /// Deliver `num_samples` samples into the connected sink, returning
    /// once delivery is complete. Mid-stream failures surface here; a
    /// graceful end of stream fires the callback instead and returns
    /// `Ok`.
    fn work(&mut self, num_samples: usize) -> SourceResult<()>;

    /// Sample rate of the stream in Hz.
    fn sample_rate(&self) -> u64;
}
