//! Downstream sample consumers.
//!
//! A source delivers each pulled chunk into exactly one [`SampleSink`].
//! The synchronizer is the production sink; `NullSink` swallows samples
//! while counting them, and `FileSink` records the stream to a raw IQ
//! capture for offline analysis.

use std::path::Path;

use tracing::warn;

use crate::iqfile::{IqFormat, IqWriter};
use crate::types::IQSample;

/// A consumer of contiguous sample runs.
pub trait SampleSink: Send {
    /// Consume one contiguous run of samples.
    fn process(&mut self, samples: &[IQSample]);
}

/// Counts and discards everything it receives.
#[derive(Debug, Default)]
pub struct NullSink {
    samples: u64,
    calls: u64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total samples consumed.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Total `process` calls.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl SampleSink for NullSink {
    fn process(&mut self, samples: &[IQSample]) {
        self.samples += samples.len() as u64;
        self.calls += 1;
    }
}

/// Records the stream to a raw IQ file.
///
/// Write failures do not abort acquisition; they are logged and counted,
/// and the affected chunk is dropped.
pub struct FileSink {
    writer: IqWriter,
    write_errors: u64,
}

impl FileSink {
    /// Create a sink writing `format` samples to `path`.
    pub fn create(path: &Path, format: IqFormat) -> std::io::Result<Self> {
        Ok(Self {
            writer: IqWriter::create(path, format)?,
            write_errors: 0,
        })
    }

    /// Samples successfully written so far.
    pub fn samples_written(&self) -> u64 {
        self.writer.samples_written()
    }

    /// Chunks dropped due to write failures.
    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    /// Flush buffered samples to disk.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl SampleSink for FileSink {
    fn process(&mut self, samples: &[IQSample]) {
        if let Err(e) = self.writer.write(samples) {
            self.write_errors += 1;
            warn!(error = %e, dropped = samples.len(), "capture write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iqfile::IqReader;
    use num_complex::Complex64;
    use std::env;

    #[test]
    fn test_null_sink_counts() {
        let mut sink = NullSink::new();
        sink.process(&[Complex64::new(1.0, 0.0); 8]);
        sink.process(&[Complex64::new(0.0, 1.0); 4]);
        assert_eq!(sink.samples(), 12);
        assert_eq!(sink.calls(), 2);
    }

    #[test]
    fn test_file_sink_records_stream() {
        let path = env::temp_dir().join("nrsniff_test_file_sink.cf32");
        let samples: Vec<Complex64> = (0..16)
            .map(|i| Complex64::new(i as f64 / 16.0, -(i as f64) / 16.0))
            .collect();

        {
            let mut sink = FileSink::create(&path, IqFormat::Cf32).unwrap();
            sink.process(&samples[..10]);
            sink.process(&samples[10..]);
            sink.flush().unwrap();
            assert_eq!(sink.samples_written(), 16);
            assert_eq!(sink.write_errors(), 0);
        }

        let mut reader = IqReader::open(&path, IqFormat::Cf32).unwrap();
        let back = reader.read(32).unwrap();
        assert_eq!(back.len(), 16);
        std::fs::remove_file(&path).ok();
    }
}
