//! Recorded-capture playback source.
//!
//! Replays a raw IQ capture as if it were a live stream. The file length
//! is read once at open, so the source knows exactly when the stream is
//! drained and can signal end-of-stream on the pull that consumes the
//! last sample rather than one pull later.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use nrsniff_core::iqfile::{total_samples, IqFormat, IqReader};
use nrsniff_core::sink::SampleSink;

use crate::source::{EndCallback, SampleSource, SourceError, SourceResult};

/// Pull-driven reader over a raw IQ capture file.
pub struct FileSource {
    sample_rate: u64,
    path: PathBuf,
    reader: IqReader,
    /// Samples left in the file.
    remaining: u64,
    sink: Option<Box<dyn SampleSink>>,
    on_end: Option<EndCallback>,
}

impl FileSource {
    /// Open a capture, guessing the format from the extension and falling
    /// back to cf32 (the native capture format).
    pub fn new(sample_rate: u64, path: impl AsRef<Path>) -> SourceResult<Self> {
        let format = IqFormat::from_extension(path.as_ref()).unwrap_or_default();
        Self::with_format(sample_rate, path, format)
    }

    /// Open a capture with an explicit sample format.
    pub fn with_format(
        sample_rate: u64,
        path: impl AsRef<Path>,
        format: IqFormat,
    ) -> SourceResult<Self> {
        if sample_rate == 0 {
            return Err(SourceError::Config("sample rate must be positive".into()));
        }
        let path = path.as_ref().to_path_buf();
        let remaining = total_samples(&path, format)?;
        let reader = IqReader::open(&path, format)?;

        info!(
            path = %path.display(),
            format = format.name(),
            sample_rate,
            samples = remaining,
            "capture opened"
        );

        Ok(Self {
            sample_rate,
            path,
            reader,
            remaining,
            sink: None,
            on_end: None,
        })
    }

    /// Samples left before end of stream.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Path of the capture being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SampleSource for FileSource {
    fn connect(&mut self, sink: Box<dyn SampleSink>) {
        self.sink = Some(sink);
    }

    fn set_on_end(&mut self, callback: EndCallback) {
        self.on_end = Some(callback);
    }

    fn work(&mut self, num_samples: usize) -> SourceResult<()> {
        let sink = self.sink.as_mut().ok_or(SourceError::NotConnected)?;

        let want = (num_samples as u64).min(self.remaining) as usize;
        if want > 0 {
            let samples = self.reader.read(want)?;
            // A truncated file delivers short; treat whatever is missing
            // as already past the end.
            self.remaining = if samples.len() < want {
                0
            } else {
                self.remaining - samples.len() as u64
            };
            sink.process(&samples);
        }

        if self.remaining == 0 {
            debug!(path = %self.path.display(), "capture exhausted");
            if let Some(on_end) = self.on_end.as_mut() {
                on_end();
            }
        }
        Ok(())
    }

    fn sample_rate(&self) -> u64 {
        self.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrsniff_core::iqfile::IqWriter;
    use nrsniff_core::sink::NullSink;
    use num_complex::Complex64;
    use std::env;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn write_capture(name: &str, num_samples: usize) -> PathBuf {
        let path = env::temp_dir().join(format!("nrsniff_file_source_{}", name));
        let mut writer = IqWriter::create(&path, IqFormat::Cf32).unwrap();
        let samples: Vec<Complex64> = (0..num_samples)
            .map(|i| Complex64::new((i as f64 * 0.01).sin(), (i as f64 * 0.01).cos()))
            .collect();
        writer.write(&samples).unwrap();
        writer.flush().unwrap();
        path
    }

    /// Sink that records delivery sizes.
    #[derive(Default)]
    struct RecordingSink {
        chunks: Arc<AtomicU64>,
        samples: Arc<AtomicU64>,
    }

    impl SampleSink for RecordingSink {
        fn process(&mut self, samples: &[Complex64]) {
            self.chunks.fetch_add(1, Ordering::SeqCst);
            self.samples.fetch_add(samples.len() as u64, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_missing_file_fails_at_open() {
        let result = FileSource::new(3_840_000, "/nonexistent/capture.cf32");
        assert!(matches!(result, Err(SourceError::Io(_))));
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let path = write_capture("zero_rate.cf32", 8);
        let result = FileSource::new(0, &path);
        assert!(matches!(result, Err(SourceError::Config(_))));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_work_without_sink_fails() {
        let path = write_capture("no_sink.cf32", 8);
        let mut source = FileSource::new(3_840_000, &path).unwrap();
        assert!(matches!(source.work(4), Err(SourceError::NotConnected)));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_delivers_requested_chunks() {
        let path = write_capture("chunks.cf32", 100);
        let mut source = FileSource::new(3_840_000, &path).unwrap();

        let chunks = Arc::new(AtomicU64::new(0));
        let samples = Arc::new(AtomicU64::new(0));
        source.connect(Box::new(RecordingSink {
            chunks: chunks.clone(),
            samples: samples.clone(),
        }));

        source.work(40).unwrap();
        assert_eq!(samples.load(Ordering::SeqCst), 40);
        assert_eq!(source.remaining(), 60);

        source.work(40).unwrap();
        assert_eq!(samples.load(Ordering::SeqCst), 80);
        assert_eq!(chunks.load(Ordering::SeqCst), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_end_signalled_on_draining_pull() {
        // Exactly two chunks: the second pull consumes the last sample
        // and must fire the callback on the same call.
        let path = write_capture("two_chunks.cf32", 64);
        let mut source = FileSource::new(3_840_000, &path).unwrap();
        source.connect(Box::new(NullSink::new()));

        let ended = Arc::new(AtomicU64::new(0));
        let flag = ended.clone();
        source.set_on_end(Box::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        source.work(32).unwrap();
        assert_eq!(ended.load(Ordering::SeqCst), 0);
        source.work(32).unwrap();
        assert_eq!(ended.load(Ordering::SeqCst), 1);
        assert_eq!(source.remaining(), 0);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_short_tail_delivered_then_end() {
        let path = write_capture("short_tail.cf32", 50);
        let mut source = FileSource::new(3_840_000, &path).unwrap();

        let chunks = Arc::new(AtomicU64::new(0));
        let samples = Arc::new(AtomicU64::new(0));
        source.connect(Box::new(RecordingSink {
            chunks: chunks.clone(),
            samples: samples.clone(),
        }));

        let ended = Arc::new(AtomicU64::new(0));
        let flag = ended.clone();
        source.set_on_end(Box::new(move || {
            flag.fetch_add(1, Ordering::SeqCst);
        }));

        source.work(32).unwrap();
        source.work(32).unwrap();
        assert_eq!(samples.load(Ordering::SeqCst), 50, "tail is 18 samples");
        assert_eq!(ended.load(Ordering::SeqCst), 1);
        std::fs::remove_file(&path).ok();
    }
}
