//! Raw IQ capture files.
//!
//! Captures are flat files of interleaved I/Q pairs, little-endian, with
//! no header; the element type is conveyed by the file extension or given
//! explicitly. `cf32` is the native format of the capture tooling this
//! frontend ingests; the integer formats cover recordings made with
//! common SDR utilities.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use num_complex::Complex64;

use crate::types::{IQBuffer, IQSample};

/// On-disk sample element format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IqFormat {
    /// Interleaved f32 pairs (8 bytes/sample).
    #[default]
    Cf32,
    /// Interleaved f64 pairs (16 bytes/sample).
    Cf64,
    /// Interleaved i16 pairs (4 bytes/sample).
    Ci16,
    /// Interleaved i8 pairs (2 bytes/sample).
    Ci8,
    /// Interleaved u8 pairs with DC at 128 (2 bytes/sample).
    Cu8,
}

impl IqFormat {
    /// Bytes per complex sample.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::Cf32 => 8,
            Self::Cf64 => 16,
            Self::Ci16 => 4,
            Self::Ci8 | Self::Cu8 => 2,
        }
    }

    /// Guess the format from a file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "cf32" | "fc32" | "iq" => Some(Self::Cf32),
            "cf64" | "fc64" => Some(Self::Cf64),
            "ci16" | "sc16" | "cs16" => Some(Self::Ci16),
            "ci8" | "cs8" => Some(Self::Ci8),
            "cu8" | "raw" => Some(Self::Cu8),
            _ => None,
        }
    }

    /// Canonical extension for the format.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cf32 => "cf32",
            Self::Cf64 => "cf64",
            Self::Ci16 => "ci16",
            Self::Ci8 => "ci8",
            Self::Cu8 => "cu8",
        }
    }

    fn decode(&self, bytes: &[u8]) -> IQBuffer {
        match self {
            Self::Cf32 => bytes
                .chunks_exact(8)
                .map(|c| {
                    Complex64::new(
                        f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64,
                        f32::from_le_bytes([c[4], c[5], c[6], c[7]]) as f64,
                    )
                })
                .collect(),
            Self::Cf64 => bytes
                .chunks_exact(16)
                .map(|c| {
                    Complex64::new(
                        f64::from_le_bytes(c[0..8].try_into().unwrap()),
                        f64::from_le_bytes(c[8..16].try_into().unwrap()),
                    )
                })
                .collect(),
            Self::Ci16 => bytes
                .chunks_exact(4)
                .map(|c| {
                    Complex64::new(
                        i16::from_le_bytes([c[0], c[1]]) as f64 / 32768.0,
                        i16::from_le_bytes([c[2], c[3]]) as f64 / 32768.0,
                    )
                })
                .collect(),
            Self::Ci8 => bytes
                .chunks_exact(2)
                .map(|c| {
                    Complex64::new(c[0] as i8 as f64 / 128.0, c[1] as i8 as f64 / 128.0)
                })
                .collect(),
            Self::Cu8 => bytes
                .chunks_exact(2)
                .map(|c| {
                    Complex64::new(
                        (c[0] as f64 - 128.0) / 128.0,
                        (c[1] as f64 - 128.0) / 128.0,
                    )
                })
                .collect(),
        }
    }

    fn encode(&self, sample: IQSample, out: &mut Vec<u8>) {
        match self {
            Self::Cf32 => {
                out.extend_from_slice(&(sample.re as f32).to_le_bytes());
                out.extend_from_slice(&(sample.im as f32).to_le_bytes());
            }
            Self::Cf64 => {
                out.extend_from_slice(&sample.re.to_le_bytes());
                out.extend_from_slice(&sample.im.to_le_bytes());
            }
            Self::Ci16 => {
                let re = (sample.re * 32767.0).clamp(-32768.0, 32767.0) as i16;
                let im = (sample.im * 32767.0).clamp(-32768.0, 32767.0) as i16;
                out.extend_from_slice(&re.to_le_bytes());
                out.extend_from_slice(&im.to_le_bytes());
            }
            Self::Ci8 => {
                let re = (sample.re * 127.0).clamp(-128.0, 127.0) as i8;
                let im = (sample.im * 127.0).clamp(-128.0, 127.0) as i8;
                out.extend_from_slice(&[re as u8, im as u8]);
            }
            Self::Cu8 => {
                let re = (sample.re * 128.0 + 128.0).clamp(0.0, 255.0) as u8;
                let im = (sample.im * 128.0 + 128.0).clamp(0.0, 255.0) as u8;
                out.extend_from_slice(&[re, im]);
            }
        }
    }
}

/// Number of complete samples in a capture file, from its length.
pub fn total_samples(path: &Path, format: IqFormat) -> io::Result<u64> {
    let len = std::fs::metadata(path)?.len();
    Ok(len / format.bytes_per_sample() as u64)
}

/// Streaming capture reader.
pub struct IqReader {
    reader: BufReader<File>,
    format: IqFormat,
    samples_read: u64,
}

impl IqReader {
    /// Open a capture with an explicit format.
    pub fn open(path: &Path, format: IqFormat) -> io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
            format,
            samples_read: 0,
        })
    }

    /// Open a capture, guessing the format from the extension.
    pub fn auto(path: &Path) -> io::Result<Self> {
        let format = IqFormat::from_extension(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "unknown capture extension")
        })?;
        Self::open(path, format)
    }

    /// Read up to `n` samples; returns fewer only at end of file.
    pub fn read(&mut self, n: usize) -> io::Result<IQBuffer> {
        let bps = self.format.bytes_per_sample();
        let mut buf = vec![0u8; n * bps];
        let mut filled = 0;
        // Loop until the request is satisfied or the file ends; a raw
        // read may legitimately return short.
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(k) => filled += k,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        let samples = self.format.decode(&buf[..filled - filled % bps]);
        self.samples_read += samples.len() as u64;
        Ok(samples)
    }

    /// Total samples read so far.
    pub fn samples_read(&self) -> u64 {
        self.samples_read
    }

    /// The element format.
    pub fn format(&self) -> IqFormat {
        self.format
    }
}

/// Streaming capture writer.
pub struct IqWriter {
    writer: BufWriter<File>,
    format: IqFormat,
    samples_written: u64,
}

impl IqWriter {
    /// Create (truncate) a capture with an explicit format.
    pub fn create(path: &Path, format: IqFormat) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            format,
            samples_written: 0,
        })
    }

    /// Write a block of samples.
    pub fn write(&mut self, samples: &[IQSample]) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(samples.len() * self.format.bytes_per_sample());
        for &s in samples {
            self.format.encode(s, &mut bytes);
        }
        self.writer.write_all(&bytes)?;
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Flush buffered bytes to the file.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Total samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// The element format.
    pub fn format(&self) -> IqFormat {
        self.format
    }
}
