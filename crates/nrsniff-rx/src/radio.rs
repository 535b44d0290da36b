//! Live radio source via SoapySDR.
//!
//! Enabled with the `soapysdr` cargo feature, which links the system
//! SoapySDR library; the driver-specific argument string (for example
//! `"driver=rtlsdr"` or `"driver=uhd,serial=3123A5C"`) is passed through
//! to device creation. Built without the feature, construction fails with
//! a driver-unavailable error so callers learn at open time, not at pull
//! time.
//!
//! SoapySDR drivers commonly run an internal capture thread; the
//! controller therefore treats the end-of-stream callback as potentially
//! cross-thread (see [`crate::source`]).

use std::collections::HashMap;

use nrsniff_core::sink::SampleSink;

use crate::source::{EndCallback, SampleSource, SourceError, SourceResult};

#[cfg(feature = "soapysdr")]
use num_complex::{Complex, Complex64};
#[cfg(feature = "soapysdr")]
use tracing::{debug, info};

/// Receive channel used for single-channel capture.
#[cfg(feature = "soapysdr")]
const RX_CHANNEL: usize = 0;

/// Stream read timeout in microseconds.
#[cfg(feature = "soapysdr")]
const READ_TIMEOUT_US: i64 = 1_000_000;

/// Split a `key=value,key=value` driver argument string.
fn parse_rf_args(rf_args: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for part in rf_args.split(',') {
        if let Some(pos) = part.find('=') {
            let key = part[..pos].trim();
            let value = part[pos + 1..].trim();
            if !key.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Name of the requested driver, for diagnostics.
fn driver_label(rf_args: &str) -> String {
    parse_rf_args(rf_args)
        .remove("driver")
        .unwrap_or_else(|| "unspecified".to_string())
}

/// Live capture source backed by a SoapySDR device.
#[cfg(feature = "soapysdr")]
pub struct RadioSource {
    sample_rate: u64,
    frequency: f64,
    sink: Option<Box<dyn SampleSink>>,
    on_end: Option<EndCallback>,
    stream: soapysdr::RxStream<Complex<f32>>,
    read_buf: Vec<Complex<f32>>,
    active: bool,
}

/// Live capture source; this build carries no driver, so construction
/// always fails.
#[cfg(not(feature = "soapysdr"))]
pub struct RadioSource {
    sample_rate: u64,
    frequency: f64,
}

impl RadioSource {
    /// Center frequency in Hz.
    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

#[cfg(feature = "soapysdr")]
impl RadioSource {
    /// Open and tune a device, then activate its receive stream.
    pub fn new(sample_rate: u64, frequency: f64, rf_args: &str) -> SourceResult<Self> {
        if sample_rate == 0 {
            return Err(SourceError::Config("sample rate must be positive".into()));
        }

        let device = soapysdr::Device::new(rf_args).map_err(|e| {
            SourceError::DeviceNotFound(format!("driver {}: {}", driver_label(rf_args), e))
        })?;

        device
            .set_sample_rate(soapysdr::Direction::Rx, RX_CHANNEL, sample_rate as f64)
            .map_err(|e| SourceError::Hardware(e.to_string()))?;
        device
            .set_frequency(soapysdr::Direction::Rx, RX_CHANNEL, frequency, ())
            .map_err(|e| SourceError::Hardware(e.to_string()))?;

        let mut stream = device
            .rx_stream::<Complex<f32>>(&[RX_CHANNEL])
            .map_err(|e| SourceError::Hardware(e.to_string()))?;
        let mtu = stream
            .mtu()
            .map_err(|e| SourceError::Hardware(e.to_string()))?;
        stream
            .activate(None)
            .map_err(|e| SourceError::Hardware(e.to_string()))?;

        info!(
            driver = %driver_label(rf_args),
            frequency,
            sample_rate,
            mtu,
            "radio stream active"
        );

        Ok(Self {
            sample_rate,
            frequency,
            sink: None,
            on_end: None,
            stream,
            read_buf: vec![Complex::new(0.0, 0.0); mtu],
            active: true,
        })
    }

    fn signal_end(&mut self) {
        debug!("radio stream ended");
        if let Some(on_end) = self.on_end.as_mut() {
            on_end();
        }
    }
}

#[cfg(not(feature = "soapysdr"))]
impl RadioSource {
    /// Always fails: this build carries no radio driver.
    pub fn new(sample_rate: u64, frequency: f64, rf_args: &str) -> SourceResult<Self> {
        let _ = (sample_rate, frequency);
        Err(SourceError::DriverUnavailable(format!(
            "driver {}: rebuild with the `soapysdr` feature for live capture",
            driver_label(rf_args)
        )))
    }
}

#[cfg(feature = "soapysdr")]
impl SampleSource for RadioSource {
    fn connect(&mut self, sink: Box<dyn SampleSink>) {
        self.sink = Some(sink);
    }

    fn set_on_end(&mut self, callback: EndCallback) {
        self.on_end = Some(callback);
    }

    fn work(&mut self, num_samples: usize) -> SourceResult<()> {
        if self.sink.is_none() {
            return Err(SourceError::NotConnected);
        }
        if !self.active {
            self.signal_end();
            return Ok(());
        }

        let mut chunk: Vec<Complex64> = Vec::with_capacity(num_samples);
        let mut ended = false;
        while chunk.len() < num_samples {
            let want = (num_samples - chunk.len()).min(self.read_buf.len());
            let got = self
                .stream
                .read(&mut [&mut self.read_buf[..want]], READ_TIMEOUT_US)
                .map_err(|e| SourceError::Hardware(e.to_string()))?;
            if got == 0 {
                ended = true;
                break;
            }
            chunk.extend(
                self.read_buf[..got]
                    .iter()
                    .map(|s| Complex64::new(s.re as f64, s.im as f64)),
            );
        }

        if !chunk.is_empty() {
            if let Some(sink) = self.sink.as_mut() {
                sink.process(&chunk);
            }
        }
        if ended {
            self.active = false;
            self.signal_end();
        }
        Ok(())
    }

    fn sample_rate(&self) -> u64 {
        self.sample_rate
    }
}

#[cfg(feature = "soapysdr")]
impl Drop for RadioSource {
    fn drop(&mut self) {
        if self.active {
            let _ = self.stream.deactivate(None);
        }
    }
}

// No driver in this build; no instance can exist, the impl only keeps
// the two construction paths type-compatible.
#[cfg(not(feature = "soapysdr"))]
impl SampleSource for RadioSource {
    fn connect(&mut self, _sink: Box<dyn SampleSink>) {}

    fn set_on_end(&mut self, _callback: EndCallback) {}

    fn work(&mut self, _num_samples: usize) -> SourceResult<()> {
        Err(SourceError::DriverUnavailable(
            "no radio driver in this build".into(),
        ))
    }

    fn sample_rate(&self) -> u64 {
        self.sample_rate
    }
}
