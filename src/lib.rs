//! # LockIn RS
//!
//! A Rust library for running lock-in amplifier measurements on a Teensy
//! microcontroller over a serial link.
//!
//! The host encodes one configuration command, the device locks onto an
//! internal or external reference and streams back `signal,I,Q,R,phi`
//! records terminated by a sentinel byte. This library frames and decodes
//! that stream under wall-clock deadlines and reduces the captured samples
//! into average amplitude and phase.
//!
//! ## Features
//!
//! - **Device discovery**: Uses `serialport` to find Teensy boards
//! - **Typed configuration**: Builders that reject invalid runs before anything is sent
//! - **Deadline-bounded reads**: A silent or unplugged device never hangs the caller
//! - **Strict decoding**: Unparseable records are dropped and counted, never zero-filled
//! - **Trailing averages**: Amplitude/phase over the most recent share of a capture
//! - **CSV export**: Uses `polars` to write and reload captured series
//!
//! ## Examples
//!
//! ### Running a Capture
//!
//! ```rust,no_run
//! use lockin_rs::{AcquisitionConfig, DeviceModel, LockInAmp, TrailingPercent};
//! use lockin_rs::{trailing_averages, Acquired, FilterOrder};
//!
//! let mut amp = LockInAmp::connect(None, DeviceModel::Teensy35)?;
//!
//! let config = AcquisitionConfig::internal_reference(1000)
//!     .sample_rate(10_000)
//!     .sample_count(5000)
//!     .low_pass(5, FilterOrder::Second)
//!     .build()?;
//!
//! let (data, _) = amp.run_logged(&config).into_result()?;
//! if let Acquired::Series { series, report } = data {
//!     println!("Captured {} of {} samples", report.collected, report.requested);
//!     let averages = trailing_averages(
//!         &series,
//!         TrailingPercent::new(75),
//!         &amp.model().calibration(),
//!     )?;
//!     println!("Amplitude: {} V", averages.amplitude_volts);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Encoding a Command
//!
//! ```rust
//! use lockin_rs::{AcquisitionConfig, FilterOrder};
//!
//! let config = AcquisitionConfig::external_reference(5000)
//!     .low_pass(10, FilterOrder::Fourth)
//!     .fast_mode()
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.to_command().as_str(), "1:5000:10000:10000:10:4:1F");
//! ```
//!
//! ### Decoding Records
//!
//! ```rust
//! use lockin_rs::Sample;
//!
//! let sample = Sample::decode("2048, 1.5, -0.5, 12, 0.25").unwrap();
//! assert_eq!(sample.r, 12.0);
//! assert!(Sample::decode("2048, ovf, -0.5, 12, 0.25").is_err());
//! ```

pub mod acquisition_config;
pub mod device_model;
pub mod export;
pub mod framed_reader;
pub mod lockin_amp;
pub mod lockin_connector;
pub mod sample;
pub mod serial_terminal;
pub mod statistics;

#[cfg(test)]
mod test_support;

// Re-export the main types for convenience
pub use acquisition_config::{
    AcquisitionConfig, AcquisitionConfigBuilder, ConfigError, FilterOrder, Reference, RunMode,
    StringifiedCommand, MAX_SAMPLE_COUNT,
};

pub use device_model::{Calibration, DeviceModel};

pub use framed_reader::FramedReader;

pub use serial_terminal::{LockInTerminal, SerialChannel, TerminalError};

pub use lockin_connector::{ConnectorError, LockInConnector, LockInDevice};

pub use sample::{DecodeError, FastResult, Sample, SampleSeries};

pub use lockin_amp::{
    AcquisitionError, AcquisitionState, Acquired, CaptureReport, ErrorKind, LockInAmp,
    LogObserver, ProtocolSettings, RunEvent, RunObserver, RunOutcome,
};

pub use statistics::{trailing_averages, Averages, StatisticsError, TrailingPercent};

pub use export::ExportError;
