use crate::device_model::Calibration;
use crate::lockin_amp::ErrorKind;
use crate::sample::{FastResult, SampleSeries};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StatisticsError {
    #[error("Averaging window is empty ({percent}% of {len} samples)")]
    EmptyWindow { percent: u8, len: usize },
}

impl StatisticsError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::EmptyWindow
    }
}

/// Share of the most recent samples to average, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingPercent(u8);

impl TrailingPercent {
    /// Values above 100 are clamped.
    pub fn new(percent: u32) -> Self {
        Self(percent.min(100) as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// First index of the trailing window over `len` samples,
    /// `floor((100 - p) / 100 * len)`.
    pub fn start_index(&self, len: usize) -> usize {
        usize::from(100 - self.0) * len / 100
    }
}

impl Default for TrailingPercent {
    fn default() -> Self {
        Self(75)
    }
}

/// Average amplitude (volts) and phase (radians).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub amplitude_volts: f64,
    pub phase_radians: f64,
    /// Samples that went into the averages.
    pub window_len: usize,
}

impl Averages {
    pub fn from_fast(result: &FastResult, calibration: &Calibration) -> Self {
        Self {
            amplitude_volts: calibration.raw_to_amplitude(result.average_amplitude_raw),
            phase_radians: result.average_phase,
            window_len: 1,
        }
    }
}

/// Average the trailing `percent` of `series`, skipping start-up transients.
pub fn trailing_averages(
    series: &SampleSeries,
    percent: TrailingPercent,
    calibration: &Calibration,
) -> Result<Averages, StatisticsError> {
    let start = percent.start_index(series.len());
    let window = &series.as_slice()[start..];
    if window.is_empty() {
        return Err(StatisticsError::EmptyWindow {
            percent: percent.get(),
            len: series.len(),
        });
    }

    let (amplitude_sum, phase_sum) = window.iter().fold((0.0, 0.0), |(amp, phase), s| {
        (amp + calibration.raw_to_amplitude(s.r), phase + s.phase)
    });
    let n = window.len() as f64;

    log::debug!(
        "Averaging samples {}..{} of {}",
        start,
        series.len(),
        series.len()
    );
    Ok(Averages {
        amplitude_volts: amplitude_sum / n,
        phase_radians: phase_sum / n,
        window_len: window.len(),
    })
}
