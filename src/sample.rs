use std::ops::Index;
use std::slice;

const RECORD_SEPARATOR: char = ',';

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Record is not valid text")]
    NotText,

    #[error("Expected {expected} fields but got {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("Field {index} ('{field}') is not a number")]
    InvalidField { index: usize, field: String },

    #[error("Field {index} ('{field}') is not finite")]
    NonFinite { index: usize, field: String },
}

/// Parse exactly `N` comma separated, finite decimal fields.
fn parse_fields<const N: usize>(record: &str) -> Result<[f64; N], DecodeError> {
    let fields: Vec<&str> = record.split(RECORD_SEPARATOR).map(str::trim).collect();
    if fields.len() != N {
        return Err(DecodeError::FieldCount {
            expected: N,
            found: fields.len(),
        });
    }

    let mut values = [0.0; N];
    for (index, (field, value)) in fields.iter().zip(values.iter_mut()).enumerate() {
        let parsed: f64 = field.parse().map_err(|_| DecodeError::InvalidField {
            index,
            field: field.to_string(),
        })?;
        // `inf` and `nan` parse as f64 too.
        if !parsed.is_finite() {
            return Err(DecodeError::NonFinite {
                index,
                field: field.to_string(),
            });
        }
        *value = parsed;
    }
    Ok(values)
}

fn record_text(record: &[u8]) -> Result<&str, DecodeError> {
    std::str::from_utf8(record).map_err(|_| DecodeError::NotText)
}

/// One lock-in output point: the raw input and its demodulated components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub signal: f64,
    pub i: f64,
    pub q: f64,
    /// Magnitude in raw ADC counts (half the peak-to-peak amplitude).
    pub r: f64,
    /// Phase in radians.
    pub phase: f64,
}

impl Sample {
    pub fn new(signal: f64, i: f64, q: f64, r: f64, phase: f64) -> Self {
        Self {
            signal,
            i,
            q,
            r,
            phase,
        }
    }

    /// Decode `signal,I,Q,R,phi`. Any unparseable field rejects the whole
    /// record.
    pub fn decode(record: &str) -> Result<Self, DecodeError> {
        let [signal, i, q, r, phase] = parse_fields::<5>(record)?;
        Ok(Self::new(signal, i, q, r, phase))
    }

    pub fn from_record(record: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(record_text(record)?)
    }
}

/// Samples of one run in arrival order. Read-only once handed out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    samples: Vec<Sample>,
}

impl SampleSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_vec(self) -> Vec<Sample> {
        self.samples
    }
}

impl From<Vec<Sample>> for SampleSeries {
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

impl FromIterator<Sample> for SampleSeries {
    fn from_iter<T: IntoIterator<Item = Sample>>(iter: T) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl Index<usize> for SampleSeries {
    type Output = Sample;

    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl<'a> IntoIterator for &'a SampleSeries {
    type Item = &'a Sample;
    type IntoIter = slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// The single aggregate a fast-mode run returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FastResult {
    pub average_amplitude_raw: f64,
    pub average_phase: f64,
    /// Only present with an external reference.
    pub measured_reference_hz: Option<f64>,
}

impl FastResult {
    /// Decode `avgAmplitudeRaw,avgPhase`.
    pub fn decode(record: &str, measured_reference_hz: Option<f64>) -> Result<Self, DecodeError> {
        let [average_amplitude_raw, average_phase] = parse_fields::<2>(record)?;
        Ok(Self {
            average_amplitude_raw,
            average_phase,
            measured_reference_hz,
        })
    }

    pub fn from_record(
        record: &[u8],
        measured_reference_hz: Option<f64>,
    ) -> Result<Self, DecodeError> {
        Self::decode(record_text(record)?, measured_reference_hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_sample_with_spaces() {
        let sample = Sample::decode("0.1, 0.2, 0.3, 0.4, 0.5").unwrap();
        assert_eq!(sample, Sample::new(0.1, 0.2, 0.3, 0.4, 0.5));
    }

    #[test]
    fn test_decode_rejects_non_numeric() {
        assert_eq!(
            Sample::decode("a,b,c,d,e"),
            Err(DecodeError::InvalidField {
                index: 0,
                field: "a".to_string()
            })
        );
        assert!(matches!(
            Sample::decode("1,2,3,x,5"),
            Err(DecodeError::InvalidField { index: 3, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_field_count() {
        assert_eq!(
            Sample::decode("1,2,3,4"),
            Err(DecodeError::FieldCount {
                expected: 5,
                found: 4
            })
        );
        assert!(Sample::decode("1,2,3,4,5,6").is_err());
        assert!(Sample::decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_overflow_markers() {
        assert!(matches!(
            Sample::decode("1,2,3,inf,5"),
            Err(DecodeError::NonFinite { index: 3, .. })
        ));
        assert!(Sample::decode("1,2,3,ovf,5").is_err());
        assert!(Sample::decode("nan,2,3,4,5").is_err());
    }

    #[test]
    fn test_from_record_bytes() {
        assert_eq!(
            Sample::from_record(b"2048,-1.5,3e-2,12,-0.75").unwrap(),
            Sample::new(2048.0, -1.5, 0.03, 12.0, -0.75)
        );
        assert_eq!(
            Sample::from_record(&[0xff, 0xfe]),
            Err(DecodeError::NotText)
        );
    }

    #[test]
    fn test_decode_fast_result() {
        let fast = FastResult::decode("512.5, 0.25", Some(1000.0)).unwrap();
        assert_eq!(fast.average_amplitude_raw, 512.5);
        assert_eq!(fast.average_phase, 0.25);
        assert_eq!(fast.measured_reference_hz, Some(1000.0));
        assert!(FastResult::decode("512.5", None).is_err());
    }

    #[test]
    fn test_series_preserves_arrival_order() {
        let series: SampleSeries = (0..4)
            .map(|n| Sample::new(n as f64, 0.0, 0.0, 0.0, 0.0))
            .collect();
        assert_eq!(series.len(), 4);
        let signals: Vec<f64> = series.iter().map(|s| s.signal).collect();
        assert_eq!(signals, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(series[2].signal, 2.0);
    }
}
