use crate::lockin_amp::ErrorKind;
use std::fmt;

/// Upper bound on samples per run; larger requests are clamped.
pub const MAX_SAMPLE_COUNT: u32 = 15_000;

const FIELD_SEPARATOR: &str = ":";
const END_OF_COMMAND: &str = "F";
const FIELD_COUNT: usize = 7;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be a positive integer")]
    NotPositive { field: &'static str },

    #[error("Filter order {0} out of range (1-4)")]
    FilterOrderOutOfRange(u32),

    #[error("Malformed command '{command}': {reason}")]
    MalformedCommand { command: String, reason: &'static str },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::ConfigInvalid
    }
}

/// The command encoded for the device, ready to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringifiedCommand {
    command: String,
}

impl StringifiedCommand {
    pub fn as_bytes(&self) -> &[u8] {
        self.command.as_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.command
    }

    pub fn into_string(self) -> String {
        self.command
    }
}

impl fmt::Display for StringifiedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// Device synthesizes the reference at this frequency.
    Internal { frequency_hz: u32 },
    /// Device counts an external reference for this long before locking.
    External { count_duration_ms: u32 },
}

impl Reference {
    pub fn flag(&self) -> u32 {
        match self {
            Reference::Internal { .. } => 0,
            Reference::External { .. } => 1,
        }
    }

    fn value(&self) -> u32 {
        match self {
            Reference::Internal { frequency_hz } => *frequency_hz,
            Reference::External { count_duration_ms } => *count_duration_ms,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Reference::External { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Stream every sample back to the host.
    #[default]
    Normal,
    /// Device averages and returns a single aggregate record.
    Fast,
}

impl RunMode {
    pub fn flag(&self) -> u32 {
        match self {
            RunMode::Normal => 0,
            RunMode::Fast => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Normal => "normal",
            RunMode::Fast => "fast",
        }
    }
}

/// Number of cascaded low-pass stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOrder {
    #[default]
    First,
    Second,
    Third,
    Fourth,
}

impl FilterOrder {
    pub fn stages(&self) -> u32 {
        match self {
            FilterOrder::First => 1,
            FilterOrder::Second => 2,
            FilterOrder::Third => 3,
            FilterOrder::Fourth => 4,
        }
    }
}

impl TryFrom<u32> for FilterOrder {
    type Error = ConfigError;

    fn try_from(stages: u32) -> Result<Self, Self::Error> {
        match stages {
            1 => Ok(FilterOrder::First),
            2 => Ok(FilterOrder::Second),
            3 => Ok(FilterOrder::Third),
            4 => Ok(FilterOrder::Fourth),
            other => Err(ConfigError::FilterOrderOutOfRange(other)),
        }
    }
}

/// Parameters of one lock-in run. Only constructed through
/// [`AcquisitionConfigBuilder::build`] or [`AcquisitionConfig::from_command`],
/// so every numeric field is positive and the sample count is within
/// [`MAX_SAMPLE_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    reference: Reference,
    sample_rate_hz: u32,
    sample_count: u32,
    cutoff_hz: u32,
    filter_order: FilterOrder,
    run_mode: RunMode,
}

impl AcquisitionConfig {
    pub fn internal_reference(frequency_hz: u32) -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder::new(Reference::Internal { frequency_hz })
    }

    pub fn external_reference(count_duration_ms: u32) -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder::new(Reference::External { count_duration_ms })
    }

    pub fn reference(&self) -> Reference {
        self.reference
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn cutoff_hz(&self) -> u32 {
        self.cutoff_hz
    }

    pub fn filter_order(&self) -> FilterOrder {
        self.filter_order
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Encode as `ref:freq:rate:count:cutoff:order:modeF`.
    pub fn to_command(&self) -> StringifiedCommand {
        let fields = [
            self.reference.flag(),
            self.reference.value(),
            self.sample_rate_hz,
            self.sample_count,
            self.cutoff_hz,
            self.filter_order.stages(),
            self.run_mode.flag(),
        ];
        let joined = fields
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR);

        StringifiedCommand {
            command: format!("{}{}", joined, END_OF_COMMAND),
        }
    }

    /// Parse a command line produced by [`Self::to_command`].
    pub fn from_command(command: &str) -> Result<Self, ConfigError> {
        let malformed = |reason| ConfigError::MalformedCommand {
            command: command.to_string(),
            reason,
        };

        let body = command
            .strip_suffix(END_OF_COMMAND)
            .ok_or_else(|| malformed("missing end-of-command marker"))?;

        let fields = body
            .split(FIELD_SEPARATOR)
            .map(|field| field.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| malformed("field is not an unsigned integer"))?;

        let [reference_flag, reference_value, sample_rate_hz, sample_count, cutoff_hz, stages, mode_flag]: [u32; FIELD_COUNT] =
            fields
                .try_into()
                .map_err(|_| malformed("expected seven fields"))?;

        let builder = match reference_flag {
            0 => Self::internal_reference(reference_value),
            1 => Self::external_reference(reference_value),
            _ => return Err(malformed("unknown reference mode flag")),
        };
        let run_mode = match mode_flag {
            0 => RunMode::Normal,
            1 => RunMode::Fast,
            _ => return Err(malformed("unknown run mode flag")),
        };

        builder
            .sample_rate(sample_rate_hz)
            .sample_count(sample_count)
            .low_pass(cutoff_hz, FilterOrder::try_from(stages)?)
            .run_mode(run_mode)
            .build()
    }
}

#[derive(Debug, Clone)]
pub struct AcquisitionConfigBuilder {
    reference: Reference,
    sample_rate_hz: u32,
    sample_count: u32,
    cutoff_hz: u32,
    filter_order: FilterOrder,
    run_mode: RunMode,
}

impl AcquisitionConfigBuilder {
    fn new(reference: Reference) -> Self {
        Self {
            reference,
            sample_rate_hz: 10_000,
            sample_count: 10_000,
            cutoff_hz: 5,
            filter_order: FilterOrder::First,
            run_mode: RunMode::Normal,
        }
    }

    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    pub fn sample_count(mut self, count: u32) -> Self {
        self.sample_count = count;
        self
    }

    pub fn low_pass(mut self, cutoff_hz: u32, order: FilterOrder) -> Self {
        self.cutoff_hz = cutoff_hz;
        self.filter_order = order;
        self
    }

    pub fn run_mode(mut self, run_mode: RunMode) -> Self {
        self.run_mode = run_mode;
        self
    }

    pub fn fast_mode(self) -> Self {
        self.run_mode(RunMode::Fast)
    }

    pub fn build(self) -> Result<AcquisitionConfig, ConfigError> {
        let reference_field = match self.reference {
            Reference::Internal { .. } => "reference frequency",
            Reference::External { .. } => "frequency count duration",
        };
        for (field, value) in [
            (reference_field, self.reference.value()),
            ("sample rate", self.sample_rate_hz),
            ("sample count", self.sample_count),
            ("filter cutoff", self.cutoff_hz),
        ] {
            if value == 0 {
                return Err(ConfigError::NotPositive { field });
            }
        }

        let sample_count = if self.sample_count > MAX_SAMPLE_COUNT {
            log::warn!(
                "Requested {} samples, clamping to {}",
                self.sample_count,
                MAX_SAMPLE_COUNT
            );
            MAX_SAMPLE_COUNT
        } else {
            self.sample_count
        };

        Ok(AcquisitionConfig {
            reference: self.reference,
            sample_rate_hz: self.sample_rate_hz,
            sample_count,
            cutoff_hz: self.cutoff_hz,
            filter_order: self.filter_order,
            run_mode: self.run_mode,
        })
    }
}

impl Default for AcquisitionConfigBuilder {
    fn default() -> Self {
        Self::new(Reference::External {
            count_duration_ms: 5000,
        })
    }
}
