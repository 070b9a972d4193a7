use crate::acquisition_config::{AcquisitionConfig, Reference, RunMode, StringifiedCommand};
use crate::device_model::DeviceModel;
use crate::framed_reader::{FramedReader, DEFAULT_SENTINEL};
use crate::lockin_connector::{ConnectorError, LockInConnector};
use crate::sample::{DecodeError, FastResult, Sample, SampleSeries};
use crate::serial_terminal::{LockInTerminal, SerialChannel, TerminalError, DEFAULT_BAUD};
use std::fmt;
use std::time::{Duration, Instant};

/// Tells the device the host has everything so it can reset.
const DATA_RECEIVED_ACK: &[u8] = b"DRX";

/// Progress is reported every this many samples.
const PROGRESS_INTERVAL: usize = 1000;

/// Stand-in deadline for budgets too large to add to `Instant::now()`.
const UNBOUNDED_WAIT: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget)
        .or_else(|| now.checked_add(UNBOUNDED_WAIT))
        .unwrap_or(now)
}

/// Flat classification of anything that can go wrong around a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigInvalid,
    DeviceSilent,
    WriteTimeout,
    Timeout,
    DecodeError,
    EmptyWindow,
    /// OS or io level failure of the serial link.
    Transport,
}

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Nothing received from the device within {0:?}")]
    DeviceSilent(Duration),

    #[error("Command transmit did not complete: {0}")]
    WriteTimeout(TerminalError),

    #[error("Timed out waiting for the {0}")]
    Timeout(&'static str),

    #[error("Could not decode the aggregate record: {0}")]
    Decode(#[from] DecodeError),

    #[error("Serial terminal error: {0}")]
    Terminal(TerminalError),
}

impl From<TerminalError> for AcquisitionError {
    fn from(error: TerminalError) -> Self {
        match error {
            TerminalError::WriteTimeout { .. } => AcquisitionError::WriteTimeout(error),
            TerminalError::Timeout { expected, .. } => AcquisitionError::Timeout(expected),
            other => AcquisitionError::Terminal(other),
        }
    }
}

impl AcquisitionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AcquisitionError::DeviceSilent(_) => ErrorKind::DeviceSilent,
            AcquisitionError::WriteTimeout(_) => ErrorKind::WriteTimeout,
            AcquisitionError::Timeout(_) => ErrorKind::Timeout,
            AcquisitionError::Decode(_) => ErrorKind::DecodeError,
            AcquisitionError::Terminal(_) => ErrorKind::Transport,
        }
    }
}

/// Protocol timing and framing knobs. Firmware revisions disagree on these,
/// so none of them is hard-coded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtocolSettings {
    /// How long the device may stay silent after the command.
    pub silence_budget: Duration,
    /// Wall-clock cap on a whole normal-mode capture.
    pub capture_budget: Duration,
    /// Wait for the measured external reference frequency line.
    pub reference_budget: Duration,
    /// Wait for the fast-mode aggregate record.
    pub aggregate_budget: Duration,
    /// Leading records left over from the previous run.
    pub stale_records: usize,
    pub sentinel: u8,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            silence_budget: Duration::from_secs(60),
            capture_budget: Duration::from_secs(30),
            reference_budget: Duration::from_secs(5),
            aggregate_budget: Duration::from_secs(30),
            stale_records: 2,
            sentinel: DEFAULT_SENTINEL,
        }
    }
}

impl ProtocolSettings {
    pub fn with_silence_budget(mut self, budget: Duration) -> Self {
        self.silence_budget = budget;
        self
    }

    pub fn with_capture_budget(mut self, budget: Duration) -> Self {
        self.capture_budget = budget;
        self
    }

    pub fn with_reference_budget(mut self, budget: Duration) -> Self {
        self.reference_budget = budget;
        self
    }

    pub fn with_aggregate_budget(mut self, budget: Duration) -> Self {
        self.aggregate_budget = budget;
        self
    }

    pub fn with_stale_records(mut self, count: usize) -> Self {
        self.stale_records = count;
        self
    }

    pub fn with_sentinel(mut self, sentinel: u8) -> Self {
        self.sentinel = sentinel;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    AwaitingDrain,
    AwaitingRefFrequency,
    Capturing,
    AwaitingAggregate,
    Finalizing,
}

/// How a normal-mode capture went.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CaptureReport {
    pub requested: usize,
    pub collected: usize,
    /// Records that failed to decode.
    pub dropped: usize,
    pub stale_discarded: usize,
    /// The capture budget ran out before `requested` samples arrived.
    pub timed_out: bool,
}

impl CaptureReport {
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.collected)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    CommandSent(StringifiedCommand),
    InternalReferenceFrequency { requested_hz: u32, actual_hz: f64 },
    MeasuredReferenceFrequency(f64),
    Progress { received: usize, requested: usize },
    CaptureFinished(CaptureReport),
    Acknowledged,
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::CommandSent(command) => write!(f, "Instruction sent: {}", command),
            RunEvent::InternalReferenceFrequency {
                requested_hz,
                actual_hz,
            } => write!(
                f,
                "Internal reference requested at {} Hz, actual frequency {} Hz",
                requested_hz, actual_hz
            ),
            RunEvent::MeasuredReferenceFrequency(hz) => {
                write!(f, "Measured external reference frequency: {} Hz", hz)
            }
            RunEvent::Progress {
                received,
                requested,
            } => write!(f, "{} lines read of {}", received, requested),
            RunEvent::CaptureFinished(report) => write!(
                f,
                "Lines read: {} of {} ({} dropped)",
                report.collected, report.requested, report.dropped
            ),
            RunEvent::Acknowledged => f.write_str("Data received acknowledgment sent"),
        }
    }
}

/// Receives progress of a run, in place of printing to a console.
pub trait RunObserver {
    fn on_event(&mut self, event: &RunEvent);
}

impl<F: FnMut(&RunEvent)> RunObserver for F {
    fn on_event(&mut self, event: &RunEvent) {
        self(event)
    }
}

/// Forwards every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl RunObserver for LogObserver {
    fn on_event(&mut self, event: &RunEvent) {
        log::info!("{}", event);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Acquired {
    Series {
        series: SampleSeries,
        report: CaptureReport,
    },
    Fast(FastResult),
}

#[derive(Debug)]
pub enum RunOutcome {
    Success {
        data: Acquired,
        measured_reference_hz: Option<f64>,
    },
    Failure(AcquisitionError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            RunOutcome::Success { .. } => None,
            RunOutcome::Failure(e) => Some(e.kind()),
        }
    }

    pub fn into_result(self) -> Result<(Acquired, Option<f64>), AcquisitionError> {
        match self {
            RunOutcome::Success {
                data,
                measured_reference_hz,
            } => Ok((data, measured_reference_hz)),
            RunOutcome::Failure(e) => Err(e),
        }
    }
}

/// Drives one lock-in device over a channel it owns exclusively.
#[derive(Debug)]
pub struct LockInAmp<C> {
    reader: FramedReader<C>,
    model: DeviceModel,
    settings: ProtocolSettings,
    state: AcquisitionState,
}

impl LockInAmp<LockInTerminal> {
    /// Connect to `port`, or to the first lock-in device found.
    pub fn connect(port: Option<&str>, model: DeviceModel) -> Result<Self, ConnectorError> {
        let terminal = LockInConnector::connect(port, DEFAULT_BAUD)?;
        Ok(Self::new(terminal, model))
    }
}

impl<C: SerialChannel> LockInAmp<C> {
    pub fn new(channel: C, model: DeviceModel) -> Self {
        Self {
            reader: FramedReader::new(channel),
            model,
            settings: ProtocolSettings::default(),
            state: AcquisitionState::Idle,
        }
    }

    pub fn with_settings(mut self, settings: ProtocolSettings) -> Self {
        self.reader = self.reader.with_sentinel(settings.sentinel);
        self.settings = settings;
        self
    }

    pub fn model(&self) -> DeviceModel {
        self.model
    }

    pub fn settings(&self) -> &ProtocolSettings {
        &self.settings
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn channel(&self) -> &C {
        self.reader.get_ref()
    }

    /// Give the channel back, e.g. to close it.
    pub fn into_channel(self) -> C {
        self.reader.into_inner()
    }

    /// Run one acquisition, logging its progress.
    pub fn run_logged(&mut self, config: &AcquisitionConfig) -> RunOutcome {
        self.run(config, &mut LogObserver)
    }

    /// Run one acquisition: send the command, read back samples (or the
    /// fast-mode aggregate) and acknowledge.
    ///
    /// A normal-mode capture cut short by the capture budget still succeeds
    /// with whatever arrived; see [`CaptureReport::shortfall`].
    #[tracing::instrument(skip_all, fields(mode = config.run_mode().as_str()))]
    pub fn run(&mut self, config: &AcquisitionConfig, observer: &mut dyn RunObserver) -> RunOutcome {
        let outcome = match self.try_run(config, observer) {
            Ok((data, measured_reference_hz)) => RunOutcome::Success {
                data,
                measured_reference_hz,
            },
            Err(e) => {
                log::warn!("Acquisition failed in {:?}: {}", self.state, e);
                RunOutcome::Failure(e)
            }
        };
        self.transition(AcquisitionState::Idle);
        outcome
    }

    fn try_run(
        &mut self,
        config: &AcquisitionConfig,
        observer: &mut dyn RunObserver,
    ) -> Result<(Acquired, Option<f64>), AcquisitionError> {
        self.transition(AcquisitionState::Idle);
        self.reader.get_mut().discard_buffers()?;

        if let Reference::Internal { frequency_hz } = config.reference() {
            match self.model.actual_internal_frequency(frequency_hz) {
                Some(actual_hz) => observer.on_event(&RunEvent::InternalReferenceFrequency {
                    requested_hz: frequency_hz,
                    actual_hz,
                }),
                None => log::warn!(
                    "{} cannot generate an internal reference at {} Hz",
                    self.model.as_str(),
                    frequency_hz
                ),
            }
        }

        let command = config.to_command();
        log::debug!("Sending command {}", command);
        self.reader.get_mut().send(command.as_bytes())?;
        observer.on_event(&RunEvent::CommandSent(command));

        self.transition(AcquisitionState::AwaitingDrain);
        let silence_budget = self.settings.silence_budget;
        self.reader
            .read_until_data(deadline_after(silence_budget))
            .map_err(|e| match e {
                TerminalError::Timeout { .. } => AcquisitionError::DeviceSilent(silence_budget),
                other => other.into(),
            })?;

        let measured_reference_hz = if config.reference().is_external() {
            self.transition(AcquisitionState::AwaitingRefFrequency);
            self.read_reference_frequency(observer)
        } else {
            None
        };

        let data = match config.run_mode() {
            RunMode::Normal => {
                self.transition(AcquisitionState::Capturing);
                let (series, report) = self.capture(config.sample_count() as usize, observer)?;
                Ok(Acquired::Series { series, report })
            }
            RunMode::Fast => {
                self.transition(AcquisitionState::AwaitingAggregate);
                self.read_aggregate(measured_reference_hz).map(Acquired::Fast)
            }
        };

        self.transition(AcquisitionState::Finalizing);
        // Sent even after a failed aggregate.
        match self.reader.get_mut().send(DATA_RECEIVED_ACK) {
            Ok(()) => observer.on_event(&RunEvent::Acknowledged),
            Err(e) => log::warn!("Failed to send data received acknowledgment: {}", e),
        }

        Ok((data?, measured_reference_hz))
    }

    fn transition(&mut self, next: AcquisitionState) {
        if self.state != next {
            log::trace!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn read_reference_frequency(&mut self, observer: &mut dyn RunObserver) -> Option<f64> {
        let deadline = deadline_after(self.settings.reference_budget);
        let line = match self.reader.read_line(deadline) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("No external reference frequency reported: {}", e);
                return None;
            }
        };

        match line.parse::<f64>() {
            Ok(hz) if hz.is_finite() => {
                observer.on_event(&RunEvent::MeasuredReferenceFrequency(hz));
                Some(hz)
            }
            _ => {
                log::warn!("Unreadable external reference frequency '{}'", line);
                None
            }
        }
    }

    fn capture(
        &mut self,
        requested: usize,
        observer: &mut dyn RunObserver,
    ) -> Result<(SampleSeries, CaptureReport), AcquisitionError> {
        let deadline = deadline_after(self.settings.capture_budget);
        let mut series = SampleSeries::with_capacity(requested);
        let mut report = CaptureReport {
            requested,
            ..CaptureReport::default()
        };

        while series.len() < requested {
            let record = match self.reader.next_record(deadline) {
                Ok(record) => record,
                Err(TerminalError::Timeout { .. }) => {
                    report.timed_out = true;
                    log::warn!(
                        "Could not read all lines: {} of {} after {:?}",
                        series.len(),
                        requested,
                        self.settings.capture_budget
                    );
                    break;
                }
                Err(e) => return Err(e.into()),
            };

            if report.stale_discarded < self.settings.stale_records {
                report.stale_discarded += 1;
                log::trace!("Discarding stale record {:?}", String::from_utf8_lossy(&record));
                continue;
            }

            match Sample::from_record(&record) {
                Ok(sample) => {
                    series.push(sample);
                    if series.len() % PROGRESS_INTERVAL == 0 {
                        observer.on_event(&RunEvent::Progress {
                            received: series.len(),
                            requested,
                        });
                    }
                }
                Err(e) => {
                    report.dropped += 1;
                    log::debug!(
                        "Dropping record {:?}: {}",
                        String::from_utf8_lossy(&record),
                        e
                    );
                }
            }
        }

        report.collected = series.len();
        observer.on_event(&RunEvent::CaptureFinished(report));
        Ok((series, report))
    }

    fn read_aggregate(
        &mut self,
        measured_reference_hz: Option<f64>,
    ) -> Result<FastResult, AcquisitionError> {
        let deadline = deadline_after(self.settings.aggregate_budget);
        let record = self.reader.next_record(deadline)?;
        Ok(FastResult::from_record(&record, measured_reference_hz)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition_config::FilterOrder;
    use crate::test_support::ScriptedChannel;

    fn quick_settings() -> ProtocolSettings {
        ProtocolSettings::default()
            .with_silence_budget(Duration::from_millis(50))
            .with_capture_budget(Duration::from_millis(100))
            .with_reference_budget(Duration::from_millis(50))
            .with_aggregate_budget(Duration::from_millis(50))
    }

    fn records(count: usize) -> Vec<u8> {
        (0..count)
            .flat_map(|n| format!("{n}, 0.5, -0.5, {}, 0.1E", n * 10).into_bytes())
            .collect()
    }

    fn amp(channel: ScriptedChannel) -> LockInAmp<ScriptedChannel> {
        LockInAmp::new(channel, DeviceModel::Teensy35).with_settings(quick_settings())
    }

    fn normal_config(count: u32) -> AcquisitionConfig {
        AcquisitionConfig::internal_reference(1000)
            .sample_count(count)
            .build()
            .unwrap()
    }

    #[test]
    fn test_captures_requested_after_stale_records() {
        let mut amp = amp(ScriptedChannel::new().respond_with(&records(7)));
        let outcome = amp.run(&normal_config(5), &mut LogObserver);

        let (data, measured) = outcome.into_result().unwrap();
        assert_eq!(measured, None);
        let Acquired::Series { series, report } = data else {
            unreachable!("normal mode yields a series")
        };
        let signals: Vec<f64> = series.iter().map(|s| s.signal).collect();
        assert_eq!(signals, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(series[0].r, 20.0);
        assert_eq!(report.stale_discarded, 2);
        assert_eq!(report.shortfall(), 0);
        assert!(!report.timed_out);

        assert_eq!(
            amp.channel().written_text(),
            vec!["0:1000:10000:5:5:1:0F".to_string(), "DRX".to_string()]
        );
        assert_eq!(amp.state(), AcquisitionState::Idle);
    }

    #[test]
    fn test_short_capture_ends_by_deadline() {
        let mut amp = amp(ScriptedChannel::new().respond_with(&records(4)));
        let start = Instant::now();
        let outcome = amp.run(&normal_config(5), &mut LogObserver);

        assert!(start.elapsed() >= Duration::from_millis(100));
        assert!(outcome.is_success());
        let (Acquired::Series { series, report }, _) = outcome.into_result().unwrap() else {
            unreachable!("normal mode yields a series")
        };
        assert_eq!(series.len(), 2);
        assert!(report.timed_out);
        assert_eq!(report.shortfall(), 3);
        assert_eq!(amp.channel().written.last().unwrap(), b"DRX");
    }

    #[test]
    fn test_undecodable_records_are_dropped() {
        let mut stream = records(2);
        stream.extend_from_slice(b"1,2,3,4,5Ea,b,c,d,eE6,7,8,9,10Eovf,1,1,1,1E11,12,13,14,15E");
        let mut amp = amp(ScriptedChannel::new().respond_with(&stream));

        let (Acquired::Series { series, report }, _) =
            amp.run_logged(&normal_config(3)).into_result().unwrap()
        else {
            unreachable!("normal mode yields a series")
        };
        assert_eq!(series.len(), 3);
        assert_eq!(series[2], Sample::new(11.0, 12.0, 13.0, 14.0, 15.0));
        assert_eq!(report.dropped, 2);
        assert_eq!(report.collected, 3);
    }

    #[test]
    fn test_silent_device() {
        let mut amp = amp(ScriptedChannel::new());
        let outcome = amp.run_logged(&normal_config(5));

        assert_eq!(outcome.error_kind(), Some(ErrorKind::DeviceSilent));
        // No acknowledgment without data.
        assert_eq!(amp.channel().written.len(), 1);
        assert_eq!(amp.state(), AcquisitionState::Idle);
    }

    #[test]
    fn test_write_timeout() {
        let mut amp = amp(ScriptedChannel::new().failing_writes());
        let outcome = amp.run_logged(&normal_config(5));
        assert_eq!(outcome.error_kind(), Some(ErrorKind::WriteTimeout));
    }

    #[test]
    fn test_external_reference_frequency_is_read_first() {
        let mut stream = b"1000.5\r\n".to_vec();
        stream.extend(records(4));
        let mut amp = amp(ScriptedChannel::new().respond_with(&stream));
        let config = AcquisitionConfig::external_reference(5000)
            .sample_count(2)
            .low_pass(10, FilterOrder::Third)
            .build()
            .unwrap();

        let mut events = Vec::new();
        let outcome = amp.run(&config, &mut |event: &RunEvent| events.push(event.clone()));

        let (Acquired::Series { series, .. }, measured) = outcome.into_result().unwrap() else {
            unreachable!("normal mode yields a series")
        };
        assert_eq!(measured, Some(1000.5));
        assert_eq!(series.len(), 2);
        assert!(events.contains(&RunEvent::MeasuredReferenceFrequency(1000.5)));
        assert_eq!(events.last(), Some(&RunEvent::Acknowledged));
        assert_eq!(amp.channel().written_text()[0], "1:5000:10000:2:10:3:0F");
    }

    #[test]
    fn test_internal_reference_reports_actual_frequency() {
        let mut amp = amp(ScriptedChannel::new().respond_with(&records(3)));
        let mut events = Vec::new();
        let outcome = amp.run(&normal_config(1), &mut |event: &RunEvent| {
            events.push(event.clone())
        });

        assert!(outcome.is_success());
        assert_eq!(
            events[0],
            RunEvent::InternalReferenceFrequency {
                requested_hz: 1000,
                actual_hz: 1000.0
            }
        );
        assert!(matches!(events[1], RunEvent::CommandSent(_)));
    }

    #[test]
    fn test_fast_mode_aggregate() {
        let mut amp = amp(ScriptedChannel::new().respond_with(b"2048,0.25E"));
        let config = AcquisitionConfig::internal_reference(1000)
            .fast_mode()
            .build()
            .unwrap();

        let (data, _) = amp.run_logged(&config).into_result().unwrap();
        let Acquired::Fast(fast) = data else {
            unreachable!("fast mode yields an aggregate")
        };
        assert_eq!(fast.average_amplitude_raw, 2048.0);
        assert_eq!(fast.average_phase, 0.25);
        assert_eq!(
            amp.channel().written_text(),
            vec!["0:1000:10000:10000:5:1:1F".to_string(), "DRX".to_string()]
        );
    }

    #[test]
    fn test_fast_mode_failures() {
        let config = AcquisitionConfig::external_reference(5000)
            .fast_mode()
            .build()
            .unwrap();

        let mut garbled = amp(ScriptedChannel::new().respond_with(b"999\nx,yE"));
        assert_eq!(
            garbled.run_logged(&config).error_kind(),
            Some(ErrorKind::DecodeError)
        );

        assert_eq!(garbled.channel().written.last().unwrap(), b"DRX");
        assert_eq!(garbled.state(), AcquisitionState::Idle);

        let mut truncated = amp(ScriptedChannel::new().respond_with(b"999\n12.5,"));
        assert_eq!(
            truncated.run_logged(&config).error_kind(),
            Some(ErrorKind::Timeout)
        );
        assert_eq!(truncated.channel().written.last().unwrap(), b"DRX");
    }

    #[test]
    fn test_unbounded_budgets() {
        let settings = ProtocolSettings::default()
            .with_silence_budget(Duration::MAX)
            .with_capture_budget(Duration::MAX)
            .with_reference_budget(Duration::MAX)
            .with_aggregate_budget(Duration::MAX);

        let mut stream = b"1000.5\n".to_vec();
        stream.extend(records(4));
        let mut amp = LockInAmp::new(
            ScriptedChannel::new().respond_with(&stream),
            DeviceModel::Teensy35,
        )
        .with_settings(settings);
        let config = AcquisitionConfig::external_reference(5000)
            .sample_count(2)
            .build()
            .unwrap();
        let (_, measured) = amp.run_logged(&config).into_result().unwrap();
        assert_eq!(measured, Some(1000.5));

        let mut fast = LockInAmp::new(
            ScriptedChannel::new().respond_with(b"2048,0.25E"),
            DeviceModel::Teensy35,
        )
        .with_settings(settings);
        let config = AcquisitionConfig::internal_reference(1000)
            .fast_mode()
            .build()
            .unwrap();
        assert!(fast.run_logged(&config).is_success());
    }

    #[test]
    fn test_lost_link_is_a_transport_failure() {
        let mut amp = amp(ScriptedChannel::new().respond_with(&records(4)).failing_reads());
        let outcome = amp.run_logged(&normal_config(2));

        assert_eq!(outcome.error_kind(), Some(ErrorKind::Transport));
        assert!(matches!(
            outcome,
            RunOutcome::Failure(AcquisitionError::Terminal(TerminalError::Io(_)))
        ));
        assert_eq!(amp.state(), AcquisitionState::Idle);
    }

    #[test]
    fn test_custom_stale_count_and_sentinel() {
        let settings = quick_settings().with_stale_records(1).with_sentinel(b';');
        let mut amp = LockInAmp::new(
            ScriptedChannel::new().respond_with(b"0,0,0,0,0;1,1,1,1,1;"),
            DeviceModel::Teensy40,
        )
        .with_settings(settings);

        let (Acquired::Series { series, report }, _) =
            amp.run_logged(&normal_config(1)).into_result().unwrap()
        else {
            unreachable!("normal mode yields a series")
        };
        assert_eq!(series[0].signal, 1.0);
        assert_eq!(report.stale_discarded, 1);
    }
}
