use crate::serial_terminal::{SerialChannel, TerminalError};
use std::thread;
use std::time::{Duration, Instant};

/// Byte that terminates every record the device streams back.
pub const DEFAULT_SENTINEL: u8 = b'E';

/// Pause between polls when the channel has nothing for us.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Splits the device's unbounded byte stream into sentinel-terminated
/// records. Every wait is bounded by a caller-supplied deadline.
#[derive(Debug)]
pub struct FramedReader<C> {
    channel: C,
    sentinel: u8,
}

impl<C: SerialChannel> FramedReader<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            sentinel: DEFAULT_SENTINEL,
        }
    }

    pub fn with_sentinel(mut self, sentinel: u8) -> Self {
        self.sentinel = sentinel;
        self
    }

    pub fn sentinel(&self) -> u8 {
        self.sentinel
    }

    pub fn get_ref(&self) -> &C {
        &self.channel
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Poll until at least one byte is waiting, returning how many are.
    pub fn read_until_data(&mut self, deadline: Instant) -> Result<usize, TerminalError> {
        loop {
            let waiting = self.channel.bytes_waiting()?;
            if waiting > 0 {
                return Ok(waiting);
            }
            if Instant::now() >= deadline {
                return Err(TerminalError::Timeout {
                    expected: "data",
                    discarded: 0,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Accumulate bytes up to the next sentinel and return them without it.
    ///
    /// On timeout the partial record is dropped, not carried into the next
    /// call.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn next_record(&mut self, deadline: Instant) -> Result<Vec<u8>, TerminalError> {
        let sentinel = self.sentinel;
        self.read_terminated(sentinel, "record", deadline)
    }

    /// Read one newline-terminated line, trimmed of CR and surrounding
    /// whitespace.
    pub fn read_line(&mut self, deadline: Instant) -> Result<String, TerminalError> {
        let line = self.read_terminated(b'\n', "line", deadline)?;
        Ok(String::from_utf8_lossy(&line).trim().to_string())
    }

    fn read_terminated(
        &mut self,
        terminator: u8,
        expected: &'static str,
        deadline: Instant,
    ) -> Result<Vec<u8>, TerminalError> {
        let mut record = Vec::new();

        loop {
            match self.channel.read_byte()? {
                Some(byte) if byte == terminator => return Ok(record),
                Some(byte) => record.push(byte),
                None => {
                    if Instant::now() >= deadline {
                        log::trace!(
                            "Deadline hit while reading {}, dropping {} byte(s)",
                            expected,
                            record.len()
                        );
                        return Err(TerminalError::Timeout {
                            expected,
                            discarded: record.len(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedChannel;

    fn soon() -> Instant {
        Instant::now() + Duration::from_millis(30)
    }

    fn reader_with(bytes: &[u8]) -> FramedReader<ScriptedChannel> {
        let mut channel = ScriptedChannel::new();
        channel.feed(bytes);
        FramedReader::new(channel)
    }

    #[test]
    fn test_splits_records_on_sentinel() {
        let mut reader = reader_with(b"1,2,3,4,5E6,7,8,9,10E");

        assert_eq!(reader.next_record(soon()).unwrap(), b"1,2,3,4,5");
        assert_eq!(reader.next_record(soon()).unwrap(), b"6,7,8,9,10");
        assert!(matches!(
            reader.next_record(soon()),
            Err(TerminalError::Timeout { discarded: 0, .. })
        ));
    }

    #[test]
    fn test_partial_record_is_lost_on_timeout() {
        let mut reader = reader_with(b"1,2E3,4");

        assert_eq!(reader.next_record(soon()).unwrap(), b"1,2");
        assert!(matches!(
            reader.next_record(soon()),
            Err(TerminalError::Timeout { discarded: 3, .. })
        ));

        reader.get_mut().feed(b"5E");
        assert_eq!(reader.next_record(soon()).unwrap(), b"5");
    }

    #[test]
    fn test_empty_record_between_sentinels() {
        let mut reader = reader_with(b"EE");
        assert!(reader.next_record(soon()).unwrap().is_empty());
        assert!(reader.next_record(soon()).unwrap().is_empty());
    }

    #[test]
    fn test_custom_sentinel() {
        let mut reader = reader_with(b"1;2;").with_sentinel(b';');
        assert_eq!(reader.sentinel(), b';');
        assert_eq!(reader.next_record(soon()).unwrap(), b"1");
        assert_eq!(reader.next_record(soon()).unwrap(), b"2");
    }

    #[test]
    fn test_read_until_data() {
        let mut reader = reader_with(b"");
        assert!(matches!(
            reader.read_until_data(soon()),
            Err(TerminalError::Timeout { expected: "data", .. })
        ));

        reader.get_mut().feed(b"abc");
        assert_eq!(reader.read_until_data(soon()).unwrap(), 3);
    }

    #[test]
    fn test_read_line_trims_crlf() {
        let mut reader = reader_with(b"1000.25\r\n1,2E");
        assert_eq!(reader.read_line(soon()).unwrap(), "1000.25");
        assert_eq!(reader.next_record(soon()).unwrap(), b"1,2");
    }

    #[test]
    fn test_deadline_in_past_still_drains_ready_bytes() {
        let mut reader = reader_with(b"7E");
        let past = Instant::now();
        assert_eq!(reader.next_record(past).unwrap(), b"7");
    }
}
