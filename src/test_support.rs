//! Scripted stand-in for a lock-in device, used by the unit tests.

use crate::serial_terminal::{SerialChannel, TerminalError};
use std::collections::VecDeque;

/// A channel whose device side is a script: each queued response becomes
/// readable after the host's next write, the way the firmware answers a
/// command.
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    readable: VecDeque<u8>,
    responses: VecDeque<Vec<u8>>,
    pub written: Vec<Vec<u8>>,
    fail_writes: bool,
    fail_reads: bool,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes the device sends in answer to the next host write.
    pub fn respond_with(mut self, bytes: &[u8]) -> Self {
        self.responses.push_back(bytes.to_vec());
        self
    }

    /// Make the bytes readable right away.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.readable.extend(bytes);
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Reads fail as if the port vanished once bytes are waiting.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn written_text(&self) -> Vec<String> {
        self.written
            .iter()
            .map(|w| String::from_utf8_lossy(w).to_string())
            .collect()
    }
}

impl SerialChannel for ScriptedChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TerminalError> {
        if self.fail_writes {
            return Err(TerminalError::WriteTimeout {
                written: 0,
                total: bytes.len(),
            });
        }
        self.written.push(bytes.to_vec());
        if let Some(response) = self.responses.pop_front() {
            self.readable.extend(response);
        }
        Ok(())
    }

    fn bytes_waiting(&mut self) -> Result<usize, TerminalError> {
        Ok(self.readable.len())
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        if self.fail_reads && !self.readable.is_empty() {
            return Err(TerminalError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device disconnected",
            )));
        }
        Ok(self.readable.pop_front())
    }

    fn discard_buffers(&mut self) -> Result<(), TerminalError> {
        self.readable.clear();
        Ok(())
    }
}
