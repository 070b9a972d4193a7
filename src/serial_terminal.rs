use serialport::SerialPort;
use std::io::{ErrorKind as IoErrorKind, Read, Write};
use std::time::Duration;

/// Baud rate the lock-in firmware listens on.
pub const DEFAULT_BAUD: u32 = 115_200;

/// How long a single byte read may block before reporting "nothing yet".
const BYTE_TIMEOUT: Duration = Duration::from_millis(10);

/// How long a host write may take before it counts as a write timeout.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout error: no {expected} before the deadline, {discarded} byte(s) discarded")]
    Timeout {
        expected: &'static str,
        discarded: usize,
    },

    #[error("Write timed out after {written} of {total} byte(s)")]
    WriteTimeout { written: usize, total: usize },
}

/// Classify a failed drain of the output buffer after `written` bytes.
fn drain_error(error: std::io::Error, written: usize, total: usize) -> TerminalError {
    match error.kind() {
        IoErrorKind::TimedOut | IoErrorKind::WouldBlock => {
            TerminalError::WriteTimeout { written, total }
        }
        _ => TerminalError::Io(error),
    }
}

/// The exclusive byte channel between host and lock-in device.
///
/// Every call is expected to return quickly: `read_byte` yields `Ok(None)`
/// when nothing arrived within the port's short read timeout, so callers can
/// poll against their own deadlines.
pub trait SerialChannel {
    /// Transmit all of `bytes`, failing with [`TerminalError::WriteTimeout`]
    /// if the device does not accept them in time.
    fn send(&mut self, bytes: &[u8]) -> Result<(), TerminalError>;

    /// Number of received bytes waiting to be read.
    fn bytes_waiting(&mut self) -> Result<usize, TerminalError>;

    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError>;

    /// Drop anything buffered in either direction.
    fn discard_buffers(&mut self) -> Result<(), TerminalError>;
}

impl<C: SerialChannel + ?Sized> SerialChannel for &mut C {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TerminalError> {
        (**self).send(bytes)
    }

    fn bytes_waiting(&mut self) -> Result<usize, TerminalError> {
        (**self).bytes_waiting()
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        (**self).read_byte()
    }

    fn discard_buffers(&mut self) -> Result<(), TerminalError> {
        (**self).discard_buffers()
    }
}

/// An open serial connection to a lock-in device. Closed on drop.
#[derive(Debug)]
pub struct LockInTerminal {
    serial: Box<dyn SerialPort>,
    port: String,
}

impl LockInTerminal {
    /// Open `port` at `baud`.
    pub fn open(port: &str, baud: u32) -> Result<Self, TerminalError> {
        log::debug!("Opening {} at {} baud", port, baud);
        let serial = serialport::new(port, baud).timeout(BYTE_TIMEOUT).open()?;

        let mut terminal = Self {
            serial,
            port: port.to_string(),
        };

        terminal.discard_buffers()?;
        Ok(terminal)
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    /// Close the connection explicitly.
    pub fn close(self) {
        log::debug!("Closing {}", self.port);
    }
}

impl SerialChannel for LockInTerminal {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TerminalError> {
        self.serial.set_timeout(WRITE_TIMEOUT)?;
        let mut written = 0;
        let result = loop {
            if written == bytes.len() {
                // The drain is not bounded by WRITE_TIMEOUT on every platform.
                break self
                    .serial
                    .flush()
                    .map_err(|e| drain_error(e, written, bytes.len()));
            }
            match self.serial.write(&bytes[written..]) {
                Ok(0) => {
                    break Err(TerminalError::WriteTimeout {
                        written,
                        total: bytes.len(),
                    })
                }
                Ok(n) => written += n,
                Err(e) if e.kind() == IoErrorKind::Interrupted => {}
                Err(e) if e.kind() == IoErrorKind::TimedOut => {
                    break Err(TerminalError::WriteTimeout {
                        written,
                        total: bytes.len(),
                    })
                }
                Err(e) => break Err(e.into()),
            }
        };
        self.serial.set_timeout(BYTE_TIMEOUT)?;
        result
    }

    fn bytes_waiting(&mut self) -> Result<usize, TerminalError> {
        Ok(self.serial.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TerminalError> {
        let mut byte = [0u8; 1];
        match self.serial.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e) if matches!(e.kind(), IoErrorKind::TimedOut | IoErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn discard_buffers(&mut self) -> Result<(), TerminalError> {
        self.serial.clear(serialport::ClearBuffer::All)?;
        Ok(())
    }
}
