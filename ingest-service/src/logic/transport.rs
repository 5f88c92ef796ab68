//! Serial Transport
//!
//! Đọc từng line từ serial port (blocking, timeout 1s).
//! Timeout không có data = `Ok(None)`, không phải lỗi.
//! EOF (read 0 byte, không còn partial line) = `TransportError::Closed`.
//! Port được đóng khi `LineReader` bị drop (mọi exit path).

use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use serialport::SerialPort;
use thiserror::Error;

use crate::constants::SERIAL_TIMEOUT_SECS;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial read failed: {0}")]
    Read(#[from] io::Error),
    #[error("serial port closed")]
    Closed,
}

/// Source of raw transport lines
pub trait LineSource {
    /// Next line, or `None` when the read timed out with no complete line
    fn next_line(&mut self) -> Result<Option<String>, TransportError>;
}

// ============================================================================
// LINE READER
// ============================================================================

/// Newline framing over any byte stream
pub struct LineReader<R: Read> {
    name: String,
    reader: BufReader<R>,
    // partial line carried across timeouts
    pending: Vec<u8>,
}

pub type SerialTransport = LineReader<Box<dyn SerialPort>>;

impl<R: Read> LineReader<R> {
    pub fn new(name: impl Into<String>, inner: R) -> Self {
        Self {
            name: name.into(),
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    fn take_pending(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        line
    }
}

impl<R: Read> LineSource for LineReader<R> {
    fn next_line(&mut self) -> Result<Option<String>, TransportError> {
        match self.reader.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Err(TransportError::Closed),
            // EOF after a partial line: hand out what we have, Closed comes next
            Ok(_) => Ok(Some(self.take_pending())),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                // bytes read before the timeout stay in `pending`
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl<R: Read> Drop for LineReader<R> {
    fn drop(&mut self) {
        log::info!("Transport closed: {}", self.name);
    }
}

/// Open the serial port with the standard 1s read timeout
pub fn open_serial(port: &str, baud: u32) -> Result<SerialTransport, TransportError> {
    let handle = serialport::new(port, baud)
        .timeout(Duration::from_secs(SERIAL_TIMEOUT_SECS))
        .open()
        .map_err(|source| TransportError::Open {
            port: port.to_string(),
            source,
        })?;

    log::info!("Listening on {} @ {}", port, baud);
    Ok(LineReader::new(port, handle))
}
