//! In-memory serial link for tests and dry runs.

use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::line::LineBuffer;
use crate::traits::{OpenStatus, SerialLink, DEFAULT_MAX_LINE_LEN};

/// Serial link backed by in-memory buffers.
///
/// Inbound bytes are injected by the test, outbound lines are collected for
/// inspection. A read with no complete line buffered returns
/// [`TransportError::Timeout`] immediately instead of blocking.
///
/// # Example
///
/// ```
/// use avionlink_transport::{MemoryLink, SerialLink};
///
/// let mut link = MemoryLink::new("mem0");
/// link.open();
///
/// link.write_line(b"37").unwrap();
/// assert_eq!(link.tx_buffer(), b"37\n");
///
/// link.inject_rx(b"640\r\n");
/// assert_eq!(link.read_line().unwrap().as_ref(), b"640\r");
/// ```
#[derive(Debug)]
pub struct MemoryLink {
    name: String,
    open: bool,
    open_error: Option<String>,
    rx: LineBuffer,
    tx: Vec<u8>,
    read_timeout: Duration,
}

impl MemoryLink {
    /// Create a closed link that opens successfully.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: false,
            open_error: None,
            rx: LineBuffer::new(DEFAULT_MAX_LINE_LEN),
            tx: Vec::new(),
            read_timeout: Duration::ZERO,
        }
    }

    /// Create a link whose every `open` attempt fails with `reason`.
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            open_error: Some(reason.into()),
            ..Self::new(name)
        }
    }

    /// Override the maximum accepted line length.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.rx = LineBuffer::new(max_line_len);
        self
    }

    /// Queue bytes as if the microcontroller had sent them.
    pub fn inject_rx(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }

    /// Everything written so far.
    pub fn tx_buffer(&self) -> &[u8] {
        &self.tx
    }

    /// Take and clear everything written so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }
}

impl SerialLink for MemoryLink {
    fn open(&mut self) -> OpenStatus {
        if self.open {
            return OpenStatus::AlreadyOpen;
        }
        if let Some(reason) = &self.open_error {
            return OpenStatus::Failed(reason.clone());
        }
        self.open = true;
        debug!(name = %self.name, "memory link opened");
        OpenStatus::Opened
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn bytes_available(&self) -> Result<usize> {
        if !self.open {
            return Ok(0);
        }
        Ok(self.rx.len())
    }

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.tx.extend_from_slice(line);
        if !line.ends_with(b"\n") {
            self.tx.push(b'\n');
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Bytes> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        match self.rx.next_line()? {
            Some(line) => Ok(line),
            None => Err(TransportError::Timeout(self.read_timeout)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_is_idempotent() {
        let mut link = MemoryLink::new("mem");
        assert_eq!(link.open(), OpenStatus::Opened);
        assert_eq!(link.open(), OpenStatus::AlreadyOpen);
        assert!(link.is_open());

        link.close();
        assert!(!link.is_open());
        assert_eq!(link.open(), OpenStatus::Opened);
    }

    #[test]
    fn unavailable_link_reports_failure() {
        let mut link = MemoryLink::unavailable("mem", "device busy");
        assert_eq!(link.open(), OpenStatus::Failed("device busy".into()));
        assert!(!link.is_open());
    }

    #[test]
    fn write_on_closed_link_is_reported() {
        let mut link = MemoryLink::new("mem");
        let err = link.write_line(b"16").unwrap_err();
        assert!(matches!(err, TransportError::Closed));
        assert!(link.tx_buffer().is_empty());
    }

    #[test]
    fn write_line_terminates_once() {
        let mut link = MemoryLink::new("mem");
        link.open();
        link.write_line(b"16\n").unwrap();
        link.write_line(b"37").unwrap();
        assert_eq!(link.take_tx(), b"16\n37\n");
        assert!(link.tx_buffer().is_empty());
    }

    #[test]
    fn bytes_available_tracks_rx() {
        let mut link = MemoryLink::new("mem");
        link.inject_rx(b"37\n");
        assert_eq!(link.bytes_available().unwrap(), 0, "closed link reports nothing");

        link.open();
        assert_eq!(link.bytes_available().unwrap(), 3);
        link.read_line().unwrap();
        assert_eq!(link.bytes_available().unwrap(), 0);
    }

    #[test]
    fn read_without_line_times_out() {
        let mut link = MemoryLink::new("mem");
        link.open();
        link.inject_rx(b"3");
        assert!(matches!(
            link.read_line().unwrap_err(),
            TransportError::Timeout(_)
        ));

        link.inject_rx(b"7\n");
        assert_eq!(link.read_line().unwrap().as_ref(), b"37");
    }

    #[test]
    fn read_on_closed_link_is_reported() {
        let mut link = MemoryLink::new("mem");
        assert!(matches!(
            link.read_line().unwrap_err(),
            TransportError::Closed
        ));
    }
}
