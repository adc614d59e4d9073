use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Baud rate spoken by the flight microcontroller.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Longest line accepted before the partial line is discarded.
///
/// A frame is at most an `i64` in decimal plus `\r`, so 32 bytes is ample.
pub const DEFAULT_MAX_LINE_LEN: usize = 32;

/// Outcome of [`SerialLink::open`].
///
/// Opening never fails with an error: the caller inspects the status and
/// decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenStatus {
    /// The link was closed and is now open.
    Opened,
    /// The link was already open; nothing was changed.
    AlreadyOpen,
    /// The device could not be opened.
    Failed(String),
}

impl OpenStatus {
    /// True if the link is usable after the call.
    pub fn is_open(&self) -> bool {
        matches!(self, OpenStatus::Opened | OpenStatus::AlreadyOpen)
    }
}

impl fmt::Display for OpenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenStatus::Opened => f.write_str("serial link opened"),
            OpenStatus::AlreadyOpen => f.write_str("serial link already open"),
            OpenStatus::Failed(reason) => write!(f, "could not open port: {reason}"),
        }
    }
}

/// A newline-delimited byte channel to the microcontroller.
///
/// Implementations buffer partial lines internally; callers always get
/// complete lines with the terminator stripped.
pub trait SerialLink {
    /// Open the link. Idempotent: a second call reports [`OpenStatus::AlreadyOpen`].
    fn open(&mut self) -> OpenStatus;

    /// Release the underlying handle. Closing a closed link is a no-op.
    fn close(&mut self);

    /// Current connection state.
    fn is_open(&self) -> bool;

    /// Number of bytes ready to be read without blocking.
    ///
    /// Returns `Ok(0)` when the link is closed.
    fn bytes_available(&self) -> Result<usize>;

    /// Write one line, appending `\n` unless `line` already ends with it.
    ///
    /// Returns [`TransportError::Closed`](crate::TransportError::Closed) when
    /// the link is not open; nothing is written in that case.
    fn write_line(&mut self, line: &[u8]) -> Result<()>;

    /// Block until a full line is available and return it without the `\n`.
    ///
    /// Gives up with [`TransportError::Timeout`](crate::TransportError::Timeout)
    /// after the configured read timeout; a partial line is kept for the next call.
    fn read_line(&mut self) -> Result<Bytes>;

    /// Device name for diagnostics.
    fn name(&self) -> &str;
}

/// Configuration for a serial link.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Device path (`/dev/ttyACM0`, `COM7`, ...).
    pub path: String,
    /// Line speed. Framing is always 8N1 without flow control.
    pub baud_rate: u32,
    /// Upper bound on a single blocking [`SerialLink::read_line`] call.
    pub read_timeout: Duration,
    /// Maximum accepted line length in bytes, terminator excluded.
    pub max_line_len: usize,
}

impl LinkConfig {
    /// Default configuration for the given device path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        let path = if cfg!(windows) { "COM7" } else { "/dev/ttyACM0" };
        Self {
            path: path.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_status_messages() {
        assert_eq!(OpenStatus::Opened.to_string(), "serial link opened");
        assert_eq!(
            OpenStatus::AlreadyOpen.to_string(),
            "serial link already open"
        );
        assert_eq!(
            OpenStatus::Failed("busy".into()).to_string(),
            "could not open port: busy"
        );
    }

    #[test]
    fn open_status_usability() {
        assert!(OpenStatus::Opened.is_open());
        assert!(OpenStatus::AlreadyOpen.is_open());
        assert!(!OpenStatus::Failed(String::new()).is_open());
    }

    #[test]
    fn link_config_defaults() {
        let cfg = LinkConfig::new("/dev/ttyUSB3");
        assert_eq!(cfg.path, "/dev/ttyUSB3");
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.max_line_len, DEFAULT_MAX_LINE_LEN);
    }
}
