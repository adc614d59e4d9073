use std::time::Duration;

/// Errors that can occur on a serial link.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The device could not be opened.
    #[error("could not open port {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// Read or write attempted while the link is closed.
    #[error("serial link is closed")]
    Closed,

    /// No complete line arrived before the read timeout.
    #[error("no complete line within {0:?}")]
    Timeout(Duration),

    /// A line exceeded the configured maximum length and was discarded.
    #[error("line too long ({len} bytes, max {max})")]
    LineTooLong { len: usize, max: usize },

    /// An I/O error occurred on the underlying device.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
