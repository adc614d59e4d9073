use avionlink_frame::FrameError;
use avionlink_transport::TransportError;

/// Errors that can occur while driving the control loop.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// The loop was asked to cycle before the link was opened.
    #[error("control loop is not running")]
    NotRunning,

    /// The serial link could not be opened.
    #[error("could not open port: {0}")]
    OpenFailed(String),

    /// A register index outside `0..=15`.
    #[error("register index {0} out of range (max 15)")]
    IndexOutOfRange(u8),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, ControlError>;
