use std::num::ParseIntError;
use std::str::Utf8Error;

use avionlink_transport::TransportError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The received line is not valid UTF-8.
    #[error("frame is not valid text: {0}")]
    Decode(#[from] Utf8Error),

    /// The received line is not a decimal integer.
    #[error("frame {text:?} is not an integer: {source}")]
    Parse {
        text: String,
        source: ParseIntError,
    },

    /// The register index does not fit the 4-bit index field.
    #[error("register index {0} out of range (max 15)")]
    IndexOutOfRange(u8),

    /// The decoded value does not fit a register slot.
    #[error("decoded value of frame {0} does not fit in 32 bits")]
    ValueOutOfRange(i64),

    /// The link failed underneath the codec.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl FrameError {
    /// True for errors caused by the content of one received line.
    ///
    /// These leave the link usable; the line is simply dropped.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            FrameError::Decode(_)
                | FrameError::Parse { .. }
                | FrameError::ValueOutOfRange(_)
                | FrameError::Transport(TransportError::LineTooLong { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
