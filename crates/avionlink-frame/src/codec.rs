use bytes::{BufMut, BytesMut};

use crate::channel::MAX_INDEX;
use crate::error::{FrameError, Result};

/// Raw sentinel command line, written as-is.
///
/// Its meaning is owned by the microcontroller firmware. It happens to equal
/// the encoding of `(value = 1, index = 0)`, but it is kept as a literal.
pub const SENTINEL_LINE: &[u8] = b"16\n";

const INDEX_BITS: u32 = 4;
const INDEX_MASK: i64 = 0xF;

/// One decoded `(value, index)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Register slot value.
    pub value: i32,
    /// Register index, always `0..=15`.
    pub index: u8,
}

impl Frame {
    /// Create a frame, rejecting indexes that do not fit in 4 bits.
    pub fn new(value: i32, index: u8) -> Result<Self> {
        if index > MAX_INDEX {
            return Err(FrameError::IndexOutOfRange(index));
        }
        Ok(Self { value, index })
    }

    /// The wire integer: `(value << 4) | index`.
    pub fn encoded(&self) -> i64 {
        (i64::from(self.value) << INDEX_BITS) | (i64::from(self.index) & INDEX_MASK)
    }

    /// Split a wire integer into value and index.
    ///
    /// The low nibble is the index (two's complement, so `-1` yields index 15)
    /// and the rest, arithmetically shifted, is the value.
    pub fn from_encoded(encoded: i64) -> Result<Self> {
        let index = (encoded & INDEX_MASK) as u8;
        let value =
            i32::try_from(encoded >> INDEX_BITS).map_err(|_| FrameError::ValueOutOfRange(encoded))?;
        Ok(Self { value, index })
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// <decimal((value << 4) | index)>\n
/// ```
/// e.g. `(2, 5)` becomes `37\n`.
pub fn encode_frame(value: i32, index: u8, dst: &mut BytesMut) -> Result<()> {
    let frame = Frame::new(value, index)?;
    let text = frame.encoded().to_string();
    dst.reserve(text.len() + 1);
    dst.put_slice(text.as_bytes());
    dst.put_u8(b'\n');
    Ok(())
}

/// Decode one received line (terminator already stripped).
///
/// A trailing `\r` and surrounding whitespace are ignored, since the
/// firmware ends lines with `\r\n`.
pub fn decode_line(line: &[u8]) -> Result<Frame> {
    let text = std::str::from_utf8(line)?.trim();
    let encoded: i64 = text.parse().map_err(|source| FrameError::Parse {
        text: text.to_string(),
        source,
    })?;
    Frame::from_encoded(encoded)
}
