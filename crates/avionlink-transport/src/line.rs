use bytes::{Bytes, BytesMut};

use crate::error::{Result, TransportError};

const INITIAL_BUFFER_CAPACITY: usize = 64;

/// Accumulates raw bytes and splits them into `\n`-terminated lines.
///
/// Shared by every [`SerialLink`](crate::SerialLink) implementation so that
/// partial reads are handled in one place.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,
    max_len: usize,
    /// Set while the tail of an over-long line is still arriving.
    discarding: bool,
}

impl LineBuffer {
    /// Create an empty buffer accepting lines of at most `max_len` bytes.
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_len,
            discarding: false,
        }
    }

    /// Append bytes received from the device.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes, complete lines and partial tail included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    /// Take the next complete line, without its `\n`.
    ///
    /// Returns `Ok(None)` if no terminator has been buffered yet. An
    /// over-long line is consumed and reported as
    /// [`TransportError::LineTooLong`]. When that happens before the
    /// terminator arrives, the rest of the line is dropped as it comes in.
    pub fn next_line(&mut self) -> Result<Option<Bytes>> {
        if self.discarding {
            match self.buf.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    let _ = self.buf.split_to(pos + 1);
                    self.discarding = false;
                }
                None => {
                    self.buf.clear();
                    return Ok(None);
                }
            }
        }

        if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line = self.buf.split_to(pos + 1);
            line.truncate(pos);
            if pos > self.max_len {
                return Err(TransportError::LineTooLong {
                    len: pos,
                    max: self.max_len,
                });
            }
            return Ok(Some(line.freeze()));
        }

        if self.buf.len() > self.max_len {
            let len = self.buf.len();
            self.buf.clear();
            self.discarding = true;
            return Err(TransportError::LineTooLong {
                len,
                max: self.max_len,
            });
        }

        Ok(None)
    }
}
