use avionlink_transport::{OpenStatus, SerialLink};
use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{decode_line, encode_frame, Frame, SENTINEL_LINE};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 32;

/// Reads and writes frames over any [`SerialLink`].
///
/// Handles line splitting and decimal encoding; callers deal in [`Frame`]s.
pub struct FramedLink<L> {
    inner: L,
    buf: BytesMut,
}

impl<L: SerialLink> FramedLink<L> {
    /// Wrap a link. The link is not opened.
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Open the underlying link.
    pub fn open(&mut self) -> OpenStatus {
        self.inner.open()
    }

    /// Close the underlying link.
    pub fn close(&mut self) {
        self.inner.close();
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    /// Bytes ready on the underlying link, partial lines included.
    pub fn bytes_available(&self) -> Result<usize> {
        Ok(self.inner.bytes_available()?)
    }

    /// Read and decode the next frame (blocking, bounded by the link's read timeout).
    pub fn read_frame(&mut self) -> Result<Frame> {
        let line = self.inner.read_line()?;
        trace!(len = line.len(), "line received");
        let frame = decode_line(&line)?;
        debug!(index = frame.index, value = frame.value, "frame received");
        Ok(frame)
    }

    /// Write a complete frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.value, frame.index)
    }

    /// Encode and send a value for a register index.
    pub fn send(&mut self, value: i32, index: u8) -> Result<()> {
        self.buf.clear();
        encode_frame(value, index, &mut self.buf)?;
        self.inner.write_line(&self.buf)?;
        debug!(index, value, "frame sent");
        Ok(())
    }

    /// Send the literal sentinel line.
    pub fn send_sentinel(&mut self) -> Result<()> {
        self.inner.write_line(SENTINEL_LINE)?;
        debug!("sentinel sent");
        Ok(())
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the framed link and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }
}

impl<L: SerialLink> std::fmt::Debug for FramedLink<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedLink")
            .field("link", &self.inner.name())
            .field("open", &self.inner.is_open())
            .finish()
    }
}
