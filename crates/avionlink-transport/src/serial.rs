use std::io::{ErrorKind, Read, Write};

use bytes::Bytes;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::line::LineBuffer;
use crate::traits::{LinkConfig, OpenStatus, SerialLink};

const READ_CHUNK_SIZE: usize = 64;

/// Serial link over a real device (USB CDC, UART adapter, ...).
///
/// The port is opened at the configured baud rate, 8N1, no flow control.
/// The read timeout of [`LinkConfig`] bounds every blocking read.
pub struct SerialPortLink {
    config: LinkConfig,
    port: Option<Box<dyn SerialPort>>,
    rx: LineBuffer,
}

impl SerialPortLink {
    /// Create a closed link for the given configuration.
    pub fn new(config: LinkConfig) -> Self {
        let rx = LineBuffer::new(config.max_line_len);
        Self {
            config,
            port: None,
            rx,
        }
    }

    /// The configuration this link was created with.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    fn connect(&self) -> Result<Box<dyn SerialPort>> {
        serialport::new(self.config.path.as_str(), self.config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.config.read_timeout)
            .open()
            .map_err(|source| TransportError::Open {
                path: self.config.path.clone(),
                source,
            })
    }
}

impl SerialLink for SerialPortLink {
    fn open(&mut self) -> OpenStatus {
        if self.port.is_some() {
            return OpenStatus::AlreadyOpen;
        }

        match self.connect() {
            Ok(port) => {
                info!(
                    path = %self.config.path,
                    baud = self.config.baud_rate,
                    "serial link opened"
                );
                self.rx.clear();
                self.port = Some(port);
                OpenStatus::Opened
            }
            Err(TransportError::Open { path, source }) => {
                warn!(%path, error = %source, "serial link open failed");
                OpenStatus::Failed(source.to_string())
            }
            Err(err) => {
                warn!(path = %self.config.path, error = %err, "serial link open failed");
                OpenStatus::Failed(err.to_string())
            }
        }
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!(path = %self.config.path, "serial link closed");
        }
        self.rx.clear();
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn bytes_available(&self) -> Result<usize> {
        let Some(port) = &self.port else {
            return Ok(0);
        };
        let pending = port.bytes_to_read().map_err(std::io::Error::from)?;
        Ok(self.rx.len() + pending as usize)
    }

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        let mut out = Vec::with_capacity(line.len() + 1);
        out.extend_from_slice(line);
        if !line.ends_with(b"\n") {
            out.push(b'\n');
        }

        port.write_all(&out)?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Bytes> {
        if self.port.is_none() {
            return Err(TransportError::Closed);
        }

        loop {
            if let Some(line) = self.rx.next_line()? {
                return Ok(line);
            }

            let port = self.port.as_mut().ok_or(TransportError::Closed)?;
            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match port.read(&mut chunk) {
                Ok(0) => return Err(TransportError::Timeout(self.config.read_timeout)),
                Ok(n) => self.rx.extend(&chunk[..n]),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    debug!(buffered = self.rx.len(), "serial read timed out");
                    return Err(TransportError::Timeout(self.config.read_timeout));
                }
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.path
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("path", &self.config.path)
            .field("baud_rate", &self.config.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// Names of the serial devices present on this machine.
pub fn available_ports() -> Result<Vec<String>> {
    let ports = serialport::available_ports().map_err(std::io::Error::from)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
