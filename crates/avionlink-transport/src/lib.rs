//! Line-oriented serial link abstraction.
//!
//! This is the lowest layer of avionlink. The flight microcontroller is seen
//! as a byte stream that carries newline-terminated lines:
//! - [`SerialPortLink`] talks to a real device through `serialport`
//! - [`MemoryLink`] keeps both directions in memory (tests, dry runs)
//!
//! Everything above this crate only sees the [`SerialLink`] trait.

pub mod error;
pub mod line;
pub mod memory;
pub mod serial;
pub mod traits;

pub use error::{Result, TransportError};
pub use line::LineBuffer;
pub use memory::MemoryLink;
pub use serial::{available_ports, SerialPortLink};
pub use traits::{LinkConfig, OpenStatus, SerialLink, DEFAULT_BAUD_RATE, DEFAULT_MAX_LINE_LEN};
