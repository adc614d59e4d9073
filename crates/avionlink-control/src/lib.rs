//! Paced polling loop between the host and the flight microcontroller.
//!
//! The [`LoopController`] owns the serial link and two 16-slot registers.
//! Each cycle it waits for inbound bytes, decodes one frame into the input
//! register, evaluates the [`CommandRule`] and then sleeps out the rest of
//! the cycle period (10 ms by default).

pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod register;
pub mod rule;
pub mod shutdown;

pub use clock::{pace, Clock, ManualClock, SystemClock};
pub use config::{ControllerConfig, DEFAULT_CYCLE_PERIOD, DEFAULT_POLL_INTERVAL};
pub use controller::{ControllerState, CycleReport, Inbound, LoopController, LoopStats};
pub use error::{ControlError, Result};
pub use register::{Register, Registers};
pub use rule::{CommandRule, DEFAULT_TRIGGER_VALUE};
pub use shutdown::ShutdownSignal;
