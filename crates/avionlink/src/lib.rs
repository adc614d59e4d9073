//! Host-side serial bridge to a flight microcontroller.
//!
//! avionlink exchanges `(value, index)` frames with the microcontroller over a
//! serial link: telemetry comes in, actuator commands go out, and a paced
//! 10 ms loop ties the two together.
//!
//! # Crate Structure
//!
//! - [`transport`]: Serial link abstraction (real device, in-memory)
//! - [`frame`]: Decimal line codec and register channel map
//! - [`control`]: Registers, cycle pacing and the polling loop

/// Re-export transport types.
pub mod transport {
    pub use avionlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use avionlink_frame::*;
}

/// Re-export control loop types.
pub mod control {
    pub use avionlink_control::*;
}
