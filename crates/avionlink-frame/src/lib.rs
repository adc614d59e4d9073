//! Decimal line codec for the avionlink serial protocol.
//!
//! Every message on the wire is one ASCII decimal integer followed by `\n`.
//! The integer packs a value and a 4-bit register index:
//! - `encoded = (value << 4) | index`
//! - `index = encoded & 0xF`, `value = encoded >> 4` (arithmetic shift)
//!
//! The sentinel line `16\n` is written verbatim and never re-derived.

pub mod channel;
pub mod codec;
pub mod error;
pub mod link;

pub use channel::{
    input_channel_name, output_channel_name, AUX_1, AUX_2, AUX_3, AUX_4, BATTERY, MAIN_MOTOR,
    MAX_INDEX, REGISTER_SLOTS, SERVO_A, SERVO_B, STICK_X, STICK_Y,
};
pub use codec::{decode_line, encode_frame, Frame, SENTINEL_LINE};
pub use error::{FrameError, Result};
pub use link::FramedLink;
