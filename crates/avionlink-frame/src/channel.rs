//! Register channel map shared with the microcontroller firmware.
//!
//! The same slot index means different things depending on direction:
//! inbound frames carry telemetry, outbound frames carry actuator commands.
//! Slots 7-15 are reserved.

/// Number of slots in a register; the index field is 4 bits wide.
pub const REGISTER_SLOTS: usize = 16;

/// Highest valid register index.
pub const MAX_INDEX: u8 = 15;

/// Inbound: stick X axis.
pub const STICK_X: u8 = 0;
/// Inbound: stick Y axis.
pub const STICK_Y: u8 = 1;
/// Inbound: battery level.
pub const BATTERY: u8 = 2;
/// Inbound: auxiliary signal 1.
pub const AUX_1: u8 = 3;
/// Inbound: auxiliary signal 2.
pub const AUX_2: u8 = 4;
/// Inbound: auxiliary signal 3.
pub const AUX_3: u8 = 5;
/// Inbound: auxiliary signal 4.
pub const AUX_4: u8 = 6;

/// Outbound: servo channel A.
pub const SERVO_A: u8 = 0;
/// Outbound: servo channel B.
pub const SERVO_B: u8 = 1;
/// Outbound: main motor throttle.
pub const MAIN_MOTOR: u8 = 2;

/// Human-readable name of an input (telemetry) register slot.
pub fn input_channel_name(index: u8) -> &'static str {
    match index {
        STICK_X => "STICK_X",
        STICK_Y => "STICK_Y",
        BATTERY => "BATTERY",
        AUX_1 => "AUX_1",
        AUX_2 => "AUX_2",
        AUX_3 => "AUX_3",
        AUX_4 => "AUX_4",
        7..=MAX_INDEX => "RESERVED",
        _ => "INVALID",
    }
}

/// Human-readable name of an output (command) register slot.
pub fn output_channel_name(index: u8) -> &'static str {
    match index {
        SERVO_A => "SERVO_A",
        SERVO_B => "SERVO_B",
        MAIN_MOTOR => "MAIN_MOTOR",
        3..=6 => "UNUSED",
        7..=MAX_INDEX => "RESERVED",
        _ => "INVALID",
    }
}
