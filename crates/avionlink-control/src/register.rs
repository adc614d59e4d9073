use avionlink_frame::{Frame, REGISTER_SLOTS};

use crate::error::{ControlError, Result};

/// Sixteen channel values indexed `0..=15`, zero at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Register {
    slots: [i32; REGISTER_SLOTS],
}

impl Register {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a slot.
    pub fn get(&self, index: u8) -> Result<i32> {
        self.slots
            .get(usize::from(index))
            .copied()
            .ok_or(ControlError::IndexOutOfRange(index))
    }

    /// Overwrite a slot.
    pub fn set(&mut self, index: u8, value: i32) -> Result<()> {
        let slot = self
            .slots
            .get_mut(usize::from(index))
            .ok_or(ControlError::IndexOutOfRange(index))?;
        *slot = value;
        Ok(())
    }

    /// Store a decoded frame in its slot.
    pub fn apply(&mut self, frame: &Frame) -> Result<()> {
        self.set(frame.index, frame.value)
    }

    /// Copy of all slots.
    pub fn snapshot(&self) -> [i32; REGISTER_SLOTS] {
        self.slots
    }

    /// Zero every slot.
    pub fn reset(&mut self) {
        self.slots = [0; REGISTER_SLOTS];
    }
}

/// The two registers of the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    /// Telemetry, written only from decoded inbound frames.
    pub input: Register,
    /// Actuator commands, written by the caller through
    /// [`LoopController::command`](crate::LoopController::command).
    pub output: Register,
}

#[cfg(test)]
mod tests {
    use avionlink_frame::{BATTERY, STICK_X};

    use super::*;

    #[test]
    fn starts_zeroed() {
        let reg = Register::new();
        assert_eq!(reg.snapshot(), [0; REGISTER_SLOTS]);
    }

    #[test]
    fn set_and_get() {
        let mut reg = Register::new();
        reg.set(BATTERY, 87).unwrap();
        assert_eq!(reg.get(BATTERY).unwrap(), 87);
        assert_eq!(reg.get(STICK_X).unwrap(), 0);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let mut reg = Register::new();
        assert!(matches!(
            reg.set(16, 1).unwrap_err(),
            ControlError::IndexOutOfRange(16)
        ));
        assert!(matches!(
            reg.get(255).unwrap_err(),
            ControlError::IndexOutOfRange(255)
        ));
        assert_eq!(reg, Register::new());
    }

    #[test]
    fn apply_frame() {
        let mut reg = Register::new();
        reg.apply(&Frame::new(-3, 15).unwrap()).unwrap();
        assert_eq!(reg.get(15).unwrap(), -3);

        reg.reset();
        assert_eq!(reg.get(15).unwrap(), 0);
    }

    #[test]
    fn registers_are_independent() {
        let mut regs = Registers::default();
        regs.input.set(2, 50).unwrap();
        regs.output.set(2, 900).unwrap();
        assert_eq!(regs.input.get(2).unwrap(), 50);
        assert_eq!(regs.output.get(2).unwrap(), 900);
    }
}
