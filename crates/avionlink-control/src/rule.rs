use avionlink_frame::STICK_X;

use crate::register::Register;

/// Input value that triggers the sentinel command.
pub const DEFAULT_TRIGGER_VALUE: i32 = 40;

/// Sends the sentinel line whenever one input slot holds the trigger value.
///
/// Evaluated once per cycle; it fires again on every cycle while the
/// condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRule {
    /// Input register slot to watch.
    pub channel: u8,
    /// Value that fires the rule.
    pub trigger: i32,
}

impl CommandRule {
    pub fn fires(&self, input: &Register) -> bool {
        input
            .get(self.channel)
            .map(|value| value == self.trigger)
            .unwrap_or(false)
    }
}

impl Default for CommandRule {
    fn default() -> Self {
        Self {
            channel: STICK_X,
            trigger: DEFAULT_TRIGGER_VALUE,
        }
    }
}
