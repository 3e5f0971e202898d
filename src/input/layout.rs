//! Standard gamepad button order
//!
//! Indices follow the W3C "standard gamepad" mapping so controllers written
//! against one device family work with every source.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of the left stick button, also the bucket receiving left stick motion
pub const LEFT_STICK: usize = 10;
/// Index of the right stick button, also the bucket receiving right stick motion
pub const RIGHT_STICK: usize = 11;

pub const STANDARD_BUTTON_COUNT: usize = 17;

// Axes order of a snapshot
pub const LEFT_STICK_X: usize = 0;
pub const LEFT_STICK_Y: usize = 1;
pub const RIGHT_STICK_X: usize = 2;
pub const RIGHT_STICK_Y: usize = 3;
pub const STANDARD_AXIS_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardButton {
    South,
    East,
    West,
    North,
    LeftBumper,
    RightBumper,
    LeftTrigger,
    RightTrigger,
    Select,
    Start,
    LeftStick,
    RightStick,
    DPadUp,
    DPadDown,
    DPadLeft,
    DPadRight,
    Guide,
}

impl StandardButton {
    pub const ALL: [StandardButton; STANDARD_BUTTON_COUNT] = [
        StandardButton::South,
        StandardButton::East,
        StandardButton::West,
        StandardButton::North,
        StandardButton::LeftBumper,
        StandardButton::RightBumper,
        StandardButton::LeftTrigger,
        StandardButton::RightTrigger,
        StandardButton::Select,
        StandardButton::Start,
        StandardButton::LeftStick,
        StandardButton::RightStick,
        StandardButton::DPadUp,
        StandardButton::DPadDown,
        StandardButton::DPadLeft,
        StandardButton::DPadRight,
        StandardButton::Guide,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Xbox-style label
    pub fn label(self) -> &'static str {
        match self {
            StandardButton::South => "A",
            StandardButton::East => "B",
            StandardButton::West => "X",
            StandardButton::North => "Y",
            StandardButton::LeftBumper => "LB",
            StandardButton::RightBumper => "RB",
            StandardButton::LeftTrigger => "LT",
            StandardButton::RightTrigger => "RT",
            StandardButton::Select => "Back",
            StandardButton::Start => "Start",
            StandardButton::LeftStick => "LS",
            StandardButton::RightStick => "RS",
            StandardButton::DPadUp => "Up",
            StandardButton::DPadDown => "Down",
            StandardButton::DPadLeft => "Left",
            StandardButton::DPadRight => "Right",
            StandardButton::Guide => "Guide",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|button| button.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for StandardButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
