use serde::{Deserialize, Serialize};

// State of one button at poll time
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonSnapshot {
    pub pressed: bool,
    // Analog value, 0.0 or 1.0 for digital buttons
    pub value: f32,
}

impl ButtonSnapshot {
    pub fn pressed() -> Self {
        Self {
            pressed: true,
            value: 1.0,
        }
    }

    pub fn released() -> Self {
        Self::default()
    }
}

/// Everything a source reports about one physical device at one instant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    pub index: usize,
    pub name: Option<String>,
    pub buttons: Vec<ButtonSnapshot>,
    pub axes: Vec<f32>,
}

impl DeviceSnapshot {
    /// All buttons released, all axes centered
    pub fn neutral(index: usize, buttons: usize, axes: usize) -> Self {
        Self {
            index,
            name: None,
            buttons: vec![ButtonSnapshot::released(); buttons],
            axes: vec![0.0; axes],
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Missing buttons count as released
    pub fn is_pressed(&self, button: usize) -> bool {
        self.buttons.get(button).is_some_and(|b| b.pressed)
    }

    /// `None` unless both axes of the pair are present
    pub fn axis_pair(&self, x: usize, y: usize) -> Option<(f32, f32)> {
        Some((*self.axes.get(x)?, *self.axes.get(y)?))
    }

    // Grows the button list as needed
    pub fn set_button(&mut self, button: usize, pressed: bool) {
        if self.buttons.len() <= button {
            self.buttons.resize(button + 1, ButtonSnapshot::released());
        }
        self.buttons[button] = if pressed {
            ButtonSnapshot::pressed()
        } else {
            ButtonSnapshot::released()
        };
    }

    pub fn set_axis(&mut self, axis: usize, value: f32) {
        if self.axes.len() <= axis {
            self.axes.resize(axis + 1, 0.0);
        }
        self.axes[axis] = value;
    }
}
