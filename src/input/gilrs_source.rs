//! Hardware source backed by gilrs
//!
//! gilrs reports buttons by name and sticks with y pointing up; snapshots are
//! rebuilt in standard order with y pointing down so both sources look alike
//! to the input loop.

use crate::error::GamepadError;
use crate::input::layout::{StandardButton, STANDARD_AXIS_COUNT, STANDARD_BUTTON_COUNT};
use crate::input::snapshot::{ButtonSnapshot, DeviceSnapshot};
use crate::input::source::{ConnectionEvent, DeviceSource};
use gilrs::{Axis, Button, Event, EventType, Gamepad, GamepadId, Gilrs};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, error, info, warn};

pub struct GilrsSource {
    gilrs: Gilrs,
    supported: bool,
    ids: BTreeMap<usize, GamepadId>,
    // Pads already present at startup never produce a Connected event
    queued: VecDeque<ConnectionEvent>,
}

impl GilrsSource {
    pub fn new() -> Result<Self, GamepadError> {
        info!("Initializing gilrs controller interface");
        let (gilrs, supported) = match Gilrs::new() {
            Ok(gilrs) => {
                info!("Successfully initialized gilrs");
                (gilrs, true)
            }
            Err(gilrs::Error::NotImplemented(dummy)) => {
                warn!("gilrs has no backend for this platform");
                (dummy, false)
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(GamepadError::InitializationError(e.to_string()));
            }
        };

        let mut source = Self {
            gilrs,
            supported,
            ids: BTreeMap::new(),
            queued: VecDeque::new(),
        };

        let present: Vec<GamepadId> = source.gilrs.gamepads().map(|(id, _)| id).collect();
        if present.is_empty() {
            warn!("No gamepad connected, waiting for one");
        }
        for id in present {
            if let Some(event) = source.connect(id) {
                source.queued.push_back(event);
            }
        }

        Ok(source)
    }

    fn connect(&mut self, id: GamepadId) -> Option<ConnectionEvent> {
        let index = usize::from(id);
        let snapshot = self.gilrs.connected_gamepad(id).map(|pad| read_pad(index, &pad))?;
        info!(
            "Gamepad {} connected: {}",
            index,
            snapshot.name.as_deref().unwrap_or("unnamed")
        );
        self.ids.insert(index, id);
        Some(ConnectionEvent::Connected(snapshot))
    }
}

impl DeviceSource for GilrsSource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn poll_connections(&mut self) -> Vec<ConnectionEvent> {
        let mut events: Vec<ConnectionEvent> = self.queued.drain(..).collect();

        // Draining also folds button and axis changes into gilrs' cached state
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::Connected => {
                    if let Some(connected) = self.connect(id) {
                        events.push(connected);
                    }
                }
                EventType::Disconnected => {
                    let index = usize::from(id);
                    info!("Gamepad {} disconnected", index);
                    self.ids.remove(&index);
                    events.push(ConnectionEvent::Disconnected(index));
                }
                _ => {}
            }
        }

        events
    }

    fn snapshot(&mut self, index: usize) -> Option<DeviceSnapshot> {
        let id = *self.ids.get(&index)?;
        match self.gilrs.connected_gamepad(id) {
            Some(pad) => Some(read_pad(index, &pad)),
            None => {
                debug!("Gamepad {} is not reporting", index);
                None
            }
        }
    }
}

fn read_pad(index: usize, pad: &Gamepad<'_>) -> DeviceSnapshot {
    let buttons = StandardButton::ALL
        .iter()
        .map(|standard| {
            let button = gilrs_button(*standard);
            let pressed = pad.is_pressed(button);
            let value = pad
                .button_data(button)
                .map(|data| data.value())
                .unwrap_or(if pressed { 1.0 } else { 0.0 });
            ButtonSnapshot { pressed, value }
        })
        .collect::<Vec<_>>();
    debug_assert_eq!(buttons.len(), STANDARD_BUTTON_COUNT);

    let axes: [f32; STANDARD_AXIS_COUNT] = [
        pad.value(Axis::LeftStickX),
        -pad.value(Axis::LeftStickY),
        pad.value(Axis::RightStickX),
        -pad.value(Axis::RightStickY),
    ];

    DeviceSnapshot {
        index,
        name: Some(pad.name().to_string()),
        buttons,
        axes: axes.to_vec(),
    }
}

// gilrs calls the bumpers triggers and the triggers Trigger2
fn gilrs_button(button: StandardButton) -> Button {
    match button {
        StandardButton::South => Button::South,
        StandardButton::East => Button::East,
        StandardButton::West => Button::West,
        StandardButton::North => Button::North,
        StandardButton::LeftBumper => Button::LeftTrigger,
        StandardButton::RightBumper => Button::RightTrigger,
        StandardButton::LeftTrigger => Button::LeftTrigger2,
        StandardButton::RightTrigger => Button::RightTrigger2,
        StandardButton::Select => Button::Select,
        StandardButton::Start => Button::Start,
        StandardButton::LeftStick => Button::LeftThumb,
        StandardButton::RightStick => Button::RightThumb,
        StandardButton::DPadUp => Button::DPadUp,
        StandardButton::DPadDown => Button::DPadDown,
        StandardButton::DPadLeft => Button::DPadLeft,
        StandardButton::DPadRight => Button::DPadRight,
        StandardButton::Guide => Button::Mode,
    }
}
