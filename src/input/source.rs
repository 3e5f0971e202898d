//! Device sources feeding the input loop
//!
//! A source is the only link to real hardware: it announces connects and
//! disconnects and hands out the latest snapshot of a device on request.

use crate::context::lock;
use crate::input::snapshot::DeviceSnapshot;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use tracing::debug;

// Connection notification drained once per tick
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    Connected(DeviceSnapshot),
    Disconnected(usize),
}

/// External provider of gamepad state
pub trait DeviceSource: Send {
    /// Whether the host exposes gamepad polling at all
    fn is_supported(&self) -> bool;

    /// Connects and disconnects observed since the previous call
    fn poll_connections(&mut self) -> Vec<ConnectionEvent>;

    /// Latest state of `index`, `None` while the device does not report
    fn snapshot(&mut self, index: usize) -> Option<DeviceSnapshot>;
}

impl<S: DeviceSource + ?Sized> DeviceSource for Box<S> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    fn poll_connections(&mut self) -> Vec<ConnectionEvent> {
        (**self).poll_connections()
    }

    fn snapshot(&mut self, index: usize) -> Option<DeviceSnapshot> {
        (**self).snapshot(index)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    devices: BTreeMap<usize, DeviceSnapshot>,
    events: VecDeque<ConnectionEvent>,
}

/// Scripted in-memory source
///
/// Clones share their devices, so a test can keep one clone to drive input
/// while the context or the poll driver owns another.
#[derive(Debug, Clone)]
pub struct MemorySource {
    state: Arc<Mutex<MemoryState>>,
    supported: bool,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            supported: true,
        }
    }

    /// Source of a host without gamepad support
    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::new()
        }
    }

    /// Plugs a device in and queues its connect notification
    pub fn connect(&self, snapshot: DeviceSnapshot) {
        let mut state = lock(&self.state);
        debug!("Memory source connecting device {}", snapshot.index);
        state.devices.insert(snapshot.index, snapshot.clone());
        state.events.push_back(ConnectionEvent::Connected(snapshot));
    }

    /// Unplugs a device and queues its disconnect notification
    pub fn disconnect(&self, index: usize) {
        let mut state = lock(&self.state);
        debug!("Memory source disconnecting device {}", index);
        state.devices.remove(&index);
        state.events.push_back(ConnectionEvent::Disconnected(index));
    }

    /// Stops reporting a device without a disconnect notification
    pub fn forget(&self, index: usize) {
        lock(&self.state).devices.remove(&index);
    }

    /// Replaces the reported state of a device without any notification
    pub fn update(&self, snapshot: DeviceSnapshot) {
        lock(&self.state).devices.insert(snapshot.index, snapshot);
    }

    pub fn set_button(&self, device: usize, button: usize, pressed: bool) {
        if let Some(snapshot) = lock(&self.state).devices.get_mut(&device) {
            snapshot.set_button(button, pressed);
        }
    }

    pub fn set_axis(&self, device: usize, axis: usize, value: f32) {
        if let Some(snapshot) = lock(&self.state).devices.get_mut(&device) {
            snapshot.set_axis(axis, value);
        }
    }
}

impl DeviceSource for MemorySource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn poll_connections(&mut self) -> Vec<ConnectionEvent> {
        lock(&self.state).events.drain(..).collect()
    }

    fn snapshot(&mut self, index: usize) -> Option<DeviceSnapshot> {
        lock(&self.state).devices.get(&index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_devices_and_events() {
        let driver = MemorySource::new();
        let mut reader = driver.clone();

        driver.connect(DeviceSnapshot::neutral(0, 4, 4));
        driver.set_button(0, 2, true);

        let events = reader.poll_connections();
        assert_eq!(events.len(), 1);
        assert!(reader.poll_connections().is_empty());
        assert!(reader.snapshot(0).unwrap().is_pressed(2));

        driver.forget(0);
        assert!(reader.snapshot(0).is_none());
        assert!(reader.poll_connections().is_empty());

        driver.disconnect(0);
        assert_eq!(reader.poll_connections(), vec![ConnectionEvent::Disconnected(0)]);
    }

    #[test]
    fn unsupported_source_reports_it() {
        assert!(!MemorySource::unsupported().is_supported());
        assert!(MemorySource::new().is_supported());
    }
}
