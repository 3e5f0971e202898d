//! Per-tick diffing of device snapshots
//!
//! Each tick compares the stored snapshot of every tracked device with the
//! latest one from the source and turns the differences into events:
//!
//! - a button whose `pressed` flag changed emits `Down` or `Up` on its index
//! - a stick whose x or y moved by more than the dead zone emits `Axes` with
//!   the new raw position on the configured stick index
//!
//! The new snapshot then becomes the baseline for the next tick.

use crate::config::AxisConfig;
use crate::context::{fire_hook, lock, read, GamepadContext};
use crate::controller::{Controller, InputEvent};
use crate::input::layout::{LEFT_STICK_X, LEFT_STICK_Y, RIGHT_STICK_X, RIGHT_STICK_Y};
use crate::input::snapshot::DeviceSnapshot;
use crate::input::source::{ConnectionEvent, DeviceSource};
use std::collections::BTreeMap;
use tokio::sync::watch;
use tracing::{debug, info};

// Devices seen connected and not yet disconnected, with their baseline
#[derive(Debug, Default)]
pub(crate) struct InputLoop {
    devices: BTreeMap<usize, DeviceSnapshot>,
}

impl InputLoop {
    pub fn connect(&mut self, snapshot: DeviceSnapshot) {
        self.devices.insert(snapshot.index, snapshot);
    }

    pub fn disconnect(&mut self, index: usize) -> Option<DeviceSnapshot> {
        self.devices.remove(&index)
    }

    pub fn tracked(&self) -> Vec<usize> {
        self.devices.keys().copied().collect()
    }

    /// Swaps in a new baseline, `None` if the device is not tracked
    pub fn replace(&mut self, snapshot: DeviceSnapshot) -> Option<DeviceSnapshot> {
        let slot = self.devices.get_mut(&snapshot.index)?;
        Some(std::mem::replace(slot, snapshot))
    }

    pub fn devices(&self) -> Vec<DeviceSnapshot> {
        self.devices.values().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.devices.clear();
    }
}

/// Events produced by the transition from `prev` to `next`
///
/// A button missing from either snapshot counts as released there, so a
/// pressed button that disappears from `next` emits `Up`. A stick is
/// skipped when `next` lacks one of its axes; axes missing from `prev` count
/// as centered.
pub fn diff_snapshots(
    prev: &DeviceSnapshot,
    next: &DeviceSnapshot,
    axes: &AxisConfig,
) -> Vec<(usize, InputEvent)> {
    let mut events = Vec::new();

    let buttons = prev.buttons.len().max(next.buttons.len());
    for button in 0..buttons {
        let pressed = next.is_pressed(button);
        if pressed != prev.is_pressed(button) {
            let event = if pressed {
                InputEvent::Down
            } else {
                InputEvent::Up
            };
            events.push((button, event));
        }
    }

    let sticks = [
        (axes.left_stick_index, LEFT_STICK_X, LEFT_STICK_Y),
        (axes.right_stick_index, RIGHT_STICK_X, RIGHT_STICK_Y),
    ];
    for (stick, x_axis, y_axis) in sticks {
        let Some((x, y)) = next.axis_pair(x_axis, y_axis) else {
            continue;
        };
        let (prev_x, prev_y) = prev.axis_pair(x_axis, y_axis).unwrap_or((0.0, 0.0));

        let radius = axes.dead_zone_radius;
        if (x - prev_x).abs() > radius || (y - prev_y).abs() > radius {
            events.push((stick, InputEvent::Axes { x, y }));
        }
    }

    events
}

impl GamepadContext {
    /// Resumes ticking
    pub fn start(&self) {
        self.shared.running.send_replace(true);
        info!("Input loop started");
    }

    /// Halts ticking after the current one
    pub fn stop(&self) {
        self.shared.running.send_replace(false);
        info!("Input loop stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.shared.running.borrow()
    }

    pub(crate) fn running_receiver(&self) -> watch::Receiver<bool> {
        self.shared.running.subscribe()
    }

    /// Snapshots of the tracked devices, ordered by index
    pub fn list_devices(&self) -> Vec<DeviceSnapshot> {
        lock(&self.shared.input).devices()
    }

    /// Runs one frame of the input loop
    ///
    /// Returns whether the loop wants another tick, which is `false` while it
    /// is stopped or the context is not initialized. Pending history records
    /// are flushed in every case.
    pub fn tick(&self, source: &mut dyn DeviceSource) -> bool {
        if !self.is_initialized() || !self.is_running() {
            self.flush();
            return false;
        }

        let hooks = self.hooks();
        for event in source.poll_connections() {
            match event {
                ConnectionEvent::Connected(snapshot) => {
                    info!(
                        "Device {} connected ({})",
                        snapshot.index,
                        snapshot.name.as_deref().unwrap_or("unnamed")
                    );
                    lock(&self.shared.input).connect(snapshot.clone());
                    fire_hook(&hooks.on_connected, "on_connected", &snapshot);
                }
                ConnectionEvent::Disconnected(index) => {
                    let removed = lock(&self.shared.input).disconnect(index);
                    match removed {
                        Some(last) => {
                            info!("Device {} disconnected", index);
                            fire_hook(&hooks.on_disconnected, "on_disconnected", &last);
                        }
                        None => debug!("Disconnect for untracked device {}", index),
                    }
                }
            }
        }

        let axes = read(&self.shared.config).axes;
        let active = self.active_controllers();
        let tracked = lock(&self.shared.input).tracked();

        for index in tracked {
            let Some(mut next) = source.snapshot(index) else {
                debug!("Device {} did not report this tick", index);
                continue;
            };
            next.index = index;

            let replaced = lock(&self.shared.input).replace(next.clone());
            let Some(prev) = replaced else {
                continue;
            };

            let events = diff_snapshots(&prev, &next, &axes);
            if events.is_empty() {
                continue;
            }

            for (button, event) in &events {
                let delivered = dispatch(&active, index, *button, *event);
                debug!(
                    "Device {} index {} {:?} delivered to {} handlers",
                    index, button, event, delivered
                );
            }
            fire_hook(&hooks.on_input, "on_input", &next);
        }

        self.flush();
        true
    }
}

// Active, subscribed and either unbound or bound to `device`
fn dispatch(active: &[Controller], device: usize, button: usize, event: InputEvent) -> usize {
    active
        .iter()
        .filter(|controller| controller.is_active())
        .filter(|controller| controller.accepts_device(device))
        .filter(|controller| controller.has_subscriptions(button))
        .map(|controller| controller.emit(button, event))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InitOptions, LifecycleHooks};
    use crate::controller::{EventKind, Handler};
    use crate::input::layout::{LEFT_STICK, RIGHT_STICK};
    use crate::input::source::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn pad(index: usize) -> DeviceSnapshot {
        DeviceSnapshot::neutral(index, 17, 4)
    }

    fn axes(radius: f32) -> AxisConfig {
        AxisConfig {
            dead_zone_radius: radius,
            ..AxisConfig::default()
        }
    }

    fn counter() -> (Arc<AtomicUsize>, Handler) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            count,
            Handler::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    fn running(source: &MemorySource) -> GamepadContext {
        let context = GamepadContext::new();
        context.initialize(InitOptions::default(), source).unwrap();
        context
    }

    #[test]
    fn button_transitions_become_down_and_up() {
        let prev = pad(0);
        let mut next = pad(0);
        next.set_button(0, true);
        assert_eq!(
            diff_snapshots(&prev, &next, &axes(0.1)),
            vec![(0, InputEvent::Down)]
        );
        assert_eq!(
            diff_snapshots(&next, &prev, &axes(0.1)),
            vec![(0, InputEvent::Up)]
        );
        assert!(diff_snapshots(&next, &next, &axes(0.1)).is_empty());
    }

    #[test]
    fn buttons_new_in_next_count_as_released_before() {
        let prev = DeviceSnapshot::neutral(0, 2, 4);
        let mut next = DeviceSnapshot::neutral(0, 2, 4);
        next.set_button(5, true);
        assert_eq!(
            diff_snapshots(&prev, &next, &axes(0.1)),
            vec![(5, InputEvent::Down)]
        );
    }

    #[test]
    fn buttons_dropped_from_next_count_as_released() {
        let mut prev = DeviceSnapshot::neutral(0, 4, 4);
        prev.set_button(3, true);
        prev.set_button(1, true);
        let mut next = DeviceSnapshot::neutral(0, 2, 4);
        next.set_button(1, true);
        assert_eq!(
            diff_snapshots(&prev, &next, &axes(0.1)),
            vec![(3, InputEvent::Up)]
        );
    }

    #[test]
    fn dead_zone_boundary_is_exclusive() {
        let prev = pad(0);
        let mut exact = pad(0);
        exact.set_axis(LEFT_STICK_X, 0.25);
        assert!(diff_snapshots(&prev, &exact, &axes(0.25)).is_empty());

        let mut beyond = pad(0);
        beyond.set_axis(LEFT_STICK_Y, 0.5);
        assert_eq!(
            diff_snapshots(&prev, &beyond, &axes(0.25)),
            vec![(LEFT_STICK, InputEvent::Axes { x: 0.0, y: 0.5 })]
        );
    }

    #[test]
    fn right_stick_reads_axes_two_and_three() {
        let prev = pad(0);
        let mut next = pad(0);
        next.set_axis(RIGHT_STICK_X, -0.75);
        assert_eq!(
            diff_snapshots(&prev, &next, &axes(0.05)),
            vec![(RIGHT_STICK, InputEvent::Axes { x: -0.75, y: 0.0 })]
        );
    }

    #[test]
    fn stick_indices_follow_config() {
        let config = AxisConfig {
            left_stick_index: 20,
            right_stick_index: 21,
            dead_zone_radius: 0.05,
        };
        let prev = pad(0);
        let mut next = pad(0);
        next.set_axis(LEFT_STICK_X, 0.5);
        assert_eq!(
            diff_snapshots(&prev, &next, &config),
            vec![(20, InputEvent::Axes { x: 0.5, y: 0.0 })]
        );
    }

    #[test]
    fn missing_axes_skip_the_stick() {
        let prev = DeviceSnapshot::neutral(0, 0, 0);
        let mut next = DeviceSnapshot::neutral(0, 0, 2);
        next.set_axis(LEFT_STICK_X, 0.9);
        assert_eq!(
            diff_snapshots(&prev, &next, &axes(0.05)),
            vec![(LEFT_STICK, InputEvent::Axes { x: 0.9, y: 0.0 })]
        );
    }

    #[test]
    fn tick_routes_to_eligible_controllers_only() {
        let source = MemorySource::new();
        let context = running(&source);
        let mut reader = source.clone();

        let bound = context.create_controller("p2", true, Some(1));
        let free = context.create_controller("any", true, None);
        let idle = context.create_controller("idle", false, None);
        let (bound_hits, on_bound) = counter();
        let (free_hits, on_free) = counter();
        let (idle_hits, on_idle) = counter();
        bound.subscribe(0, EventKind::Down, &on_bound);
        free.subscribe(0, EventKind::Down, &on_free);
        idle.subscribe(0, EventKind::Down, &on_idle);

        source.connect(pad(0));
        assert!(context.tick(&mut reader));
        source.set_button(0, 0, true);
        context.tick(&mut reader);

        assert_eq!(bound_hits.load(Ordering::SeqCst), 0);
        assert_eq!(free_hits.load(Ordering::SeqCst), 1);
        assert_eq!(idle_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unchanged_state_emits_nothing_twice() {
        let source = MemorySource::new();
        let context = running(&source);
        let mut reader = source.clone();
        let controller = context.create_controller("pad", true, None);
        let (hits, handler) = counter();
        controller.subscribe(3, EventKind::Down, &handler);

        source.connect(pad(0));
        context.tick(&mut reader);
        source.set_button(0, 3, true);
        context.tick(&mut reader);
        context.tick(&mut reader);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn silent_device_is_skipped_without_blocking_others() {
        let source = MemorySource::new();
        let context = running(&source);
        let mut reader = source.clone();
        let controller = context.create_controller("pad", true, None);
        let (hits, handler) = counter();
        controller.subscribe(0, EventKind::Down, &handler);

        source.connect(pad(0));
        source.connect(pad(1));
        context.tick(&mut reader);

        source.forget(0);
        source.set_button(1, 0, true);
        context.tick(&mut reader);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(context.list_devices().len(), 2);

        // device 0 reports again with its button held
        let mut held = pad(0);
        held.set_button(0, true);
        source.update(held);
        context.tick(&mut reader);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stopped_loop_does_not_dispatch() {
        let source = MemorySource::new();
        let context = running(&source);
        let mut reader = source.clone();
        let controller = context.create_controller("pad", true, None);
        let (hits, handler) = counter();
        controller.subscribe(0, EventKind::Down, &handler);

        source.connect(pad(0));
        context.tick(&mut reader);

        context.stop();
        source.set_button(0, 0, true);
        assert!(!context.tick(&mut reader));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        context.start();
        assert!(context.tick(&mut reader));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uninitialized_context_does_not_tick() {
        let context = GamepadContext::new();
        let mut source = MemorySource::new();
        context.start();
        assert!(!context.tick(&mut source));
    }

    #[test]
    fn hooks_fire_on_lifecycle_and_input() {
        let source = MemorySource::new();
        let mut reader = source.clone();
        let log = Arc::new(Mutex::new(Vec::new()));

        let (connected, disconnected, input) = (log.clone(), log.clone(), log.clone());
        let hooks = LifecycleHooks::default()
            .on_connected(move |s| connected.lock().unwrap().push(format!("connected {}", s.index)))
            .on_disconnected(move |s| {
                disconnected
                    .lock()
                    .unwrap()
                    .push(format!("disconnected {}", s.index))
            })
            .on_input(move |s| input.lock().unwrap().push(format!("input {}", s.index)));

        let context = GamepadContext::new();
        context
            .initialize(InitOptions::default().hooks(hooks), &source)
            .unwrap();

        source.connect(pad(2));
        context.tick(&mut reader);
        // two changes in one tick notify once
        source.set_button(2, 0, true);
        source.set_axis(2, LEFT_STICK_X, 0.8);
        context.tick(&mut reader);
        context.tick(&mut reader);
        source.disconnect(2);
        context.tick(&mut reader);

        assert_eq!(
            *log.lock().unwrap(),
            vec!["connected 2", "input 2", "disconnected 2"]
        );
        assert!(context.list_devices().is_empty());
    }

    #[test]
    fn handler_switching_context_mid_tick() {
        let source = MemorySource::new();
        let context = running(&source);
        let mut reader = source.clone();

        let game = context.create_controller("game", true, None);
        let menu = context.create_controller("menu", false, None);
        let (menu_hits, on_menu) = counter();
        menu.subscribe(9, EventKind::Down, &on_menu);

        let switcher = context.clone();
        let menu_id = menu.id();
        game.subscribe(
            9,
            EventKind::Down,
            &Handler::on_press(move || switcher.switch_active([menu_id])),
        );

        source.connect(pad(0));
        context.tick(&mut reader);
        source.set_button(0, 9, true);
        context.tick(&mut reader);

        assert!(menu.is_active());
        assert!(!game.is_active());
        // the menu was not active when the tick started
        assert_eq!(menu_hits.load(Ordering::SeqCst), 0);
        // the switch was flushed at the end of the tick
        assert_eq!(context.peek_history()[0].controller_ids(), vec![menu.id()]);
    }
}
