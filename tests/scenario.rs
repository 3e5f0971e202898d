use padctl::input::layout::{
    LEFT_STICK, LEFT_STICK_X, LEFT_STICK_Y, STANDARD_AXIS_COUNT, STANDARD_BUTTON_COUNT,
};
use padctl::{
    ControllerId, DeviceSnapshot, EventKind, GamepadContext, Handler, InitOptions, InputConfig,
    InputEvent, MemorySource, RollbackOptions, StandardButton,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn pad(index: usize) -> DeviceSnapshot {
    DeviceSnapshot::neutral(index, STANDARD_BUTTON_COUNT, STANDARD_AXIS_COUNT)
}

fn counter() -> (Arc<AtomicUsize>, Handler) {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    let handler = Handler::new(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    (count, handler)
}

fn initialized(source: &MemorySource) -> GamepadContext {
    let context = GamepadContext::new();
    context
        .initialize(InitOptions::default(), source)
        .expect("memory source is supported");
    context
}

fn active_ids(context: &GamepadContext) -> Vec<ControllerId> {
    context.active_controllers().iter().map(|c| c.id()).collect()
}

#[test]
fn bound_and_unbound_controllers_share_a_button() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = initialized(&source);

    let x = context.create_controller("x", true, Some(0));
    let y = context.create_controller("y", true, None);
    let (x_hits, on_x) = counter();
    let (y_hits, on_y) = counter();
    let south = StandardButton::South.index();
    x.subscribe(south, EventKind::Down, &on_x);
    y.subscribe(south, EventKind::Down, &on_y);

    source.connect(pad(0));
    source.connect(pad(1));
    context.tick(&mut reader);

    source.set_button(1, south, true);
    context.tick(&mut reader);
    assert_eq!(x_hits.load(Ordering::SeqCst), 0);
    assert_eq!(y_hits.load(Ordering::SeqCst), 1);

    source.set_button(0, south, true);
    context.tick(&mut reader);
    assert_eq!(x_hits.load(Ordering::SeqCst), 1);
    assert_eq!(y_hits.load(Ordering::SeqCst), 2);

    // with only y active the same press on device 0 skips x
    context.switch_active([y.id()]);
    source.set_button(0, south, false);
    context.tick(&mut reader);
    source.set_button(0, south, true);
    context.tick(&mut reader);
    assert_eq!(x_hits.load(Ordering::SeqCst), 1);
    assert_eq!(y_hits.load(Ordering::SeqCst), 3);
}

#[test]
fn suppressed_bucket_stays_quiet_until_released() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = initialized(&source);

    let controller = context.create_controller("pad", true, None);
    let (hits, handler) = counter();
    let start = StandardButton::Start.index();
    controller.subscribe(start, EventKind::Down, &handler);
    controller.suppress(start);

    source.connect(pad(0));
    context.tick(&mut reader);
    source.set_button(0, start, true);
    context.tick(&mut reader);
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    controller.unsuppress(start);
    source.set_button(0, start, false);
    context.tick(&mut reader);
    source.set_button(0, start, true);
    context.tick(&mut reader);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn stick_motion_respects_the_dead_zone() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = GamepadContext::new();
    let mut config = InputConfig::default();
    config.axes.dead_zone_radius = 0.2;
    context
        .initialize(InitOptions::with_config(config), &source)
        .unwrap();

    let controller = context.create_controller("pad", true, None);
    let positions = Arc::new(Mutex::new(Vec::new()));
    let seen = positions.clone();
    controller.subscribe(
        LEFT_STICK,
        EventKind::Axes,
        &Handler::on_axes(move |x, y| seen.lock().unwrap().push((x, y))),
    );

    source.connect(pad(0));
    context.tick(&mut reader);

    source.set_axis(0, LEFT_STICK_X, 0.1);
    context.tick(&mut reader);
    assert!(positions.lock().unwrap().is_empty());

    source.set_axis(0, LEFT_STICK_Y, -0.6);
    context.tick(&mut reader);
    assert_eq!(*positions.lock().unwrap(), vec![(0.1, -0.6)]);
}

#[test]
fn panicking_handler_does_not_stop_the_tick() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = initialized(&source);

    let controller = context.create_controller("pad", true, None);
    let (hits, counting) = counter();
    controller.subscribe(0, EventKind::Down, &Handler::on_press(|| panic!("handler bug")));
    controller.subscribe(0, EventKind::Down, &counting);
    controller.subscribe(1, EventKind::Down, &counting);

    source.connect(pad(0));
    context.tick(&mut reader);
    source.set_button(0, 0, true);
    source.set_button(0, 1, true);
    assert!(context.tick(&mut reader));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn up_events_follow_down_events() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = initialized(&source);

    let controller = context.create_controller("pad", true, None);
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = events.clone();
    let handler = Handler::new(move |event| seen.lock().unwrap().push(*event));
    controller.subscribe(2, EventKind::Down, &handler);
    controller.subscribe(2, EventKind::Up, &handler);

    source.connect(pad(0));
    context.tick(&mut reader);
    source.set_button(0, 2, true);
    context.tick(&mut reader);
    source.set_button(0, 2, false);
    context.tick(&mut reader);

    assert_eq!(*events.lock().unwrap(), vec![InputEvent::Down, InputEvent::Up]);
}

#[test]
fn rollback_walks_back_through_activation_changes() {
    let source = MemorySource::new();
    let context = initialized(&source);

    let a = context.create_controller("a", true, None);
    let b = context.create_controller("b", false, None);
    context.flush();

    context.switch_active([b.id()]);
    context.flush();
    context.switch_active([a.id(), b.id()]);
    context.flush();
    assert_eq!(context.history_len(), 3);

    let target = context.rollback(1, RollbackOptions::default()).unwrap();
    assert_eq!(target.controller_ids(), vec![b.id()]);
    assert_eq!(active_ids(&context), vec![b.id()]);

    // the restored state becomes the newest entry once flushed
    assert!(context.has_pending_record());
    context.flush();
    assert_eq!(context.peek_history()[0].controller_ids(), vec![b.id()]);
    assert_eq!(context.history_len(), 2);

    context.rollback(1, RollbackOptions::default());
    assert_eq!(active_ids(&context), vec![a.id()]);
}

#[test]
fn bursts_of_changes_record_once() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = initialized(&source);

    let a = context.create_controller("a", true, None);
    let b = context.create_controller("b", false, None);
    context.tick(&mut reader);
    assert_eq!(context.history_len(), 1);

    a.disable();
    b.activate();
    a.activate();
    context.tick(&mut reader);

    assert_eq!(context.history_len(), 2);
    let mut newest = context.peek_history()[0].controller_ids();
    newest.sort();
    assert_eq!(newest, vec![a.id(), b.id()]);
}

#[test]
fn removed_controller_is_ignored_by_the_loop() {
    let source = MemorySource::new();
    let mut reader = source.clone();
    let context = initialized(&source);

    let controller = context.create_controller("pad", true, None);
    let (hits, handler) = counter();
    controller.subscribe(0, EventKind::Down, &handler);
    context.remove_controller(controller.id());

    source.connect(pad(0));
    context.tick(&mut reader);
    source.set_button(0, 0, true);
    context.tick(&mut reader);

    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(controller.emit(0, InputEvent::Down), 0);
}
