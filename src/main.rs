use color_eyre::Result;
use padctl::config::default_config_path;
use padctl::{
    EventKind, GamepadContext, GilrsSource, Handler, InitOptions, InputConfig, LifecycleHooks,
    PollDriverHandle, RollbackOptions, StandardButton,
};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = default_config_path();
    info!("Loading input config from {}", config_path.display());
    let config = InputConfig::load_or_default(&config_path)?;

    let context = GamepadContext::new();
    build_controllers(&context);

    let hooks = LifecycleHooks::default()
        .on_connected(|pad| {
            info!(
                "Gamepad {} ready: {}",
                pad.index,
                pad.name.as_deref().unwrap_or("unnamed")
            )
        })
        .on_disconnected(|pad| warn!("Gamepad {} lost", pad.index));

    let source = GilrsSource::new()?;
    let mut driver =
        PollDriverHandle::spawn(context.clone(), source, InitOptions::with_config(config).hooks(hooks))?;

    info!("Press Start to open the menu, B to go back, Ctrl+C to quit");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    driver.shutdown().await?;
    context.teardown();
    Ok(())
}

// Two scenes: gameplay is active at start, Start opens the menu and B in the
// menu rolls back to whatever was active before.
fn build_controllers(context: &GamepadContext) {
    let gameplay = context.create_controller("gameplay", true, None);
    let menu = context.create_controller("menu", false, None);

    let south = StandardButton::South.index();
    let start = StandardButton::Start.index();

    gameplay.subscribe(south, EventKind::Down, &Handler::on_press(|| info!("Jump")));
    gameplay.subscribe(
        StandardButton::LeftStick.index(),
        EventKind::Axes,
        &Handler::on_axes(|x, y| debug!("Move {:.2} {:.2}", x, y)),
    );

    let switcher = context.clone();
    let menu_id = menu.id();
    gameplay.subscribe(
        start,
        EventKind::Down,
        &Handler::on_press(move || {
            info!("Opening menu");
            switcher.switch_active([menu_id]);
        }),
    );

    // Select toggles jumping
    let lookup = context.clone();
    let gameplay_id = gameplay.id();
    gameplay.subscribe(
        StandardButton::Select.index(),
        EventKind::Down,
        &Handler::on_press(move || {
            if let Some(gameplay) = lookup.controller(gameplay_id) {
                let suppressed = !gameplay.is_suppressed(south);
                gameplay.set_suppressed([south], suppressed);
                info!("Jump {}", if suppressed { "disabled" } else { "enabled" });
            }
        }),
    );

    menu.subscribe(south, EventKind::Down, &Handler::on_press(|| info!("Confirm")));
    for button in [StandardButton::DPadUp, StandardButton::DPadDown] {
        menu.subscribe(
            button.index(),
            EventKind::Down,
            &Handler::on_press(move || info!("Menu cursor {}", button)),
        );
    }

    let back = context.clone();
    menu.subscribe(
        StandardButton::East.index(),
        EventKind::Down,
        &Handler::on_press(move || {
            if back.rollback(1, RollbackOptions::default()).is_some() {
                info!("Back");
            }
        }),
    );
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
