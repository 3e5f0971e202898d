//! Gamepad controller library
//!
//! Applications create logical controllers, subscribe handlers to button and
//! stick indices and switch which controllers are active. A poll driver diffs
//! device snapshots every frame and dispatches the changes to the active
//! controllers, while every activation change is recorded in a history that
//! can be rolled back.
//!
//! ```rust,no_run
//! use padctl::{EventKind, GamepadContext, Handler, InitOptions, MemorySource, PollDriverHandle};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), padctl::GamepadError> {
//! let context = GamepadContext::new();
//! let menu = context.create_controller("menu", true, None);
//! menu.subscribe(0, EventKind::Down, &Handler::on_press(|| println!("confirm")));
//!
//! let mut driver = PollDriverHandle::spawn(context.clone(), MemorySource::new(), InitOptions::default())?;
//! driver.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod input;

pub use config::{AxisConfig, InputConfig};
pub use context::{DeviceCallback, GamepadContext, InitOptions, LifecycleHooks};
pub use controller::{
    BucketInfo, Controller, ControllerId, ControllerSnapshot, EventKind, Handler, HistoryEntry,
    InputEvent, RollbackOptions,
};
pub use error::GamepadError;
pub use input::{
    ConnectionEvent, DeviceSnapshot, DeviceSource, GilrsSource, MemorySource, PollDriverHandle,
    StandardButton,
};
