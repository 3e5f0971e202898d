//! Device polling and the per-frame input loop
//!
//! 1. [`layout`] - Standard button and axis order
//! 2. [`snapshot`] - Button and axis state of one device
//! 3. [`source`] - The [`DeviceSource`] seam plus a scripted in-memory source
//! 4. [`gilrs_source`] - Hardware source backed by gilrs
//! 5. [`input_loop`] - Snapshot diffing and [`GamepadContext::tick`](crate::GamepadContext::tick)
//! 6. [`driver`] - tokio task calling the tick once per frame
//!
//! ```text
//! DeviceSource ──► tick ──► diff_snapshots ──► active controllers ──► Handler
//!                   │
//!                   └──► hooks (connected / disconnected / input)
//! ```

pub mod driver;
pub mod gilrs_source;
pub mod input_loop;
pub mod layout;
pub mod snapshot;
pub mod source;

pub use driver::{PollDriver, PollDriverHandle};
pub use gilrs_source::GilrsSource;
pub use input_loop::diff_snapshots;
pub use layout::{StandardButton, LEFT_STICK, RIGHT_STICK};
pub use snapshot::{ButtonSnapshot, DeviceSnapshot};
pub use source::{ConnectionEvent, DeviceSource, MemorySource};
