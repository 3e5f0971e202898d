//! Logical controllers, their registry and the activation history
//!
//! 1. [`event`] - Event kinds, payloads and handler identity
//! 2. [`bucket`] - Per-index subscriber sets with a suppression flag
//! 3. [`controller`] - The controller handle
//! 4. [`registry`] - Registration and exclusive activation switching
//! 5. [`history`] - Debounced activation history and rollback
//!
//! ```text
//! InputLoop ──► Controller::emit ──► Handler
//!                    │
//!          activate / disable
//!                    ▼
//!     registry ──► history.record ──► flush ──► rollback ──► switch_active
//! ```

pub mod bucket;
#[allow(clippy::module_inception)]
pub mod controller;
pub mod event;
pub mod history;
pub mod registry;

pub use bucket::BucketInfo;
pub use controller::{Controller, ControllerId};
pub use event::{EventKind, Handler, InputEvent};
pub use history::{ControllerSnapshot, HistoryEntry, RollbackOptions};
