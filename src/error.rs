//! Error definitions for the gamepad subsystem

use crate::controller::ControllerId;
use thiserror::Error;

/// Errors surfaced by [`GamepadContext`](crate::GamepadContext) and the poll driver
///
/// Lookups of unknown controller ids are not errors; bulk operations skip them.
#[derive(Debug, Error)]
pub enum GamepadError {
    /// The host exposes no gamepad polling at all
    ///
    /// Fatal for the whole subsystem and never retried.
    #[error("Gamepad input is not supported on this platform: {0}")]
    Unsupported(String),

    /// Any other failure while bringing the subsystem up
    #[error("Failed to initialize gamepad subsystem: {0}")]
    InitializationError(String),

    /// A controller created by another context was handed to this one
    #[error("Controller {0} belongs to a different context")]
    ForeignController(ControllerId),

    /// Configuration file unreadable or malformed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The poll task could not be joined
    #[error("Driver error: {0}")]
    DriverError(String),
}
