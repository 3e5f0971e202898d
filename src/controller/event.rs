use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

// Kind of transition a handler subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Down,
    Up,
    Axes,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Down => write!(f, "down"),
            EventKind::Up => write!(f, "up"),
            EventKind::Axes => write!(f, "axes"),
        }
    }
}

/// Event delivered to handlers
///
/// `Axes` carries the raw stick position of the device snapshot that
/// triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Down,
    Up,
    Axes { x: f32, y: f32 },
}

impl InputEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::Down => EventKind::Down,
            InputEvent::Up => EventKind::Up,
            InputEvent::Axes { .. } => EventKind::Axes,
        }
    }
}

type HandlerFn = dyn Fn(&InputEvent) + Send + Sync;

/// Shared event callback
///
/// Two handlers are the same subscriber when they share the closure, which is
/// the case for clones of one `Handler`. Subscribing a clone again is a no-op.
#[derive(Clone)]
pub struct Handler(Arc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&InputEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Handler for `down`/`up` subscriptions, ignores stick motion
    pub fn on_press<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(move |event| {
            if !matches!(event, InputEvent::Axes { .. }) {
                f()
            }
        })
    }

    /// Handler for `axes` subscriptions receiving the stick position
    pub fn on_axes<F>(f: F) -> Self
    where
        F: Fn(f32, f32) + Send + Sync + 'static,
    {
        Self::new(move |event| {
            if let InputEvent::Axes { x, y } = *event {
                f(x, y)
            }
        })
    }

    pub fn same(&self, other: &Handler) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }

    /// Runs the callback, returning `false` if it panicked
    ///
    /// A panicking handler must not take its siblings or the current tick
    /// down with it.
    pub(crate) fn invoke(&self, event: &InputEvent) -> bool {
        let callback = &self.0;
        match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
            Ok(()) => true,
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Handler panicked on {:?}: {}", event, reason);
                false
            }
        }
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&(Arc::as_ptr(&self.0) as *const ()))
            .finish()
    }
}
