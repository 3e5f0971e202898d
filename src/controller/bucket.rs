use crate::controller::event::{EventKind, Handler};
use serde::Serialize;

/// Introspection record for one bucket of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketInfo {
    pub index: usize,
    pub suppressed: bool,
    pub has_down: bool,
    pub has_up: bool,
    pub has_axes: bool,
}

// Subscribers of one button or stick index
#[derive(Debug, Default, Clone)]
pub(crate) struct EventBucket {
    pub suppressed: bool,
    on_down: Vec<Handler>,
    on_up: Vec<Handler>,
    on_axes: Vec<Handler>,
}

impl EventBucket {
    fn handlers(&self, kind: EventKind) -> &Vec<Handler> {
        match kind {
            EventKind::Down => &self.on_down,
            EventKind::Up => &self.on_up,
            EventKind::Axes => &self.on_axes,
        }
    }

    fn handlers_mut(&mut self, kind: EventKind) -> &mut Vec<Handler> {
        match kind {
            EventKind::Down => &mut self.on_down,
            EventKind::Up => &mut self.on_up,
            EventKind::Axes => &mut self.on_axes,
        }
    }

    /// Adds `handler` unless it is already subscribed for `kind`
    pub fn insert(&mut self, kind: EventKind, handler: &Handler) -> bool {
        let handlers = self.handlers_mut(kind);
        if handlers.iter().any(|h| h.same(handler)) {
            return false;
        }
        handlers.push(handler.clone());
        true
    }

    pub fn remove(&mut self, kind: EventKind, handler: &Handler) -> bool {
        let handlers = self.handlers_mut(kind);
        let before = handlers.len();
        handlers.retain(|h| !h.same(handler));
        handlers.len() != before
    }

    /// Handlers to run for `kind`, empty while suppressed
    pub fn targets(&self, kind: EventKind) -> Vec<Handler> {
        if self.suppressed {
            return Vec::new();
        }
        self.handlers(kind).clone()
    }

    pub fn has_handlers(&self) -> bool {
        !(self.on_down.is_empty() && self.on_up.is_empty() && self.on_axes.is_empty())
    }

    pub fn info(&self, index: usize) -> BucketInfo {
        BucketInfo {
            index,
            suppressed: self.suppressed,
            has_down: !self.on_down.is_empty(),
            has_up: !self.on_up.is_empty(),
            has_axes: !self.on_axes.is_empty(),
        }
    }
}
