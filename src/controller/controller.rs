use crate::config::AxisConfig;
use crate::context::{lock, read, GamepadContext, Shared};
use crate::controller::bucket::{BucketInfo, EventBucket};
use crate::controller::event::{EventKind, Handler, InputEvent};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, info, warn};

/// Identifier of a controller, unique within its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub(crate) u64);

impl ControllerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctrl-{}", self.0)
    }
}

// Mutable part of a controller, shared by all clones of the handle
#[derive(Debug, Default)]
struct ControllerState {
    active: bool,
    registered: bool,
    buckets: BTreeMap<usize, EventBucket>,
}

/// Logical controller bound to one or all physical devices
///
/// `Controller` is a cheap handle; clones refer to the same subscriptions and
/// flags. A controller only receives input from the loop while it is active
/// and registered in its context.
#[derive(Clone)]
pub struct Controller {
    id: ControllerId,
    key: Arc<str>,
    bound_device: Option<usize>,
    state: Arc<Mutex<ControllerState>>,
    context: Weak<Shared>,
}

impl Controller {
    pub(crate) fn new(
        id: ControllerId,
        key: String,
        bound_device: Option<usize>,
        active: bool,
        context: Weak<Shared>,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            bound_device,
            state: Arc::new(Mutex::new(ControllerState {
                active,
                ..ControllerState::default()
            })),
            context,
        }
    }

    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn bound_device(&self) -> Option<usize> {
        self.bound_device
    }

    /// Unbound controllers accept every device
    pub fn accepts_device(&self, device: usize) -> bool {
        self.bound_device.map_or(true, |bound| bound == device)
    }

    pub fn is_active(&self) -> bool {
        lock(&self.state).active
    }

    pub fn is_registered(&self) -> bool {
        lock(&self.state).registered
    }

    fn axis_config(&self) -> AxisConfig {
        self.context
            .upgrade()
            .map(|shared| read(&shared.config).axes)
            .unwrap_or_default()
    }

    /// Registers `handler` for `kind` transitions on `index`
    ///
    /// Subscribing the same handler twice is a no-op. `Axes` subscriptions
    /// are only kept on the configured stick indices; elsewhere the bucket is
    /// created but nothing is stored and `false` is returned.
    pub fn subscribe(&self, index: usize, kind: EventKind, handler: &Handler) -> bool {
        let axes = self.axis_config();
        let mut state = lock(&self.state);
        let bucket = state.buckets.entry(index).or_default();

        if kind == EventKind::Axes && !axes.is_stick(index) {
            warn!(
                "Controller {} ignores axes subscription on non-stick index {}",
                self.id, index
            );
            return false;
        }

        if bucket.insert(kind, handler) {
            debug!("Controller {} subscribed {} on index {}", self.id, kind, index);
        } else {
            debug!(
                "Controller {} already has this {} handler on index {}",
                self.id, kind, index
            );
        }
        true
    }

    pub fn unsubscribe(&self, index: usize, kind: EventKind, handler: &Handler) {
        let mut state = lock(&self.state);
        if let Some(bucket) = state.buckets.get_mut(&index) {
            if bucket.remove(kind, handler) {
                debug!(
                    "Controller {} unsubscribed {} on index {}",
                    self.id, kind, index
                );
            }
        }
    }

    /// Sets the suppression flag of every listed bucket that exists
    pub fn set_suppressed<I>(&self, indices: I, suppressed: bool)
    where
        I: IntoIterator<Item = usize>,
    {
        let mut state = lock(&self.state);
        for index in indices {
            match state.buckets.get_mut(&index) {
                Some(bucket) => {
                    bucket.suppressed = suppressed;
                    debug!(
                        "Controller {} index {} suppressed={}",
                        self.id, index, suppressed
                    );
                }
                None => debug!(
                    "Controller {} has no bucket {} to suppress",
                    self.id, index
                ),
            }
        }
    }

    pub fn suppress(&self, index: usize) {
        self.set_suppressed([index], true);
    }

    pub fn unsuppress(&self, index: usize) {
        self.set_suppressed([index], false);
    }

    pub fn is_suppressed(&self, index: usize) -> bool {
        lock(&self.state)
            .buckets
            .get(&index)
            .is_some_and(|bucket| bucket.suppressed)
    }

    pub fn has_subscriptions(&self, index: usize) -> bool {
        lock(&self.state)
            .buckets
            .get(&index)
            .is_some_and(EventBucket::has_handlers)
    }

    /// Delivers `event` to the handlers of `index` and returns how many ran
    ///
    /// Nothing runs when the controller left its registry, the bucket is
    /// missing or suppressed, or an `Axes` event targets a non-stick index.
    /// Handlers run after the controller lock is released and may freely call
    /// back into the controller or its context.
    pub fn emit(&self, index: usize, event: InputEvent) -> usize {
        let kind = event.kind();
        if kind == EventKind::Axes && !self.axis_config().is_stick(index) {
            return 0;
        }

        let targets = {
            let state = lock(&self.state);
            if !state.registered {
                debug!("Controller {} is not registered, dropping {:?}", self.id, event);
                return 0;
            }
            match state.buckets.get(&index) {
                Some(bucket) => bucket.targets(kind),
                None => return 0,
            }
        };

        let failed = targets.iter().filter(|handler| !handler.invoke(&event)).count();
        if failed > 0 {
            warn!(
                "{} of {} handlers failed on controller {} index {}",
                failed,
                targets.len(),
                self.id,
                index
            );
        }
        targets.len()
    }

    pub fn activate(&self) {
        self.set_active(true);
    }

    pub fn disable(&self) {
        self.set_active(false);
    }

    // A real transition of a registered controller asks for a history record
    pub(crate) fn set_active(&self, active: bool) -> bool {
        let registered = {
            let mut state = lock(&self.state);
            if state.active == active {
                return false;
            }
            state.active = active;
            state.registered
        };

        debug!("Controller {} active={}", self.id, active);
        if registered {
            if let Some(context) = self.context() {
                context.record();
            }
        }
        true
    }

    // Sets the flag without asking for a record
    pub(crate) fn force_active(&self, active: bool) {
        lock(&self.state).active = active;
    }

    /// Removes the controller from its context
    pub fn destroy(&self) {
        match self.context() {
            Some(context) => {
                context.remove_controller(self.id);
            }
            None => self.set_registered(false),
        }
        info!("Controller {} ({}) destroyed", self.id, self.key);
    }

    /// Snapshot of all buckets ordered by index
    pub fn buckets(&self) -> Vec<BucketInfo> {
        lock(&self.state)
            .buckets
            .iter()
            .map(|(index, bucket)| bucket.info(*index))
            .collect()
    }

    pub(crate) fn suppression_snapshot(&self) -> BTreeMap<usize, bool> {
        lock(&self.state)
            .buckets
            .iter()
            .map(|(index, bucket)| (*index, bucket.suppressed))
            .collect()
    }

    // Buckets created after the snapshot keep their current flag
    pub(crate) fn restore_suppression(&self, snapshot: &BTreeMap<usize, bool>) {
        let mut state = lock(&self.state);
        for (index, suppressed) in snapshot {
            if let Some(bucket) = state.buckets.get_mut(index) {
                bucket.suppressed = *suppressed;
            }
        }
    }

    pub(crate) fn set_registered(&self, registered: bool) {
        lock(&self.state).registered = registered;
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared>) -> bool {
        std::ptr::eq(self.context.as_ptr(), Arc::as_ptr(shared))
    }

    fn context(&self) -> Option<GamepadContext> {
        self.context
            .upgrade()
            .map(|shared| GamepadContext { shared })
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("bound_device", &self.bound_device)
            .field("active", &self.is_active())
            .finish()
    }
}
