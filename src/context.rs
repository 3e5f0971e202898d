//! Explicit context object holding every piece of gamepad state
//!
//! A [`GamepadContext`] replaces process-wide registries: it owns the
//! controller registry, the activation history, the tracked devices, the
//! configuration and the running flag. Clones share the same state, so a
//! context can be handed to the poll driver and kept by the application at
//! the same time. Independent contexts never observe each other.
//!
//! Operations are spread over the modules that implement them:
//! registry operations live in [`crate::controller::registry`], history
//! operations in [`crate::controller::history`] and the tick in
//! [`crate::input::input_loop`].

use crate::config::InputConfig;
use crate::controller::history::ActivationHistory;
use crate::controller::registry::ControllerRegistry;
use crate::controller::ControllerId;
use crate::error::GamepadError;
use crate::input::input_loop::InputLoop;
use crate::input::snapshot::DeviceSnapshot;
use crate::input::source::DeviceSource;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, info, warn};

/// Callback receiving a device snapshot
pub type DeviceCallback = Arc<dyn Fn(&DeviceSnapshot) + Send + Sync>;

/// Optional notifications fired by the input loop
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_connected: Option<DeviceCallback>,
    pub on_disconnected: Option<DeviceCallback>,

    /// Fired at most once per device and tick, when any diff event was found
    pub on_input: Option<DeviceCallback>,
}

impl LifecycleHooks {
    pub fn on_connected<F>(mut self, f: F) -> Self
    where
        F: Fn(&DeviceSnapshot) + Send + Sync + 'static,
    {
        self.on_connected = Some(Arc::new(f));
        self
    }

    pub fn on_disconnected<F>(mut self, f: F) -> Self
    where
        F: Fn(&DeviceSnapshot) + Send + Sync + 'static,
    {
        self.on_disconnected = Some(Arc::new(f));
        self
    }

    pub fn on_input<F>(mut self, f: F) -> Self
    where
        F: Fn(&DeviceSnapshot) + Send + Sync + 'static,
    {
        self.on_input = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_connected", &self.on_connected.is_some())
            .field("on_disconnected", &self.on_disconnected.is_some())
            .field("on_input", &self.on_input.is_some())
            .finish()
    }
}

/// Everything `initialize` accepts
#[derive(Clone, Debug, Default)]
pub struct InitOptions {
    pub config: InputConfig,
    pub hooks: LifecycleHooks,
}

impl InitOptions {
    pub fn with_config(config: InputConfig) -> Self {
        Self {
            config,
            hooks: LifecycleHooks::default(),
        }
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

pub(crate) struct Shared {
    pub(crate) config: RwLock<InputConfig>,
    pub(crate) hooks: RwLock<LifecycleHooks>,
    pub(crate) registry: Mutex<ControllerRegistry>,
    pub(crate) history: Mutex<ActivationHistory>,
    pub(crate) input: Mutex<InputLoop>,
    pub(crate) running: watch::Sender<bool>,
    pub(crate) record_requested: Notify,
    initialized: AtomicBool,
    next_id: AtomicU64,
}

/// Handle to one independent gamepad subsystem
#[derive(Clone)]
pub struct GamepadContext {
    pub(crate) shared: Arc<Shared>,
}

impl Default for GamepadContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GamepadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GamepadContext")
            .field("initialized", &self.is_initialized())
            .field("running", &self.is_running())
            .field("controllers", &lock(&self.shared.registry).len())
            .field("history", &lock(&self.shared.history).len())
            .finish()
    }
}

impl GamepadContext {
    /// Creates an empty, uninitialized and stopped context
    pub fn new() -> Self {
        let (running, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config: RwLock::new(InputConfig::default()),
                hooks: RwLock::new(LifecycleHooks::default()),
                registry: Mutex::new(ControllerRegistry::default()),
                history: Mutex::new(ActivationHistory::default()),
                input: Mutex::new(InputLoop::default()),
                running,
                record_requested: Notify::new(),
                initialized: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Brings the subsystem up
    ///
    /// Returns `Ok(false)` without touching anything when the context is
    /// already initialized. A source without gamepad support is fatal.
    pub fn initialize(
        &self,
        options: InitOptions,
        source: &dyn DeviceSource,
    ) -> Result<bool, GamepadError> {
        if self.is_initialized() {
            debug!("Gamepad context already initialized, ignoring");
            return Ok(false);
        }

        if !source.is_supported() {
            error!("Device source reports no gamepad support");
            return Err(GamepadError::Unsupported(
                "device source does not expose gamepad polling".to_string(),
            ));
        }

        let config = options.config.sanitized();
        info!("Initializing gamepad context with config: {:?}", config);

        lock(&self.shared.history).set_capacity(config.history_capacity);
        *write(&self.shared.config) = config;
        *write(&self.shared.hooks) = options.hooks;

        if self
            .shared
            .initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Gamepad context was initialized concurrently");
            return Ok(false);
        }

        self.start();
        info!("Gamepad context initialized");
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::SeqCst)
    }

    /// Stops the loop and forgets devices, controllers and history
    pub fn teardown(&self) {
        info!("Tearing down gamepad context");
        self.stop();

        lock(&self.shared.input).clear();

        let removed = lock(&self.shared.registry).drain();
        for controller in &removed {
            controller.set_registered(false);
        }
        debug!("Unregistered {} controllers", removed.len());

        lock(&self.shared.history).clear();
        self.shared.initialized.store(false, Ordering::SeqCst);
    }

    pub fn config(&self) -> InputConfig {
        read(&self.shared.config).clone()
    }

    pub(crate) fn next_controller_id(&self) -> ControllerId {
        ControllerId(self.shared.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn hooks(&self) -> LifecycleHooks {
        read(&self.shared.hooks).clone()
    }
}

// Runs a lifecycle hook with the same isolation as event handlers
pub(crate) fn fire_hook(hook: &Option<DeviceCallback>, name: &str, snapshot: &DeviceSnapshot) {
    if let Some(callback) = hook {
        if panic::catch_unwind(AssertUnwindSafe(|| callback(snapshot))).is_err() {
            error!("{} hook panicked for device {}", name, snapshot.index);
        }
    }
}

// Lock helpers. Handlers never run under a lock, so a poisoned lock still
// holds consistent data and is recovered.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
