//! Poll driver running the input loop on a tokio task
//!
//! The driver owns the device source and calls [`GamepadContext::tick`] once
//! per frame while the context is running. While it is stopped the driver
//! parks on the running flag and only wakes up to flush history records, so
//! activation changes made outside the loop still land in the history after
//! the work that requested them.

use crate::context::{GamepadContext, InitOptions};
use crate::error::GamepadError;
use crate::input::source::DeviceSource;
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[state]
#[derive(Debug, Clone)]
pub enum DriverState {
    Initializing, // Source attached, context not yet brought up
    Polling,      // Ticking every frame
    Stopped,      // Loop left, final flush pending
}

#[machine]
pub struct PollDriver<S: DriverState> {
    context: GamepadContext,
    source: Box<dyn DeviceSource>,
    frame_interval: Duration,
}

impl<S: DriverState> PollDriver<S> {
    pub fn context(&self) -> &GamepadContext {
        &self.context
    }
}

impl PollDriver<Initializing> {
    pub fn create(context: GamepadContext, source: Box<dyn DeviceSource>) -> Self {
        debug!("Creating poll driver");
        Self::new(context, source, Duration::ZERO)
    }

    /// Initializes the context against the attached source
    ///
    /// An already initialized context keeps its configuration and hooks.
    pub fn initialize(
        mut self,
        options: InitOptions,
    ) -> Result<PollDriver<Polling>, GamepadError> {
        if !self.context.initialize(options, &*self.source)? {
            warn!("Context was already initialized, polling with its current config");
        }

        let frame_interval_ms = self.context.config().frame_interval_ms.max(1);
        self.frame_interval = Duration::from_millis(frame_interval_ms);
        info!("Poll driver ready, frame interval {}ms", frame_interval_ms);
        Ok(self.transition())
    }
}

impl PollDriver<Polling> {
    /// Ticks until `shutdown_rx` fires or its sender is dropped
    pub async fn run_until_shutdown(
        mut self,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> PollDriver<Stopped> {
        info!("Starting input polling loop");

        let mut frames = tokio::time::interval(self.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut running = self.context.running_receiver();

        loop {
            let is_running = *running.borrow_and_update();

            if is_running {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Shutdown signal received for poll driver");
                        break;
                    }

                    _ = frames.tick() => {
                        self.context.tick(&mut *self.source);
                    }
                }
            } else {
                self.context.flush();
                debug!("Input loop stopped, poll driver idle");

                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Shutdown signal received for poll driver");
                        break;
                    }

                    changed = running.changed() => {
                        if changed.is_err() {
                            warn!("Running flag closed, leaving polling loop");
                            break;
                        }
                        frames.reset();
                    }

                    _ = self.context.shared.record_requested.notified() => {
                        // let the requesting work finish before capturing
                        tokio::task::yield_now().await;
                        self.context.flush();
                    }
                }
            }
        }

        self.transition()
    }
}

impl PollDriver<Stopped> {
    /// Flushes what the last frame left pending
    pub fn finish(self) {
        if self.context.flush() {
            debug!("Flushed pending history record on shutdown");
        }
        info!("Poll driver stopped");
    }
}

/// Handle for a poll driver running in a tokio task
#[derive(Debug, Default)]
pub struct PollDriverHandle {
    task_handle: Option<JoinHandle<()>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl PollDriverHandle {
    /// Initializes `context` against `source` and starts polling
    ///
    /// Must be called from within a tokio runtime. Initialization errors are
    /// returned before anything is spawned.
    pub fn spawn<S>(
        context: GamepadContext,
        source: S,
        options: InitOptions,
    ) -> Result<Self, GamepadError>
    where
        S: DeviceSource + 'static,
    {
        let driver = PollDriver::create(context, Box::new(source)).initialize(options)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task_handle = tokio::spawn(async move {
            driver.run_until_shutdown(shutdown_rx).await.finish();
        });

        info!("Poll driver spawned");
        Ok(Self {
            task_handle: Some(task_handle),
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn is_finished(&self) -> bool {
        self.task_handle
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Signals the driver and waits for its task
    pub async fn shutdown(&mut self) -> Result<(), GamepadError> {
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Poll driver task already terminated");
            }
        }

        match self.task_handle.take() {
            Some(handle) => handle.await.map_err(|e| {
                error!("Poll driver task failed: {}", e);
                GamepadError::DriverError(format!("poll driver task failed: {}", e))
            }),
            None => {
                debug!("Poll driver already shut down");
                Ok(())
            }
        }
    }
}
