//! Controller registry and the bulk activation switch

use crate::context::{lock, GamepadContext};
use crate::controller::controller::{Controller, ControllerId};
use crate::error::GamepadError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

// Every controller created or added and not removed since
#[derive(Debug, Default)]
pub(crate) struct ControllerRegistry {
    controllers: HashMap<ControllerId, Controller>,
}

impl ControllerRegistry {
    pub fn insert(&mut self, controller: Controller) {
        controller.set_registered(true);
        self.controllers.insert(controller.id(), controller);
    }

    pub fn remove(&mut self, id: ControllerId) -> Option<Controller> {
        let controller = self.controllers.remove(&id)?;
        controller.set_registered(false);
        Some(controller)
    }

    pub fn get(&self, id: ControllerId) -> Option<Controller> {
        self.controllers.get(&id).cloned()
    }

    pub fn by_key(&self, key: &str) -> Vec<Controller> {
        let mut matches: Vec<Controller> = self
            .controllers
            .values()
            .filter(|controller| controller.key() == key)
            .cloned()
            .collect();
        matches.sort_by_key(Controller::id);
        matches
    }

    pub fn active(&self) -> Vec<Controller> {
        let mut active: Vec<Controller> = self
            .controllers
            .values()
            .filter(|controller| controller.is_active())
            .cloned()
            .collect();
        active.sort_by_key(Controller::id);
        active
    }

    pub fn all(&self) -> Vec<Controller> {
        let mut all: Vec<Controller> = self.controllers.values().cloned().collect();
        all.sort_by_key(Controller::id);
        all
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn drain(&mut self) -> Vec<Controller> {
        self.controllers.drain().map(|(_, controller)| controller).collect()
    }
}

impl GamepadContext {
    /// Creates and registers a controller
    ///
    /// An active controller joins the global active set, which is recorded
    /// in the history with the next flush. Creating an inactive controller
    /// is not a transition and records nothing.
    pub fn create_controller(
        &self,
        key: impl Into<String>,
        active: bool,
        bound_device: Option<usize>,
    ) -> Controller {
        let id = self.next_controller_id();
        let controller = Controller::new(
            id,
            key.into(),
            bound_device,
            active,
            Arc::downgrade(&self.shared),
        );
        lock(&self.shared.registry).insert(controller.clone());
        info!(
            "Created controller {} ({}) active={} bound={:?}",
            id,
            controller.key(),
            active,
            bound_device
        );

        if active {
            self.record();
        }
        controller
    }

    /// Registers a controller of this context again, e.g. after `destroy`
    ///
    /// For a controller that is still registered this only sets its flag, and
    /// records like `activate`/`disable` would.
    pub fn add_controller(
        &self,
        controller: &Controller,
        active: bool,
    ) -> Result<Controller, GamepadError> {
        if !controller.belongs_to(&self.shared) {
            return Err(GamepadError::ForeignController(controller.id()));
        }

        if controller.is_registered() {
            // already part of the active set, only a real flip records
            controller.set_active(active);
            debug!("Controller {} already registered, active={}", controller.id(), active);
            return Ok(controller.clone());
        }

        controller.force_active(active);
        lock(&self.shared.registry).insert(controller.clone());
        debug!("Added controller {} active={}", controller.id(), active);

        if active {
            self.record();
        }
        Ok(controller.clone())
    }

    pub fn remove_controller(&self, id: ControllerId) -> Option<Controller> {
        let removed = lock(&self.shared.registry).remove(id);
        match &removed {
            Some(controller) => debug!("Removed controller {} ({})", id, controller.key()),
            None => debug!("Controller {} not registered, nothing to remove", id),
        }
        removed
    }

    pub fn controller(&self, id: ControllerId) -> Option<Controller> {
        lock(&self.shared.registry).get(id)
    }

    /// All controllers sharing `key`, ordered by id
    pub fn controllers_by_key(&self, key: &str) -> Vec<Controller> {
        lock(&self.shared.registry).by_key(key)
    }

    /// Snapshot of the currently active controllers, ordered by id
    pub fn active_controllers(&self) -> Vec<Controller> {
        lock(&self.shared.registry).active()
    }

    pub fn controllers(&self) -> Vec<Controller> {
        lock(&self.shared.registry).all()
    }

    /// Activates exactly the listed controllers and disables every other one
    ///
    /// Unknown ids are skipped so one stale id never blocks the switch.
    pub fn switch_active<I>(&self, ids: I)
    where
        I: IntoIterator<Item = ControllerId>,
    {
        let ids: HashSet<ControllerId> = ids.into_iter().collect();
        let controllers = self.controllers();

        for id in &ids {
            if !controllers.iter().any(|controller| controller.id() == *id) {
                debug!("Ignoring unknown controller {} in switch", id);
            }
        }

        let mut changed = 0;
        for controller in &controllers {
            if controller.set_active(ids.contains(&controller.id())) {
                changed += 1;
            }
        }
        debug!(
            "Switched active set to {} controllers ({} changed)",
            ids.len(),
            changed
        );
    }
}
