//! Activation history with debounced recording and rollback
//!
//! Every activation change asks for a record. Requests made before the next
//! flush coalesce into one entry describing the active set at flush time, so
//! toggling several controllers "at once" yields a single step.
//!
//! ```text
//! activate/disable ──► record() ──► pending ──► flush() ──► entries
//!                                                             │
//!                       switch_active ◄── rollback(offset) ◄──┘
//! ```

use crate::context::{lock, GamepadContext};
use crate::controller::controller::ControllerId;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Suppression flags of one controller that was active when recorded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub id: ControllerId,
    pub suppression: BTreeMap<usize, bool>,
}

/// One step of the activation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub recorded_at: DateTime<Local>,
    pub controllers: Vec<ControllerSnapshot>,
}

impl HistoryEntry {
    pub fn controller_ids(&self) -> Vec<ControllerId> {
        self.controllers.iter().map(|snapshot| snapshot.id).collect()
    }

    pub fn suppression_of(&self, id: ControllerId) -> Option<&BTreeMap<usize, bool>> {
        self.controllers
            .iter()
            .find(|snapshot| snapshot.id == id)
            .map(|snapshot| &snapshot.suppression)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RollbackOptions {
    /// Also restore the captured per-bucket suppression flags
    pub restore_suppression: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ActivationHistory {
    entries: Vec<HistoryEntry>,
    pending: bool,
    // 0 keeps everything
    capacity: usize,
}

impl ActivationHistory {
    /// Marks a record as pending, `true` if this opened a new window
    pub fn request(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
        self.enforce_capacity();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.enforce_capacity();
    }

    fn enforce_capacity(&mut self) {
        if self.capacity > 0 && self.entries.len() > self.capacity {
            let excess = self.entries.len() - self.capacity;
            self.entries.drain(..excess);
            debug!("Dropped {} old history entries", excess);
        }
    }

    /// Pops `offset + 1` entries (clamped) and returns the oldest one popped
    ///
    /// The newest entry is the state after the last change, so going back
    /// `offset` changes lands one entry further down.
    pub fn truncate_for_rollback(&mut self, offset: usize) -> Option<HistoryEntry> {
        if offset == 0 || self.entries.is_empty() {
            return None;
        }
        let remove = offset.saturating_add(1).min(self.entries.len());
        let start = self.entries.len() - remove;
        self.entries.drain(start..).next()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.pending = false;
    }

    /// Most recent first
    pub fn peek(&self) -> Vec<HistoryEntry> {
        self.entries.iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl GamepadContext {
    /// Requests a history record
    ///
    /// Only the first request before a flush schedules anything; later ones
    /// are absorbed and the flush captures the final active set.
    pub fn record(&self) {
        let opened = lock(&self.shared.history).request();
        if opened {
            debug!("History record scheduled");
            self.shared.record_requested.notify_one();
        }
    }

    /// Runs a pending record, returns whether an entry was appended
    pub fn flush(&self) -> bool {
        if !lock(&self.shared.history).take_pending() {
            return false;
        }

        let entry = self.capture_entry();
        debug!(
            "Recording history entry with {} active controllers",
            entry.controllers.len()
        );
        lock(&self.shared.history).push(entry);
        true
    }

    pub fn has_pending_record(&self) -> bool {
        lock(&self.shared.history).is_pending()
    }

    fn capture_entry(&self) -> HistoryEntry {
        let controllers = self
            .active_controllers()
            .iter()
            .map(|controller| ControllerSnapshot {
                id: controller.id(),
                suppression: controller.suppression_snapshot(),
            })
            .collect();

        HistoryEntry {
            recorded_at: Local::now(),
            controllers,
        }
    }

    /// Goes back `offset` activation changes
    ///
    /// Pending requests are flushed first. An offset of 0 or an empty history
    /// does nothing; offsets beyond the depth land on the oldest entry. The
    /// restored state is recorded again with the next flush so it becomes the
    /// newest entry.
    pub fn rollback(&self, offset: usize, options: RollbackOptions) -> Option<HistoryEntry> {
        if offset == 0 {
            debug!("Rollback offset 0 ignored");
            return None;
        }

        self.flush();
        let Some(target) = lock(&self.shared.history).truncate_for_rollback(offset) else {
            debug!("History empty, nothing to roll back");
            return None;
        };

        self.switch_active(target.controller_ids());

        if options.restore_suppression {
            for snapshot in &target.controllers {
                match self.controller(snapshot.id) {
                    Some(controller) => controller.restore_suppression(&snapshot.suppression),
                    None => debug!(
                        "Controller {} no longer exists, skipping suppression restore",
                        snapshot.id
                    ),
                }
            }
        }

        self.record();
        info!(
            "Rolled back {} step(s) to entry from {}",
            offset,
            target.recorded_at.format("%H:%M:%S.%3f")
        );
        Some(target)
    }

    /// Forgets all history, e.g. when a new input scene starts
    pub fn clear_history(&self) {
        lock(&self.shared.history).clear();
        debug!("History cleared");
    }

    /// History entries, most recent first
    ///
    /// Pending requests are not flushed, they show up after the next flush.
    pub fn peek_history(&self) -> Vec<HistoryEntry> {
        lock(&self.shared.history).peek()
    }

    pub fn history_len(&self) -> usize {
        lock(&self.shared.history).len()
    }
}
