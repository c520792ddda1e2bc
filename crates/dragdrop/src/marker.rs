use std::time::Duration;

use plate_model::view::DROP_TARGET_MARKER;
use plate_model::{MarkerOptions, Model, Range};

use crate::timer::{Delayed, Throttled};

/// Shows and hides the drop indicator. Updates are coalesced to one per
/// interval (the last range wins); removal waits one interval so that a
/// drag-over right after a drag-leave can cancel it.
#[derive(Debug)]
pub struct DropMarkerController {
    update: Throttled<Range>,
    removal: Delayed,
}

impl DropMarkerController {
    pub fn new(interval: Duration) -> Self {
        Self {
            update: Throttled::new(interval),
            removal: Delayed::new(interval),
        }
    }

    pub fn schedule_update(&mut self, range: Range, now: Duration) {
        tracing::trace!(?range, "drop marker update scheduled");
        self.update.schedule(range, now);
    }

    pub fn schedule_removal(&mut self, now: Duration) {
        tracing::trace!("drop marker removal scheduled");
        self.removal.schedule(now);
    }

    pub fn cancel_removal(&mut self) {
        self.removal.cancel();
    }

    pub fn has_pending_update(&self) -> bool {
        self.update.is_pending()
    }

    pub fn has_pending_removal(&self) -> bool {
        self.removal.is_pending()
    }

    /// Drops both pending actions.
    pub fn cancel(&mut self) {
        self.update.cancel();
        self.removal.cancel();
    }

    /// Cancels pending actions and removes the marker right away.
    pub fn remove(&mut self, model: &mut Model) {
        self.cancel();
        remove_marker(model);
    }

    /// Runs the actions whose deadline has passed, earliest first.
    pub fn tick(&mut self, model: &mut Model, now: Duration) {
        let update_first = match (self.update.deadline(), self.removal.deadline()) {
            (Some(update), Some(removal)) => update <= removal,
            _ => true,
        };
        if update_first {
            self.run_update(model, now);
            self.run_removal(model, now);
        } else {
            self.run_removal(model, now);
            self.run_update(model, now);
        }
    }

    fn run_update(&mut self, model: &mut Model, now: Duration) {
        if let Some(range) = self.update.take_due(now) {
            apply_update(model, range);
        }
    }

    fn run_removal(&mut self, model: &mut Model, now: Duration) {
        if self.removal.take_due(now) {
            remove_marker(model);
        }
    }
}

fn apply_update(model: &mut Model, range: Range) {
    if model
        .marker(DROP_TARGET_MARKER)
        .is_some_and(|marker| marker.range == range)
    {
        return;
    }
    let result = model.change(|model| {
        if model.has_marker(DROP_TARGET_MARKER) {
            model.update_marker(DROP_TARGET_MARKER, range)
        } else {
            model.add_marker(DROP_TARGET_MARKER, MarkerOptions::ui(range))
        }
    });
    if let Err(err) = result {
        tracing::warn!(%err, "failed to place the drop marker");
    }
}

fn remove_marker(model: &mut Model) {
    if !model.has_marker(DROP_TARGET_MARKER) {
        return;
    }
    if let Err(err) = model.change(|model| model.remove_marker(DROP_TARGET_MARKER)) {
        tracing::warn!(%err, "failed to remove the drop marker");
    }
}
