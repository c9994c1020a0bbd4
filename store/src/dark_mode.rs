//! Dark mode preference cell.
//!
//! Reads the preference from the `darkMode` storage key and mirrors it onto
//! the document as the `dark` class on `<html>`. Every change is written back
//! to storage and re-applied to the document, so styling that keys off the
//! class updates without its own subscription.
//!
//! TRADE-OFFS
//! ==========
//! The stored value is the bare string `"true"` or `"false"`. Anything else
//! reads as `false`; a corrupt preference is never worth failing startup.

#[cfg(test)]
#[path = "dark_mode_test.rs"]
mod dark_mode_test;

use std::rc::Rc;

use crate::cell::{StateCell, StoreError, Subscription};
use crate::storage::KeyValueStore;

/// Storage key holding the preference.
pub const STORAGE_KEY: &str = "darkMode";

/// Class toggled on the root element while dark mode is on.
pub const DARK_CLASS: &str = "dark";

/// Document-wide visual-mode marker.
pub trait VisualModeMarker {
    /// Add the marker when `enabled`, remove it otherwise.
    fn apply(&self, enabled: bool);
}

/// Marker for environments without a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMarker;

impl VisualModeMarker for NoMarker {
    fn apply(&self, _enabled: bool) {}
}

/// The `darkMode` state cell plus its document marker.
#[derive(Clone, Debug)]
pub struct DarkMode {
    cell: StateCell<bool>,
}

impl DarkMode {
    /// Load the preference (default `false`) and apply it to `marker`.
    ///
    /// The marker stays subscribed for the life of the cell.
    pub fn initialize(storage: Rc<dyn KeyValueStore>, marker: impl VisualModeMarker + 'static) -> Self {
        let cell = StateCell::initialize(storage, STORAGE_KEY, false);
        // Never detached.
        cell.subscribe(move |enabled: &bool| marker.apply(*enabled));
        Self { cell }
    }

    #[must_use]
    pub fn get(&self) -> bool {
        self.cell.get()
    }

    /// Set the preference, persist it and update the document marker.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Persistence` when the write-through fails; the
    /// preference and marker are still updated for this session.
    pub fn set(&self, enabled: bool) -> Result<(), StoreError> {
        self.cell.set(enabled)
    }

    /// Flip the preference and return the new value.
    ///
    /// A failed write-through is logged by the cell and otherwise ignored
    /// here; the toggle still takes effect for this session.
    pub fn toggle(&self) -> bool {
        let next = !self.get();
        if let Err(e) = self.set(next) {
            log::debug!("dark mode toggle not persisted: {e}");
        }
        next
    }

    pub fn subscribe(&self, observer: impl Fn(&bool) + 'static) -> Subscription {
        self.cell.subscribe(observer)
    }

    /// Underlying state cell.
    #[must_use]
    pub fn cell(&self) -> &StateCell<bool> {
        &self.cell
    }
}
