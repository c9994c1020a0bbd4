//! Browser bindings: `window.localStorage` and the `<html>` class marker.
//!
//! Requires a browser environment; only compiled with the `hydrate` feature.

use wasm_bindgen::JsValue;

use crate::dark_mode::{DARK_CLASS, VisualModeMarker};
use crate::storage::{KeyValueStore, StorageError};

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

/// Route `log` output to the browser console and panics to `console.error`.
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Debug) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("logger already set: {e}")));
    }
}

/// `window.localStorage`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Grab the window's local storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` outside a window or when storage
    /// access is denied.
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window().ok_or_else(|| StorageError::Unavailable("no window".into()))?;
        match window.local_storage() {
            Ok(Some(storage)) => Ok(Self { storage }),
            Ok(None) => Err(StorageError::Unavailable("localStorage not provided".into())),
            Err(e) => Err(StorageError::Unavailable(describe(&e))),
        }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(|e| StorageError::Unavailable(describe(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        // Browsers throw `QuotaExceededError` without reporting sizes.
        self.storage.set_item(key, value).map_err(|e| StorageError::Unavailable(describe(&e)))
    }
}

/// Toggles the `dark` class on `document.documentElement`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentMarker;

impl VisualModeMarker for DocumentMarker {
    fn apply(&self, enabled: bool) {
        let Some(root) = web_sys::window().and_then(|w| w.document()).and_then(|d| d.document_element()) else {
            return;
        };
        let class_list = root.class_list();
        let result = if enabled { class_list.add_1(DARK_CLASS) } else { class_list.remove_1(DARK_CLASS) };
        if let Err(e) = result {
            log::warn!("failed to toggle `{DARK_CLASS}` class: {}", describe(&e));
        }
    }
}
