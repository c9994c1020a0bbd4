//! Client-side state for the bookmark manager.
//!
//! SYSTEM CONTEXT
//! ==============
//! The frontend keeps three pieces of state in the browser's local storage:
//! the dark-mode preference, the bookmark list and the category list. Each is
//! an observable `StateCell` that writes through to storage on every change.
//! `AppStores` owns all three and is what UI code receives.
//!
//! `color` derives tile colors from bookmark icons.
//!
//! With the `hydrate` feature, `web` binds storage and the dark-mode marker to
//! the real browser; without it everything runs against `MemoryStorage`.

pub mod app;
pub mod cell;
pub mod color;
pub mod dark_mode;
pub mod quantize;
pub mod records;
pub mod storage;
#[cfg(feature = "hydrate")]
pub mod web;


pub use app::AppStores;
pub use cell::{StateCell, StoreError, Subscription};
pub use color::{ColorError, ContrastingColor, IconTheme, Rgb, get_contrasting_color};
pub use dark_mode::{DarkMode, NoMarker, VisualModeMarker};
pub use records::{Bookmark, Category};
pub use storage::{KeyValueStore, MemoryStorage, StorageError};
