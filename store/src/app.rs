//! Application context owning every persisted state cell.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AppStores` is built once at startup and handed to UI components, which
//! subscribe to the cells they render and call the mutation helpers here.
//! Each cell owns exactly one storage key; nothing here reads another cell's
//! key directly.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::rc::Rc;

use crate::cell::{StateCell, StoreError};
use crate::dark_mode::{DarkMode, VisualModeMarker};
use crate::records::{BOOKMARKS_KEY, Bookmark, CATEGORIES_KEY, Category};
use crate::storage::KeyValueStore;

/// Dark mode, bookmarks and categories, all backed by one storage.
#[derive(Clone, Debug)]
pub struct AppStores {
    pub dark_mode: DarkMode,
    pub bookmarks: StateCell<Vec<Bookmark>>,
    pub categories: StateCell<Vec<Category>>,
}

impl AppStores {
    /// Initialize all cells from `storage`. Missing or corrupt keys fall back
    /// to `false` and empty lists.
    pub fn open(storage: Rc<dyn KeyValueStore>, marker: impl VisualModeMarker + 'static) -> Self {
        Self {
            dark_mode: DarkMode::initialize(Rc::clone(&storage), marker),
            bookmarks: StateCell::initialize(Rc::clone(&storage), BOOKMARKS_KEY, Vec::new()),
            categories: StateCell::initialize(storage, CATEGORIES_KEY, Vec::new()),
        }
    }

    /// Open against `window.localStorage` with the `<html>` class marker.
    ///
    /// # Errors
    ///
    /// Returns an error when the browser exposes no local storage.
    #[cfg(feature = "hydrate")]
    pub fn open_browser() -> Result<Self, crate::storage::StorageError> {
        let storage = crate::web::LocalStorage::open()?;
        Ok(Self::open(Rc::new(storage), crate::web::DocumentMarker))
    }

    // =========================================================================
    // BOOKMARKS
    // =========================================================================

    /// Save `bookmark`, replacing the entry with the same URL in place or
    /// appending it. A bookmark without a URL is always appended.
    ///
    /// # Errors
    ///
    /// Returns the write-through failure, if any.
    pub fn add_bookmark(&self, bookmark: Bookmark) -> Result<(), StoreError> {
        let url = bookmark.url().map(str::to_string);
        self.bookmarks.update(|list| {
            let existing = url.as_deref().and_then(|url| list.iter_mut().find(|b| b.url() == Some(url)));
            match existing {
                Some(existing) => *existing = bookmark,
                None => list.push(bookmark),
            }
        })
    }

    /// Remove the bookmark with `url`. Returns whether one was removed; no
    /// write happens when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns the write-through failure, if any.
    pub fn remove_bookmark(&self, url: &str) -> Result<bool, StoreError> {
        if !self.bookmarks.with(|list| list.iter().any(|b| b.url() == Some(url))) {
            return Ok(false);
        }
        self.bookmarks.update(|list| list.retain(|b| b.url() != Some(url)))?;
        Ok(true)
    }

    /// Bookmarks filed under `category` (`None` = uncategorized), in list order.
    #[must_use]
    pub fn bookmarks_in(&self, category: Option<&str>) -> Vec<Bookmark> {
        self.bookmarks
            .with(|list| list.iter().filter(|b| b.is_in(category)).cloned().collect())
    }

    // =========================================================================
    // CATEGORIES
    // =========================================================================

    /// Append `category` unless one with the same name exists. Returns
    /// whether it was added. Unnamed categories are always appended.
    ///
    /// # Errors
    ///
    /// Returns the write-through failure, if any.
    pub fn add_category(&self, category: Category) -> Result<bool, StoreError> {
        if let Some(name) = category.name() {
            if self.categories.with(|list| list.iter().any(|c| c.name() == Some(name))) {
                return Ok(false);
            }
        }
        self.categories.update(|list| list.push(category))?;
        Ok(true)
    }

    /// Remove the category `name` and move its bookmarks to uncategorized.
    /// Returns whether the category existed.
    ///
    /// Both cells are updated even if the first write-through fails; the
    /// first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns the first write-through failure, if any.
    pub fn remove_category(&self, name: &str) -> Result<bool, StoreError> {
        if !self.categories.with(|list| list.iter().any(|c| c.name() == Some(name))) {
            return Ok(false);
        }
        let removed = self.categories.update(|list| list.retain(|c| c.name() != Some(name)));

        let referenced = self.bookmarks.with(|list| list.iter().any(|b| b.is_in(Some(name))));
        let detached = if referenced {
            self.bookmarks.update(|list| {
                for bookmark in list.iter_mut().filter(|b| b.is_in(Some(name))) {
                    bookmark.set_category(None);
                }
            })
        } else {
            Ok(())
        };

        removed.and(detached)?;
        Ok(true)
    }
}
