//! Durable key-value storage behind the state cells.
//!
//! SYSTEM CONTEXT
//! ==============
//! In the browser this is `window.localStorage` (see `web::LocalStorage`).
//! Everywhere else, and in tests, `MemoryStorage` stands in for it. Cells only
//! ever talk to the `KeyValueStore` trait, one key per cell.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The write would exceed the backend's size limit.
    #[error("storage quota exceeded writing `{key}`: need {needed} bytes, limit {limit}")]
    QuotaExceeded { key: String, needed: usize, limit: usize },

    /// The backend is disabled or cannot be reached (private mode, blocked cookies).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Minimal string key-value store.
///
/// Takes `&self` for writes; backends use interior mutability the same way
/// the browser's `Storage` object does.
pub trait KeyValueStore {
    /// Read the raw value stored under `key`, `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

// =============================================================================
// MEMORY STORAGE
// =============================================================================

/// In-memory storage. Clones share the same entries, like two tabs of one
/// browser profile, so a store re-opened on a clone sees earlier writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that rejects writes once keys plus values exceed `limit` bytes.
    #[must_use]
    pub fn with_quota(limit: usize) -> Self {
        let storage = Self::new();
        storage.inner.borrow_mut().quota = Some(limit);
        storage
    }

    /// Make every read and write fail with `StorageError::Unavailable`.
    pub fn set_disabled(&self, disabled: bool) {
        self.inner.borrow_mut().disabled = disabled;
    }

    /// Seed a raw value, bypassing quota and disabled checks.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.inner.borrow_mut().entries.insert(key.to_string(), value.to_string());
    }

    /// Raw value under `key`, bypassing the disabled check.
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.borrow();
        if inner.disabled {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        Ok(inner.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disabled {
            return Err(StorageError::Unavailable("memory storage disabled".into()));
        }
        if let Some(limit) = inner.quota {
            let others: usize = inner
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { key: key.to_string(), needed, limit });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
