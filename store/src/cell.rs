//! Observable, write-through state cells.
//!
//! DESIGN
//! ======
//! A `StateCell<T>` owns one storage key. It is a cheap-clone handle (all
//! clones share the value and subscriber list) so UI code can hand it to
//! several components and observers can capture it to mutate re-entrantly.
//!
//! Delivery contract:
//! - `subscribe` calls the observer once, synchronously, with the current value.
//! - every `set` notifies all observers registered at that time, FIFO by
//!   subscription order.
//! - a `set` issued from inside an observer is queued and delivered after the
//!   current round, so every observer sees mutations in the order they happened.
//! - an observer registered mid-round starts from the latest value and is not
//!   handed the older values still in the queue.
//!
//! Execution is single-threaded; cells are `!Send` by construction.

#[cfg(test)]
#[path = "cell_test.rs"]
mod cell_test;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::storage::{KeyValueStore, StorageError};

/// Errors raised while reading or writing a cell's storage key.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A stored value is present but is not valid data for the cell's type.
    #[error("malformed value under `{key}`: {source}")]
    MalformedStorage { key: String, source: serde_json::Error },

    /// The cell's value could not be serialized.
    #[error("failed to serialize `{key}`: {source}")]
    Serialize { key: String, source: serde_json::Error },

    /// The storage backend could not be read.
    #[error("failed to read `{key}`: {source}")]
    Read { key: String, source: StorageError },

    /// The value changed in memory but the write-through failed.
    #[error("failed to persist `{key}`: {source}")]
    Persistence { key: String, source: StorageError },
}

/// Read and decode `key` from `storage`.
///
/// # Errors
///
/// Returns `StoreError::Read` when the backend fails and
/// `StoreError::MalformedStorage` when the stored text does not decode as `T`.
pub fn read_value<T: DeserializeOwned>(storage: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError> {
    let raw = storage
        .get(key)
        .map_err(|source| StoreError::Read { key: key.to_string(), source })?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::MalformedStorage { key: key.to_string(), source })
}

/// Encode `value` and write it to `key` in `storage`.
///
/// # Errors
///
/// Returns `StoreError::Serialize` or `StoreError::Persistence`.
pub fn write_value<T: Serialize>(storage: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let raw =
        serde_json::to_string(value).map_err(|source| StoreError::Serialize { key: key.to_string(), source })?;
    storage
        .set(key, &raw)
        .map_err(|source| StoreError::Persistence { key: key.to_string(), source })
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Deregistration handle returned by `subscribe`.
///
/// Dropping the handle keeps the observer registered; call `unsubscribe` to
/// stop delivery.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the observer. Later mutations are not delivered to it.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}

// =============================================================================
// STATE CELL
// =============================================================================

type Observer<T> = Rc<dyn Fn(&T)>;

struct Entry<T> {
    id: u64,
    /// Version of the value the observer was first called with.
    since: u64,
    observer: Observer<T>,
}

struct Observers<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

struct Inner<T> {
    key: String,
    storage: Rc<dyn KeyValueStore>,
    value: RefCell<T>,
    observers: Rc<RefCell<Observers<T>>>,
    /// Bumped on every `set`.
    version: Cell<u64>,
    pending: RefCell<VecDeque<(u64, T)>>,
    notifying: Cell<bool>,
}

/// Clears the `notifying` flag even if an observer panics.
struct NotifyingGuard<'a>(&'a Cell<bool>);

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A named, observable, persisted unit of state.
pub struct StateCell<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for StateCell<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateCell")
            .field("key", &self.inner.key)
            .field("value", &self.inner.value.borrow())
            .field("observers", &self.inner.observers.borrow().entries.len())
            .finish_non_exhaustive()
    }
}

impl<T> StateCell<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    /// Load the cell from `storage`.
    ///
    /// A missing key yields `default`. A malformed or unreadable value also
    /// yields `default` and logs a warning; initialization never fails.
    pub fn initialize(storage: Rc<dyn KeyValueStore>, key: impl Into<String>, default: T) -> Self {
        let key = key.into();
        let value = match read_value::<T>(storage.as_ref(), &key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                log::warn!("{e}; falling back to default");
                default
            }
        };
        Self {
            inner: Rc::new(Inner {
                key,
                storage,
                value: RefCell::new(value),
                observers: Rc::new(RefCell::new(Observers { next_id: 0, entries: Vec::new() })),
                version: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
                notifying: Cell::new(false),
            }),
        }
    }

    /// Storage key owned by this cell.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Run `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.inner.observers.borrow().entries.len()
    }

    /// Register `observer`, calling it immediately with the current value and
    /// again after every mutation.
    pub fn subscribe(&self, observer: impl Fn(&T) + 'static) -> Subscription {
        let observer: Observer<T> = Rc::new(observer);
        let since = self.inner.version.get();
        let id = {
            let mut observers = self.inner.observers.borrow_mut();
            let id = observers.next_id;
            observers.next_id += 1;
            observers.entries.push(Entry { id, since, observer: Rc::clone(&observer) });
            id
        };

        let current = self.get();
        observer(&current);

        let registry: Weak<RefCell<Observers<T>>> = Rc::downgrade(&self.inner.observers);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.borrow_mut().entries.retain(|entry| entry.id != id);
                }
            })),
        }
    }

    /// Replace the value, write it through to storage and notify observers.
    ///
    /// The in-memory value and the notifications always happen. An `Err`
    /// only reports that the write-through failed, so the value will not
    /// survive a reload; it is also logged as a warning.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Serialize` or `StoreError::Persistence`.
    pub fn set(&self, value: T) -> Result<(), StoreError> {
        *self.inner.value.borrow_mut() = value.clone();

        let persisted = write_value(self.inner.storage.as_ref(), &self.inner.key, &value);
        if let Err(e) = &persisted {
            log::warn!("{e}; keeping in-memory value for this session");
        }

        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);
        self.inner.pending.borrow_mut().push_back((version, value));
        self.drain_notifications();
        persisted
    }

    /// Mutate the value in place, then behave as `set`.
    ///
    /// # Errors
    ///
    /// Same as `set`.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<(), StoreError> {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    fn drain_notifications(&self) {
        if self.inner.notifying.replace(true) {
            return;
        }
        let _guard = NotifyingGuard(&self.inner.notifying);
        loop {
            let Some((version, value)) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };
            let observers: Vec<Observer<T>> = self
                .inner
                .observers
                .borrow()
                .entries
                .iter()
                .filter(|entry| entry.since < version)
                .map(|entry| Rc::clone(&entry.observer))
                .collect();
            for observer in observers {
                observer(&value);
            }
        }
    }
}
