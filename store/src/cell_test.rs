use std::panic::{AssertUnwindSafe, catch_unwind};

use super::*;
use crate::logging_test::{capture_logs, warnings};
use crate::storage::MemoryStorage;

fn open<T>(storage: &MemoryStorage, key: &str, default: T) -> StateCell<T>
where
    T: Clone + Serialize + DeserializeOwned + 'static,
{
    StateCell::initialize(Rc::new(storage.clone()), key, default)
}

fn recorder<T: Clone + 'static>() -> (Rc<RefCell<Vec<T>>>, impl Fn(&T) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |value: &T| sink.borrow_mut().push(value.clone()))
}

// =============================================================
// initialize
// =============================================================

#[test]
fn initialize_missing_key_uses_default() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "bookmarks", vec![1, 2]);
    assert_eq!(cell.get(), vec![1, 2]);
    assert_eq!(cell.key(), "bookmarks");
    assert!(storage.is_empty());
}

#[test]
fn initialize_reads_stored_value() {
    let storage = MemoryStorage::new();
    storage.insert_raw("numbers", "[3,4,5]");
    let cell = open(&storage, "numbers", Vec::<i32>::new());
    assert_eq!(cell.get(), vec![3, 4, 5]);
}

#[test]
fn initialize_malformed_value_falls_back_to_default() {
    let storage = MemoryStorage::new();
    storage.insert_raw("numbers", "{not json");
    let cell = open(&storage, "numbers", Vec::<i32>::new());
    assert!(cell.get().is_empty());
}

#[test]
fn initialize_malformed_value_logs_warning() {
    let storage = MemoryStorage::new();
    storage.insert_raw("flag", "{oops");
    capture_logs();

    let cell = open(&storage, "flag", true);

    assert!(cell.get());
    let warned = warnings();
    assert_eq!(warned.len(), 1);
    assert!(warned[0].starts_with("malformed value under `flag`"));
    assert!(warned[0].ends_with("falling back to default"));
}

#[test]
fn initialize_type_mismatch_falls_back_to_default() {
    let storage = MemoryStorage::new();
    storage.insert_raw("numbers", r#"{"a":1}"#);
    let cell = open(&storage, "numbers", Vec::<i32>::new());
    assert!(cell.get().is_empty());
}

#[test]
fn initialize_unreadable_storage_falls_back_to_default() {
    let storage = MemoryStorage::new();
    storage.insert_raw("flag", "true");
    storage.set_disabled(true);
    let cell = open(&storage, "flag", false);
    assert!(!cell.get());
}

#[test]
fn read_value_reports_malformed_storage() {
    let storage = MemoryStorage::new();
    storage.insert_raw("flag", "yes");
    let err = read_value::<bool>(&storage, "flag").unwrap_err();
    assert!(matches!(err, StoreError::MalformedStorage { ref key, .. } if key == "flag"));
}

#[test]
fn read_value_missing_key_is_none() {
    let storage = MemoryStorage::new();
    assert!(read_value::<bool>(&storage, "flag").unwrap().is_none());
}

// =============================================================
// set / round trip
// =============================================================

#[test]
fn set_writes_through_and_reloads() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "numbers", Vec::<i32>::new());
    cell.set(vec![7, 8]).unwrap();
    assert_eq!(storage.raw("numbers").as_deref(), Some("[7,8]"));

    let reopened = open(&storage, "numbers", Vec::<i32>::new());
    assert_eq!(reopened.get(), vec![7, 8]);
}

#[test]
fn set_only_touches_own_key() {
    let storage = MemoryStorage::new();
    storage.insert_raw("other", "\"untouched\"");
    let cell = open(&storage, "numbers", Vec::<i32>::new());
    cell.set(vec![1]).unwrap();
    assert_eq!(storage.raw("other").as_deref(), Some("\"untouched\""));
    assert_eq!(storage.len(), 2);
}

#[test]
fn set_same_value_twice_notifies_twice() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "flag", false);
    let (seen, observer) = recorder::<bool>();
    cell.subscribe(observer);

    cell.set(true).unwrap();
    cell.set(true).unwrap();

    assert_eq!(*seen.borrow(), vec![false, true, true]);
    assert_eq!(storage.raw("flag").as_deref(), Some("true"));
}

#[test]
fn set_with_failed_persistence_still_updates_and_notifies() {
    let storage = MemoryStorage::with_quota(4);
    let cell = open(&storage, "numbers", Vec::<i32>::new());
    let (seen, observer) = recorder::<Vec<i32>>();
    cell.subscribe(observer);

    let err = cell.set(vec![1, 2, 3]).unwrap_err();

    assert!(matches!(err, StoreError::Persistence { ref key, source: StorageError::QuotaExceeded { .. } } if key == "numbers"));
    assert_eq!(cell.get(), vec![1, 2, 3]);
    assert_eq!(*seen.borrow(), vec![vec![], vec![1, 2, 3]]);
    assert_eq!(storage.raw("numbers"), None);
}

#[test]
fn failed_persistence_logs_warning() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    storage.set_disabled(true);
    capture_logs();

    assert!(cell.set(1).is_err());

    let warned = warnings();
    assert_eq!(warned.len(), 1);
    assert!(warned[0].starts_with("failed to persist `n`"));
}

#[test]
fn update_mutates_in_place() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "numbers", vec![1]);
    cell.update(|v| v.push(2)).unwrap();
    assert_eq!(cell.get(), vec![1, 2]);
    assert_eq!(storage.raw("numbers").as_deref(), Some("[1,2]"));
}

#[test]
fn clones_share_value() {
    let storage = MemoryStorage::new();
    let a = open(&storage, "flag", false);
    let b = a.clone();
    a.set(true).unwrap();
    assert!(b.get());
    assert!(b.with(|v| *v));
}

// =============================================================
// subscribe
// =============================================================

#[test]
fn subscribe_delivers_current_value_immediately() {
    let storage = MemoryStorage::new();
    storage.insert_raw("flag", "true");
    let cell = open(&storage, "flag", false);
    let (seen, observer) = recorder::<bool>();
    cell.subscribe(observer);
    assert_eq!(*seen.borrow(), vec![true]);
}

#[test]
fn observers_fire_in_subscription_order() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    let log = Rc::new(RefCell::new(Vec::new()));
    for name in ["first", "second", "third"] {
        let log = Rc::clone(&log);
        cell.subscribe(move |v: &i32| log.borrow_mut().push(format!("{name}:{v}")));
    }
    log.borrow_mut().clear();

    cell.set(1).unwrap();

    assert_eq!(*log.borrow(), vec!["first:1", "second:1", "third:1"]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    let (seen, observer) = recorder::<i32>();
    let handle = cell.subscribe(observer);
    cell.set(1).unwrap();
    handle.unsubscribe();
    cell.set(2).unwrap();

    assert_eq!(*seen.borrow(), vec![0, 1]);
    assert_eq!(cell.observer_count(), 0);
}

#[test]
fn dropping_handle_keeps_observer() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    let (seen, observer) = recorder::<i32>();
    drop(cell.subscribe(observer));
    cell.set(5).unwrap();
    assert_eq!(*seen.borrow(), vec![0, 5]);
}

#[test]
fn reentrant_set_is_delivered_in_mutation_order() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);

    // Clamp: any value above 10 is immediately reset to 10.
    let clamp = cell.clone();
    cell.subscribe(move |v: &i32| {
        if *v > 10 {
            let _ = clamp.set(10);
        }
    });
    let (seen, observer) = recorder::<i32>();
    cell.subscribe(observer);

    cell.set(42).unwrap();

    assert_eq!(*seen.borrow(), vec![0, 42, 10]);
    assert_eq!(cell.get(), 10);
    assert_eq!(storage.raw("n").as_deref(), Some("10"));
}

#[test]
fn subscriber_added_mid_round_sees_only_newer_values() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    let (late_seen, _) = recorder::<i32>();

    let inner = cell.clone();
    let late_sink = Rc::clone(&late_seen);
    cell.subscribe(move |v: &i32| {
        if *v == 1 {
            let _ = inner.set(2);
            let _ = inner.set(3);
            let sink = Rc::clone(&late_sink);
            inner.subscribe(move |v: &i32| sink.borrow_mut().push(*v));
        }
    });
    let (seen, observer) = recorder::<i32>();
    cell.subscribe(observer);

    cell.set(1).unwrap();
    assert_eq!(*late_seen.borrow(), vec![3]);
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3]);

    cell.set(4).unwrap();
    assert_eq!(*late_seen.borrow(), vec![3, 4]);
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn panicking_observer_does_not_block_later_notifications() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    let (seen, observer) = recorder::<i32>();
    cell.subscribe(observer);
    cell.subscribe(|v: &i32| assert_ne!(*v, 1, "observer rejects 1"));

    let outcome = catch_unwind(AssertUnwindSafe(|| cell.set(1)));
    assert!(outcome.is_err());

    cell.set(2).unwrap();

    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert_eq!(cell.get(), 2);
}

#[test]
fn subscription_debug_reports_active() {
    let storage = MemoryStorage::new();
    let cell = open(&storage, "n", 0_i32);
    let handle = cell.subscribe(|_| {});
    assert!(format!("{handle:?}").contains("active: true"));
}
