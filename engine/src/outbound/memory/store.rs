//! Versioned key-value cell shared by the in-memory repositories.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use crate::domain::ports::{UNSAVED_VERSION, Versioned};

/// Why a store operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StoreFault {
    /// A writer panicked while holding the lock.
    Poisoned,
    /// The stored version differs from the expected one.
    Conflict { expected: u64, actual: u64 },
}

/// Map of aggregates, each tagged with the version it was last saved at.
#[derive(Debug)]
pub(super) struct VersionedStore<K, T> {
    entries: Mutex<HashMap<K, (u64, T)>>,
}

impl<K, T> Default for VersionedStore<K, T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, T> VersionedStore<K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<K, (u64, T)>>, StoreFault> {
        self.entries.lock().map_err(|_| StoreFault::Poisoned)
    }

    pub(super) fn get(&self, key: &K) -> Result<Option<Versioned<T>>, StoreFault> {
        Ok(self
            .lock()?
            .get(key)
            .map(|(version, value)| Versioned::new(*version, value.clone())))
    }

    /// Compare-and-set; returns the new version.
    pub(super) fn put(&self, key: K, value: T, expected: u64) -> Result<u64, StoreFault> {
        let mut entries = self.lock()?;
        let actual = entries
            .get(&key)
            .map_or(UNSAVED_VERSION, |(version, _)| *version);
        if actual != expected {
            return Err(StoreFault::Conflict { expected, actual });
        }
        let next = actual + 1;
        entries.insert(key, (next, value));
        Ok(next)
    }

    pub(super) fn remove(&self, key: &K, expected: u64) -> Result<(), StoreFault> {
        let mut entries = self.lock()?;
        let actual = entries
            .get(key)
            .map_or(UNSAVED_VERSION, |(version, _)| *version);
        if actual != expected {
            return Err(StoreFault::Conflict { expected, actual });
        }
        entries.remove(key);
        Ok(())
    }

    /// Clone every value matching `keep`.
    pub(super) fn filter<F>(&self, mut keep: F) -> Result<Vec<(K, T)>, StoreFault>
    where
        K: Clone,
        F: FnMut(&T) -> bool,
    {
        Ok(self
            .lock()?
            .iter()
            .filter(|(_, (_, value))| keep(value))
            .map(|(key, (_, value))| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn first_put_expects_unsaved_version() {
        let store = VersionedStore::<u8, &str>::default();
        assert_eq!(store.put(1, "a", UNSAVED_VERSION), Ok(1));
        assert_eq!(store.put(1, "b", 1), Ok(2));
        let stored = store.get(&1).expect("lock").expect("present");
        assert_eq!(stored, Versioned::new(2, "b"));
    }

    #[rstest]
    fn stale_put_reports_both_versions() {
        let store = VersionedStore::<u8, &str>::default();
        store.put(1, "a", 0).expect("insert");
        assert_eq!(
            store.put(1, "b", 0),
            Err(StoreFault::Conflict {
                expected: 0,
                actual: 1
            })
        );
    }

    #[rstest]
    fn remove_checks_version() {
        let store = VersionedStore::<u8, &str>::default();
        store.put(1, "a", 0).expect("insert");
        assert!(store.remove(&1, 0).is_err());
        store.remove(&1, 1).expect("remove");
        assert!(store.get(&1).expect("lock").is_none());
    }
}
