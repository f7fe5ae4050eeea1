//! Optimistic concurrency envelope shared by aggregate repositories.

/// Version of an aggregate that has never been saved.
pub const UNSAVED_VERSION: u64 = 0;

/// An aggregate together with the version it was read at.
///
/// Saving with `expected_version` succeeds only while the stored version is
/// unchanged; the store then returns the next version. Version
/// [`UNSAVED_VERSION`] means "insert, nothing stored yet".
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub version: u64,
    pub aggregate: T,
}

impl<T> Versioned<T> {
    pub fn new(version: u64, aggregate: T) -> Self {
        Self { version, aggregate }
    }

    /// Wrap an aggregate that has not been persisted yet.
    pub fn unsaved(aggregate: T) -> Self {
        Self::new(UNSAVED_VERSION, aggregate)
    }
}

/// Repository errors that can report a lost optimistic-concurrency race.
pub trait VersionConflict {
    /// Whether the failure was a version mismatch worth retrying with a fresh
    /// read.
    fn is_version_conflict(&self) -> bool;
}
