//! Port for per-user statistics snapshots.

use async_trait::async_trait;

use crate::domain::{StatSnapshot, UserId};

use super::{VersionConflict, Versioned, define_port_error};

define_port_error! {
    /// Errors raised by snapshot repository adapters.
    pub enum StatSnapshotRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "stat snapshot repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "stat snapshot repository query failed: {message}",
        /// Another writer updated the snapshot first.
        VersionConflict { expected: u64, actual: u64 } =>
            "stat snapshot version conflict: expected {expected}, found {actual}",
    }
}

impl VersionConflict for StatSnapshotRepositoryError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Port for loading and storing one snapshot per user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatSnapshotRepository: Send + Sync {
    /// Load the snapshot for `user_id`, if one was ever stored.
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Versioned<StatSnapshot>>, StatSnapshotRepositoryError>;

    /// Store the snapshot when the stored version still equals
    /// `expected_version`.
    async fn save(
        &self,
        snapshot: &StatSnapshot,
        expected_version: u64,
    ) -> Result<u64, StatSnapshotRepositoryError>;
}

/// Fixture implementation that never holds any snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStatSnapshotRepository;

#[async_trait]
impl StatSnapshotRepository for FixtureStatSnapshotRepository {
    async fn find_by_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<Versioned<StatSnapshot>>, StatSnapshotRepositoryError> {
        Ok(None)
    }

    async fn save(
        &self,
        _snapshot: &StatSnapshot,
        expected_version: u64,
    ) -> Result<u64, StatSnapshotRepositoryError> {
        Ok(expected_version + 1)
    }
}
