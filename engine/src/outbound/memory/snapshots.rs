//! In-memory statistics snapshot repository.

use async_trait::async_trait;

use crate::domain::ports::{StatSnapshotRepository, StatSnapshotRepositoryError, Versioned};
use crate::domain::{StatSnapshot, UserId};

use super::store::{StoreFault, VersionedStore};

fn map_fault(fault: StoreFault) -> StatSnapshotRepositoryError {
    match fault {
        StoreFault::Poisoned => StatSnapshotRepositoryError::query("snapshot store poisoned"),
        StoreFault::Conflict { expected, actual } => {
            StatSnapshotRepositoryError::version_conflict(expected, actual)
        }
    }
}

/// Process-local [`StatSnapshotRepository`].
#[derive(Debug, Default)]
pub struct InMemoryStatSnapshotRepository {
    store: VersionedStore<UserId, StatSnapshot>,
}

#[async_trait]
impl StatSnapshotRepository for InMemoryStatSnapshotRepository {
    async fn find_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Versioned<StatSnapshot>>, StatSnapshotRepositoryError> {
        self.store.get(user_id).map_err(map_fault)
    }

    async fn save(
        &self,
        snapshot: &StatSnapshot,
        expected_version: u64,
    ) -> Result<u64, StatSnapshotRepositoryError> {
        self.store
            .put(
                snapshot.user_id().clone(),
                snapshot.clone(),
                expected_version,
            )
            .map_err(map_fault)
    }
}
