//! In-memory practice session repository.

use async_trait::async_trait;

use crate::domain::ports::{
    PracticeSessionRepository, PracticeSessionRepositoryError, Versioned,
};
use crate::domain::{PracticeSession, SessionId};

use super::store::{StoreFault, VersionedStore};

fn map_fault(fault: StoreFault) -> PracticeSessionRepositoryError {
    match fault {
        StoreFault::Poisoned => PracticeSessionRepositoryError::query("session store poisoned"),
        StoreFault::Conflict { expected, actual } => {
            PracticeSessionRepositoryError::version_conflict(expected, actual)
        }
    }
}

/// Process-local [`PracticeSessionRepository`].
#[derive(Debug, Default)]
pub struct InMemoryPracticeSessionRepository {
    store: VersionedStore<SessionId, PracticeSession>,
}

#[async_trait]
impl PracticeSessionRepository for InMemoryPracticeSessionRepository {
    async fn find_by_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Versioned<PracticeSession>>, PracticeSessionRepositoryError> {
        self.store.get(session_id).map_err(map_fault)
    }

    async fn save(
        &self,
        session: &PracticeSession,
        expected_version: u64,
    ) -> Result<u64, PracticeSessionRepositoryError> {
        self.store
            .put(session.id(), session.clone(), expected_version)
            .map_err(map_fault)
    }

    async fn delete(
        &self,
        session_id: &SessionId,
        expected_version: u64,
    ) -> Result<(), PracticeSessionRepositoryError> {
        self.store
            .remove(session_id, expected_version)
            .map_err(map_fault)
    }
}
