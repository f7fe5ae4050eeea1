//! In-memory challenge repository.

use async_trait::async_trait;

use crate::domain::ports::{ChallengeRepository, ChallengeRepositoryError, Versioned};
use crate::domain::{Challenge, ChallengeId, UserId};

use super::store::{StoreFault, VersionedStore};

fn map_fault(fault: StoreFault) -> ChallengeRepositoryError {
    match fault {
        StoreFault::Poisoned => ChallengeRepositoryError::query("challenge store poisoned"),
        StoreFault::Conflict { expected, actual } => {
            ChallengeRepositoryError::version_conflict(expected, actual)
        }
    }
}

/// Process-local [`ChallengeRepository`].
#[derive(Debug, Default)]
pub struct InMemoryChallengeRepository {
    store: VersionedStore<ChallengeId, Challenge>,
}

#[async_trait]
impl ChallengeRepository for InMemoryChallengeRepository {
    async fn find_by_id(
        &self,
        challenge_id: &ChallengeId,
    ) -> Result<Option<Versioned<Challenge>>, ChallengeRepositoryError> {
        self.store.get(challenge_id).map_err(map_fault)
    }

    async fn save(
        &self,
        challenge: &Challenge,
        expected_version: u64,
    ) -> Result<u64, ChallengeRepositoryError> {
        self.store
            .put(challenge.id(), challenge.clone(), expected_version)
            .map_err(map_fault)
    }

    async fn list_for_participant(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChallengeId>, ChallengeRepositoryError> {
        let mut ids: Vec<_> = self
            .store
            .filter(|challenge| challenge.participant(user_id).is_some())
            .map_err(map_fault)?
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}
