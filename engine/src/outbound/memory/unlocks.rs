//! In-memory achievement unlock log.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{AchievementUnlockRepository, AchievementUnlockRepositoryError};
use crate::domain::{AchievementUnlock, UserId};

/// Process-local [`AchievementUnlockRepository`] rejecting duplicate
/// occurrences.
#[derive(Debug, Default)]
pub struct InMemoryAchievementUnlockRepository {
    unlocks: Mutex<Vec<AchievementUnlock>>,
}

fn poisoned() -> AchievementUnlockRepositoryError {
    AchievementUnlockRepositoryError::query("unlock log poisoned")
}

#[async_trait]
impl AchievementUnlockRepository for InMemoryAchievementUnlockRepository {
    async fn record(
        &self,
        unlock: &AchievementUnlock,
    ) -> Result<(), AchievementUnlockRepositoryError> {
        let mut unlocks = self.unlocks.lock().map_err(|_| poisoned())?;
        if unlocks.iter().any(|existing| existing.same_occurrence(unlock)) {
            return Err(AchievementUnlockRepositoryError::duplicate(
                unlock.achievement_id.as_str(),
            ));
        }
        unlocks.push(unlock.clone());
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AchievementUnlock>, AchievementUnlockRepositoryError> {
        let unlocks = self.unlocks.lock().map_err(|_| poisoned())?;
        Ok(unlocks
            .iter()
            .filter(|unlock| &unlock.user_id == user_id)
            .cloned()
            .collect())
    }
}
