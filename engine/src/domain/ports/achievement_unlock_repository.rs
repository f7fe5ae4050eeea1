//! Port for the append-only achievement unlock log.

use async_trait::async_trait;

use crate::domain::{AchievementUnlock, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by unlock repository adapters.
    pub enum AchievementUnlockRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "achievement unlock repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "achievement unlock repository query failed: {message}",
        /// The same unlock occurrence was already recorded.
        Duplicate { achievement_id: String } =>
            "achievement unlock already recorded: {achievement_id}",
    }
}

/// Port recording unlock events.
///
/// Adapters must reject a second record of the same occurrence (see
/// [`AchievementUnlock::same_occurrence`]) with `Duplicate`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AchievementUnlockRepository: Send + Sync {
    /// Append one unlock.
    async fn record(&self, unlock: &AchievementUnlock) -> Result<(), AchievementUnlockRepositoryError>;

    /// Unlocks for a user in recording order.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<AchievementUnlock>, AchievementUnlockRepositoryError>;
}

/// Fixture implementation that accepts and forgets every unlock.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAchievementUnlockRepository;

#[async_trait]
impl AchievementUnlockRepository for FixtureAchievementUnlockRepository {
    async fn record(
        &self,
        _unlock: &AchievementUnlock,
    ) -> Result<(), AchievementUnlockRepositoryError> {
        Ok(())
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<AchievementUnlock>, AchievementUnlockRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::{AchievementId, SessionId};

    #[rstest]
    #[tokio::test]
    async fn fixture_accepts_records() {
        let repo = FixtureAchievementUnlockRepository;
        let user_id = UserId::random();
        let unlock = AchievementUnlock {
            user_id: user_id.clone(),
            achievement_id: AchievementId::new("first-hour").expect("valid id"),
            xp_awarded: 50,
            unlocked_at: Utc::now(),
            session_id: SessionId::random(),
            repeatable: false,
        };

        repo.record(&unlock).await.expect("fixture record succeeds");
        let listed = repo
            .list_for_user(&user_id)
            .await
            .expect("fixture list succeeds");
        assert!(listed.is_empty());
    }

    #[rstest]
    fn duplicate_names_the_achievement() {
        let err = AchievementUnlockRepositoryError::duplicate("first-hour");
        assert!(err.to_string().contains("first-hour"));
    }
}
