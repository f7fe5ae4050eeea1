//! Port for challenge persistence.

use async_trait::async_trait;

use crate::domain::{Challenge, ChallengeId, UserId};

use super::{VersionConflict, Versioned, define_port_error};

define_port_error! {
    /// Errors raised by challenge repository adapters.
    pub enum ChallengeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "challenge repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "challenge repository query failed: {message}",
        /// The challenge was changed by another writer.
        VersionConflict { expected: u64, actual: u64 } =>
            "challenge version conflict: expected {expected}, found {actual}",
    }
}

impl VersionConflict for ChallengeRepositoryError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Port for challenge aggregates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Find a challenge and its stored version.
    async fn find_by_id(
        &self,
        challenge_id: &ChallengeId,
    ) -> Result<Option<Versioned<Challenge>>, ChallengeRepositoryError>;

    /// Persist a challenge, returning the new version.
    async fn save(
        &self,
        challenge: &Challenge,
        expected_version: u64,
    ) -> Result<u64, ChallengeRepositoryError>;

    /// Identifiers of every challenge `user_id` currently participates in.
    async fn list_for_participant(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChallengeId>, ChallengeRepositoryError>;
}

/// Fixture implementation with no stored challenges.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureChallengeRepository;

#[async_trait]
impl ChallengeRepository for FixtureChallengeRepository {
    async fn find_by_id(
        &self,
        _challenge_id: &ChallengeId,
    ) -> Result<Option<Versioned<Challenge>>, ChallengeRepositoryError> {
        Ok(None)
    }

    async fn save(
        &self,
        _challenge: &Challenge,
        expected_version: u64,
    ) -> Result<u64, ChallengeRepositoryError> {
        Ok(expected_version + 1)
    }

    async fn list_for_participant(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<ChallengeId>, ChallengeRepositoryError> {
        Ok(Vec::new())
    }
}
