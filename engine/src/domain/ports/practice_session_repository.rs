//! Port for practice session persistence.

use async_trait::async_trait;

use crate::domain::{PracticeSession, SessionId};

use super::{VersionConflict, Versioned, define_port_error};

define_port_error! {
    /// Errors raised by practice session repository adapters.
    pub enum PracticeSessionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "practice session repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "practice session repository query failed: {message}",
        /// The stored session moved on since it was read.
        VersionConflict { expected: u64, actual: u64 } =>
            "practice session version conflict: expected {expected}, found {actual}",
    }
}

impl VersionConflict for PracticeSessionRepositoryError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// Port for reading and writing practice sessions under optimistic
/// concurrency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PracticeSessionRepository: Send + Sync {
    /// Find a session and the version it is stored at.
    async fn find_by_id(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<Versioned<PracticeSession>>, PracticeSessionRepositoryError>;

    /// Persist a session, returning the new version.
    async fn save(
        &self,
        session: &PracticeSession,
        expected_version: u64,
    ) -> Result<u64, PracticeSessionRepositoryError>;

    /// Remove a session stored at `expected_version`.
    async fn delete(
        &self,
        session_id: &SessionId,
        expected_version: u64,
    ) -> Result<(), PracticeSessionRepositoryError>;
}

/// Fixture implementation for tests that do not exercise session storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePracticeSessionRepository;

#[async_trait]
impl PracticeSessionRepository for FixturePracticeSessionRepository {
    async fn find_by_id(
        &self,
        _session_id: &SessionId,
    ) -> Result<Option<Versioned<PracticeSession>>, PracticeSessionRepositoryError> {
        Ok(None)
    }

    async fn save(
        &self,
        _session: &PracticeSession,
        expected_version: u64,
    ) -> Result<u64, PracticeSessionRepositoryError> {
        Ok(expected_version + 1)
    }

    async fn delete(
        &self,
        _session_id: &SessionId,
        _expected_version: u64,
    ) -> Result<(), PracticeSessionRepositoryError> {
        Ok(())
    }
}
