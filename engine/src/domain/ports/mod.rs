//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod achievement_catalog;
mod achievement_unlock_repository;
mod challenge_command;
mod challenge_repository;
mod practice_session_command;
mod practice_session_repository;
mod stat_snapshot_repository;
mod versioned;

#[cfg(test)]
pub use achievement_catalog::MockAchievementCatalog;
pub use achievement_catalog::{
    AchievementCatalog, AchievementCatalogError, FixtureAchievementCatalog,
};
#[cfg(test)]
pub use achievement_unlock_repository::MockAchievementUnlockRepository;
pub use achievement_unlock_repository::{
    AchievementUnlockRepository, AchievementUnlockRepositoryError,
    FixtureAchievementUnlockRepository,
};
#[cfg(test)]
pub use challenge_command::MockChallengeCommand;
pub use challenge_command::{
    ChallengeCommand, ChallengeRewardReceipt, CompleteChallengeResponse,
};
#[cfg(test)]
pub use challenge_repository::MockChallengeRepository;
pub use challenge_repository::{
    ChallengeRepository, ChallengeRepositoryError, FixtureChallengeRepository,
};
#[cfg(test)]
pub use practice_session_command::MockPracticeSessionCommand;
pub use practice_session_command::{
    CompleteSessionResponse, PracticeSessionCommand, StartSessionRequest, StartSessionResponse,
};
#[cfg(test)]
pub use practice_session_repository::MockPracticeSessionRepository;
pub use practice_session_repository::{
    FixturePracticeSessionRepository, PracticeSessionRepository, PracticeSessionRepositoryError,
};
#[cfg(test)]
pub use stat_snapshot_repository::MockStatSnapshotRepository;
pub use stat_snapshot_repository::{
    FixtureStatSnapshotRepository, StatSnapshotRepository, StatSnapshotRepositoryError,
};
pub use versioned::{UNSAVED_VERSION, VersionConflict, Versioned};
