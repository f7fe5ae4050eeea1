//! Mapping from repository port errors to domain errors.

use serde_json::json;

use crate::domain::Error;
use crate::domain::ports::{
    AchievementUnlockRepositoryError, ChallengeRepositoryError, PracticeSessionRepositoryError,
    StatSnapshotRepositoryError,
};

fn version_conflict(aggregate: &str, expected: u64, actual: u64) -> Error {
    Error::concurrency_conflict(format!(
        "{aggregate} was modified concurrently; retries exhausted"
    ))
    .with_details(json!({ "expected": expected, "actual": actual }))
}

pub(crate) fn map_session_repository_error(error: PracticeSessionRepositoryError) -> Error {
    match error {
        PracticeSessionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("practice session store unavailable: {message}"))
        }
        PracticeSessionRepositoryError::Query { message } => {
            Error::internal(format!("practice session store error: {message}"))
        }
        PracticeSessionRepositoryError::VersionConflict { expected, actual } => {
            version_conflict("practice session", expected, actual)
        }
    }
}

pub(crate) fn map_snapshot_repository_error(error: StatSnapshotRepositoryError) -> Error {
    match error {
        StatSnapshotRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("stat snapshot store unavailable: {message}"))
        }
        StatSnapshotRepositoryError::Query { message } => {
            Error::internal(format!("stat snapshot store error: {message}"))
        }
        StatSnapshotRepositoryError::VersionConflict { expected, actual } => {
            version_conflict("stat snapshot", expected, actual)
        }
    }
}

pub(crate) fn map_challenge_repository_error(error: ChallengeRepositoryError) -> Error {
    match error {
        ChallengeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("challenge store unavailable: {message}"))
        }
        ChallengeRepositoryError::Query { message } => {
            Error::internal(format!("challenge store error: {message}"))
        }
        ChallengeRepositoryError::VersionConflict { expected, actual } => {
            version_conflict("challenge", expected, actual)
        }
    }
}

pub(crate) fn map_unlock_repository_error(error: AchievementUnlockRepositoryError) -> Error {
    match error {
        AchievementUnlockRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("achievement unlock store unavailable: {message}"))
        }
        AchievementUnlockRepositoryError::Query { message } => {
            Error::internal(format!("achievement unlock store error: {message}"))
        }
        AchievementUnlockRepositoryError::Duplicate { achievement_id } => {
            Error::conflict(format!("achievement {achievement_id} already recorded"))
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::ErrorCode;

    #[rstest]
    #[case(PracticeSessionRepositoryError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(PracticeSessionRepositoryError::query("bad"), ErrorCode::InternalError)]
    #[case(
        PracticeSessionRepositoryError::version_conflict(1_u64, 2_u64),
        ErrorCode::ConcurrencyConflict
    )]
    fn session_errors_map_to_codes(
        #[case] error: PracticeSessionRepositoryError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(map_session_repository_error(error).code(), expected);
    }

    #[rstest]
    fn conflict_details_carry_versions() {
        let error =
            map_snapshot_repository_error(StatSnapshotRepositoryError::version_conflict(3_u64, 5_u64));
        let details = error.details().expect("details present");
        assert_eq!(details["expected"], 3);
        assert_eq!(details["actual"], 5);
    }

    #[rstest]
    fn challenge_connection_is_unavailable() {
        let error = map_challenge_repository_error(ChallengeRepositoryError::connection("refused"));
        assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
        assert!(error.message().contains("refused"));
    }

    #[rstest]
    fn duplicate_unlock_is_a_conflict() {
        let error =
            map_unlock_repository_error(AchievementUnlockRepositoryError::duplicate("first-hour"));
        assert_eq!(error.code(), ErrorCode::Conflict);
    }
}
