//! Driving port for practice session mutations.
//!
//! Every operation names the acting user; only the session owner may mutate a
//! session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::sessions::PracticeLog;
use crate::domain::{AchievementId, Challenge, Error, PracticeSession, SessionId, UserId};

/// Request to open a new practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub user_id: UserId,
    pub instrument: String,
}

/// Response from opening a practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: SessionId,
    pub session: PracticeSession,
}

/// Outcome of completing a session, including its progression effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteSessionResponse {
    pub session: PracticeSession,
    /// Session XP plus XP from achievements unlocked by this session.
    pub xp_gained: u64,
    pub leveled_up: bool,
    pub new_level: u32,
    pub new_streak: u32,
    pub newly_unlocked: Vec<AchievementId>,
    /// False when the catalog was unavailable and evaluation was skipped.
    pub achievements_evaluated: bool,
    /// Challenges whose progress moved because of this session.
    pub updated_challenges: Vec<Challenge>,
}

/// Driving port for practice session write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PracticeSessionCommand: Send + Sync {
    /// Open an active session for `request.user_id`.
    async fn start_session(&self, request: StartSessionRequest)
    -> Result<StartSessionResponse, Error>;

    /// Pause an active session.
    async fn pause(&self, actor: &UserId, session_id: SessionId)
    -> Result<PracticeSession, Error>;

    /// Resume a paused session.
    async fn resume(&self, actor: &UserId, session_id: SessionId)
    -> Result<PracticeSession, Error>;

    /// Cancel a session that has not finished. Cancelled sessions never earn
    /// progress.
    async fn cancel(&self, actor: &UserId, session_id: SessionId)
    -> Result<PracticeSession, Error>;

    /// Complete a session and apply its progression effects.
    ///
    /// A second call for an already completed session finishes any
    /// progression that an earlier call left undone, then fails with
    /// `invalid_transition`.
    async fn complete(
        &self,
        actor: &UserId,
        session_id: SessionId,
    ) -> Result<CompleteSessionResponse, Error>;

    /// Record a piece practised during the session.
    async fn log_piece(
        &self,
        actor: &UserId,
        session_id: SessionId,
        log: PracticeLog,
    ) -> Result<PracticeSession, Error>;

    /// Record an exercise practised during the session.
    async fn log_exercise(
        &self,
        actor: &UserId,
        session_id: SessionId,
        log: PracticeLog,
    ) -> Result<PracticeSession, Error>;

    /// Append a goal to the session.
    async fn add_goal(
        &self,
        actor: &UserId,
        session_id: SessionId,
        description: String,
    ) -> Result<PracticeSession, Error>;

    /// Mark the goal at `index` as done.
    async fn complete_goal(
        &self,
        actor: &UserId,
        session_id: SessionId,
        index: usize,
    ) -> Result<PracticeSession, Error>;

    /// Delete a session. Deleting a completed session first removes its
    /// minutes and session count from the owner's statistics.
    async fn delete_session(&self, actor: &UserId, session_id: SessionId) -> Result<(), Error>;
}
