//! Driving port for challenge lifecycle and membership.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::challenges::{InvitationResponse, NewChallenge, RewardGrant};
use crate::domain::progress::LevelAward;
use crate::domain::{Challenge, ChallengeId, Error, UserId};

/// Result of crediting one challenge reward to a participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRewardReceipt {
    pub grant: RewardGrant,
    /// `None` when the reward had already been credited earlier.
    pub award: Option<LevelAward>,
}

/// Response from completing a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChallengeResponse {
    pub challenge: Challenge,
    pub receipts: Vec<ChallengeRewardReceipt>,
}

/// Driving port for challenge write operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeCommand: Send + Sync {
    /// Create a draft challenge owned by `creator`.
    async fn create_challenge(
        &self,
        creator: &UserId,
        draft: NewChallenge,
    ) -> Result<Challenge, Error>;

    /// Open a draft for joining. Creator only.
    async fn publish(&self, actor: &UserId, challenge_id: ChallengeId)
    -> Result<Challenge, Error>;

    /// Start a pending challenge. Creator only.
    async fn start(&self, actor: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error>;

    /// Finish an active challenge and credit rewards. Creator only.
    ///
    /// Repeating the call on a completed challenge credits any reward an
    /// earlier call left undone, then fails with `invalid_transition`.
    async fn complete(
        &self,
        actor: &UserId,
        challenge_id: ChallengeId,
    ) -> Result<CompleteChallengeResponse, Error>;

    /// Cancel a challenge that has not finished. Creator only.
    async fn cancel(&self, actor: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error>;

    /// Join an open challenge.
    async fn join(&self, user_id: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error>;

    /// Leave a challenge before it starts.
    async fn leave(&self, user_id: &UserId, challenge_id: ChallengeId)
    -> Result<Challenge, Error>;

    /// Set a participant's progress directly.
    async fn update_progress(
        &self,
        user_id: &UserId,
        challenge_id: ChallengeId,
        progress: f64,
    ) -> Result<Challenge, Error>;

    /// Invite `invitee` on behalf of the participant `inviter`.
    async fn invite(
        &self,
        inviter: &UserId,
        challenge_id: ChallengeId,
        invitee: &UserId,
    ) -> Result<Challenge, Error>;

    /// Accept or decline a pending invitation.
    async fn respond_to_invitation(
        &self,
        user_id: &UserId,
        challenge_id: ChallengeId,
        response: InvitationResponse,
    ) -> Result<Challenge, Error>;
}
