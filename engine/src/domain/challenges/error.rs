//! Challenge engine errors.

use std::fmt;

use serde_json::json;

use crate::domain::{Error, UserId};

use super::ChallengeStatus;

/// Operation attempted on a challenge, reported in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChallengeAction {
    Publish,
    Start,
    Complete,
    Cancel,
    Join,
    Leave,
    UpdateProgress,
    Invite,
    RespondToInvitation,
}

impl fmt::Display for ChallengeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Publish => "publish",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Join => "join",
            Self::Leave => "leave",
            Self::UpdateProgress => "update progress on",
            Self::Invite => "invite to",
            Self::RespondToInvitation => "respond to an invitation for",
        };
        f.write_str(label)
    }
}

/// Errors raised by challenge membership and lifecycle operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChallengeError {
    #[error("cannot {action} a {status} challenge")]
    InvalidTransition {
        action: ChallengeAction,
        status: ChallengeStatus,
    },
    #[error("challenge is full ({max_participants} participants)")]
    ChallengeFull { max_participants: u32 },
    #[error("user {user_id} already joined this challenge")]
    AlreadyJoined { user_id: UserId },
    #[error("user {user_id} is not a participant")]
    NotParticipant { user_id: UserId },
    #[error("progress must be a finite, non-negative number, got {value}")]
    InvalidProgress { value: f64 },
    #[error("this challenge does not allow invitations")]
    InvitesDisabled,
    #[error("user {user_id} must be the creator or a participant to invite")]
    InviterNotMember { user_id: UserId },
    #[error("user {user_id} already has an invitation")]
    AlreadyInvited { user_id: UserId },
    #[error("no invitation exists for user {user_id}")]
    InvitationNotFound { user_id: UserId },
    #[error("invitation for user {user_id} was already answered")]
    InvitationAlreadyResolved { user_id: UserId },
    #[error("joining this challenge requires an accepted invitation")]
    InvitationRequired,
    #[error("invalid challenge: {0}")]
    Validation(String),
}

impl ChallengeError {
    /// Stable snake_case identifier for adapters.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::ChallengeFull { .. } => "challenge_full",
            Self::AlreadyJoined { .. } => "already_joined",
            Self::NotParticipant { .. } => "not_participant",
            Self::InvalidProgress { .. } => "invalid_progress",
            Self::InvitesDisabled => "invites_disabled",
            Self::InviterNotMember { .. } => "inviter_not_member",
            Self::AlreadyInvited { .. } => "already_invited",
            Self::InvitationNotFound { .. } => "invitation_not_found",
            Self::InvitationAlreadyResolved { .. } => "invitation_already_resolved",
            Self::InvitationRequired => "invitation_required",
            Self::Validation(_) => "validation_failed",
        }
    }
}

impl From<ChallengeError> for Error {
    fn from(value: ChallengeError) -> Self {
        let message = value.to_string();
        let error = match &value {
            ChallengeError::InvalidTransition { status, .. } => {
                Error::invalid_transition(message).with_details(json!({ "status": status }))
            }
            ChallengeError::ChallengeFull { max_participants } => Error::conflict(message)
                .with_details(json!({ "maxParticipants": max_participants })),
            ChallengeError::AlreadyJoined { .. }
            | ChallengeError::AlreadyInvited { .. }
            | ChallengeError::InvitationAlreadyResolved { .. } => Error::conflict(message),
            ChallengeError::NotParticipant { .. } | ChallengeError::InvitationNotFound { .. } => {
                Error::not_found(message)
            }
            ChallengeError::InvitesDisabled
            | ChallengeError::InviterNotMember { .. }
            | ChallengeError::InvitationRequired => Error::forbidden(message),
            ChallengeError::InvalidProgress { .. } | ChallengeError::Validation(_) => {
                Error::invalid_request(message)
            }
        };
        error.with_reason(value.reason())
    }
}
