//! Participants, invitations, and progress.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{SessionId, UserId};

use super::{Challenge, ChallengeAction, ChallengeError, ChallengeStatus, ChallengeUnit};

/// A user taking part in a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
    pub progress: f64,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Sessions already folded into `progress`.
    #[serde(default)]
    pub contributed_sessions: BTreeSet<SessionId>,
}

/// State of an invitation. Leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

/// Answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationResponse {
    Accept,
    Decline,
}

/// An invitation to join a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub user_id: UserId,
    pub invited_by: UserId,
    pub invited_at: DateTime<Utc>,
    pub status: InvitationStatus,
    pub responded_at: Option<DateTime<Utc>>,
}

/// What a completed session can contribute to challenge progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContribution {
    pub session_id: SessionId,
    pub ended_at: DateTime<Utc>,
    pub minutes: u32,
    pub xp: u64,
    /// Streak after the session.
    pub streak: u32,
}

impl Challenge {
    /// Add `user_id` directly.
    ///
    /// Capacity is checked before membership, so a full challenge reports
    /// `ChallengeFull` even to existing members. Invite-only and approval
    /// challenges refuse direct joins.
    pub fn join(&mut self, user_id: &UserId, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        self.ensure_open(ChallengeAction::Join)?;
        self.ensure_capacity()?;
        if self.participant(user_id).is_some() {
            return Err(ChallengeError::AlreadyJoined {
                user_id: user_id.clone(),
            });
        }
        if !self.settings.is_public || self.settings.require_approval {
            return Err(ChallengeError::InvitationRequired);
        }
        self.admit(user_id, now);
        Ok(())
    }

    /// Remove `user_id` before the challenge starts.
    pub fn leave(&mut self, user_id: &UserId, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        if self.status == ChallengeStatus::Active || self.status.is_terminal() {
            return Err(self.invalid(ChallengeAction::Leave));
        }
        let before = self.participants.len();
        self.participants
            .retain(|participant| &participant.user_id != user_id);
        if self.participants.len() == before {
            return Err(ChallengeError::NotParticipant {
                user_id: user_id.clone(),
            });
        }
        self.updated_at = now;
        self.recompute();
        Ok(())
    }

    /// Set `user_id`'s progress to `value` (last write wins).
    ///
    /// Reaching the target marks the participant completed once; later
    /// updates never clear the flag.
    pub fn update_progress(
        &mut self,
        user_id: &UserId,
        value: f64,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        if self.status != ChallengeStatus::Active {
            return Err(self.invalid(ChallengeAction::UpdateProgress));
        }
        if !value.is_finite() || value < 0.0 {
            return Err(ChallengeError::InvalidProgress { value });
        }
        let target = self.requirement.target;
        let participant = self.participant_mut(user_id)?;
        participant.progress = value;
        if value >= target && !participant.completed {
            participant.completed = true;
            participant.completed_at = Some(now);
        }
        self.updated_at = now;
        self.recompute();
        Ok(())
    }

    /// Invite `user_id` on behalf of `inviter_id`.
    pub fn invite(
        &mut self,
        inviter_id: &UserId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        self.ensure_open(ChallengeAction::Invite)?;
        if !self.settings.allow_invites {
            return Err(ChallengeError::InvitesDisabled);
        }
        if inviter_id != &self.creator_id && self.participant(inviter_id).is_none() {
            return Err(ChallengeError::InviterNotMember {
                user_id: inviter_id.clone(),
            });
        }
        if self.participant(user_id).is_some() {
            return Err(ChallengeError::AlreadyJoined {
                user_id: user_id.clone(),
            });
        }
        if self.invitation(user_id).is_some() {
            return Err(ChallengeError::AlreadyInvited {
                user_id: user_id.clone(),
            });
        }

        self.invitations.push(Invitation {
            user_id: user_id.clone(),
            invited_by: inviter_id.clone(),
            invited_at: now,
            status: InvitationStatus::Pending,
            responded_at: None,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Accept or decline `user_id`'s invitation.
    ///
    /// Acceptance admits the user first; if the challenge is full the
    /// invitation stays pending.
    pub fn respond_to_invitation(
        &mut self,
        user_id: &UserId,
        response: InvitationResponse,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        self.ensure_open(ChallengeAction::RespondToInvitation)?;
        let status = self
            .invitation(user_id)
            .map(|invitation| invitation.status)
            .ok_or_else(|| ChallengeError::InvitationNotFound {
                user_id: user_id.clone(),
            })?;
        if status != InvitationStatus::Pending {
            return Err(ChallengeError::InvitationAlreadyResolved {
                user_id: user_id.clone(),
            });
        }

        let resolved = match response {
            InvitationResponse::Accept => {
                self.ensure_capacity()?;
                if self.participant(user_id).is_some() {
                    return Err(ChallengeError::AlreadyJoined {
                        user_id: user_id.clone(),
                    });
                }
                self.admit(user_id, now);
                InvitationStatus::Accepted
            }
            InvitationResponse::Decline => InvitationStatus::Declined,
        };

        if let Some(invitation) = self
            .invitations
            .iter_mut()
            .find(|invitation| &invitation.user_id == user_id)
        {
            invitation.status = resolved;
            invitation.responded_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Fold a completed session into `user_id`'s progress.
    ///
    /// Applies only to active challenges the user belongs to, and only for
    /// sessions that ended inside the schedule. Each session counts once.
    /// Returns whether progress changed.
    pub fn record_session(
        &mut self,
        user_id: &UserId,
        contribution: &SessionContribution,
        now: DateTime<Utc>,
    ) -> Result<bool, ChallengeError> {
        if self.status != ChallengeStatus::Active
            || !self.schedule.contains(contribution.ended_at)
        {
            return Ok(false);
        }
        let unit = self.requirement.unit;
        let participant = self.participant_mut(user_id)?;
        if participant
            .contributed_sessions
            .contains(&contribution.session_id)
        {
            return Ok(false);
        }

        let next = match unit {
            ChallengeUnit::Minutes => participant.progress + f64::from(contribution.minutes),
            ChallengeUnit::Sessions => participant.progress + 1.0,
            ChallengeUnit::Days => f64::from(contribution.streak),
            ChallengeUnit::Xp => participant.progress + xp_as_progress(contribution.xp),
            ChallengeUnit::Points => return Ok(false),
        };
        participant
            .contributed_sessions
            .insert(contribution.session_id);
        self.update_progress(user_id, next, now)?;
        Ok(true)
    }

    fn invitation(&self, user_id: &UserId) -> Option<&Invitation> {
        self.invitations
            .iter()
            .find(|invitation| &invitation.user_id == user_id)
    }

    fn participant_mut(&mut self, user_id: &UserId) -> Result<&mut Participant, ChallengeError> {
        self.participants
            .iter_mut()
            .find(|participant| &participant.user_id == user_id)
            .ok_or_else(|| ChallengeError::NotParticipant {
                user_id: user_id.clone(),
            })
    }

    fn ensure_open(&self, action: ChallengeAction) -> Result<(), ChallengeError> {
        if self.status.is_terminal() {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn ensure_capacity(&self) -> Result<(), ChallengeError> {
        let max_participants = self.settings.max_participants;
        let full = u32::try_from(self.participants.len())
            .map_or(true, |count| count >= max_participants);
        if full {
            return Err(ChallengeError::ChallengeFull { max_participants });
        }
        Ok(())
    }

    fn admit(&mut self, user_id: &UserId, now: DateTime<Utc>) {
        self.participants.push(Participant {
            user_id: user_id.clone(),
            joined_at: now,
            progress: 0.0,
            completed: false,
            completed_at: None,
            contributed_sessions: BTreeSet::new(),
        });
        self.updated_at = now;
        self.recompute();
    }
}

// XP totals stay far below 2^53, where the conversion is exact.
fn xp_as_progress(xp: u64) -> f64 {
    xp as f64
}
