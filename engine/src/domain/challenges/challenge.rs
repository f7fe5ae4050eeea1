//! Challenge aggregate and its lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChallengeId, UserId};

use super::{
    ChallengeAction, ChallengeError, Invitation, LeaderboardEntry, Participant, RewardGrant,
    RewardTable,
};

/// Lifecycle state of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Draft,
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl ChallengeStatus {
    /// `Completed` and `Cancelled` accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Cadence of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeType {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

/// Unit in which challenge progress is measured.
///
/// Completed sessions feed `minutes`, `sessions`, `days`, and `xp`
/// automatically. `points` only moves through explicit progress reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeUnit {
    Minutes,
    Sessions,
    Days,
    Xp,
    Points,
}

/// Target a participant must reach to complete the challenge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequirement {
    pub target: f64,
    pub unit: ChallengeUnit,
}

/// Membership rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSettings {
    pub max_participants: u32,
    /// Anyone may join directly; otherwise an accepted invitation is needed.
    pub is_public: bool,
    pub allow_invites: bool,
    /// Start automatically once `starts_at` has passed.
    pub auto_start: bool,
    /// Direct joins are refused; members enter through invitations.
    pub require_approval: bool,
}

impl Default for ChallengeSettings {
    fn default() -> Self {
        Self {
            max_participants: 50,
            is_public: true,
            allow_invites: true,
            auto_start: false,
            require_approval: false,
        }
    }
}

/// Time box of a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeSchedule {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl ChallengeSchedule {
    /// Whether `at` falls inside the schedule, both ends inclusive.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.starts_at <= at && at <= self.ends_at
    }
}

/// Derived participation figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeStats {
    pub total_participants: u32,
    pub completed_participants: u32,
    pub average_progress: f64,
}

/// Caller-supplied fields of a new challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChallenge {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub challenge_type: ChallengeType,
    pub category: String,
    pub requirement: ChallengeRequirement,
    #[serde(default)]
    pub settings: ChallengeSettings,
    pub schedule: ChallengeSchedule,
    #[serde(default)]
    pub rewards: RewardTable,
}

/// A time-boxed competition between users.
///
/// ## Invariants
/// - `participants.len() <= settings.max_participants`.
/// - `leaderboard` and `stats` are recomputed from `participants` after every
///   change and are never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub(super) id: ChallengeId,
    pub(super) creator_id: UserId,
    pub(super) title: String,
    pub(super) description: String,
    pub(super) challenge_type: ChallengeType,
    pub(super) category: String,
    pub(super) requirement: ChallengeRequirement,
    pub(super) settings: ChallengeSettings,
    pub(super) schedule: ChallengeSchedule,
    pub(super) status: ChallengeStatus,
    pub(super) participants: Vec<Participant>,
    pub(super) invitations: Vec<Invitation>,
    pub(super) rewards: RewardTable,
    pub(super) leaderboard: Vec<LeaderboardEntry>,
    pub(super) stats: ChallengeStats,
    pub(super) reward_grants: Vec<RewardGrant>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

impl Challenge {
    /// Validate `draft` and create a challenge in `Draft`.
    ///
    /// The creator is not enrolled automatically.
    pub fn create(
        id: ChallengeId,
        creator_id: UserId,
        draft: NewChallenge,
        now: DateTime<Utc>,
    ) -> Result<Self, ChallengeError> {
        validate(&draft)?;
        let NewChallenge {
            title,
            description,
            challenge_type,
            category,
            requirement,
            settings,
            schedule,
            rewards,
        } = draft;

        Ok(Self {
            id,
            creator_id,
            title: title.trim().to_owned(),
            description,
            challenge_type,
            category,
            requirement,
            settings,
            schedule,
            status: ChallengeStatus::Draft,
            participants: Vec::new(),
            invitations: Vec::new(),
            rewards,
            leaderboard: Vec::new(),
            stats: ChallengeStats::default(),
            reward_grants: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> ChallengeId {
        self.id
    }

    pub fn creator_id(&self) -> &UserId {
        &self.creator_id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn challenge_type(&self) -> ChallengeType {
        self.challenge_type
    }

    pub fn category(&self) -> &str {
        self.category.as_str()
    }

    pub fn requirement(&self) -> ChallengeRequirement {
        self.requirement
    }

    pub fn settings(&self) -> ChallengeSettings {
        self.settings
    }

    pub fn schedule(&self) -> ChallengeSchedule {
        self.schedule
    }

    pub fn status(&self) -> ChallengeStatus {
        self.status
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, user_id: &UserId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| &participant.user_id == user_id)
    }

    pub fn invitations(&self) -> &[Invitation] {
        &self.invitations
    }

    pub fn rewards(&self) -> &RewardTable {
        &self.rewards
    }

    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    pub fn stats(&self) -> ChallengeStats {
        self.stats
    }

    /// Grants computed when the challenge completed; empty before that.
    pub fn reward_grants(&self) -> &[RewardGrant] {
        &self.reward_grants
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `Draft` to `Pending`.
    pub fn publish(&mut self, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        self.transition(
            ChallengeAction::Publish,
            ChallengeStatus::Draft,
            ChallengeStatus::Pending,
            now,
        )
    }

    /// `Pending` to `Active`.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        self.transition(
            ChallengeAction::Start,
            ChallengeStatus::Pending,
            ChallengeStatus::Active,
            now,
        )
    }

    /// Start a pending auto-start challenge whose start time has passed.
    ///
    /// Returns whether the status changed.
    pub fn refresh(&mut self, now: DateTime<Utc>) -> bool {
        let due = self.status == ChallengeStatus::Pending
            && self.settings.auto_start
            && now >= self.schedule.starts_at;
        if due {
            self.status = ChallengeStatus::Active;
            self.updated_at = now;
        }
        due
    }

    /// `Active` to `Completed`: finalise the leaderboard and compute reward
    /// grants for every participant.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<&[RewardGrant], ChallengeError> {
        self.transition(
            ChallengeAction::Complete,
            ChallengeStatus::Active,
            ChallengeStatus::Completed,
            now,
        )?;
        self.recompute();
        self.reward_grants = self.rewards.distribute(&self.leaderboard);
        Ok(&self.reward_grants)
    }

    /// Any non-terminal state to `Cancelled`. No rewards are granted.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), ChallengeError> {
        if self.status.is_terminal() {
            return Err(self.invalid(ChallengeAction::Cancel));
        }
        self.status = ChallengeStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    fn transition(
        &mut self,
        action: ChallengeAction,
        from: ChallengeStatus,
        to: ChallengeStatus,
        now: DateTime<Utc>,
    ) -> Result<(), ChallengeError> {
        if self.status != from {
            return Err(self.invalid(action));
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    pub(super) fn invalid(&self, action: ChallengeAction) -> ChallengeError {
        ChallengeError::InvalidTransition {
            action,
            status: self.status,
        }
    }
}

fn validate(draft: &NewChallenge) -> Result<(), ChallengeError> {
    if draft.title.trim().is_empty() {
        return Err(ChallengeError::Validation(
            "title must not be empty".to_owned(),
        ));
    }
    if !draft.requirement.target.is_finite() || draft.requirement.target <= 0.0 {
        return Err(ChallengeError::Validation(
            "requirement target must be a positive number".to_owned(),
        ));
    }
    if draft.settings.max_participants == 0 {
        return Err(ChallengeError::Validation(
            "max participants must be at least 1".to_owned(),
        ));
    }
    if draft.schedule.ends_at <= draft.schedule.starts_at {
        return Err(ChallengeError::Validation(
            "schedule must end after it starts".to_owned(),
        ));
    }
    Ok(())
}
