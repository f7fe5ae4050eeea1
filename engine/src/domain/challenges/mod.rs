//! Multi-user challenges: membership, invitations, progress, and ranking.

mod challenge;
mod error;
mod leaderboard;
mod membership;
mod rewards;

pub use challenge::{
    Challenge, ChallengeRequirement, ChallengeSchedule, ChallengeSettings, ChallengeStats,
    ChallengeStatus, ChallengeType, ChallengeUnit, NewChallenge,
};
pub use error::{ChallengeAction, ChallengeError};
pub use leaderboard::LeaderboardEntry;
pub use membership::{
    Invitation, InvitationResponse, InvitationStatus, Participant, SessionContribution,
};
pub use rewards::{PlaceReward, RewardGrant, RewardTable};

#[cfg(test)]
mod tests;
