//! Leaderboard and stats derivation.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::UserId;

use super::{Challenge, ChallengeStats, Participant};

/// One ranked row of a challenge leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 1-based rank with no gaps or ties.
    pub rank: u32,
    pub user_id: UserId,
    pub progress: f64,
    pub completed: bool,
}

/// Ranking order: progress descending, then earlier joiners first. The user
/// id settles identical join instants so the order is total.
fn ranking_order(a: &Participant, b: &Participant) -> Ordering {
    b.progress
        .total_cmp(&a.progress)
        .then_with(|| a.joined_at.cmp(&b.joined_at))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

impl Challenge {
    /// Rebuild the leaderboard and stats from participant rows.
    pub(super) fn recompute(&mut self) {
        let mut ranked: Vec<&Participant> = self.participants.iter().collect();
        ranked.sort_by(|a, b| ranking_order(a, b));

        self.leaderboard = ranked
            .into_iter()
            .zip(1_u32..)
            .map(|(participant, rank)| LeaderboardEntry {
                rank,
                user_id: participant.user_id.clone(),
                progress: participant.progress,
                completed: participant.completed,
            })
            .collect();

        self.stats = derive_stats(&self.participants);
    }
}

fn derive_stats(participants: &[Participant]) -> ChallengeStats {
    let total = u32::try_from(participants.len()).unwrap_or(u32::MAX);
    let completed = u32::try_from(participants.iter().filter(|p| p.completed).count())
        .unwrap_or(u32::MAX);
    let average_progress = if total == 0 {
        0.0
    } else {
        participants.iter().map(|p| p.progress).sum::<f64>() / f64::from(total)
    };

    ChallengeStats {
        total_participants: total,
        completed_participants: completed,
        average_progress,
    }
}
