//! Progress coordination for completed sessions and challenge rewards.
//!
//! A completion runs in three resumable stages: the snapshot update (which
//! remembers the resulting cycle), unlock recording, and challenge
//! contributions. Each stage is idempotent, so repeating a completion after a
//! partial failure finishes the remaining work without counting anything
//! twice. The remembered cycle stays pending until the session service has
//! durably marked the session as recorded and calls
//! [`ProgressCoordinator::settle_session`].

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::achievements::AchievementDefinition;
use crate::domain::challenges::{RewardGrant, SessionContribution};
use crate::domain::persistence_mapping::{
    map_challenge_repository_error, map_snapshot_repository_error, map_unlock_repository_error,
};
use crate::domain::ports::{
    AchievementCatalog, AchievementUnlockRepository, AchievementUnlockRepositoryError,
    ChallengeRepository, ChallengeRewardReceipt, StatSnapshotRepository, VersionConflict,
    Versioned,
};
use crate::domain::progress::{ProgressCycle, apply_completion};
use crate::domain::{
    AchievementUnlock, Challenge, ChallengeError, ChallengeId, Error, ProgressPolicy, SessionId,
    SessionOutcome, StatSnapshot, UserId,
};

/// Port bundle required by the coordinator.
pub struct ProgressPorts {
    /// Per-user statistics snapshots.
    pub snapshots: Arc<dyn StatSnapshotRepository>,
    /// Challenge aggregates the user may contribute to.
    pub challenges: Arc<dyn ChallengeRepository>,
    /// Source of active achievement definitions.
    pub catalog: Arc<dyn AchievementCatalog>,
    /// Append-only unlock log.
    pub unlocks: Arc<dyn AchievementUnlockRepository>,
}

impl ProgressPorts {
    /// Build a strongly-typed port bundle.
    pub fn new(
        snapshots: Arc<dyn StatSnapshotRepository>,
        challenges: Arc<dyn ChallengeRepository>,
        catalog: Arc<dyn AchievementCatalog>,
        unlocks: Arc<dyn AchievementUnlockRepository>,
    ) -> Self {
        Self {
            snapshots,
            challenges,
            catalog,
            unlocks,
        }
    }
}

/// What recording one completion did.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReport {
    pub cycle: ProgressCycle,
    /// `true` when the snapshot already held this session.
    pub replayed: bool,
    /// Challenges whose progress changed during this call.
    pub updated_challenges: Vec<Challenge>,
}

/// Applies session outcomes and challenge rewards to user progress.
pub struct ProgressCoordinator {
    snapshots: Arc<dyn StatSnapshotRepository>,
    challenges: Arc<dyn ChallengeRepository>,
    catalog: Arc<dyn AchievementCatalog>,
    unlocks: Arc<dyn AchievementUnlockRepository>,
    clock: Arc<dyn Clock>,
    policy: ProgressPolicy,
}

impl ProgressCoordinator {
    pub fn new(ports: ProgressPorts, clock: Arc<dyn Clock>, policy: ProgressPolicy) -> Self {
        Self {
            snapshots: ports.snapshots,
            challenges: ports.challenges,
            catalog: ports.catalog,
            unlocks: ports.unlocks,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &ProgressPolicy {
        &self.policy
    }

    /// Current snapshot for `user_id`; users without one get a fresh level 1
    /// snapshot.
    pub async fn snapshot(&self, user_id: &UserId) -> Result<StatSnapshot, Error> {
        Ok(self.load_snapshot(user_id).await?.aggregate)
    }

    /// Unlock history for `user_id`.
    pub async fn unlocks(&self, user_id: &UserId) -> Result<Vec<AchievementUnlock>, Error> {
        self.unlocks
            .list_for_user(user_id)
            .await
            .map_err(map_unlock_repository_error)
    }

    /// Apply a completed session to the owner's progress.
    ///
    /// When the achievement catalog cannot be read the session still counts;
    /// the returned cycle reports that achievements were not evaluated.
    pub async fn record_completion(
        &self,
        outcome: &SessionOutcome,
    ) -> Result<CompletionReport, Error> {
        let catalog = self.active_catalog().await;
        let (cycle, replayed) = self.apply_to_snapshot(outcome, catalog.as_deref()).await?;

        self.record_unlocks(&cycle).await?;
        let updated_challenges = self.contribute_to_challenges(outcome, &cycle).await?;

        if replayed {
            debug!(
                user_id = %outcome.user_id,
                session_id = %outcome.session_id,
                "session already applied; finished remaining effects"
            );
        } else if cycle.leveled_up() {
            info!(
                user_id = %outcome.user_id,
                previous_level = cycle.previous_level,
                new_level = cycle.new_level,
                "user levelled up"
            );
        }

        Ok(CompletionReport {
            cycle,
            replayed,
            updated_challenges,
        })
    }

    /// Credit one challenge reward to its recipient.
    ///
    /// Each user is credited at most once per challenge; later calls return a
    /// receipt without an award. Rewards add XP and labels but do not trigger
    /// achievement evaluation.
    pub async fn grant_challenge_reward(
        &self,
        challenge_id: ChallengeId,
        grant: &RewardGrant,
    ) -> Result<ChallengeRewardReceipt, Error> {
        let max_attempts = self.policy.max_save_attempts.get();
        for attempt in 1..=max_attempts {
            let Versioned {
                version,
                aggregate: mut snapshot,
            } = self.load_snapshot(&grant.user_id).await?;

            if !snapshot.mark_challenge_rewarded(challenge_id) {
                debug!(
                    user_id = %grant.user_id,
                    %challenge_id,
                    "challenge reward already credited"
                );
                return Ok(ChallengeRewardReceipt {
                    grant: grant.clone(),
                    award: None,
                });
            }
            let award = snapshot.apply_xp(grant.xp, &self.policy.curve);
            snapshot.record_labels(grant.badge.as_deref(), grant.title.as_deref());

            match self.snapshots.save(&snapshot, version).await {
                Ok(_) => {
                    info!(
                        user_id = %grant.user_id,
                        %challenge_id,
                        rank = grant.rank,
                        xp = grant.xp,
                        "challenge reward credited"
                    );
                    return Ok(ChallengeRewardReceipt {
                        grant: grant.clone(),
                        award: Some(award),
                    });
                }
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(user_id = %grant.user_id, attempt, %error, "retrying reward credit");
                }
                Err(error) => return Err(map_snapshot_repository_error(error)),
            }
        }
        Err(exhausted("stat snapshot"))
    }

    /// Release the remembered cycle of `session_id` once the session itself
    /// records that its progress was applied or that it was deleted.
    ///
    /// Returns `false` when nothing was pending.
    pub async fn settle_session(
        &self,
        user_id: &UserId,
        session_id: SessionId,
    ) -> Result<bool, Error> {
        let max_attempts = self.policy.max_save_attempts.get();
        for attempt in 1..=max_attempts {
            let Versioned {
                version,
                aggregate: mut snapshot,
            } = self.load_snapshot(user_id).await?;

            if !snapshot.settle_cycle(session_id) {
                return Ok(false);
            }
            match self.snapshots.save(&snapshot, version).await {
                Ok(_) => {
                    debug!(%user_id, %session_id, "completion cycle settled");
                    return Ok(true);
                }
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(%user_id, attempt, %error, "retrying settlement");
                }
                Err(error) => return Err(map_snapshot_repository_error(error)),
            }
        }
        Err(exhausted("stat snapshot"))
    }

    /// Remove a deleted session's minutes and count from its owner's totals.
    ///
    /// Returns `false` when the session was already reversed. The reversal
    /// stays remembered until [`Self::settle_session`] runs, so a retried
    /// deletion never subtracts twice.
    pub async fn reverse_session(&self, outcome: &SessionOutcome) -> Result<bool, Error> {
        let practice_date = self.policy.calendar.date_of(outcome.started_at);
        let max_attempts = self.policy.max_save_attempts.get();
        for attempt in 1..=max_attempts {
            let Versioned {
                version,
                aggregate: mut snapshot,
            } = self.load_snapshot(&outcome.user_id).await?;

            if !snapshot.reverse_session(outcome, practice_date) {
                return Ok(false);
            }
            match self.snapshots.save(&snapshot, version).await {
                Ok(_) => {
                    info!(
                        user_id = %outcome.user_id,
                        session_id = %outcome.session_id,
                        "session reversed"
                    );
                    return Ok(true);
                }
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(user_id = %outcome.user_id, attempt, %error, "retrying reversal");
                }
                Err(error) => return Err(map_snapshot_repository_error(error)),
            }
        }
        Err(exhausted("stat snapshot"))
    }

    async fn load_snapshot(&self, user_id: &UserId) -> Result<Versioned<StatSnapshot>, Error> {
        let found = self
            .snapshots
            .find_by_user(user_id)
            .await
            .map_err(map_snapshot_repository_error)?;
        Ok(found.unwrap_or_else(|| Versioned::unsaved(StatSnapshot::new(user_id.clone()))))
    }

    async fn active_catalog(&self) -> Option<Vec<AchievementDefinition>> {
        match self.catalog.list_active().await {
            Ok(definitions) => Some(definitions),
            Err(error) => {
                warn!(%error, "achievement catalog unavailable; skipping evaluation");
                None
            }
        }
    }

    async fn apply_to_snapshot(
        &self,
        outcome: &SessionOutcome,
        catalog: Option<&[AchievementDefinition]>,
    ) -> Result<(ProgressCycle, bool), Error> {
        let max_attempts = self.policy.max_save_attempts.get();
        for attempt in 1..=max_attempts {
            let Versioned { version, aggregate } = self.load_snapshot(&outcome.user_id).await?;
            let result = apply_completion(aggregate, outcome, catalog, &self.policy);
            if result.replayed {
                return Ok((result.cycle, true));
            }

            match self.snapshots.save(&result.snapshot, version).await {
                Ok(_) => return Ok((result.cycle, false)),
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(
                        user_id = %outcome.user_id,
                        attempt,
                        %error,
                        "snapshot changed underneath completion; retrying"
                    );
                }
                Err(error) => return Err(map_snapshot_repository_error(error)),
            }
        }
        Err(exhausted("stat snapshot"))
    }

    async fn record_unlocks(&self, cycle: &ProgressCycle) -> Result<(), Error> {
        for unlock in &cycle.unlocks {
            match self.unlocks.record(unlock).await {
                Ok(()) => info!(
                    user_id = %unlock.user_id,
                    achievement_id = %unlock.achievement_id,
                    xp = unlock.xp_awarded,
                    "achievement unlocked"
                ),
                Err(AchievementUnlockRepositoryError::Duplicate { .. }) => debug!(
                    achievement_id = %unlock.achievement_id,
                    "unlock already recorded"
                ),
                Err(error) => return Err(map_unlock_repository_error(error)),
            }
        }
        Ok(())
    }

    async fn contribute_to_challenges(
        &self,
        outcome: &SessionOutcome,
        cycle: &ProgressCycle,
    ) -> Result<Vec<Challenge>, Error> {
        let challenge_ids = self
            .challenges
            .list_for_participant(&outcome.user_id)
            .await
            .map_err(map_challenge_repository_error)?;
        let contribution = SessionContribution {
            session_id: cycle.session_id,
            ended_at: cycle.ended_at,
            minutes: cycle.minutes,
            xp: cycle.xp_gained,
            streak: cycle.new_streak,
        };

        let mut updated = Vec::new();
        for challenge_id in challenge_ids {
            if let Some(challenge) = self
                .contribute_to(challenge_id, &outcome.user_id, &contribution)
                .await?
            {
                updated.push(challenge);
            }
        }
        Ok(updated)
    }

    async fn contribute_to(
        &self,
        challenge_id: ChallengeId,
        user_id: &UserId,
        contribution: &SessionContribution,
    ) -> Result<Option<Challenge>, Error> {
        let max_attempts = self.policy.max_save_attempts.get();
        for attempt in 1..=max_attempts {
            let found = self
                .challenges
                .find_by_id(&challenge_id)
                .await
                .map_err(map_challenge_repository_error)?;
            let Some(Versioned {
                version,
                aggregate: mut challenge,
            }) = found
            else {
                warn!(%challenge_id, "listed challenge is missing");
                return Ok(None);
            };

            let now = self.clock.utc();
            let refreshed = challenge.refresh(now);
            let recorded = match challenge.record_session(user_id, contribution, now) {
                Ok(recorded) => recorded,
                // The user left between listing and loading.
                Err(ChallengeError::NotParticipant { .. }) => false,
                Err(error) => return Err(error.into()),
            };
            if !refreshed && !recorded {
                return Ok(None);
            }

            match self.challenges.save(&challenge, version).await {
                Ok(_) => return Ok(recorded.then_some(challenge)),
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(%challenge_id, attempt, %error, "challenge changed; retrying");
                }
                Err(error) => return Err(map_challenge_repository_error(error)),
            }
        }
        Err(exhausted("challenge"))
    }
}

fn exhausted(aggregate: &str) -> Error {
    Error::concurrency_conflict(format!(
        "{aggregate} was modified concurrently; retries exhausted"
    ))
}

#[cfg(test)]
#[path = "progress_coordinator_tests.rs"]
mod tests;
