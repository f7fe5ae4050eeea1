//! Challenge domain service implementing [`ChallengeCommand`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info};

use crate::domain::challenges::{ChallengeAction, InvitationResponse, NewChallenge, RewardGrant};
use crate::domain::persistence_mapping::map_challenge_repository_error;
use crate::domain::ports::{
    ChallengeCommand, ChallengeRepository, ChallengeRewardReceipt, CompleteChallengeResponse,
    UNSAVED_VERSION, VersionConflict, Versioned,
};
use crate::domain::{
    Challenge, ChallengeError, ChallengeId, ChallengeStatus, Error, ProgressCoordinator, UserId,
};

/// Challenge service: creator checks, optimistic persistence, and reward
/// crediting through the [`ProgressCoordinator`].
#[derive(Clone)]
pub struct ChallengeService {
    challenges: Arc<dyn ChallengeRepository>,
    coordinator: Arc<ProgressCoordinator>,
    clock: Arc<dyn Clock>,
}

fn ensure_creator(challenge: &Challenge, actor: &UserId) -> Result<(), Error> {
    if challenge.creator_id() != actor {
        return Err(Error::forbidden(format!(
            "only the creator may manage challenge {}",
            challenge.id()
        )));
    }
    Ok(())
}

impl ChallengeService {
    pub fn new(
        challenges: Arc<dyn ChallengeRepository>,
        coordinator: Arc<ProgressCoordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenges,
            coordinator,
            clock,
        }
    }

    /// Read a challenge by id.
    pub async fn find(&self, challenge_id: ChallengeId) -> Result<Challenge, Error> {
        Ok(self.load(challenge_id).await?.aggregate)
    }

    async fn load(&self, challenge_id: ChallengeId) -> Result<Versioned<Challenge>, Error> {
        self.challenges
            .find_by_id(&challenge_id)
            .await
            .map_err(map_challenge_repository_error)?
            .ok_or_else(|| Error::not_found(format!("challenge {challenge_id} not found")))
    }

    /// Load, refresh, change, and save a challenge, retrying lost races.
    ///
    /// Due auto-start challenges are started before `change` runs.
    async fn mutate<T, F>(
        &self,
        challenge_id: ChallengeId,
        mut change: F,
    ) -> Result<(Challenge, T), Error>
    where
        T: Send,
        F: FnMut(&mut Challenge, DateTime<Utc>) -> Result<T, Error> + Send,
    {
        let max_attempts = self.coordinator.policy().max_save_attempts.get();
        for attempt in 1..=max_attempts {
            let Versioned {
                version,
                aggregate: mut challenge,
            } = self.load(challenge_id).await?;
            let now = self.clock.utc();
            challenge.refresh(now);
            let value = change(&mut challenge, now)?;

            match self.challenges.save(&challenge, version).await {
                Ok(_) => return Ok((challenge, value)),
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(%challenge_id, attempt, %error, "challenge changed; retrying");
                }
                Err(error) => return Err(map_challenge_repository_error(error)),
            }
        }
        Err(Error::concurrency_conflict(format!(
            "challenge {challenge_id} was modified concurrently; retries exhausted"
        )))
    }

    async fn credit(
        &self,
        challenge_id: ChallengeId,
        grants: &[RewardGrant],
    ) -> Result<Vec<ChallengeRewardReceipt>, Error> {
        let mut receipts = Vec::with_capacity(grants.len());
        for grant in grants {
            receipts.push(
                self.coordinator
                    .grant_challenge_reward(challenge_id, grant)
                    .await?,
            );
        }
        Ok(receipts)
    }
}

#[async_trait]
impl ChallengeCommand for ChallengeService {
    async fn create_challenge(
        &self,
        creator: &UserId,
        draft: NewChallenge,
    ) -> Result<Challenge, Error> {
        let challenge = Challenge::create(
            ChallengeId::random(),
            creator.clone(),
            draft,
            self.clock.utc(),
        )?;
        self.challenges
            .save(&challenge, UNSAVED_VERSION)
            .await
            .map_err(map_challenge_repository_error)?;
        info!(
            challenge_id = %challenge.id(),
            creator_id = %creator,
            title = challenge.title(),
            "challenge created"
        );
        Ok(challenge)
    }

    async fn publish(&self, actor: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                ensure_creator(challenge, actor)?;
                Ok(challenge.publish(now)?)
            })
            .await?;
        Ok(challenge)
    }

    async fn start(&self, actor: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                ensure_creator(challenge, actor)?;
                Ok(challenge.start(now)?)
            })
            .await?;
        info!(%challenge_id, "challenge started");
        Ok(challenge)
    }

    async fn complete(
        &self,
        actor: &UserId,
        challenge_id: ChallengeId,
    ) -> Result<CompleteChallengeResponse, Error> {
        let current = self.load(challenge_id).await?;
        ensure_creator(&current.aggregate, actor)?;
        if current.aggregate.status() == ChallengeStatus::Completed {
            // Credit anything an earlier attempt left undone.
            self.credit(challenge_id, current.aggregate.reward_grants())
                .await?;
            return Err(ChallengeError::InvalidTransition {
                action: ChallengeAction::Complete,
                status: ChallengeStatus::Completed,
            }
            .into());
        }

        let (challenge, grants) = self
            .mutate(challenge_id, |challenge, now| {
                ensure_creator(challenge, actor)?;
                Ok(challenge.complete(now)?.to_vec())
            })
            .await?;
        info!(
            %challenge_id,
            participants = challenge.participants().len(),
            "challenge completed"
        );

        let receipts = self.credit(challenge_id, &grants).await?;
        Ok(CompleteChallengeResponse {
            challenge,
            receipts,
        })
    }

    async fn cancel(&self, actor: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                ensure_creator(challenge, actor)?;
                Ok(challenge.cancel(now)?)
            })
            .await?;
        info!(%challenge_id, "challenge cancelled");
        Ok(challenge)
    }

    async fn join(&self, user_id: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                Ok(challenge.join(user_id, now)?)
            })
            .await?;
        info!(%challenge_id, %user_id, "user joined challenge");
        Ok(challenge)
    }

    async fn leave(&self, user_id: &UserId, challenge_id: ChallengeId) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                Ok(challenge.leave(user_id, now)?)
            })
            .await?;
        info!(%challenge_id, %user_id, "user left challenge");
        Ok(challenge)
    }

    async fn update_progress(
        &self,
        user_id: &UserId,
        challenge_id: ChallengeId,
        progress: f64,
    ) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                Ok(challenge.update_progress(user_id, progress, now)?)
            })
            .await?;
        Ok(challenge)
    }

    async fn invite(
        &self,
        inviter: &UserId,
        challenge_id: ChallengeId,
        invitee: &UserId,
    ) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                Ok(challenge.invite(inviter, invitee, now)?)
            })
            .await?;
        Ok(challenge)
    }

    async fn respond_to_invitation(
        &self,
        user_id: &UserId,
        challenge_id: ChallengeId,
        response: InvitationResponse,
    ) -> Result<Challenge, Error> {
        let (challenge, ()) = self
            .mutate(challenge_id, |challenge, now| {
                Ok(challenge.respond_to_invitation(user_id, response, now)?)
            })
            .await?;
        Ok(challenge)
    }
}

#[cfg(test)]
#[path = "challenge_service_tests.rs"]
mod tests;
