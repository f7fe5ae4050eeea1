//! Practice session domain service.
//!
//! Implements [`PracticeSessionCommand`]: owner checks, optimistic
//! read-modify-write against the session repository, and hand-off of
//! completed sessions to the [`ProgressCoordinator`].
//!
//! A completed session is marked `progress_recorded` only after every
//! progress stage has finished. Until then the snapshot keeps the pending
//! cycle, so a retried completion re-drives the remaining stages; afterwards
//! the marker alone refuses the retry.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::persistence_mapping::map_session_repository_error;
use crate::domain::ports::{
    CompleteSessionResponse, PracticeSessionCommand, PracticeSessionRepository,
    StartSessionRequest, StartSessionResponse, UNSAVED_VERSION, VersionConflict, Versioned,
};
use crate::domain::sessions::{PracticeLog, SessionAction};
use crate::domain::{
    CompletionReport, Error, PracticeSession, ProgressCoordinator, SessionError, SessionId,
    SessionOutcome, SessionStatus, UserId,
};

/// Practice session service implementing the session command port.
#[derive(Clone)]
pub struct PracticeSessionService {
    sessions: Arc<dyn PracticeSessionRepository>,
    coordinator: Arc<ProgressCoordinator>,
    clock: Arc<dyn Clock>,
}

impl PracticeSessionService {
    pub fn new(
        sessions: Arc<dyn PracticeSessionRepository>,
        coordinator: Arc<ProgressCoordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            coordinator,
            clock,
        }
    }

    /// Read one of `actor`'s sessions.
    pub async fn find(
        &self,
        actor: &UserId,
        session_id: SessionId,
    ) -> Result<PracticeSession, Error> {
        Ok(self.load_owned(actor, session_id).await?.aggregate)
    }

    fn max_save_attempts(&self) -> u32 {
        self.coordinator.policy().max_save_attempts.get()
    }

    async fn load_owned(
        &self,
        actor: &UserId,
        session_id: SessionId,
    ) -> Result<Versioned<PracticeSession>, Error> {
        let found = self
            .sessions
            .find_by_id(&session_id)
            .await
            .map_err(map_session_repository_error)?;
        let Some(versioned) = found else {
            return Err(Error::not_found(format!(
                "practice session {session_id} not found"
            )));
        };
        if versioned.aggregate.user_id() != actor {
            return Err(Error::forbidden(format!(
                "practice session {session_id} belongs to another user"
            )));
        }
        Ok(versioned)
    }

    /// Load, change, and save a session, retrying lost version races.
    async fn mutate<T, F>(
        &self,
        actor: &UserId,
        session_id: SessionId,
        mut change: F,
    ) -> Result<(PracticeSession, T), Error>
    where
        T: Send,
        F: FnMut(&mut PracticeSession, DateTime<Utc>) -> Result<T, SessionError> + Send,
    {
        let max_attempts = self.max_save_attempts();
        for attempt in 1..=max_attempts {
            let Versioned {
                version,
                aggregate: mut session,
            } = self.load_owned(actor, session_id).await?;
            let value = change(&mut session, self.clock.utc())?;

            match self.sessions.save(&session, version).await {
                Ok(_) => return Ok((session, value)),
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(%session_id, attempt, %error, "session changed; retrying");
                }
                Err(error) => return Err(map_session_repository_error(error)),
            }
        }
        Err(Error::concurrency_conflict(format!(
            "practice session {session_id} was modified concurrently; retries exhausted"
        )))
    }

    /// Record that `outcome` reached the owner's progress, then release the
    /// pending cycle.
    async fn acknowledge(
        &self,
        actor: &UserId,
        outcome: &SessionOutcome,
    ) -> Result<PracticeSession, Error> {
        let (session, _) = self
            .mutate(actor, outcome.session_id, |session, _| {
                Ok(session.mark_progress_recorded())
            })
            .await?;
        self.settle(outcome).await;
        Ok(session)
    }

    /// Release the pending cycle. A failure only delays eviction, so it is
    /// logged rather than returned.
    async fn settle(&self, outcome: &SessionOutcome) {
        if let Err(error) = self
            .coordinator
            .settle_session(&outcome.user_id, outcome.session_id)
            .await
        {
            warn!(
                session_id = %outcome.session_id,
                %error,
                "completion cycle left pending"
            );
        }
    }
}

fn completion_response(session: PracticeSession, report: CompletionReport) -> CompleteSessionResponse {
    let CompletionReport {
        cycle,
        updated_challenges,
        ..
    } = report;
    CompleteSessionResponse {
        session,
        xp_gained: cycle.xp_gained,
        leveled_up: cycle.leveled_up(),
        new_level: cycle.new_level,
        new_streak: cycle.new_streak,
        newly_unlocked: cycle.newly_unlocked(),
        achievements_evaluated: cycle.achievements_evaluated,
        updated_challenges,
    }
}

#[async_trait]
impl PracticeSessionCommand for PracticeSessionService {
    async fn start_session(
        &self,
        request: StartSessionRequest,
    ) -> Result<StartSessionResponse, Error> {
        let StartSessionRequest {
            user_id,
            instrument,
        } = request;
        let session = PracticeSession::start(
            SessionId::random(),
            user_id,
            instrument,
            self.clock.utc(),
        )?;

        self.sessions
            .save(&session, UNSAVED_VERSION)
            .await
            .map_err(map_session_repository_error)?;
        info!(
            user_id = %session.user_id(),
            session_id = %session.id(),
            instrument = session.instrument(),
            "practice session started"
        );

        Ok(StartSessionResponse {
            session_id: session.id(),
            session,
        })
    }

    async fn pause(&self, actor: &UserId, session_id: SessionId) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, now| session.pause(now))
            .await?;
        Ok(session)
    }

    async fn resume(
        &self,
        actor: &UserId,
        session_id: SessionId,
    ) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, now| session.resume(now))
            .await?;
        Ok(session)
    }

    async fn cancel(
        &self,
        actor: &UserId,
        session_id: SessionId,
    ) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, now| session.cancel(now))
            .await?;
        info!(%session_id, "practice session cancelled");
        Ok(session)
    }

    async fn complete(
        &self,
        actor: &UserId,
        session_id: SessionId,
    ) -> Result<CompleteSessionResponse, Error> {
        let current = self.load_owned(actor, session_id).await?.aggregate;
        if current.status() == SessionStatus::Completed {
            let outcome = current.outcome()?;
            if current.progress_recorded() {
                self.settle(&outcome).await;
            } else {
                // Finish whatever progression an earlier attempt left undone.
                self.coordinator.record_completion(&outcome).await?;
                self.acknowledge(actor, &outcome).await?;
            }
            return Err(SessionError::InvalidTransition {
                action: SessionAction::Complete,
                status: SessionStatus::Completed,
            }
            .into());
        }

        let (session, outcome) = self
            .mutate(actor, session_id, |session, now| session.complete(now))
            .await?;
        info!(
            user_id = %outcome.user_id,
            %session_id,
            minutes = outcome.duration_minutes,
            "practice session completed"
        );

        let report = self.coordinator.record_completion(&outcome).await?;
        let session = self.acknowledge(actor, &outcome).await?;
        Ok(completion_response(session, report))
    }

    async fn log_piece(
        &self,
        actor: &UserId,
        session_id: SessionId,
        log: PracticeLog,
    ) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, _| session.log_piece(log.clone()))
            .await?;
        Ok(session)
    }

    async fn log_exercise(
        &self,
        actor: &UserId,
        session_id: SessionId,
        log: PracticeLog,
    ) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, _| {
                session.log_exercise(log.clone())
            })
            .await?;
        Ok(session)
    }

    async fn add_goal(
        &self,
        actor: &UserId,
        session_id: SessionId,
        description: String,
    ) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, _| {
                session.add_goal(description.as_str())
            })
            .await?;
        Ok(session)
    }

    async fn complete_goal(
        &self,
        actor: &UserId,
        session_id: SessionId,
        index: usize,
    ) -> Result<PracticeSession, Error> {
        let (session, ()) = self
            .mutate(actor, session_id, |session, _| session.complete_goal(index))
            .await?;
        Ok(session)
    }

    async fn delete_session(&self, actor: &UserId, session_id: SessionId) -> Result<(), Error> {
        let max_attempts = self.max_save_attempts();
        for attempt in 1..=max_attempts {
            let Versioned { version, aggregate } = self.load_owned(actor, session_id).await?;
            let outcome = aggregate.outcome().ok();
            if let Some(outcome) = &outcome {
                if !aggregate.progress_recorded() {
                    // Only a session that counted can be subtracted.
                    self.coordinator.record_completion(outcome).await?;
                }
                self.coordinator.reverse_session(outcome).await?;
            }

            match self.sessions.delete(&session_id, version).await {
                Ok(()) => {
                    if let Some(outcome) = &outcome {
                        self.settle(outcome).await;
                    }
                    info!(%session_id, "practice session deleted");
                    return Ok(());
                }
                Err(error) if error.is_version_conflict() && attempt < max_attempts => {
                    debug!(%session_id, attempt, %error, "session changed; retrying delete");
                }
                Err(error) => return Err(map_session_repository_error(error)),
            }
        }
        Err(Error::concurrency_conflict(format!(
            "practice session {session_id} was modified concurrently; retries exhausted"
        )))
    }
}

#[cfg(test)]
#[path = "practice_session_service_tests.rs"]
mod tests;
