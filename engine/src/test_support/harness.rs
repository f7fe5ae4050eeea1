//! Fully wired engine over in-memory adapters.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::achievements::{
    AchievementReward, Rarity, Requirement, RequirementKind,
};
use crate::domain::ports::{CompleteSessionResponse, PracticeSessionCommand, StartSessionRequest};
use crate::domain::{
    AchievementDefinition, AchievementId, ChallengeService, Error, PracticeSessionService,
    ProgressCoordinator, ProgressPolicy, StatSnapshot, UserId,
};
use crate::outbound::catalog::StaticAchievementCatalog;
use crate::outbound::memory::InMemoryRepositories;

use super::MutableClock;

/// UTC timestamp on the hour and minute given.
pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    match Utc
        .with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
    {
        Some(instant) => instant,
        None => panic!("invalid timestamp {year}-{month}-{day} {hour}:{minute}"),
    }
}

/// Active, visible, one-time achievement with no extra conditions.
pub fn definition(
    id: &str,
    kind: RequirementKind,
    threshold: u64,
    xp: u64,
    rarity: Rarity,
) -> AchievementDefinition {
    let achievement_id = match AchievementId::new(id) {
        Ok(achievement_id) => achievement_id,
        Err(error) => panic!("invalid achievement id {id}: {error}"),
    };
    AchievementDefinition {
        id: achievement_id,
        name: id.replace('-', " "),
        description: String::new(),
        category: "test".to_owned(),
        requirement: Requirement {
            kind,
            threshold,
            conditions: Vec::new(),
        },
        reward: AchievementReward {
            xp,
            badge: None,
            title: None,
        },
        rarity,
        is_active: true,
        is_hidden: false,
        is_repeatable: false,
    }
}

/// Services, adapters, and clock sharing one set of in-memory stores.
pub struct EngineHarness {
    pub repositories: InMemoryRepositories,
    pub catalog: Arc<StaticAchievementCatalog>,
    pub clock: Arc<MutableClock>,
    pub coordinator: Arc<ProgressCoordinator>,
    pub sessions: PracticeSessionService,
    pub challenges: ChallengeService,
}

impl EngineHarness {
    pub fn new(definitions: Vec<AchievementDefinition>, now: DateTime<Utc>) -> Self {
        Self::with_policy(definitions, now, ProgressPolicy::default())
    }

    pub fn with_policy(
        definitions: Vec<AchievementDefinition>,
        now: DateTime<Utc>,
        policy: ProgressPolicy,
    ) -> Self {
        let repositories = InMemoryRepositories::default();
        let catalog = Arc::new(StaticAchievementCatalog::new(definitions));
        let clock = Arc::new(MutableClock::new(now));
        let coordinator = Arc::new(ProgressCoordinator::new(
            repositories.progress_ports(catalog.clone()),
            clock.clone(),
            policy,
        ));
        let sessions = PracticeSessionService::new(
            repositories.sessions.clone(),
            coordinator.clone(),
            clock.clone(),
        );
        let challenges = ChallengeService::new(
            repositories.challenges.clone(),
            coordinator.clone(),
            clock.clone(),
        );

        Self {
            repositories,
            catalog,
            clock,
            coordinator,
            sessions,
            challenges,
        }
    }

    /// Start a session now, let `minutes` pass, and complete it.
    pub async fn practice(
        &self,
        user_id: &UserId,
        minutes: i64,
    ) -> Result<CompleteSessionResponse, Error> {
        let started = self
            .sessions
            .start_session(StartSessionRequest {
                user_id: user_id.clone(),
                instrument: "piano".to_owned(),
            })
            .await?;
        self.clock.advance_minutes(minutes);
        self.sessions.complete(user_id, started.session_id).await
    }

    /// Current snapshot; panics when the store fails.
    pub async fn snapshot(&self, user_id: &UserId) -> StatSnapshot {
        match self.coordinator.snapshot(user_id).await {
            Ok(snapshot) => snapshot,
            Err(error) => panic!("snapshot lookup failed: {error}"),
        }
    }
}
