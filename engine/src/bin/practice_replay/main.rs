//! Replay a JSON script of practice sessions and challenge actions through the
//! engine and print the resulting statistics.

mod script;

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::{ambient_authority, fs::Dir};
use chrono::{DateTime, TimeDelta, Utc};
use clap::Parser;
use ortho_config::OrthoConfig;
use tracing::info;

use practice_engine::clock::MutableClock;
use practice_engine::config::EngineSettings;
use practice_engine::domain::ports::{
    ChallengeCommand, PracticeSessionCommand, StartSessionRequest,
};
use practice_engine::domain::{
    ChallengeId, ChallengeService, PracticeSessionService, ProgressCoordinator, ProgressPolicy,
    UserId,
};
use practice_engine::outbound::catalog::StaticAchievementCatalog;
use practice_engine::outbound::memory::InMemoryRepositories;
use practice_engine::telemetry::init_tracing;

use script::{Report, Script, Step};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "practice-replay",
    about = "Replay practice sessions and challenges through the progress engine",
    version
)]
struct Cli {
    /// JSON script to replay.
    script: PathBuf,
    /// Achievement catalog; overrides `PRACTICE_CATALOG_PATH`.
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

fn other(context: &str, error: impl std::fmt::Display) -> io::Error {
    io::Error::other(format!("{context}: {error}"))
}

fn read_text(path: &Path) -> io::Result<String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| other("invalid path", path.display()))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read_to_string(Path::new(file_name))
}

struct Replay {
    clock: Arc<MutableClock>,
    coordinator: Arc<ProgressCoordinator>,
    sessions: PracticeSessionService,
    challenges: ChallengeService,
    users: HashMap<String, UserId>,
    challenge_ids: HashMap<String, ChallengeId>,
}

impl Replay {
    /// Wire the engine over fresh in-memory adapters.
    fn new(catalog: StaticAchievementCatalog, policy: ProgressPolicy, now: DateTime<Utc>) -> Self {
        let repositories = InMemoryRepositories::default();
        let clock = Arc::new(MutableClock::new(now));
        let coordinator = Arc::new(ProgressCoordinator::new(
            repositories.progress_ports(Arc::new(catalog)),
            clock.clone(),
            policy,
        ));
        Self {
            sessions: PracticeSessionService::new(
                repositories.sessions.clone(),
                coordinator.clone(),
                clock.clone(),
            ),
            challenges: ChallengeService::new(
                repositories.challenges.clone(),
                coordinator.clone(),
                clock.clone(),
            ),
            clock,
            coordinator,
            users: HashMap::new(),
            challenge_ids: HashMap::new(),
        }
    }

    fn user(&mut self, alias: &str) -> UserId {
        self.users
            .entry(alias.to_owned())
            .or_insert_with(UserId::random)
            .clone()
    }

    fn challenge(&self, name: &str) -> io::Result<ChallengeId> {
        self.challenge_ids
            .get(name)
            .copied()
            .ok_or_else(|| other("unknown challenge", name))
    }

    async fn run(&mut self, step: Step) -> io::Result<()> {
        match step {
            Step::Practice {
                user,
                started_at,
                minutes,
            } => {
                let user_id = self.user(&user);
                self.clock.set(started_at);
                let started = self
                    .sessions
                    .start_session(StartSessionRequest {
                        user_id: user_id.clone(),
                        instrument: "replay".to_owned(),
                    })
                    .await
                    .map_err(|e| other("start session", e))?;
                self.clock.set(started_at + TimeDelta::minutes(minutes));
                let completed = self
                    .sessions
                    .complete(&user_id, started.session_id)
                    .await
                    .map_err(|e| other("complete session", e))?;
                info!(
                    user = %user,
                    xp_gained = completed.xp_gained,
                    level = completed.new_level,
                    streak = completed.new_streak,
                    "replayed session"
                );
            }
            Step::CreateChallenge {
                name,
                creator,
                at,
                challenge,
            } => {
                let creator_id = self.user(&creator);
                self.clock.set(at);
                let created = self
                    .challenges
                    .create_challenge(&creator_id, challenge)
                    .await
                    .map_err(|e| other("create challenge", e))?;
                self.challenge_ids.insert(name, created.id());
            }
            Step::Publish { name, at } => {
                let id = self.challenge(&name)?;
                let creator = self.creator_of(id).await?;
                self.clock.set(at);
                self.challenges
                    .publish(&creator, id)
                    .await
                    .map_err(|e| other("publish challenge", e))?;
            }
            Step::Start { name, at } => {
                let id = self.challenge(&name)?;
                let creator = self.creator_of(id).await?;
                self.clock.set(at);
                self.challenges
                    .start(&creator, id)
                    .await
                    .map_err(|e| other("start challenge", e))?;
            }
            Step::Join { name, user, at } => {
                let id = self.challenge(&name)?;
                let user_id = self.user(&user);
                self.clock.set(at);
                self.challenges
                    .join(&user_id, id)
                    .await
                    .map_err(|e| other("join challenge", e))?;
            }
            Step::Complete { name, at } => {
                let id = self.challenge(&name)?;
                let creator = self.creator_of(id).await?;
                self.clock.set(at);
                self.challenges
                    .complete(&creator, id)
                    .await
                    .map_err(|e| other("complete challenge", e))?;
            }
        }
        Ok(())
    }

    async fn creator_of(&self, id: ChallengeId) -> io::Result<UserId> {
        let challenge = self.load_challenge(id).await?;
        Ok(challenge.creator_id().clone())
    }

    async fn load_challenge(
        &self,
        id: ChallengeId,
    ) -> io::Result<practice_engine::domain::Challenge> {
        self.challenges
            .find(id)
            .await
            .map_err(|e| other("load challenge", e))
    }

    async fn report(&self) -> io::Result<Report> {
        let mut report = Report::default();
        for (alias, user_id) in &self.users {
            let snapshot = self
                .coordinator
                .snapshot(user_id)
                .await
                .map_err(|e| other("read snapshot", e))?;
            report.record_user(alias, snapshot);
        }
        for (name, id) in &self.challenge_ids {
            report
                .challenges
                .insert(name.clone(), self.load_challenge(*id).await?);
        }
        Ok(report)
    }
}

async fn async_main(cli: Cli) -> io::Result<()> {
    let settings = EngineSettings::load_from_iter([OsString::from("practice-replay")])
        .map_err(|e| other("failed to load settings", e))?;
    let policy = settings
        .to_policy()
        .map_err(|e| other("invalid settings", e))?;

    let script: Script = serde_json::from_str(&read_text(&cli.script)?)
        .map_err(|e| other("invalid script", e))?;
    let catalog = match (script.catalog, cli.catalog.or(settings.catalog_path)) {
        (Some(definitions), _) => StaticAchievementCatalog::new(definitions),
        (None, Some(path)) => {
            StaticAchievementCatalog::from_path(&path).map_err(|e| other("catalog", e))?
        }
        (None, None) => StaticAchievementCatalog::new(Vec::new()),
    };

    let mut replay = Replay::new(catalog, policy, Utc::now());

    let step_count = script.steps.len();
    for step in script.steps {
        replay.run(step).await?;
    }
    info!(steps = step_count, "replay finished");

    let report = replay.report().await?;
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| other("failed to render report", e))?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.write_all(b"\n")
}

fn main() -> io::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("failed to build runtime: {error}")))?;
    runtime.block_on(async_main(cli))
}
