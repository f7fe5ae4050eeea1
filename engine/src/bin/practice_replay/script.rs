//! Replay script format.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use practice_engine::domain::challenges::NewChallenge;
use practice_engine::domain::{AchievementDefinition, Challenge, StatSnapshot};
use practice_engine::domain::progress::StatSnapshotDraft;

/// A replay: optional inline catalog plus ordered steps.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default)]
    pub catalog: Option<Vec<AchievementDefinition>>,
    pub steps: Vec<Step>,
}

/// One timestamped action. Users and challenges are named by aliases local to
/// the script.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Practice {
        user: String,
        #[serde(rename = "startedAt")]
        started_at: DateTime<Utc>,
        minutes: i64,
    },
    CreateChallenge {
        name: String,
        creator: String,
        at: DateTime<Utc>,
        challenge: NewChallenge,
    },
    Publish {
        name: String,
        at: DateTime<Utc>,
    },
    Start {
        name: String,
        at: DateTime<Utc>,
    },
    Join {
        name: String,
        user: String,
        at: DateTime<Utc>,
    },
    Complete {
        name: String,
        at: DateTime<Utc>,
    },
}

/// Final state written to stdout.
#[derive(Debug, Default, Serialize)]
pub struct Report {
    pub users: BTreeMap<String, StatSnapshotDraft>,
    pub challenges: BTreeMap<String, Challenge>,
}

impl Report {
    pub fn record_user(&mut self, alias: &str, snapshot: StatSnapshot) {
        self.users.insert(alias.to_owned(), snapshot.into());
    }
}
