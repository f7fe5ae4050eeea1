//! Practice session lifecycle and active-time bookkeeping.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{Error, SessionId, UserId};

use super::{LogEntry, LogEntryKind, PracticeGoal, PracticeLog};

/// Lifecycle state of a practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// `Completed` and `Cancelled` accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Operation attempted on a session, reported in transition errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Pause,
    Resume,
    Complete,
    Cancel,
    Log,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Log => "log",
        };
        f.write_str(label)
    }
}

/// Errors raised by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("cannot {action} a {status} session")]
    InvalidTransition {
        action: SessionAction,
        status: SessionStatus,
    },
    #[error("goal {index} does not exist; session has {len} goals")]
    GoalNotFound { index: usize, len: usize },
    #[error("instrument must not be empty")]
    BlankInstrument,
    #[error("log entry title must not be empty")]
    BlankTitle,
    #[error("goal description must not be empty")]
    BlankGoal,
    #[error("session has no outcome until it is completed")]
    NotCompleted,
}

impl SessionError {
    /// Stable snake_case identifier for adapters.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::GoalNotFound { .. } => "goal_not_found",
            Self::BlankInstrument => "blank_instrument",
            Self::BlankTitle => "blank_title",
            Self::BlankGoal => "blank_goal",
            Self::NotCompleted => "not_completed",
        }
    }
}

impl From<SessionError> for Error {
    fn from(value: SessionError) -> Self {
        let message = value.to_string();
        let error = match &value {
            SessionError::InvalidTransition { action, status } => Error::invalid_transition(message)
                .with_details(json!({ "action": action, "status": status })),
            SessionError::GoalNotFound { index, len } => {
                Error::not_found(message).with_details(json!({ "index": index, "goals": len }))
            }
            SessionError::BlankInstrument | SessionError::BlankTitle | SessionError::BlankGoal => {
                Error::invalid_request(message)
            }
            SessionError::NotCompleted => Error::invalid_transition(message),
        };
        error.with_reason(value.reason())
    }
}

/// Stat-affecting result of completing a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub user_id: UserId,
    /// Whole minutes spent active.
    pub duration_minutes: u32,
    /// Start of the session; its calendar day is the practice date.
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// One practice attempt by one user.
///
/// ## Invariants
/// - `ended_at` is set exactly when the status is `Completed`.
/// - Active time only accrues while `Active`; paused intervals are excluded.
///
/// # Examples
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use practice_engine::domain::{PracticeSession, SessionId, UserId};
///
/// let start = Utc.with_ymd_and_hms(2026, 3, 10, 18, 0, 0).single().expect("time");
/// let mut session = PracticeSession::start(SessionId::random(), UserId::random(), "cello", start)
///     .expect("valid session");
/// session.pause(start + Duration::minutes(10)).expect("pause");
/// session.resume(start + Duration::minutes(25)).expect("resume");
/// let outcome = session.complete(start + Duration::minutes(30)).expect("complete");
/// assert_eq!(outcome.duration_minutes, 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    id: SessionId,
    user_id: UserId,
    instrument: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    status: SessionStatus,
    active_seconds: u64,
    active_since: Option<DateTime<Utc>>,
    pieces: Vec<LogEntry>,
    goals: Vec<PracticeGoal>,
    notes: String,
    /// The completion has been fully applied to the owner's progress.
    #[serde(default)]
    progress_recorded: bool,
}

impl PracticeSession {
    /// Begin an `Active` session with no accumulated time.
    pub fn start(
        id: SessionId,
        user_id: UserId,
        instrument: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let instrument = instrument.into();
        if instrument.trim().is_empty() {
            return Err(SessionError::BlankInstrument);
        }

        Ok(Self {
            id,
            user_id,
            instrument: instrument.trim().to_owned(),
            started_at: now,
            ended_at: None,
            status: SessionStatus::Active,
            active_seconds: 0,
            active_since: Some(now),
            pieces: Vec::new(),
            goals: Vec::new(),
            notes: String::new(),
            progress_recorded: false,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn instrument(&self) -> &str {
        self.instrument.as_str()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn pieces(&self) -> &[LogEntry] {
        &self.pieces
    }

    pub fn goals(&self) -> &[PracticeGoal] {
        &self.goals
    }

    pub fn notes(&self) -> &str {
        self.notes.as_str()
    }

    /// Active time banked so far, excluding any still-open interval.
    pub fn active_seconds(&self) -> u64 {
        self.active_seconds
    }

    /// Whole active minutes as of `now`, including an open interval.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> u32 {
        minutes_from_seconds(self.active_seconds.saturating_add(self.open_interval(now)))
    }

    /// Whole active minutes banked so far.
    pub fn duration_minutes(&self) -> u32 {
        minutes_from_seconds(self.active_seconds)
    }

    /// `Active` to `Paused`, banking the open interval.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(self.invalid(SessionAction::Pause));
        }
        self.bank_active_time(now);
        self.status = SessionStatus::Paused;
        Ok(())
    }

    /// `Paused` to `Active`, opening a new interval.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Paused {
            return Err(self.invalid(SessionAction::Resume));
        }
        self.active_since = Some(now);
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Finalise the session and report what it contributes to statistics.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<SessionOutcome, SessionError> {
        if self.status.is_terminal() {
            return Err(self.invalid(SessionAction::Complete));
        }
        self.bank_active_time(now);
        self.status = SessionStatus::Completed;
        // Clock skew must not place the end before the start.
        self.ended_at = Some(now.max(self.started_at));
        self.outcome()
    }

    /// Abandon the session; it never contributes to statistics.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(self.invalid(SessionAction::Cancel));
        }
        self.bank_active_time(now);
        self.status = SessionStatus::Cancelled;
        Ok(())
    }

    /// Whether every progress stage for this completion has finished.
    pub fn progress_recorded(&self) -> bool {
        self.progress_recorded
    }

    /// Remember that the completion reached the owner's progress. Returns
    /// `false` for sessions that are not completed or already marked.
    pub fn mark_progress_recorded(&mut self) -> bool {
        if self.status != SessionStatus::Completed || self.progress_recorded {
            return false;
        }
        self.progress_recorded = true;
        true
    }

    /// Outcome of a completed session, derivable again after the fact.
    pub fn outcome(&self) -> Result<SessionOutcome, SessionError> {
        match (self.status, self.ended_at) {
            (SessionStatus::Completed, Some(ended_at)) => Ok(SessionOutcome {
                session_id: self.id,
                user_id: self.user_id.clone(),
                duration_minutes: self.duration_minutes(),
                started_at: self.started_at,
                ended_at,
            }),
            _ => Err(SessionError::NotCompleted),
        }
    }

    pub fn log_piece(&mut self, log: PracticeLog) -> Result<(), SessionError> {
        self.log(LogEntryKind::Piece, log)
    }

    pub fn log_exercise(&mut self, log: PracticeLog) -> Result<(), SessionError> {
        self.log(LogEntryKind::Exercise, log)
    }

    pub fn add_goal(&mut self, description: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        let description = description.into();
        if description.trim().is_empty() {
            return Err(SessionError::BlankGoal);
        }
        self.goals.push(PracticeGoal {
            description: description.trim().to_owned(),
            completed: false,
        });
        Ok(())
    }

    /// Mark the goal at `index` as done. Completing it twice is harmless.
    pub fn complete_goal(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_open()?;
        let len = self.goals.len();
        let goal = self
            .goals
            .get_mut(index)
            .ok_or(SessionError::GoalNotFound { index, len })?;
        goal.completed = true;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.notes = notes.into();
        Ok(())
    }

    fn log(&mut self, kind: LogEntryKind, log: PracticeLog) -> Result<(), SessionError> {
        self.ensure_open()?;
        if log.title.trim().is_empty() {
            return Err(SessionError::BlankTitle);
        }
        self.pieces.push(LogEntry::new(kind, log));
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(self.invalid(SessionAction::Log));
        }
        Ok(())
    }

    fn invalid(&self, action: SessionAction) -> SessionError {
        SessionError::InvalidTransition {
            action,
            status: self.status,
        }
    }

    fn open_interval(&self, now: DateTime<Utc>) -> u64 {
        self.active_since
            .map(|since| u64::try_from((now - since).num_seconds()).unwrap_or(0))
            .unwrap_or(0)
    }

    fn bank_active_time(&mut self, now: DateTime<Utc>) {
        self.active_seconds = self.active_seconds.saturating_add(self.open_interval(now));
        self.active_since = None;
    }
}

fn minutes_from_seconds(seconds: u64) -> u32 {
    u32::try_from(seconds / 60).unwrap_or(u32::MAX)
}
