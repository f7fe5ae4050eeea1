//! Practice session aggregate.

mod log;
mod session;

pub use log::{LogEntry, LogEntryKind, PracticeGoal, PracticeLog};
pub use session::{
    PracticeSession, SessionAction, SessionError, SessionOutcome, SessionStatus,
};
