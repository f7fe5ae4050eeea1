//! Domain primitives, aggregates, and services.
//!
//! Purpose: model practice sessions, statistics, achievements, and challenges
//! as strongly typed values, and orchestrate them behind driving ports.
//! Engines are synchronous and pure; suspension only happens at the ports.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - PracticeSession, StatSnapshot, Challenge: the three aggregates.
//! - ProgressCoordinator: fixed-order completion pipeline.
//! - PracticeSessionService, ChallengeService: driving port implementations.

pub mod achievements;
pub mod challenges;
pub mod error;
pub mod ids;
pub mod ports;
pub mod progress;
pub mod sessions;
pub mod user;

mod challenge_service;
mod persistence_mapping;
mod practice_session_service;
mod progress_coordinator;

pub use self::achievements::{AchievementDefinition, AchievementUnlock, UnlockDecision};
pub use self::challenge_service::ChallengeService;
pub use self::challenges::{Challenge, ChallengeError, ChallengeStatus};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{AchievementId, AchievementIdValidationError, ChallengeId, SessionId};
pub use self::practice_session_service::PracticeSessionService;
pub use self::progress::{ProgressPolicy, StatSnapshot};
pub use self::progress_coordinator::{CompletionReport, ProgressCoordinator, ProgressPorts};
pub use self::sessions::{PracticeSession, SessionError, SessionOutcome, SessionStatus};
pub use self::user::{UserId, UserValidationError};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use practice_engine::domain::{DomainResult, Error};
///
/// fn refuse() -> DomainResult<()> {
///     Err(Error::forbidden("not your session"))
/// }
/// assert!(refuse().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
