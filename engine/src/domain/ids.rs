//! Identifiers for engine aggregates.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifier of a [`crate::domain::PracticeSession`].
    SessionId
);

uuid_id!(
    /// Identifier of a [`crate::domain::Challenge`].
    ChallengeId
);

/// Maximum length of an achievement identifier.
pub const ACHIEVEMENT_ID_MAX: usize = 64;

/// Validation errors returned by [`AchievementId::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AchievementIdValidationError {
    #[error("achievement id must not be empty")]
    Empty,
    #[error("achievement id must be at most {max} characters")]
    TooLong { max: usize },
    #[error("achievement id may only contain lowercase letters, digits, '-' or '_'")]
    InvalidCharacters,
}

/// Catalog-assigned achievement identifier, e.g. `first-hour`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AchievementId(String);

impl AchievementId {
    /// Validate and construct an [`AchievementId`].
    ///
    /// # Examples
    /// ```
    /// use practice_engine::domain::AchievementId;
    ///
    /// assert!(AchievementId::new("first-hour").is_ok());
    /// assert!(AchievementId::new("First Hour").is_err());
    /// ```
    pub fn new(id: impl Into<String>) -> Result<Self, AchievementIdValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(AchievementIdValidationError::Empty);
        }
        if id.chars().count() > ACHIEVEMENT_ID_MAX {
            return Err(AchievementIdValidationError::TooLong {
                max: ACHIEVEMENT_ID_MAX,
            });
        }
        let valid = id
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');
        if !valid {
            return Err(AchievementIdValidationError::InvalidCharacters);
        }
        Ok(Self(id))
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for AchievementId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AchievementId> for String {
    fn from(value: AchievementId) -> Self {
        value.0
    }
}

impl TryFrom<String> for AchievementId {
    type Error = AchievementIdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
