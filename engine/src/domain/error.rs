//! Domain-level error types.
//!
//! These errors are transport agnostic. The CRUD layer that calls into the
//! engine decides how each [`ErrorCode`] maps onto its own protocol.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or fails validation.
    InvalidRequest,
    /// The caller does not own the aggregate it tried to mutate.
    Forbidden,
    /// The requested session, challenge, goal, or invitation does not exist.
    NotFound,
    /// A state machine refused the requested transition.
    InvalidTransition,
    /// The request collides with existing state (full, joined, invited).
    Conflict,
    /// An optimistic concurrency check kept failing after retries.
    ConcurrencyConflict,
    /// A persistence dependency is temporarily unavailable.
    ServiceUnavailable,
    /// An unexpected error occurred inside the domain.
    InternalError,
}

/// Domain error payload.
///
/// ## Invariants
/// - `message` must be non-empty once trimmed of whitespace.
///
/// # Examples
/// ```
/// use practice_engine::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("missing session");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(deny_unknown_fields)]
#[serde(try_from = "ErrorDto", into = "ErrorDto")]
pub struct Error {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

/// Validation errors emitted by the constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
}

impl Error {
    /// Create a new error.
    ///
    /// Blank messages are replaced by the error code's name so the payload
    /// always satisfies its invariant.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        match Self::try_new(code, message) {
            Ok(value) => value,
            Err(ErrorValidationError::EmptyMessage) => Self {
                code,
                message: format!("{code:?}"),
                details: None,
            },
        }
    }

    /// Fallible constructor that validates the message content.
    pub fn try_new(code: ErrorCode, message: impl Into<String>) -> Result<Self, ErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(ErrorValidationError::EmptyMessage);
        }
        Ok(Self {
            code,
            message,
            details: None,
        })
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message returned to adapters.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Supplementary error details for adapters.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// Stable reason string stored under `details.reason`, if any.
    ///
    /// # Examples
    /// ```
    /// use practice_engine::domain::Error;
    ///
    /// let err = Error::conflict("challenge is full").with_reason("challenge_full");
    /// assert_eq!(err.reason(), Some("challenge_full"));
    /// ```
    pub fn reason(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|details| details.get("reason"))
            .and_then(Value::as_str)
    }

    /// Attach structured details to the error.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Record a stable reason string, merging it into any existing object
    /// details.
    pub fn with_reason(mut self, reason: &str) -> Self {
        let mut details = match self.details.take() {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = Map::new();
                map.insert("context".to_owned(), other);
                map
            }
            None => Map::new(),
        };
        details.insert("reason".to_owned(), Value::String(reason.to_owned()));
        self.details = Some(Value::Object(details));
        self
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::Forbidden`].
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidTransition`].
    pub fn invalid_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTransition, message)
    }

    /// Convenience constructor for [`ErrorCode::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ConcurrencyConflict`].
    pub fn concurrency_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConcurrencyConflict, message)
    }

    /// Convenience constructor for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDto {
    code: ErrorCode,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl From<Error> for ErrorDto {
    fn from(value: Error) -> Self {
        Self {
            code: value.code,
            message: value.message,
            details: value.details,
        }
    }
}

impl TryFrom<ErrorDto> for Error {
    type Error = ErrorValidationError;

    fn try_from(value: ErrorDto) -> Result<Self, Self::Error> {
        let ErrorDto {
            code,
            message,
            details,
        } = value;

        let mut error = Error::try_new(code, message)?;
        error.details = details;
        Ok(error)
    }
}

#[cfg(test)]
mod tests;
