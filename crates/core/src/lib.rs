//! Shared primitives for all Rust crates in Lakegrant.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across Lakegrant crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
///
/// The `Permission*` and `Record*` variants name the step of the grant
/// lifecycle that failed; adapters report their own failures with the
/// generic variants and the lifecycle service re-labels them.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The permission service refused or failed to apply a grant.
    #[error("permission apply failed: {0}")]
    PermissionApplyFailed(String),

    /// The permission service refused or failed to remove a grant.
    #[error("permission remove failed: {0}")]
    PermissionRemoveFailed(String),

    /// A grant record could not be inserted.
    #[error("record insert failed: {0}")]
    RecordInsertFailed(String),

    /// A grant record could not be updated.
    #[error("record update failed: {0}")]
    RecordUpdateFailed(String),

    /// The grant record set could not be read.
    #[error("record scan failed: {0}")]
    RecordScanFailed(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
