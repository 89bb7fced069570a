//! Service error taxonomy.
//!
//! # Invariants
//! - Every failure maps to exactly one [`ErrorKind`].
//! - Repository `ParticipantNotFound`/`DuplicateParticipant` are lifted to
//!   their semantic variants; everything else is `Storage`.

use crate::model::participant::ParticipantId;
use crate::model::validation::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    DuplicateParticipant,
    Storage,
}

impl ErrorKind {
    /// Stable snake_case code used on the wire and in logs.
    pub fn code(self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::NotFound => "not_found",
            Self::DuplicateParticipant => "duplicate_participant",
            Self::Storage => "storage_error",
        }
    }
}

/// Errors from participant and emotion use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// An input field broke a validation rule. `index` is the zero-based
    /// position inside a batch, `None` for single-record operations.
    Validation {
        index: Option<usize>,
        error: ValidationError,
    },
    /// Referenced participant does not exist.
    ParticipantNotFound(ParticipantId),
    /// Identity triple is already registered.
    DuplicateParticipant,
    /// Record store failure; partial writes were rolled back.
    Storage(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::ParticipantNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateParticipant => ErrorKind::DuplicateParticipant,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation {
                index: Some(index),
                error,
            } => write!(f, "emotion #{index}: {error}"),
            Self::Validation { index: None, error } => write!(f, "{error}"),
            Self::ParticipantNotFound(id) => write!(f, "participant not found: {id}"),
            Self::DuplicateParticipant => write!(f, "participant is already registered"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation { error, .. } => Some(error),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation {
            index: None,
            error: value,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ParticipantNotFound(id) => Self::ParticipantNotFound(id),
            RepoError::DuplicateParticipant => Self::DuplicateParticipant,
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, ServiceError};
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn repo_errors_lift_to_semantic_kinds() {
        let id = Uuid::new_v4();
        assert_eq!(
            ServiceError::from(RepoError::ParticipantNotFound(id)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ServiceError::from(RepoError::DuplicateParticipant).kind(),
            ErrorKind::DuplicateParticipant
        );
        assert_eq!(
            ServiceError::from(RepoError::InvalidData("x".to_string())).kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn error_codes_are_distinct() {
        let codes = [
            ErrorKind::Validation.code(),
            ErrorKind::NotFound.code(),
            ErrorKind::DuplicateParticipant.code(),
            ErrorKind::Storage.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
