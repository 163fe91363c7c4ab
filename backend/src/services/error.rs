//! Errors raised by the schedule workflow.

use thiserror::Error;

use super::conflicts::ConflictDetail;
use crate::db::RepositoryError;

/// Error type for service operations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// The request is malformed: bad time slot, academic year, semester or notes.
    #[error("{0}")]
    Validation(String),

    /// A referenced class room, subject, teacher or schedule does not exist.
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The candidate collides with stored schedules and neither
    /// `skip_conflict_check` nor `allow_overlap` was set.
    #[error("Schedule conflicts detected: {} conflicts found", .0.len())]
    Conflicts(Vec<ConflictDetail>),

    /// An item of an all-or-nothing bulk request failed; nothing was stored.
    #[error(
        "Bulk schedule creation failed: Error creating schedule {}: {}",
        .index + 1,
        .source
    )]
    BulkAborted {
        index: usize,
        #[source]
        source: Box<ScheduleError>,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

impl ScheduleError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Conflicts carried by this error, if any.
    pub fn conflicts(&self) -> &[ConflictDetail] {
        match self {
            Self::Conflicts(conflicts) => conflicts,
            Self::BulkAborted { source, .. } => source.conflicts(),
            _ => &[],
        }
    }
}

/// Turn a repository not-found into [`ScheduleError::NotFound`] for `entity`.
///
/// Other repository errors pass through unchanged.
pub(crate) fn or_not_found(entity: &'static str, id: i64) -> impl FnOnce(RepositoryError) -> ScheduleError {
    move |err| {
        if err.is_not_found() {
            ScheduleError::not_found(entity, id)
        } else {
            ScheduleError::Repository(err)
        }
    }
}
