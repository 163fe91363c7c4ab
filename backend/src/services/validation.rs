//! Soft constraints on a session's timing, reported rather than enforced.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use super::error::{or_not_found, ScheduleResult};
use super::schedules::UpdateScheduleRequest;
use crate::config::SchedulingPolicy;
use crate::db::FullRepository;
use crate::models::{duration_minutes, validate_time_slot, ScheduleId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub duration_minutes: i64,
}

/// Check a session against the school day and the session length limits.
///
/// Errors make the report invalid; warnings do not.
pub fn validate_schedule_constraints(
    start: NaiveTime,
    end: NaiveTime,
    policy: &SchedulingPolicy,
) -> ConstraintReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if !validate_time_slot(start, end) {
        errors.push("Invalid time slot: start time must be before end time".to_string());
    }

    if start < policy.school_start || end > policy.school_end {
        warnings.push("Schedule is outside normal school hours".to_string());
    }

    let duration = duration_minutes(start, end);
    if duration < policy.min_session_minutes {
        errors.push(format!(
            "Session duration is too short (minimum {} minutes)",
            policy.min_session_minutes
        ));
    }
    if duration > policy.max_session_minutes {
        warnings.push(format!(
            "Session duration is very long (maximum recommended {} minutes)",
            policy.max_session_minutes
        ));
    }

    ConstraintReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        duration_minutes: duration,
    }
}

/// [`validate_schedule_constraints`] for an edit merged over schedule `id`.
pub async fn validate_update_constraints<R: FullRepository + ?Sized>(
    repo: &R,
    id: ScheduleId,
    request: &UpdateScheduleRequest,
    policy: &SchedulingPolicy,
) -> ScheduleResult<ConstraintReport> {
    let current = repo
        .get_schedule(id)
        .await
        .map_err(or_not_found("Schedule", id.value()))?;
    let merged = request.merge_over(&current);
    Ok(validate_schedule_constraints(
        merged.range.start,
        merged.range.end,
        policy,
    ))
}
