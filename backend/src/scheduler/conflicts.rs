//! Schedule conflict detection.
//!
//! Everything here is a pure function over values the caller already
//! fetched; nothing reads the repository or the clock.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Schedulable, ScheduleId, ScheduleRecord, TimeRange};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    TeacherConflict,
    ClassroomConflict,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::TeacherConflict => "TEACHER_CONFLICT",
            ConflictKind::ClassroomConflict => "CLASSROOM_CONFLICT",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate colliding with one existing schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub existing_schedule_id: ScheduleId,
    /// The part of the candidate's range that the existing schedule occupies.
    pub overlap_range: TimeRange,
}

/// Two stored schedules colliding with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingConflict {
    pub kind: ConflictKind,
    pub first_schedule_id: ScheduleId,
    pub second_schedule_id: ScheduleId,
    pub overlap_range: TimeRange,
}

/// Find every active schedule in `existing` that collides with `candidate`.
///
/// The record whose id equals `exclude_id` is skipped, so an edited schedule
/// does not collide with its own stored version. A single existing record
/// can produce a teacher conflict and a classroom conflict; the teacher
/// conflict is listed first. Results follow the order of `existing`.
pub fn find_conflicts<C: Schedulable + ?Sized>(
    candidate: &C,
    existing: &[ScheduleRecord],
    exclude_id: Option<ScheduleId>,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for record in existing {
        if Some(record.id) == exclude_id || !record.is_active {
            continue;
        }
        let Some(overlap_range) = candidate.range().intersection(&record.range) else {
            continue;
        };

        if record.teacher_id == candidate.teacher_id() {
            conflicts.push(Conflict {
                kind: ConflictKind::TeacherConflict,
                existing_schedule_id: record.id,
                overlap_range: overlap_range.clone(),
            });
        }
        if record.class_room_id == candidate.class_room_id() {
            conflicts.push(Conflict {
                kind: ConflictKind::ClassroomConflict,
                existing_schedule_id: record.id,
                overlap_range,
            });
        }
    }

    conflicts
}

/// Pairwise scan of already stored schedules for double bookings.
///
/// Inactive records are ignored. Each colliding pair `(i, j)` with `i < j`
/// is reported once per kind.
pub fn detect_existing_conflicts(records: &[ScheduleRecord]) -> Vec<ExistingConflict> {
    let active: Vec<&ScheduleRecord> = records.iter().filter(|r| r.is_active).collect();
    let mut conflicts = Vec::new();

    for (i, first) in active.iter().enumerate() {
        for second in &active[i + 1..] {
            let Some(overlap_range) = first.range.intersection(&second.range) else {
                continue;
            };

            if first.teacher_id == second.teacher_id {
                conflicts.push(ExistingConflict {
                    kind: ConflictKind::TeacherConflict,
                    first_schedule_id: first.id,
                    second_schedule_id: second.id,
                    overlap_range: overlap_range.clone(),
                });
            }
            if first.class_room_id == second.class_room_id {
                conflicts.push(ExistingConflict {
                    kind: ConflictKind::ClassroomConflict,
                    first_schedule_id: first.id,
                    second_schedule_id: second.id,
                    overlap_range,
                });
            }
        }
    }

    conflicts
}
