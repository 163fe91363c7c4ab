//! Conflict reporting: runs the pure checker against a term snapshot and
//! dresses the results with directory names for people to read.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::{or_not_found, ScheduleError, ScheduleResult};
use super::schedules::{validate_draft, CreateScheduleRequest, UpdateScheduleRequest};
use crate::db::{FullRepository, ScheduleQuery};
use crate::models::{
    AcademicTerm, ClassRoomId, ScheduleDraft, ScheduleId, ScheduleRecord, SubjectId, TeacherId,
};
use crate::scheduler::{detect_existing_conflicts, find_conflicts, Conflict, ConflictKind, ExistingConflict};

/// A [`Conflict`] with the colliding entity named and a readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDetail {
    #[serde(flatten)]
    pub conflict: Conflict,
    /// Teacher full name or class room name, depending on the kind.
    pub conflicting_entity: String,
    pub message: String,
}

/// Two stored schedules of one term colliding with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermConflictDetail {
    #[serde(flatten)]
    pub conflict: ExistingConflict,
    pub conflicting_entity: String,
    pub message: String,
}

/// Memoized directory lookups for one report.
///
/// Records pointing at directory entries that no longer exist are reported
/// by id instead of failing the whole report.
pub(crate) struct DirectoryNames<'a, R: ?Sized> {
    repo: &'a R,
    class_rooms: HashMap<ClassRoomId, String>,
    subjects: HashMap<SubjectId, String>,
    teachers: HashMap<TeacherId, String>,
}

impl<'a, R: FullRepository + ?Sized> DirectoryNames<'a, R> {
    pub(crate) fn new(repo: &'a R) -> Self {
        Self {
            repo,
            class_rooms: HashMap::new(),
            subjects: HashMap::new(),
            teachers: HashMap::new(),
        }
    }

    pub(crate) async fn class_room(&mut self, id: ClassRoomId) -> ScheduleResult<String> {
        if let Some(name) = self.class_rooms.get(&id) {
            return Ok(name.clone());
        }
        let name = match self.repo.get_class_room(id).await {
            Ok(room) => room.name,
            Err(e) if e.is_not_found() => format!("class room #{}", id),
            Err(e) => return Err(e.into()),
        };
        self.class_rooms.insert(id, name.clone());
        Ok(name)
    }

    pub(crate) async fn subject(&mut self, id: SubjectId) -> ScheduleResult<String> {
        if let Some(name) = self.subjects.get(&id) {
            return Ok(name.clone());
        }
        let name = match self.repo.get_subject(id).await {
            Ok(subject) => subject.name,
            Err(e) if e.is_not_found() => format!("subject #{}", id),
            Err(e) => return Err(e.into()),
        };
        self.subjects.insert(id, name.clone());
        Ok(name)
    }

    pub(crate) async fn teacher(&mut self, id: TeacherId) -> ScheduleResult<String> {
        if let Some(name) = self.teachers.get(&id) {
            return Ok(name.clone());
        }
        let name = match self.repo.get_teacher(id).await {
            Ok(teacher) => teacher.full_name(),
            Err(e) if e.is_not_found() => format!("teacher #{}", id),
            Err(e) => return Err(e.into()),
        };
        self.teachers.insert(id, name.clone());
        Ok(name)
    }
}

fn slot_text(record: &ScheduleRecord) -> String {
    format!(
        "from {}-{} on {}",
        record.start_time().format("%H:%M"),
        record.end_time().format("%H:%M"),
        record.day_of_week()
    )
}

/// Attach names and messages to checker output.
///
/// Every conflict must point at a record of `snapshot`.
pub(crate) async fn describe_conflicts<R: FullRepository + ?Sized>(
    repo: &R,
    conflicts: Vec<Conflict>,
    snapshot: &[ScheduleRecord],
) -> ScheduleResult<Vec<ConflictDetail>> {
    let by_id: HashMap<ScheduleId, &ScheduleRecord> =
        snapshot.iter().map(|r| (r.id, r)).collect();
    let mut names = DirectoryNames::new(repo);
    let mut details = Vec::with_capacity(conflicts.len());

    for conflict in conflicts {
        let existing = by_id.get(&conflict.existing_schedule_id).ok_or_else(|| {
            ScheduleError::not_found("Schedule", conflict.existing_schedule_id.value())
        })?;

        let (conflicting_entity, message) = match conflict.kind {
            ConflictKind::TeacherConflict => {
                let teacher = names.teacher(existing.teacher_id).await?;
                let room = names.class_room(existing.class_room_id).await?;
                let message = format!(
                    "Teacher {} already has a class in classroom {} {}",
                    teacher,
                    room,
                    slot_text(existing)
                );
                (teacher, message)
            }
            ConflictKind::ClassroomConflict => {
                let room = names.class_room(existing.class_room_id).await?;
                let subject = names.subject(existing.subject_id).await?;
                let message = format!(
                    "Classroom {} is already occupied by {} {}",
                    room,
                    subject,
                    slot_text(existing)
                );
                (room, message)
            }
        };

        details.push(ConflictDetail {
            conflict,
            conflicting_entity,
            message,
        });
    }

    Ok(details)
}

/// Active schedules of `term`: the snapshot conflict checks run against.
pub(crate) async fn term_snapshot<R: FullRepository + ?Sized>(
    repo: &R,
    term: &AcademicTerm,
) -> ScheduleResult<Vec<ScheduleRecord>> {
    Ok(repo
        .list_schedules_for_term(term, &ScheduleQuery::active())
        .await?)
}

async fn conflicts_for_draft<R: FullRepository + ?Sized>(
    repo: &R,
    draft: &ScheduleDraft,
    exclude_id: Option<ScheduleId>,
) -> ScheduleResult<Vec<ConflictDetail>> {
    validate_draft(draft)?;
    let snapshot = term_snapshot(repo, &draft.range.term).await?;
    let conflicts = find_conflicts(draft, &snapshot, exclude_id);
    debug!(
        "Checked draft against {} schedules of {}: {} conflicts",
        snapshot.len(),
        draft.range.term,
        conflicts.len()
    );
    describe_conflicts(repo, conflicts, &snapshot).await
}

/// Dry-run conflict check for a prospective schedule. Nothing is stored.
///
/// `exclude_id` skips one stored schedule, typically the one being edited.
pub async fn check_conflicts<R: FullRepository + ?Sized>(
    repo: &R,
    request: &CreateScheduleRequest,
    exclude_id: Option<ScheduleId>,
) -> ScheduleResult<Vec<ConflictDetail>> {
    info!("Checking schedule conflicts for new schedule");
    conflicts_for_draft(repo, &request.to_draft(), exclude_id).await
}

/// Dry-run conflict check for an edit of schedule `id`.
///
/// The edit is merged over the stored record and the record's own stored
/// version is never reported.
pub async fn check_update_conflicts<R: FullRepository + ?Sized>(
    repo: &R,
    id: ScheduleId,
    request: &UpdateScheduleRequest,
) -> ScheduleResult<Vec<ConflictDetail>> {
    info!("Checking schedule conflicts for schedule update: {}", id);
    let current = repo
        .get_schedule(id)
        .await
        .map_err(or_not_found("Schedule", id.value()))?;
    let draft = request.merge_over(&current);
    conflicts_for_draft(repo, &draft, Some(id)).await
}

/// Every pair of active schedules of `term` that already collide.
pub async fn detect_term_conflicts<R: FullRepository + ?Sized>(
    repo: &R,
    term: &AcademicTerm,
) -> ScheduleResult<Vec<TermConflictDetail>> {
    info!("Detecting existing conflicts for period: {}", term);
    term.validate().map_err(ScheduleError::Validation)?;

    let snapshot = term_snapshot(repo, term).await?;
    let by_id: HashMap<ScheduleId, &ScheduleRecord> =
        snapshot.iter().map(|r| (r.id, r)).collect();
    let mut names = DirectoryNames::new(repo);
    let mut details = Vec::new();

    for conflict in detect_existing_conflicts(&snapshot) {
        let Some(second) = by_id.get(&conflict.second_schedule_id) else {
            continue;
        };
        let (conflicting_entity, message) = match conflict.kind {
            ConflictKind::TeacherConflict => {
                let teacher = names.teacher(second.teacher_id).await?;
                let message = format!(
                    "Teacher {} has conflicting schedules {} and {} {}",
                    teacher,
                    conflict.first_schedule_id,
                    conflict.second_schedule_id,
                    slot_text(second)
                );
                (teacher, message)
            }
            ConflictKind::ClassroomConflict => {
                let room = names.class_room(second.class_room_id).await?;
                let message = format!(
                    "Classroom {} has conflicting schedules {} and {} {}",
                    room,
                    conflict.first_schedule_id,
                    conflict.second_schedule_id,
                    slot_text(second)
                );
                (room, message)
            }
        };
        details.push(TermConflictDetail {
            conflict,
            conflicting_entity,
            message,
        });
    }

    Ok(details)
}
