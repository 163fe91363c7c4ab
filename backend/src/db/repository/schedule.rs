//! Schedule repository trait for class session CRUD and term queries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::error::RepositoryResult;
use crate::models::{
    AcademicTerm, ClassRoomId, DayOfWeek, ScheduleDraft, ScheduleId, ScheduleRecord, SubjectId,
    TeacherId,
};

/// Narrowing applied to the schedules of one academic term.
///
/// The default query returns every active schedule of the term, which is
/// the snapshot the conflict checker runs against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleQuery {
    pub teacher_id: Option<TeacherId>,
    pub class_room_id: Option<ClassRoomId>,
    pub subject_id: Option<SubjectId>,
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub include_inactive: bool,
}

impl ScheduleQuery {
    pub fn active() -> Self {
        Self::default()
    }

    pub fn for_teacher(teacher_id: TeacherId) -> Self {
        Self {
            teacher_id: Some(teacher_id),
            ..Self::default()
        }
    }

    pub fn for_class_room(class_room_id: ClassRoomId) -> Self {
        Self {
            class_room_id: Some(class_room_id),
            ..Self::default()
        }
    }

    pub fn for_subject(subject_id: SubjectId) -> Self {
        Self {
            subject_id: Some(subject_id),
            ..Self::default()
        }
    }

    pub fn on_day(mut self, day: DayOfWeek) -> Self {
        self.day_of_week = Some(day);
        self
    }

    pub fn matches(&self, term: &AcademicTerm, record: &ScheduleRecord) -> bool {
        record.term() == term
            && (self.include_inactive || record.is_active)
            && self.teacher_id.map_or(true, |id| record.teacher_id == id)
            && self.class_room_id.map_or(true, |id| record.class_room_id == id)
            && self.subject_id.map_or(true, |id| record.subject_id == id)
            && self.day_of_week.map_or(true, |d| record.day_of_week() == d)
    }
}

/// Free-form search across all terms. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFilter {
    pub class_room_id: Option<ClassRoomId>,
    pub subject_id: Option<SubjectId>,
    pub teacher_id: Option<TeacherId>,
    pub academic_year: Option<String>,
    pub semester: Option<u8>,
    pub day_of_week: Option<DayOfWeek>,
    pub is_active: Option<bool>,
}

impl ScheduleFilter {
    pub fn matches(&self, record: &ScheduleRecord) -> bool {
        self.class_room_id.map_or(true, |id| record.class_room_id == id)
            && self.subject_id.map_or(true, |id| record.subject_id == id)
            && self.teacher_id.map_or(true, |id| record.teacher_id == id)
            && self
                .academic_year
                .as_deref()
                .map_or(true, |y| record.term().academic_year == y)
            && self.semester.map_or(true, |s| record.term().semester == s)
            && self.day_of_week.map_or(true, |d| record.day_of_week() == d)
            && self.is_active.map_or(true, |a| record.is_active == a)
    }
}

/// Weekly timetable order: day, then start time, then id.
pub fn timetable_order(a: &ScheduleRecord, b: &ScheduleRecord) -> Ordering {
    (a.day_of_week(), a.start_time(), a.id).cmp(&(b.day_of_week(), b.start_time(), b.id))
}

/// Repository trait for class schedules.
///
/// Records are never physically deleted; `set_schedule_active(id, false)`
/// is the delete operation.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Check if the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert one schedule and return it with its assigned id.
    async fn store_schedule(&self, draft: &ScheduleDraft) -> RepositoryResult<ScheduleRecord>;

    /// Insert several schedules atomically: either all are stored or none.
    ///
    /// Returned records follow the order of `drafts`.
    async fn store_schedules(
        &self,
        drafts: &[ScheduleDraft],
    ) -> RepositoryResult<Vec<ScheduleRecord>>;

    /// Replace the writable fields of an existing schedule.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the schedule doesn't exist
    async fn update_schedule(
        &self,
        id: ScheduleId,
        draft: &ScheduleDraft,
    ) -> RepositoryResult<ScheduleRecord>;

    async fn set_schedule_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> RepositoryResult<ScheduleRecord>;

    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the schedule doesn't exist
    async fn get_schedule(&self, id: ScheduleId) -> RepositoryResult<ScheduleRecord>;

    /// Schedules of one term matching `query`, in [`timetable_order`].
    async fn list_schedules_for_term(
        &self,
        term: &AcademicTerm,
        query: &ScheduleQuery,
    ) -> RepositoryResult<Vec<ScheduleRecord>>;

    /// One page of schedules matching `filter`, in [`timetable_order`],
    /// together with the total number of matches.
    async fn search_schedules(
        &self,
        filter: &ScheduleFilter,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<ScheduleRecord>, usize)>;
}
