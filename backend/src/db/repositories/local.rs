//! In-memory local repository implementation.
//!
//! All data lives in `HashMap`s behind a single `parking_lot::RwLock`, which
//! gives fast, deterministic and isolated execution for unit tests and local
//! development.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    AcademicTerm, ClassRoom, ClassRoomId, NewClassRoom, NewSubject, NewTeacher, ScheduleDraft,
    ScheduleId, ScheduleRecord, Subject, SubjectId, Teacher, TeacherId,
};

/// In-memory local repository.
///
/// Cloning shares the underlying data.
///
/// # Example
/// ```
/// use school_sim::db::repositories::LocalRepository;
/// use school_sim::db::repository::DirectoryRepository;
/// use school_sim::models::NewSubject;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// let subject = repo
///     .store_subject(&NewSubject { name: "Physics".into(), code: "PHY".into(), credits: None })
///     .await
///     .unwrap();
/// assert_eq!(repo.get_subject(subject.id).await.unwrap().code, "PHY");
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    schedules: HashMap<ScheduleId, ScheduleRecord>,
    class_rooms: HashMap<ClassRoomId, ClassRoom>,
    subjects: HashMap<SubjectId, Subject>,
    teachers: HashMap<TeacherId, Teacher>,

    // ID counters
    next_schedule_id: i64,
    next_class_room_id: i64,
    next_subject_id: i64,
    next_teacher_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            schedules: HashMap::new(),
            class_rooms: HashMap::new(),
            subjects: HashMap::new(),
            teachers: HashMap::new(),
            next_schedule_id: 1,
            next_class_room_id: 1,
            next_subject_id: 1,
            next_teacher_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalData {
    fn insert_schedule(&mut self, draft: &ScheduleDraft) -> ScheduleRecord {
        let id = ScheduleId(self.next_schedule_id);
        self.next_schedule_id += 1;

        let record = ScheduleRecord {
            id,
            class_room_id: draft.class_room_id,
            subject_id: draft.subject_id,
            teacher_id: draft.teacher_id,
            range: draft.range.clone(),
            is_active: draft.is_active,
            notes: draft.notes.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.schedules.insert(id, record.clone());
        record
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Number of schedules stored, active or not.
    pub fn schedule_count(&self) -> usize {
        self.data.read().schedules.len()
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirrors the `CHECK (start_time < end_time)` of the SQL schema.
fn check_draft(operation: &str, draft: &ScheduleDraft) -> RepositoryResult<()> {
    if !draft.range.is_well_formed() {
        return Err(RepositoryError::ValidationError {
            message: format!(
                "Schedule range {} has start >= end",
                draft.range.label()
            ),
            context: ErrorContext::new(operation).with_entity("schedule"),
        });
    }
    Ok(())
}

#[async_trait]
impl ScheduleRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn store_schedule(&self, draft: &ScheduleDraft) -> RepositoryResult<ScheduleRecord> {
        self.check_health()?;
        check_draft("store_schedule", draft)?;
        Ok(self.data.write().insert_schedule(draft))
    }

    async fn store_schedules(
        &self,
        drafts: &[ScheduleDraft],
    ) -> RepositoryResult<Vec<ScheduleRecord>> {
        self.check_health()?;
        for draft in drafts {
            check_draft("store_schedules", draft)?;
        }

        let mut data = self.data.write();
        Ok(drafts.iter().map(|d| data.insert_schedule(d)).collect())
    }

    async fn update_schedule(
        &self,
        id: ScheduleId,
        draft: &ScheduleDraft,
    ) -> RepositoryResult<ScheduleRecord> {
        self.check_health()?;
        check_draft("update_schedule", draft)?;

        let mut data = self.data.write();
        let record = data
            .schedules
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::entity_not_found("update_schedule", "schedule", id))?;

        record.class_room_id = draft.class_room_id;
        record.subject_id = draft.subject_id;
        record.teacher_id = draft.teacher_id;
        record.range = draft.range.clone();
        record.is_active = draft.is_active;
        record.notes = draft.notes.clone();
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn set_schedule_active(
        &self,
        id: ScheduleId,
        active: bool,
    ) -> RepositoryResult<ScheduleRecord> {
        self.check_health()?;

        let mut data = self.data.write();
        let record = data.schedules.get_mut(&id).ok_or_else(|| {
            RepositoryError::entity_not_found("set_schedule_active", "schedule", id)
        })?;
        record.is_active = active;
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn get_schedule(&self, id: ScheduleId) -> RepositoryResult<ScheduleRecord> {
        self.check_health()?;
        self.data
            .read()
            .schedules
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("get_schedule", "schedule", id))
    }

    async fn list_schedules_for_term(
        &self,
        term: &AcademicTerm,
        query: &ScheduleQuery,
    ) -> RepositoryResult<Vec<ScheduleRecord>> {
        self.check_health()?;
        let data = self.data.read();

        let mut schedules: Vec<ScheduleRecord> = data
            .schedules
            .values()
            .filter(|r| query.matches(term, r))
            .cloned()
            .collect();
        schedules.sort_by(timetable_order);
        Ok(schedules)
    }

    async fn search_schedules(
        &self,
        filter: &ScheduleFilter,
        offset: usize,
        limit: usize,
    ) -> RepositoryResult<(Vec<ScheduleRecord>, usize)> {
        self.check_health()?;
        let data = self.data.read();

        let mut matches: Vec<&ScheduleRecord> =
            data.schedules.values().filter(|r| filter.matches(r)).collect();
        matches.sort_by(|a, b| timetable_order(a, b));

        let total = matches.len();
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl DirectoryRepository for LocalRepository {
    async fn store_class_room(&self, class_room: &NewClassRoom) -> RepositoryResult<ClassRoom> {
        self.check_health()?;
        let mut data = self.data.write();

        let id = ClassRoomId(data.next_class_room_id);
        data.next_class_room_id += 1;

        let stored = ClassRoom {
            id,
            name: class_room.name.clone(),
            code: class_room.code.clone(),
            capacity: class_room.capacity,
            location: class_room.location.clone(),
        };
        data.class_rooms.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_class_room(&self, id: ClassRoomId) -> RepositoryResult<ClassRoom> {
        self.check_health()?;
        self.data
            .read()
            .class_rooms
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("get_class_room", "class room", id))
    }

    async fn list_class_rooms(&self) -> RepositoryResult<Vec<ClassRoom>> {
        self.check_health()?;
        let mut rooms: Vec<ClassRoom> = self.data.read().class_rooms.values().cloned().collect();
        rooms.sort_by_key(|r| r.id);
        Ok(rooms)
    }

    async fn store_subject(&self, subject: &NewSubject) -> RepositoryResult<Subject> {
        self.check_health()?;
        let mut data = self.data.write();

        let id = SubjectId(data.next_subject_id);
        data.next_subject_id += 1;

        let stored = Subject {
            id,
            name: subject.name.clone(),
            code: subject.code.clone(),
            credits: subject.credits,
        };
        data.subjects.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject> {
        self.check_health()?;
        self.data
            .read()
            .subjects
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("get_subject", "subject", id))
    }

    async fn list_subjects(&self) -> RepositoryResult<Vec<Subject>> {
        self.check_health()?;
        let mut subjects: Vec<Subject> = self.data.read().subjects.values().cloned().collect();
        subjects.sort_by_key(|s| s.id);
        Ok(subjects)
    }

    async fn store_teacher(&self, teacher: &NewTeacher) -> RepositoryResult<Teacher> {
        self.check_health()?;
        let mut data = self.data.write();

        let id = TeacherId(data.next_teacher_id);
        data.next_teacher_id += 1;

        let stored = Teacher {
            id,
            first_name: teacher.first_name.clone(),
            last_name: teacher.last_name.clone(),
            username: teacher.username.clone(),
            email: teacher.email.clone(),
        };
        data.teachers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher> {
        self.check_health()?;
        self.data
            .read()
            .teachers
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::entity_not_found("get_teacher", "teacher", id))
    }

    async fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>> {
        self.check_health()?;
        let mut teachers: Vec<Teacher> = self.data.read().teachers.values().cloned().collect();
        teachers.sort_by_key(|t| t.id);
        Ok(teachers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayOfWeek, TimeRange};
    use chrono::NaiveTime;

    fn draft(teacher: i64, room: i64, day: DayOfWeek, start: u32, end: u32) -> ScheduleDraft {
        ScheduleDraft {
            class_room_id: ClassRoomId(room),
            subject_id: SubjectId(1),
            teacher_id: TeacherId(teacher),
            range: TimeRange::new(
                day,
                NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(end, 0, 0).unwrap(),
                AcademicTerm::new("2024/2025", 1),
            ),
            is_active: true,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        assert!(repo.get_schedule(ScheduleId(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_store_and_retrieve_schedule() {
        let repo = LocalRepository::new();
        let stored = repo
            .store_schedule(&draft(1, 1, DayOfWeek::Monday, 8, 9))
            .await
            .unwrap();

        assert_eq!(stored.id, ScheduleId(1));
        let fetched = repo.get_schedule(stored.id).await.unwrap();
        assert_eq!(fetched, stored);
    }

    #[tokio::test]
    async fn test_reversed_range_is_rejected() {
        let repo = LocalRepository::new();
        let err = repo
            .store_schedule(&draft(1, 1, DayOfWeek::Monday, 10, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(repo.schedule_count(), 0);
    }

    #[tokio::test]
    async fn test_store_schedules_is_all_or_nothing() {
        let repo = LocalRepository::new();
        let batch = vec![
            draft(1, 1, DayOfWeek::Monday, 8, 9),
            draft(1, 1, DayOfWeek::Monday, 12, 11),
        ];
        assert!(repo.store_schedules(&batch).await.is_err());
        assert_eq!(repo.schedule_count(), 0);

        let stored = repo.store_schedules(&batch[..1]).await.unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn test_deactivate_keeps_record() {
        let repo = LocalRepository::new();
        let stored = repo
            .store_schedule(&draft(1, 1, DayOfWeek::Monday, 8, 9))
            .await
            .unwrap();

        let updated = repo.set_schedule_active(stored.id, false).await.unwrap();
        assert!(!updated.is_active);
        assert!(updated.updated_at.is_some());

        let term = AcademicTerm::new("2024/2025", 1);
        let active = repo
            .list_schedules_for_term(&term, &ScheduleQuery::active())
            .await
            .unwrap();
        assert!(active.is_empty());

        let all = repo
            .list_schedules_for_term(
                &term,
                &ScheduleQuery {
                    include_inactive: true,
                    ..ScheduleQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_term_listing_is_ordered_and_filtered() {
        let repo = LocalRepository::new();
        repo.store_schedule(&draft(1, 1, DayOfWeek::Wednesday, 8, 9))
            .await
            .unwrap();
        repo.store_schedule(&draft(1, 2, DayOfWeek::Monday, 10, 11))
            .await
            .unwrap();
        repo.store_schedule(&draft(2, 1, DayOfWeek::Monday, 8, 9))
            .await
            .unwrap();

        let term = AcademicTerm::new("2024/2025", 1);
        let all = repo
            .list_schedules_for_term(&term, &ScheduleQuery::active())
            .await
            .unwrap();
        let ids: Vec<i64> = all.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let teacher_one = repo
            .list_schedules_for_term(&term, &ScheduleQuery::for_teacher(TeacherId(1)))
            .await
            .unwrap();
        assert_eq!(teacher_one.len(), 2);

        let other_term = repo
            .list_schedules_for_term(&AcademicTerm::new("2024/2025", 2), &ScheduleQuery::active())
            .await
            .unwrap();
        assert!(other_term.is_empty());
    }

    #[tokio::test]
    async fn test_search_pages_and_counts() {
        let repo = LocalRepository::new();
        for hour in 8..13 {
            repo.store_schedule(&draft(1, 1, DayOfWeek::Tuesday, hour, hour + 1))
                .await
                .unwrap();
        }

        let filter = ScheduleFilter {
            teacher_id: Some(TeacherId(1)),
            ..ScheduleFilter::default()
        };
        let (page, total) = repo.search_schedules(&filter, 2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].start_time(), NaiveTime::from_hms_opt(10, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_directory_roundtrip_and_not_found() {
        let repo = LocalRepository::new();
        let teacher = repo
            .store_teacher(&NewTeacher {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                username: "ada".into(),
                email: None,
            })
            .await
            .unwrap();

        assert_eq!(repo.get_teacher(teacher.id).await.unwrap().username, "ada");
        assert_eq!(repo.list_teachers().await.unwrap().len(), 1);

        let err = repo.get_class_room(ClassRoomId(99)).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Class room 99 not found");
    }

    #[tokio::test]
    async fn test_update_unknown_schedule_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .update_schedule(ScheduleId(5), &draft(1, 1, DayOfWeek::Monday, 8, 9))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
