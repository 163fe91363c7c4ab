//! Weekly timetables for a class room, teacher or subject, with summary
//! statistics.

use chrono::{DateTime, NaiveTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::error::{or_not_found, ScheduleError, ScheduleResult};
use crate::config::SchedulingPolicy;
use crate::db::{FullRepository, ScheduleQuery};
use crate::models::{
    AcademicTerm, ClassRoom, ClassRoomId, DayOfWeek, ScheduleId, ScheduleRecord, Subject,
    SubjectId, Teacher, TeacherId,
};
use crate::scheduler::detect_existing_conflicts;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimetableKind {
    Class,
    Teacher,
    Subject,
}

impl TimetableKind {
    pub fn title(self) -> &'static str {
        match self {
            TimetableKind::Class => "Class Timetable",
            TimetableKind::Teacher => "Teacher Timetable",
            TimetableKind::Subject => "Subject Timetable",
        }
    }
}

/// One session as shown in a timetable cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableSlot {
    pub schedule_id: ScheduleId,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// `"08:00 - 09:30"`
    pub time_range: String,
    pub duration_minutes: i64,
    pub subject_name: String,
    pub subject_code: String,
    pub teacher_name: String,
    /// The teacher's username.
    pub teacher_code: String,
    pub class_room_name: String,
    pub class_room_code: String,
    pub notes: Option<String>,
    pub is_active: bool,
    /// Other sessions of this timetable colliding with this one.
    #[serde(default)]
    pub conflicts: Vec<ScheduleId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableStatistics {
    pub total_sessions: usize,
    pub total_minutes: i64,
    /// Whole hours, truncated.
    pub total_hours: i64,
    pub sessions_by_day: BTreeMap<DayOfWeek, usize>,
    pub minutes_by_day: BTreeMap<DayOfWeek, i64>,
    pub subject_minutes: BTreeMap<String, i64>,
    pub teacher_minutes: BTreeMap<String, i64>,
    /// Sessions divided by the number of school days per week.
    pub average_sessions_per_day: f64,
    pub busiest_day: Option<DayOfWeek>,
    pub lightest_day: Option<DayOfWeek>,
    pub conflict_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timetable {
    pub title: String,
    pub kind: TimetableKind,
    pub term: AcademicTerm,
    pub entity_id: i64,
    pub entity_name: String,
    pub entity_code: String,
    /// Days without sessions are absent. Slots are ordered by start time.
    pub weekly_schedule: BTreeMap<DayOfWeek, Vec<TimetableSlot>>,
    pub statistics: TimetableStatistics,
    pub generated_at: DateTime<Utc>,
}

/// The whole directory, keyed by id, for labelling slots.
struct Directory {
    class_rooms: HashMap<ClassRoomId, ClassRoom>,
    subjects: HashMap<SubjectId, Subject>,
    teachers: HashMap<TeacherId, Teacher>,
}

impl Directory {
    async fn load<R: FullRepository + ?Sized>(repo: &R) -> ScheduleResult<Self> {
        Ok(Self {
            class_rooms: repo
                .list_class_rooms()
                .await?
                .into_iter()
                .map(|c| (c.id, c))
                .collect(),
            subjects: repo
                .list_subjects()
                .await?
                .into_iter()
                .map(|s| (s.id, s))
                .collect(),
            teachers: repo
                .list_teachers()
                .await?
                .into_iter()
                .map(|t| (t.id, t))
                .collect(),
        })
    }

    fn slot(&self, record: &ScheduleRecord, conflicts: Vec<ScheduleId>) -> TimetableSlot {
        let (subject_name, subject_code) = match self.subjects.get(&record.subject_id) {
            Some(s) => (s.name.clone(), s.code.clone()),
            None => (format!("subject #{}", record.subject_id), String::new()),
        };
        let (teacher_name, teacher_code) = match self.teachers.get(&record.teacher_id) {
            Some(t) => (t.full_name(), t.username.clone()),
            None => (format!("teacher #{}", record.teacher_id), String::new()),
        };
        let (class_room_name, class_room_code) = match self.class_rooms.get(&record.class_room_id)
        {
            Some(c) => (c.name.clone(), c.code.clone()),
            None => (format!("class room #{}", record.class_room_id), String::new()),
        };

        TimetableSlot {
            schedule_id: record.id,
            day_of_week: record.day_of_week(),
            start_time: record.start_time(),
            end_time: record.end_time(),
            time_range: record.range.label(),
            duration_minutes: record.range.duration_minutes(),
            subject_name,
            subject_code,
            teacher_name,
            teacher_code,
            class_room_name,
            class_room_code,
            notes: record.notes.clone(),
            is_active: record.is_active,
            conflicts,
        }
    }
}

/// Group slots by day, each day ordered by start time.
pub fn build_weekly_schedule(slots: Vec<TimetableSlot>) -> BTreeMap<DayOfWeek, Vec<TimetableSlot>> {
    let mut weekly: BTreeMap<DayOfWeek, Vec<TimetableSlot>> = BTreeMap::new();
    for slot in slots {
        weekly.entry(slot.day_of_week).or_default().push(slot);
    }
    for day_slots in weekly.values_mut() {
        day_slots.sort_by_key(|s| (s.start_time, s.schedule_id));
    }
    weekly
}

/// Summary figures for the sessions of one timetable.
pub fn compute_statistics(
    records: &[ScheduleRecord],
    slots: &[TimetableSlot],
    policy: &SchedulingPolicy,
) -> TimetableStatistics {
    let mut sessions_by_day: BTreeMap<DayOfWeek, usize> = BTreeMap::new();
    let mut minutes_by_day: BTreeMap<DayOfWeek, i64> = BTreeMap::new();
    let mut subject_minutes: BTreeMap<String, i64> = BTreeMap::new();
    let mut teacher_minutes: BTreeMap<String, i64> = BTreeMap::new();

    for (record, slot) in records.iter().zip(slots) {
        let minutes = slot.duration_minutes;
        *sessions_by_day.entry(record.day_of_week()).or_default() += 1;
        *minutes_by_day.entry(record.day_of_week()).or_default() += minutes;
        *subject_minutes.entry(slot.subject_name.clone()).or_default() += minutes;
        *teacher_minutes.entry(slot.teacher_name.clone()).or_default() += minutes;
    }

    let total_sessions = records.len();
    let total_minutes: i64 = minutes_by_day.values().sum();
    let average_sessions_per_day = if policy.school_days == 0 {
        0.0
    } else {
        total_sessions as f64 / f64::from(policy.school_days)
    };

    // Ties go to the earlier day of the week.
    let busiest_day = sessions_by_day
        .iter()
        .fold(None, |best: Option<(DayOfWeek, usize)>, (&day, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((day, count)),
        })
        .map(|(day, _)| day);
    let lightest_day = sessions_by_day
        .iter()
        .fold(None, |best: Option<(DayOfWeek, usize)>, (&day, &count)| match best {
            Some((_, c)) if c <= count => best,
            _ => Some((day, count)),
        })
        .map(|(day, _)| day);

    TimetableStatistics {
        total_sessions,
        total_minutes,
        total_hours: total_minutes / 60,
        sessions_by_day,
        minutes_by_day,
        subject_minutes,
        teacher_minutes,
        average_sessions_per_day,
        busiest_day,
        lightest_day,
        conflict_count: detect_existing_conflicts(records).len(),
    }
}

struct TimetableEntity {
    kind: TimetableKind,
    id: i64,
    name: String,
    code: String,
}

async fn build_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    entity: TimetableEntity,
    term: &AcademicTerm,
    query: ScheduleQuery,
    policy: &SchedulingPolicy,
) -> ScheduleResult<Timetable> {
    let records = repo.list_schedules_for_term(term, &query).await?;
    let directory = Directory::load(repo).await?;

    let mut conflicts_by_id: HashMap<ScheduleId, Vec<ScheduleId>> = HashMap::new();
    for conflict in detect_existing_conflicts(&records) {
        conflicts_by_id
            .entry(conflict.first_schedule_id)
            .or_default()
            .push(conflict.second_schedule_id);
        conflicts_by_id
            .entry(conflict.second_schedule_id)
            .or_default()
            .push(conflict.first_schedule_id);
    }

    let slots: Vec<TimetableSlot> = records
        .iter()
        .map(|r| {
            let mut others = conflicts_by_id.remove(&r.id).unwrap_or_default();
            others.sort();
            others.dedup();
            directory.slot(r, others)
        })
        .collect();

    let statistics = compute_statistics(&records, &slots, policy);

    Ok(Timetable {
        title: entity.kind.title().to_string(),
        kind: entity.kind,
        term: term.clone(),
        entity_id: entity.id,
        entity_name: entity.name,
        entity_code: entity.code,
        weekly_schedule: build_weekly_schedule(slots),
        statistics,
        generated_at: Utc::now(),
    })
}

/// Timetable of the active sessions held in one class room.
pub async fn class_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    class_room_id: ClassRoomId,
    term: &AcademicTerm,
    policy: &SchedulingPolicy,
) -> ScheduleResult<Timetable> {
    info!(
        "Generating class timetable for class: {}, period: {}",
        class_room_id, term
    );
    term.validate().map_err(ScheduleError::Validation)?;
    let class_room = repo
        .get_class_room(class_room_id)
        .await
        .map_err(or_not_found("ClassRoom", class_room_id.value()))?;

    let entity = TimetableEntity {
        kind: TimetableKind::Class,
        id: class_room.id.value(),
        name: class_room.name,
        code: class_room.code,
    };
    build_timetable(
        repo,
        entity,
        term,
        ScheduleQuery::for_class_room(class_room_id),
        policy,
    )
    .await
}

pub async fn teacher_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    teacher_id: TeacherId,
    term: &AcademicTerm,
    policy: &SchedulingPolicy,
) -> ScheduleResult<Timetable> {
    info!(
        "Generating teacher timetable for teacher: {}, period: {}",
        teacher_id, term
    );
    term.validate().map_err(ScheduleError::Validation)?;
    let teacher = repo
        .get_teacher(teacher_id)
        .await
        .map_err(or_not_found("Teacher", teacher_id.value()))?;

    let entity = TimetableEntity {
        kind: TimetableKind::Teacher,
        id: teacher.id.value(),
        name: teacher.full_name(),
        code: teacher.username,
    };
    build_timetable(
        repo,
        entity,
        term,
        ScheduleQuery::for_teacher(teacher_id),
        policy,
    )
    .await
}

pub async fn subject_timetable<R: FullRepository + ?Sized>(
    repo: &R,
    subject_id: SubjectId,
    term: &AcademicTerm,
    policy: &SchedulingPolicy,
) -> ScheduleResult<Timetable> {
    info!(
        "Generating subject timetable for subject: {}, period: {}",
        subject_id, term
    );
    term.validate().map_err(ScheduleError::Validation)?;
    let subject = repo
        .get_subject(subject_id)
        .await
        .map_err(or_not_found("Subject", subject_id.value()))?;

    let entity = TimetableEntity {
        kind: TimetableKind::Subject,
        id: subject.id.value(),
        name: subject.name,
        code: subject.code,
    };
    build_timetable(
        repo,
        entity,
        term,
        ScheduleQuery::for_subject(subject_id),
        policy,
    )
    .await
}

#[cfg(test)]
#[path = "timetable_tests.rs"]
mod timetable_tests;
