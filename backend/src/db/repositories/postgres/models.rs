use chrono::{DateTime, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{class_rooms, schedules, subjects, teachers};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    AcademicTerm, ClassRoom, ClassRoomId, DayOfWeek, NewClassRoom, NewSubject, NewTeacher,
    ScheduleDraft, ScheduleId, ScheduleRecord, Subject, SubjectId, Teacher, TeacherId, TimeRange,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = schedules)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScheduleRow {
    pub schedule_id: i64,
    pub class_room_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub academic_year: String,
    pub semester: i16,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<ScheduleRow> for ScheduleRecord {
    type Error = RepositoryError;

    fn try_from(row: ScheduleRow) -> RepositoryResult<Self> {
        let day_of_week = DayOfWeek::from_iso_number(row.day_of_week).ok_or_else(|| {
            RepositoryError::ValidationError {
                message: format!("Invalid day_of_week {}", row.day_of_week),
                context: ErrorContext::new("row_to_schedule")
                    .with_entity("schedule")
                    .with_entity_id(row.schedule_id),
            }
        })?;
        let semester = u8::try_from(row.semester).map_err(|_| RepositoryError::ValidationError {
            message: format!("Invalid semester {}", row.semester),
            context: ErrorContext::new("row_to_schedule")
                .with_entity("schedule")
                .with_entity_id(row.schedule_id),
        })?;

        Ok(ScheduleRecord {
            id: ScheduleId(row.schedule_id),
            class_room_id: ClassRoomId(row.class_room_id),
            subject_id: SubjectId(row.subject_id),
            teacher_id: TeacherId(row.teacher_id),
            range: TimeRange::new(
                day_of_week,
                row.start_time,
                row.end_time,
                AcademicTerm::new(row.academic_year, semester),
            ),
            is_active: row.is_active,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub fn rows_to_records(rows: Vec<ScheduleRow>) -> RepositoryResult<Vec<ScheduleRecord>> {
    rows.into_iter().map(ScheduleRecord::try_from).collect()
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schedules)]
pub struct NewScheduleRow {
    pub class_room_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub academic_year: String,
    pub semester: i16,
    pub is_active: bool,
    pub notes: Option<String>,
}

impl From<&ScheduleDraft> for NewScheduleRow {
    fn from(draft: &ScheduleDraft) -> Self {
        Self {
            class_room_id: draft.class_room_id.0,
            subject_id: draft.subject_id.0,
            teacher_id: draft.teacher_id.0,
            day_of_week: draft.range.day_of_week.iso_number(),
            start_time: draft.range.start,
            end_time: draft.range.end,
            academic_year: draft.range.term.academic_year.clone(),
            semester: i16::from(draft.range.term.semester),
            is_active: draft.is_active,
            notes: draft.notes.clone(),
        }
    }
}

/// Full replacement of the writable columns; `notes = None` clears the column.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schedules)]
#[diesel(treat_none_as_null = true)]
pub struct ScheduleChangeset {
    pub class_room_id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub academic_year: String,
    pub semester: i16,
    pub is_active: bool,
    pub notes: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduleChangeset {
    pub fn from_draft(draft: &ScheduleDraft, updated_at: DateTime<Utc>) -> Self {
        let row = NewScheduleRow::from(draft);
        Self {
            class_room_id: row.class_room_id,
            subject_id: row.subject_id,
            teacher_id: row.teacher_id,
            day_of_week: row.day_of_week,
            start_time: row.start_time,
            end_time: row.end_time,
            academic_year: row.academic_year,
            semester: row.semester,
            is_active: row.is_active,
            notes: row.notes,
            updated_at: Some(updated_at),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = class_rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ClassRoomRow {
    pub class_room_id: i64,
    pub name: String,
    pub code: String,
    pub capacity: Option<i32>,
    pub location: Option<String>,
}

impl From<ClassRoomRow> for ClassRoom {
    fn from(row: ClassRoomRow) -> Self {
        Self {
            id: ClassRoomId(row.class_room_id),
            name: row.name,
            code: row.code,
            capacity: row.capacity,
            location: row.location,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = class_rooms)]
pub struct NewClassRoomRow {
    pub name: String,
    pub code: String,
    pub capacity: Option<i32>,
    pub location: Option<String>,
}

impl From<&NewClassRoom> for NewClassRoomRow {
    fn from(value: &NewClassRoom) -> Self {
        Self {
            name: value.name.clone(),
            code: value.code.clone(),
            capacity: value.capacity,
            location: value.location.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubjectRow {
    pub subject_id: i64,
    pub name: String,
    pub code: String,
    pub credits: Option<i32>,
}

impl From<SubjectRow> for Subject {
    fn from(row: SubjectRow) -> Self {
        Self {
            id: SubjectId(row.subject_id),
            name: row.name,
            code: row.code,
            credits: row.credits,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subjects)]
pub struct NewSubjectRow {
    pub name: String,
    pub code: String,
    pub credits: Option<i32>,
}

impl From<&NewSubject> for NewSubjectRow {
    fn from(value: &NewSubject) -> Self {
        Self {
            name: value.name.clone(),
            code: value.code.clone(),
            credits: value.credits,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teachers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TeacherRow {
    pub teacher_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: Option<String>,
}

impl From<TeacherRow> for Teacher {
    fn from(row: TeacherRow) -> Self {
        Self {
            id: TeacherId(row.teacher_id),
            first_name: row.first_name,
            last_name: row.last_name,
            username: row.username,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teachers)]
pub struct NewTeacherRow {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: Option<String>,
}

impl From<&NewTeacher> for NewTeacherRow {
    fn from(value: &NewTeacher) -> Self {
        Self {
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
            username: value.username.clone(),
            email: value.email.clone(),
        }
    }
}
