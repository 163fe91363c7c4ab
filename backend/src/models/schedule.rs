//! Schedule records and the directory entities they reference.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::{AcademicTerm, DayOfWeek, TimeRange};
use crate::define_id_type;

define_id_type!(i64, ScheduleId);
define_id_type!(i64, ClassRoomId);
define_id_type!(i64, SubjectId);
define_id_type!(i64, TeacherId);

/// A stored recurring class session.
///
/// Records are never physically removed; deleting one clears `is_active`
/// so teaching history that points at it stays valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: ScheduleId,
    pub class_room_id: ClassRoomId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub range: TimeRange,
    pub is_active: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ScheduleRecord {
    pub fn term(&self) -> &AcademicTerm {
        &self.range.term
    }

    pub fn day_of_week(&self) -> DayOfWeek {
        self.range.day_of_week
    }

    pub fn start_time(&self) -> NaiveTime {
        self.range.start
    }

    pub fn end_time(&self) -> NaiveTime {
        self.range.end
    }

    /// The writable part of the record.
    pub fn to_draft(&self) -> ScheduleDraft {
        ScheduleDraft {
            class_room_id: self.class_room_id,
            subject_id: self.subject_id,
            teacher_id: self.teacher_id,
            range: self.range.clone(),
            is_active: self.is_active,
            notes: self.notes.clone(),
        }
    }
}

/// A schedule that has not been persisted yet (or the replacement values
/// for an existing one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub class_room_id: ClassRoomId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub range: TimeRange,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_active() -> bool {
    true
}

/// What the conflict checker needs to know about a candidate schedule.
pub trait Schedulable {
    fn teacher_id(&self) -> TeacherId;
    fn class_room_id(&self) -> ClassRoomId;
    fn range(&self) -> &TimeRange;
}

impl Schedulable for ScheduleRecord {
    fn teacher_id(&self) -> TeacherId {
        self.teacher_id
    }

    fn class_room_id(&self) -> ClassRoomId {
        self.class_room_id
    }

    fn range(&self) -> &TimeRange {
        &self.range
    }
}

impl Schedulable for ScheduleDraft {
    fn teacher_id(&self) -> TeacherId {
        self.teacher_id
    }

    fn class_room_id(&self) -> ClassRoomId {
        self.class_room_id
    }

    fn range(&self) -> &TimeRange {
        &self.range
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRoom {
    pub id: ClassRoomId,
    pub name: String,
    pub code: String,
    pub capacity: Option<i32>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClassRoom {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub capacity: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: String,
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubject {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub credits: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: Option<String>,
}

impl Teacher {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTeacher {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}
