//! Public API surface for the backend.
//!
//! This file consolidates the types exchanged over the HTTP API.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::config::SchedulingPolicy;
pub use crate::db::{ScheduleFilter, ScheduleQuery};
pub use crate::models::{
    AcademicTerm, ClassRoom, ClassRoomId, DayOfWeek, NewClassRoom, NewSubject, NewTeacher,
    ScheduleDraft, ScheduleId, ScheduleRecord, Subject, SubjectId, Teacher, TeacherId, TimeRange,
};
pub use crate::scheduler::{Conflict, ConflictKind, ExistingConflict, FreePeriod};
pub use crate::services::{
    Availability, BulkItemResult, BulkOutcome, BulkScheduleRequest, ConflictDetail,
    ConstraintReport, CreateScheduleRequest, FreePeriods, PageRequest, ScheduleOutcome,
    SchedulePage, TermConflictDetail, Timetable, TimetableKind, TimetableSlot,
    TimetableStatistics, UpdateScheduleRequest,
};
