//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository traits. They
//! are generic over `R: FullRepository + ?Sized`, so the same code runs
//! against the in-memory and Postgres backends and behind `Arc<dyn ...>`.

pub mod availability;
pub mod conflicts;
pub mod directory;
pub mod error;
pub mod schedules;
pub mod timetable;
pub mod validation;

pub use availability::{
    class_room_availability, class_room_free_periods, teacher_availability, teacher_free_periods,
    Availability, FreePeriods,
};
pub use conflicts::{
    check_conflicts, check_update_conflicts, detect_term_conflicts, ConflictDetail,
    TermConflictDetail,
};
pub use error::{ScheduleError, ScheduleResult};
pub use schedules::{
    bulk_create_schedules, create_schedule, delete_schedule, get_schedule, schedules_by_class_room,
    schedules_by_subject, schedules_by_teacher, search_schedules, update_schedule,
    validate_draft, BulkItemResult, BulkOutcome, BulkScheduleRequest, ConflictPolicy,
    CreateScheduleRequest, PageRequest, ScheduleOutcome, SchedulePage, UpdateScheduleRequest,
};
pub use timetable::{
    class_timetable, subject_timetable, teacher_timetable, Timetable, TimetableKind,
    TimetableSlot, TimetableStatistics,
};
pub use validation::{validate_schedule_constraints, validate_update_constraints, ConstraintReport};
