//! Teacher and class room availability, and free periods in a school day.

use chrono::NaiveTime;
use log::info;
use serde::{Deserialize, Serialize};

use super::error::{or_not_found, ScheduleError, ScheduleResult};
use crate::config::SchedulingPolicy;
use crate::db::{FullRepository, ScheduleQuery};
use crate::models::{
    validate_time_slot, AcademicTerm, ClassRoomId, DayOfWeek, ScheduleRecord, TeacherId,
    TimeRange,
};
use crate::scheduler::{free_periods, FreePeriod};

/// Whether one teacher or class room can take a session in a given slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    pub entity_id: i64,
    pub entity_name: String,
    pub day_of_week: DayOfWeek,
    pub requested_start_time: NaiveTime,
    pub requested_end_time: NaiveTime,
    pub is_available: bool,
    /// Active schedules of the entity overlapping the requested slot.
    pub conflicting_schedules: Vec<ScheduleRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreePeriods {
    pub entity_id: i64,
    pub entity_name: String,
    pub day_of_week: DayOfWeek,
    pub periods: Vec<FreePeriod>,
    pub total_free_minutes: i64,
}

fn requested_range(
    day: DayOfWeek,
    start: NaiveTime,
    end: NaiveTime,
    term: &AcademicTerm,
) -> ScheduleResult<TimeRange> {
    if !validate_time_slot(start, end) {
        return Err(ScheduleError::validation(
            "Invalid time slot: start time must be before end time",
        ));
    }
    term.validate().map_err(ScheduleError::Validation)?;
    Ok(TimeRange::new(day, start, end, term.clone()))
}

fn availability(
    entity_id: i64,
    entity_name: String,
    requested: &TimeRange,
    day_schedules: Vec<ScheduleRecord>,
) -> Availability {
    let conflicting_schedules: Vec<ScheduleRecord> = day_schedules
        .into_iter()
        .filter(|r| r.range.overlaps(requested))
        .collect();

    Availability {
        entity_id,
        entity_name,
        day_of_week: requested.day_of_week,
        requested_start_time: requested.start,
        requested_end_time: requested.end,
        is_available: conflicting_schedules.is_empty(),
        conflicting_schedules,
    }
}

fn free_periods_of(
    entity_id: i64,
    entity_name: String,
    day: DayOfWeek,
    day_schedules: &[ScheduleRecord],
    policy: &SchedulingPolicy,
) -> FreePeriods {
    let busy: Vec<(NaiveTime, NaiveTime)> = day_schedules
        .iter()
        .map(|r| (r.start_time(), r.end_time()))
        .collect();
    let periods = free_periods(policy.school_start, policy.school_end, &busy);
    let total_free_minutes = periods.iter().map(|p| p.duration_minutes).sum();

    FreePeriods {
        entity_id,
        entity_name,
        day_of_week: day,
        periods,
        total_free_minutes,
    }
}

pub async fn teacher_availability<R: FullRepository + ?Sized>(
    repo: &R,
    teacher_id: TeacherId,
    day: DayOfWeek,
    start: NaiveTime,
    end: NaiveTime,
    term: &AcademicTerm,
) -> ScheduleResult<Availability> {
    info!("Checking teacher availability for teacher: {} on {}", teacher_id, day);
    let requested = requested_range(day, start, end, term)?;
    let teacher = repo
        .get_teacher(teacher_id)
        .await
        .map_err(or_not_found("Teacher", teacher_id.value()))?;

    let day_schedules = repo
        .list_schedules_for_term(term, &ScheduleQuery::for_teacher(teacher_id).on_day(day))
        .await?;
    Ok(availability(
        teacher_id.value(),
        teacher.full_name(),
        &requested,
        day_schedules,
    ))
}

pub async fn class_room_availability<R: FullRepository + ?Sized>(
    repo: &R,
    class_room_id: ClassRoomId,
    day: DayOfWeek,
    start: NaiveTime,
    end: NaiveTime,
    term: &AcademicTerm,
) -> ScheduleResult<Availability> {
    info!(
        "Checking classroom availability for classroom: {} on {}",
        class_room_id, day
    );
    let requested = requested_range(day, start, end, term)?;
    let class_room = repo
        .get_class_room(class_room_id)
        .await
        .map_err(or_not_found("ClassRoom", class_room_id.value()))?;

    let day_schedules = repo
        .list_schedules_for_term(
            term,
            &ScheduleQuery::for_class_room(class_room_id).on_day(day),
        )
        .await?;
    Ok(availability(
        class_room_id.value(),
        class_room.name,
        &requested,
        day_schedules,
    ))
}

/// The parts of the school day in which the teacher has no active session.
pub async fn teacher_free_periods<R: FullRepository + ?Sized>(
    repo: &R,
    teacher_id: TeacherId,
    day: DayOfWeek,
    term: &AcademicTerm,
    policy: &SchedulingPolicy,
) -> ScheduleResult<FreePeriods> {
    term.validate().map_err(ScheduleError::Validation)?;
    let teacher = repo
        .get_teacher(teacher_id)
        .await
        .map_err(or_not_found("Teacher", teacher_id.value()))?;

    let day_schedules = repo
        .list_schedules_for_term(term, &ScheduleQuery::for_teacher(teacher_id).on_day(day))
        .await?;
    Ok(free_periods_of(
        teacher_id.value(),
        teacher.full_name(),
        day,
        &day_schedules,
        policy,
    ))
}

/// The parts of the school day in which the class room is empty.
pub async fn class_room_free_periods<R: FullRepository + ?Sized>(
    repo: &R,
    class_room_id: ClassRoomId,
    day: DayOfWeek,
    term: &AcademicTerm,
    policy: &SchedulingPolicy,
) -> ScheduleResult<FreePeriods> {
    term.validate().map_err(ScheduleError::Validation)?;
    let class_room = repo
        .get_class_room(class_room_id)
        .await
        .map_err(or_not_found("ClassRoom", class_room_id.value()))?;

    let day_schedules = repo
        .list_schedules_for_term(
            term,
            &ScheduleQuery::for_class_room(class_room_id).on_day(day),
        )
        .await?;
    Ok(free_periods_of(
        class_room_id.value(),
        class_room.name,
        day,
        &day_schedules,
        policy,
    ))
}
