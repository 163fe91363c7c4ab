//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    AvailabilityQuery, ConflictCheckResponse, ExcludeQuery, FreePeriodsQuery, HealthResponse,
    ScheduleListResponse, SearchQuery, TermQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{
    Availability, BulkOutcome, BulkScheduleRequest, ClassRoom, ClassRoomId, ConstraintReport,
    CreateScheduleRequest, FreePeriods, NewClassRoom, NewSubject, NewTeacher, ScheduleId,
    ScheduleOutcome, SchedulePage, ScheduleRecord, Subject, SubjectId, Teacher, TeacherId,
    TermConflictDetail, Timetable, UpdateScheduleRequest,
};
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Result type for handlers that create a resource.
pub type CreatedResult<T> = Result<(StatusCode, Json<T>), AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and database is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Schedules
// =============================================================================

/// POST /v1/schedules
///
/// 201 with the stored schedule and any tolerated conflicts, 409 when the
/// schedule collides and overlap is not allowed.
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> CreatedResult<ScheduleOutcome> {
    let outcome = services::create_schedule(state.repository.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /v1/schedules
pub async fn search_schedules(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> HandlerResult<SchedulePage> {
    let page =
        services::search_schedules(state.repository.as_ref(), &query.filter(), query.page())
            .await?;
    Ok(Json(page))
}

/// POST /v1/schedules/bulk
pub async fn bulk_create_schedules(
    State(state): State<AppState>,
    Json(request): Json<BulkScheduleRequest>,
) -> HandlerResult<BulkOutcome> {
    let outcome = services::bulk_create_schedules(state.repository.as_ref(), &request).await?;
    Ok(Json(outcome))
}

/// POST /v1/schedules/check-conflicts
///
/// Dry run: reports what creating the schedule would collide with.
pub async fn check_conflicts(
    State(state): State<AppState>,
    Query(query): Query<ExcludeQuery>,
    Json(request): Json<CreateScheduleRequest>,
) -> HandlerResult<ConflictCheckResponse> {
    let conflicts =
        services::check_conflicts(state.repository.as_ref(), &request, query.exclude_id())
            .await?;
    Ok(Json(conflicts.into()))
}

/// POST /v1/schedules/validate
pub async fn validate_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> HandlerResult<ConstraintReport> {
    Ok(Json(services::validate_schedule_constraints(
        request.start_time,
        request.end_time,
        &state.policy,
    )))
}

/// GET /v1/schedules/conflicts?academic_year=..&semester=..
pub async fn detect_conflicts(
    State(state): State<AppState>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<Vec<TermConflictDetail>> {
    let conflicts =
        services::detect_term_conflicts(state.repository.as_ref(), &query.term()).await?;
    Ok(Json(conflicts))
}

/// GET /v1/schedules/{id}
pub async fn get_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ScheduleRecord> {
    let record = services::get_schedule(state.repository.as_ref(), ScheduleId::new(id)).await?;
    Ok(Json(record))
}

/// PUT /v1/schedules/{id}
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateScheduleRequest>,
) -> HandlerResult<ScheduleOutcome> {
    let outcome =
        services::update_schedule(state.repository.as_ref(), ScheduleId::new(id), &request)
            .await?;
    Ok(Json(outcome))
}

/// DELETE /v1/schedules/{id}
///
/// Logical delete; returns the deactivated record.
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ScheduleRecord> {
    let record =
        services::delete_schedule(state.repository.as_ref(), ScheduleId::new(id)).await?;
    Ok(Json(record))
}

/// POST /v1/schedules/{id}/check-conflicts
pub async fn check_update_conflicts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateScheduleRequest>,
) -> HandlerResult<ConflictCheckResponse> {
    let conflicts = services::check_update_conflicts(
        state.repository.as_ref(),
        ScheduleId::new(id),
        &request,
    )
    .await?;
    Ok(Json(conflicts.into()))
}

/// POST /v1/schedules/{id}/validate
pub async fn validate_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateScheduleRequest>,
) -> HandlerResult<ConstraintReport> {
    let report = services::validate_update_constraints(
        state.repository.as_ref(),
        ScheduleId::new(id),
        &request,
        &state.policy,
    )
    .await?;
    Ok(Json(report))
}

// =============================================================================
// Class rooms
// =============================================================================

/// POST /v1/class-rooms
pub async fn create_class_room(
    State(state): State<AppState>,
    Json(request): Json<NewClassRoom>,
) -> CreatedResult<ClassRoom> {
    let stored =
        services::directory::create_class_room(state.repository.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /v1/class-rooms
pub async fn list_class_rooms(State(state): State<AppState>) -> HandlerResult<Vec<ClassRoom>> {
    Ok(Json(
        services::directory::list_class_rooms(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/class-rooms/{id}
pub async fn get_class_room(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<ClassRoom> {
    Ok(Json(
        services::directory::get_class_room(state.repository.as_ref(), ClassRoomId::new(id))
            .await?,
    ))
}

/// GET /v1/class-rooms/{id}/schedules
pub async fn class_room_schedules(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<ScheduleListResponse> {
    let schedules = services::schedules_by_class_room(
        state.repository.as_ref(),
        ClassRoomId::new(id),
        &query.term(),
    )
    .await?;
    Ok(Json(schedules.into()))
}

/// GET /v1/class-rooms/{id}/timetable
pub async fn class_room_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<Timetable> {
    let timetable = services::class_timetable(
        state.repository.as_ref(),
        ClassRoomId::new(id),
        &query.term(),
        &state.policy,
    )
    .await?;
    Ok(Json(timetable))
}

/// GET /v1/class-rooms/{id}/availability
pub async fn class_room_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<Availability> {
    let availability = services::class_room_availability(
        state.repository.as_ref(),
        ClassRoomId::new(id),
        query.day_of_week,
        query.start_time,
        query.end_time,
        &query.term(),
    )
    .await?;
    Ok(Json(availability))
}

/// GET /v1/class-rooms/{id}/free-periods
pub async fn class_room_free_periods(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FreePeriodsQuery>,
) -> HandlerResult<FreePeriods> {
    let periods = services::class_room_free_periods(
        state.repository.as_ref(),
        ClassRoomId::new(id),
        query.day_of_week,
        &query.term(),
        &state.policy,
    )
    .await?;
    Ok(Json(periods))
}

// =============================================================================
// Teachers
// =============================================================================

/// POST /v1/teachers
pub async fn create_teacher(
    State(state): State<AppState>,
    Json(request): Json<NewTeacher>,
) -> CreatedResult<Teacher> {
    let stored = services::directory::create_teacher(state.repository.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /v1/teachers
pub async fn list_teachers(State(state): State<AppState>) -> HandlerResult<Vec<Teacher>> {
    Ok(Json(
        services::directory::list_teachers(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/teachers/{id}
pub async fn get_teacher(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Teacher> {
    Ok(Json(
        services::directory::get_teacher(state.repository.as_ref(), TeacherId::new(id)).await?,
    ))
}

/// GET /v1/teachers/{id}/schedules
pub async fn teacher_schedules(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<ScheduleListResponse> {
    let schedules = services::schedules_by_teacher(
        state.repository.as_ref(),
        TeacherId::new(id),
        &query.term(),
    )
    .await?;
    Ok(Json(schedules.into()))
}

/// GET /v1/teachers/{id}/timetable
pub async fn teacher_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<Timetable> {
    let timetable = services::teacher_timetable(
        state.repository.as_ref(),
        TeacherId::new(id),
        &query.term(),
        &state.policy,
    )
    .await?;
    Ok(Json(timetable))
}

/// GET /v1/teachers/{id}/availability
pub async fn teacher_availability(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<Availability> {
    let availability = services::teacher_availability(
        state.repository.as_ref(),
        TeacherId::new(id),
        query.day_of_week,
        query.start_time,
        query.end_time,
        &query.term(),
    )
    .await?;
    Ok(Json(availability))
}

/// GET /v1/teachers/{id}/free-periods
pub async fn teacher_free_periods(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<FreePeriodsQuery>,
) -> HandlerResult<FreePeriods> {
    let periods = services::teacher_free_periods(
        state.repository.as_ref(),
        TeacherId::new(id),
        query.day_of_week,
        &query.term(),
        &state.policy,
    )
    .await?;
    Ok(Json(periods))
}

// =============================================================================
// Subjects
// =============================================================================

/// POST /v1/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<NewSubject>,
) -> CreatedResult<Subject> {
    let stored = services::directory::create_subject(state.repository.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /v1/subjects
pub async fn list_subjects(State(state): State<AppState>) -> HandlerResult<Vec<Subject>> {
    Ok(Json(
        services::directory::list_subjects(state.repository.as_ref()).await?,
    ))
}

/// GET /v1/subjects/{id}
pub async fn get_subject(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> HandlerResult<Subject> {
    Ok(Json(
        services::directory::get_subject(state.repository.as_ref(), SubjectId::new(id)).await?,
    ))
}

/// GET /v1/subjects/{id}/schedules
pub async fn subject_schedules(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<ScheduleListResponse> {
    let schedules = services::schedules_by_subject(
        state.repository.as_ref(),
        SubjectId::new(id),
        &query.term(),
    )
    .await?;
    Ok(Json(schedules.into()))
}

/// GET /v1/subjects/{id}/timetable
pub async fn subject_timetable(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<TermQuery>,
) -> HandlerResult<Timetable> {
    let timetable = services::subject_timetable(
        state.repository.as_ref(),
        SubjectId::new(id),
        &query.term(),
        &state.policy,
    )
    .await?;
    Ok(Json(timetable))
}
