//! Data Transfer Objects for the HTTP API.
//!
//! Request and response bodies of the schedule workflow are the service
//! types re-exported from [`crate::api`]; this module adds query strings and
//! the few envelopes that only exist on the wire.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::api::{
    AcademicTerm, ClassRoomId, ConflictDetail, DayOfWeek, PageRequest, ScheduleFilter, ScheduleId,
    ScheduleRecord, SubjectId, TeacherId,
};
use crate::services::schedules::DEFAULT_PAGE_SIZE;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// `?academic_year=2024/2025&semester=1`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermQuery {
    pub academic_year: String,
    pub semester: u8,
}

impl TermQuery {
    pub fn term(&self) -> AcademicTerm {
        AcademicTerm::new(self.academic_year.clone(), self.semester)
    }
}

/// Query parameters for the availability endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub academic_year: String,
    pub semester: u8,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl AvailabilityQuery {
    pub fn term(&self) -> AcademicTerm {
        AcademicTerm::new(self.academic_year.clone(), self.semester)
    }
}

/// Query parameters for the free-period endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FreePeriodsQuery {
    pub academic_year: String,
    pub semester: u8,
    pub day_of_week: DayOfWeek,
}

impl FreePeriodsQuery {
    pub fn term(&self) -> AcademicTerm {
        AcademicTerm::new(self.academic_year.clone(), self.semester)
    }
}

/// Query parameters for schedule search. Every filter is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub class_room_id: Option<i64>,
    #[serde(default)]
    pub subject_id: Option<i64>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub semester: Option<u8>,
    #[serde(default)]
    pub day_of_week: Option<DayOfWeek>,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Zero-based page number (default: 0)
    #[serde(default)]
    pub page: Option<usize>,
    /// Page size (default: 20, max: 100)
    #[serde(default)]
    pub size: Option<usize>,
}

impl SearchQuery {
    pub fn filter(&self) -> ScheduleFilter {
        ScheduleFilter {
            class_room_id: self.class_room_id.map(ClassRoomId),
            subject_id: self.subject_id.map(SubjectId),
            teacher_id: self.teacher_id.map(TeacherId),
            academic_year: self.academic_year.clone(),
            semester: self.semester,
            day_of_week: self.day_of_week,
            is_active: self.is_active,
        }
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// `?exclude_id=7` on the dry-run conflict check.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExcludeQuery {
    #[serde(default)]
    pub exclude_id: Option<i64>,
}

impl ExcludeQuery {
    pub fn exclude_id(&self) -> Option<ScheduleId> {
        self.exclude_id.map(ScheduleId)
    }
}

/// Result of a dry-run conflict check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictDetail>,
}

impl From<Vec<ConflictDetail>> for ConflictCheckResponse {
    fn from(conflicts: Vec<ConflictDetail>) -> Self {
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }
}

/// Schedule list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    /// List of schedules
    pub schedules: Vec<ScheduleRecord>,
    /// Total count
    pub total: usize,
}

impl From<Vec<ScheduleRecord>> for ScheduleListResponse {
    fn from(schedules: Vec<ScheduleRecord>) -> Self {
        Self {
            total: schedules.len(),
            schedules,
        }
    }
}
