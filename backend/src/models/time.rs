//! Weekly time ranges scoped to an academic term.
//!
//! A [`TimeRange`] is a half-open interval `[start, end)` on one day of the
//! week inside one [`AcademicTerm`]. Ranges from different days or terms are
//! never comparable, so they never overlap.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the week, ordered Monday first (ISO 8601).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// ISO day number, Monday = 1 .. Sunday = 7.
    pub fn iso_number(self) -> i16 {
        match self {
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
            DayOfWeek::Sunday => 7,
        }
    }

    pub fn from_iso_number(n: i16) -> Option<Self> {
        match n {
            1..=7 => Some(Self::ALL[(n - 1) as usize]),
            _ => None,
        }
    }

    pub fn is_school_day(self) -> bool {
        !matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "MONDAY",
            DayOfWeek::Tuesday => "TUESDAY",
            DayOfWeek::Wednesday => "WEDNESDAY",
            DayOfWeek::Thursday => "THURSDAY",
            DayOfWeek::Friday => "FRIDAY",
            DayOfWeek::Saturday => "SATURDAY",
            DayOfWeek::Sunday => "SUNDAY",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    /// Accepts full names and three-letter abbreviations, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        DayOfWeek::ALL
            .into_iter()
            .find(|day| {
                let name = day.as_str().to_lowercase();
                name == lower || name[..3] == lower
            })
            .ok_or_else(|| format!("Unknown day of week: {}", s))
    }
}

/// An `(academic_year, semester)` pair, e.g. `2024/2025` semester 1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AcademicTerm {
    pub academic_year: String,
    pub semester: u8,
}

impl AcademicTerm {
    pub fn new(academic_year: impl Into<String>, semester: u8) -> Self {
        Self {
            academic_year: academic_year.into(),
            semester,
        }
    }

    /// Check the `YYYY/YYYY` format and that the semester is 1 or 2.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_academic_year(&self.academic_year) {
            return Err("Academic year must be in format YYYY/YYYY".to_string());
        }
        if !(1..=2).contains(&self.semester) {
            return Err("Semester must be 1 or 2".to_string());
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl fmt::Display for AcademicTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} semester {}", self.academic_year, self.semester)
    }
}

/// `true` when `year` is exactly four digits, a slash, four digits.
pub fn is_valid_academic_year(year: &str) -> bool {
    let bytes = year.as_bytes();
    bytes.len() == 9
        && bytes[4] == b'/'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Half-open `[start, end)` interval on one weekday of one academic term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub day_of_week: DayOfWeek,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(flatten)]
    pub term: AcademicTerm,
}

impl TimeRange {
    pub fn new(day_of_week: DayOfWeek, start: NaiveTime, end: NaiveTime, term: AcademicTerm) -> Self {
        Self {
            day_of_week,
            start,
            end,
            term,
        }
    }

    /// Whether `start < end`. Every stored range satisfies this.
    pub fn is_well_formed(&self) -> bool {
        validate_time_slot(self.start, self.end)
    }

    /// Same day of week and same academic term.
    pub fn is_comparable(&self, other: &TimeRange) -> bool {
        self.day_of_week == other.day_of_week && self.term == other.term
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        overlaps(self, other)
    }

    /// The shared part of two overlapping ranges.
    pub fn intersection(&self, other: &TimeRange) -> Option<TimeRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(TimeRange {
            day_of_week: self.day_of_week,
            start: self.start.max(other.start),
            end: self.end.min(other.end),
            term: self.term.clone(),
        })
    }

    pub fn duration_minutes(&self) -> i64 {
        duration_minutes(self.start, self.end)
    }

    /// `"08:00 - 09:30"`
    pub fn label(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Half-open overlap test; touching endpoints do not overlap.
pub fn overlaps(a: &TimeRange, b: &TimeRange) -> bool {
    if !a.is_comparable(b) {
        return false;
    }
    a.start < b.end && b.start < a.end
}

pub fn validate_time_slot(start: NaiveTime, end: NaiveTime) -> bool {
    start < end
}

/// Whole minutes between `start` and `end` (negative when reversed).
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    end.signed_duration_since(start).num_minutes()
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod time_tests;
