#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::NaiveTime;
use school_sim::db::{DirectoryRepository, LocalRepository};
use school_sim::models::{ClassRoomId, DayOfWeek, NewClassRoom, NewSubject, NewTeacher, SubjectId, TeacherId};
use school_sim::services::CreateScheduleRequest;

pub const ACADEMIC_YEAR: &str = "2024/2025";

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Two rooms, two subjects and two teachers, all with ids 1 and 2:
/// Room 101 / Room 102, Mathematics / Physics, Jane Doe / John Smith.
pub async fn seeded_repo() -> LocalRepository {
    let repo = LocalRepository::new();
    for (name, code) in [("Room 101", "R101"), ("Room 102", "R102")] {
        repo.store_class_room(&NewClassRoom {
            name: name.to_string(),
            code: code.to_string(),
            capacity: Some(30),
            location: Some("Main building".to_string()),
        })
        .await
        .unwrap();
    }
    for (name, code) in [("Mathematics", "MATH"), ("Physics", "PHYS")] {
        repo.store_subject(&NewSubject {
            name: name.to_string(),
            code: code.to_string(),
            credits: Some(4),
        })
        .await
        .unwrap();
    }
    for (first, last, username) in [("Jane", "Doe", "jdoe"), ("John", "Smith", "jsmith")] {
        repo.store_teacher(&NewTeacher {
            first_name: first.to_string(),
            last_name: last.to_string(),
            username: username.to_string(),
            email: Some(format!("{}@school.test", username)),
        })
        .await
        .unwrap();
    }
    repo
}

/// A first-semester Monday session of subject 1.
pub fn session(teacher: i64, room: i64, start: NaiveTime, end: NaiveTime) -> CreateScheduleRequest {
    session_on(DayOfWeek::Monday, teacher, room, 1, start, end)
}

pub fn session_on(
    day: DayOfWeek,
    teacher: i64,
    room: i64,
    subject: i64,
    start: NaiveTime,
    end: NaiveTime,
) -> CreateScheduleRequest {
    CreateScheduleRequest {
        class_room_id: ClassRoomId(room),
        subject_id: SubjectId(subject),
        teacher_id: TeacherId(teacher),
        day_of_week: day,
        start_time: start,
        end_time: end,
        academic_year: ACADEMIC_YEAR.to_string(),
        semester: 1,
        notes: None,
        is_active: None,
        skip_conflict_check: false,
        allow_overlap: false,
    }
}

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}
