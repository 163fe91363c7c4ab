use chrono::{NaiveTime, Utc};
use proptest::prelude::*;

use super::*;
use crate::models::{
    overlaps, AcademicTerm, ClassRoomId, DayOfWeek, ScheduleDraft, ScheduleId, ScheduleRecord,
    SubjectId, TeacherId, TimeRange,
};

const T1: TeacherId = TeacherId(1);
const T2: TeacherId = TeacherId(2);
const R1: ClassRoomId = ClassRoomId(1);
const R2: ClassRoomId = ClassRoomId(2);

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn term() -> AcademicTerm {
    AcademicTerm::new("2024/2025", 1)
}

fn range(day: DayOfWeek, start: NaiveTime, end: NaiveTime) -> TimeRange {
    TimeRange::new(day, start, end, term())
}

fn record(id: i64, teacher: TeacherId, room: ClassRoomId, r: TimeRange) -> ScheduleRecord {
    ScheduleRecord {
        id: ScheduleId(id),
        class_room_id: room,
        subject_id: SubjectId(1),
        teacher_id: teacher,
        range: r,
        is_active: true,
        notes: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Monday 08:00-09:30, teacher T1, room R1.
fn candidate() -> ScheduleDraft {
    ScheduleDraft {
        class_room_id: R1,
        subject_id: SubjectId(1),
        teacher_id: T1,
        range: range(DayOfWeek::Monday, t(8, 0), t(9, 30)),
        is_active: true,
        notes: None,
    }
}

fn monday_nine_to_ten(id: i64, teacher: TeacherId, room: ClassRoomId) -> ScheduleRecord {
    record(id, teacher, room, range(DayOfWeek::Monday, t(9, 0), t(10, 0)))
}

#[test]
fn test_same_teacher_other_room_is_teacher_conflict_only() {
    let existing = vec![monday_nine_to_ten(5, T1, R2)];
    let conflicts = find_conflicts(&candidate(), &existing, None);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::TeacherConflict);
    assert_eq!(conflicts[0].existing_schedule_id, ScheduleId(5));
    assert_eq!(conflicts[0].overlap_range.start, t(9, 0));
    assert_eq!(conflicts[0].overlap_range.end, t(9, 30));
}

#[test]
fn test_other_teacher_same_room_is_classroom_conflict_only() {
    let existing = vec![monday_nine_to_ten(5, T2, R1)];
    let conflicts = find_conflicts(&candidate(), &existing, None);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].kind, ConflictKind::ClassroomConflict);
}

#[test]
fn test_fully_double_booked_slot_yields_both_kinds() {
    let existing = vec![monday_nine_to_ten(5, T1, R1)];
    let kinds: Vec<ConflictKind> = find_conflicts(&candidate(), &existing, None)
        .into_iter()
        .map(|c| c.kind)
        .collect();

    assert_eq!(
        kinds,
        vec![ConflictKind::TeacherConflict, ConflictKind::ClassroomConflict]
    );
}

#[test]
fn test_unrelated_schedule_is_ignored() {
    let existing = vec![monday_nine_to_ten(5, T2, R2)];
    assert!(find_conflicts(&candidate(), &existing, None).is_empty());
}

#[test]
fn test_inactive_schedules_never_conflict() {
    let mut stale = monday_nine_to_ten(5, T1, R1);
    stale.is_active = false;
    assert!(find_conflicts(&candidate(), &[stale], None).is_empty());
}

#[test]
fn test_exclude_id_skips_own_prior_version() {
    let own = record(7, T1, R1, range(DayOfWeek::Monday, t(8, 0), t(9, 30)));
    let other = monday_nine_to_ten(8, T2, R1);

    let conflicts = find_conflicts(&own, &[own.clone(), other], Some(ScheduleId(7)));
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].existing_schedule_id, ScheduleId(8));
}

#[test]
fn test_conflicts_follow_input_order() {
    let existing = vec![
        monday_nine_to_ten(30, T2, R1),
        record(10, T1, R2, range(DayOfWeek::Monday, t(7, 0), t(8, 30))),
    ];
    let ids: Vec<ScheduleId> = find_conflicts(&candidate(), &existing, None)
        .iter()
        .map(|c| c.existing_schedule_id)
        .collect();
    assert_eq!(ids, vec![ScheduleId(30), ScheduleId(10)]);
}

#[test]
fn test_other_term_does_not_conflict() {
    let mut other = monday_nine_to_ten(5, T1, R1);
    other.range.term = AcademicTerm::new("2024/2025", 2);
    assert!(find_conflicts(&candidate(), &[other], None).is_empty());
}

#[test]
fn test_detect_existing_conflicts_reports_each_pair_once() {
    let records = vec![
        record(1, T1, R1, range(DayOfWeek::Tuesday, t(8, 0), t(9, 0))),
        record(2, T1, R2, range(DayOfWeek::Tuesday, t(8, 30), t(9, 30))),
        record(3, T2, R2, range(DayOfWeek::Tuesday, t(9, 0), t(10, 0))),
    ];
    let found = detect_existing_conflicts(&records);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].kind, ConflictKind::TeacherConflict);
    assert_eq!(
        (found[0].first_schedule_id, found[0].second_schedule_id),
        (ScheduleId(1), ScheduleId(2))
    );
    assert_eq!(found[1].kind, ConflictKind::ClassroomConflict);
    assert_eq!(
        (found[1].first_schedule_id, found[1].second_schedule_id),
        (ScheduleId(2), ScheduleId(3))
    );
}

#[test]
fn test_free_periods_of_empty_day_is_whole_day() {
    let free = free_periods(t(7, 0), t(17, 0), &[]);
    assert_eq!(free.len(), 1);
    assert_eq!(free[0].start, t(7, 0));
    assert_eq!(free[0].end, t(17, 0));
    assert_eq!(free[0].duration_minutes, 600);
}

#[test]
fn test_touching_sessions_leave_no_gap() {
    let busy = [(t(9, 0), t(10, 0)), (t(8, 0), t(9, 0)), (t(13, 0), t(14, 30))];
    let free = free_periods(t(7, 0), t(17, 0), &busy);

    let spans: Vec<(NaiveTime, NaiveTime)> = free.iter().map(|f| (f.start, f.end)).collect();
    assert_eq!(
        spans,
        vec![(t(7, 0), t(8, 0)), (t(10, 0), t(13, 0)), (t(14, 30), t(17, 0))]
    );
}

#[test]
fn test_busy_spans_are_clipped_to_school_day() {
    let busy = [(t(6, 0), t(7, 30)), (t(16, 0), t(18, 0))];
    let free = free_periods(t(7, 0), t(17, 0), &busy);
    assert_eq!(free.len(), 1);
    assert_eq!((free[0].start, free[0].end), (t(7, 30), t(16, 0)));
}

#[test]
fn test_fully_booked_day_has_no_free_period() {
    let free = free_periods(t(7, 0), t(17, 0), &[(t(6, 0), t(18, 0))]);
    assert!(free.is_empty());
}

#[test]
fn test_merge_busy_joins_overlapping_spans() {
    let merged = merge_busy(&[(t(10, 0), t(11, 0)), (t(8, 0), t(10, 30)), (t(12, 0), t(12, 0))]);
    assert_eq!(merged, vec![(t(8, 0), t(11, 0))]);
}

fn arb_day() -> impl Strategy<Value = DayOfWeek> {
    (0usize..7).prop_map(|i| DayOfWeek::ALL[i])
}

/// Well-formed range on `day` at minute granularity.
fn arb_range_on(day: DayOfWeek) -> impl Strategy<Value = TimeRange> {
    (0u32..1439)
        .prop_flat_map(|start| (Just(start), (start + 1)..1440))
        .prop_map(move |(s, e)| range(day, t(s / 60, s % 60), t(e / 60, e % 60)))
}

fn arb_range() -> impl Strategy<Value = TimeRange> {
    arb_day().prop_flat_map(arb_range_on)
}

proptest! {
    #[test]
    fn prop_different_days_never_overlap(a in arb_range(), b in arb_range()) {
        prop_assume!(a.day_of_week != b.day_of_week);
        prop_assert!(!overlaps(&a, &b));
    }

    #[test]
    fn prop_overlap_is_symmetric(
        (a, b) in arb_day().prop_flat_map(|d| (arb_range_on(d), arb_range_on(d)))
    ) {
        prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
    }

    #[test]
    fn prop_no_conflicts_without_existing(r in arb_range(), teacher in 1i64..5, room in 1i64..5) {
        let candidate = record(1, TeacherId(teacher), ClassRoomId(room), r);
        prop_assert!(find_conflicts(&candidate, &[], None).is_empty());
    }

    #[test]
    fn prop_record_never_conflicts_with_itself_when_excluded(r in arb_range()) {
        let own = record(42, T1, R1, r);
        prop_assert!(find_conflicts(&own, &[own.clone()], Some(own.id)).is_empty());
    }

    #[test]
    fn prop_free_periods_never_intersect_busy(
        busy in prop::collection::vec(arb_range_on(DayOfWeek::Monday), 0..6)
    ) {
        let spans: Vec<(NaiveTime, NaiveTime)> = busy.iter().map(|r| (r.start, r.end)).collect();
        for free in free_periods(t(7, 0), t(17, 0), &spans) {
            prop_assert!(free.start < free.end);
            for (s, e) in &spans {
                prop_assert!(!(free.start < *e && *s < free.end));
            }
        }
    }
}

#[test]
fn test_touching_ranges_do_not_overlap() {
    let a = range(DayOfWeek::Monday, t(10, 0), t(11, 0));
    let b = range(DayOfWeek::Monday, t(11, 0), t(12, 0));
    assert!(!overlaps(&a, &b));
}

#[test]
fn test_nested_ranges_overlap() {
    let a = range(DayOfWeek::Monday, t(8, 0), t(10, 0));
    let b = range(DayOfWeek::Monday, t(8, 30), t(9, 30));
    assert!(overlaps(&a, &b));
}
