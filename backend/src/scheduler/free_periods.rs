//! Free time within a school day.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::duration_minutes;

/// `[start, end)` window in which nothing is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreePeriod {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub duration_minutes: i64,
}

impl FreePeriod {
    fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            start,
            end,
            duration_minutes: duration_minutes(start, end),
        }
    }
}

/// Merge busy spans into sorted, disjoint spans. Adjacent spans are joined.
pub fn merge_busy(spans: &[(NaiveTime, NaiveTime)]) -> Vec<(NaiveTime, NaiveTime)> {
    let mut sorted: Vec<(NaiveTime, NaiveTime)> =
        spans.iter().copied().filter(|(s, e)| s < e).collect();
    sorted.sort();

    let mut merged: Vec<(NaiveTime, NaiveTime)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }
    merged
}

/// The parts of `[day_start, day_end)` not covered by any busy span.
///
/// Busy spans reaching outside the window are clipped to it.
pub fn free_periods(
    day_start: NaiveTime,
    day_end: NaiveTime,
    busy: &[(NaiveTime, NaiveTime)],
) -> Vec<FreePeriod> {
    if day_start >= day_end {
        return Vec::new();
    }

    let mut free = Vec::new();
    let mut cursor = day_start;

    for (start, end) in merge_busy(busy) {
        if end <= cursor {
            continue;
        }
        if start >= day_end {
            break;
        }
        if start > cursor {
            free.push(FreePeriod::new(cursor, start));
        }
        cursor = cursor.max(end);
        if cursor >= day_end {
            return free;
        }
    }

    if cursor < day_end {
        free.push(FreePeriod::new(cursor, day_end));
    }
    free
}
