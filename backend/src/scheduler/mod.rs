//! Timetable scheduling primitives.
//!
//! Pure computations over schedule snapshots: conflict detection between a
//! candidate session and the sessions already on the books, and the free
//! time left in a school day. The service layer fetches the snapshots and
//! decides what to do with the results.

pub mod conflicts;
pub mod free_periods;

pub use conflicts::{
    detect_existing_conflicts, find_conflicts, Conflict, ConflictKind, ExistingConflict,
};
pub use free_periods::{free_periods, merge_busy, FreePeriod};

#[cfg(test)]
mod tests;
