//! Repository trait definitions for database operations.
//!
//! - [`error`]: Error types for repository operations
//! - [`schedule`]: Class session CRUD and term queries
//! - [`directory`]: Class rooms, subjects and teachers
//!
//! For functions that need both, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let teacher = repo.get_teacher(teacher_id).await?;
//!     let stored = repo.store_schedule(&draft).await?;
//!     Ok(())
//! }
//! ```

pub mod directory;
pub mod error;
pub mod schedule;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use directory::DirectoryRepository;
pub use schedule::{timetable_order, ScheduleFilter, ScheduleQuery, ScheduleRepository};

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements every repository
/// trait.
pub trait FullRepository: ScheduleRepository + DirectoryRepository {}

impl<T> FullRepository for T where T: ScheduleRepository + DirectoryRepository {}
