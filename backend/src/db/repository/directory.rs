//! Reference data that schedules point at: class rooms, subjects, teachers.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    ClassRoom, ClassRoomId, NewClassRoom, NewSubject, NewTeacher, Subject, SubjectId, Teacher,
    TeacherId,
};

/// Repository trait for the school directory.
///
/// `get_*` methods return `RepositoryError::NotFound` for unknown ids.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn store_class_room(&self, class_room: &NewClassRoom) -> RepositoryResult<ClassRoom>;

    async fn get_class_room(&self, id: ClassRoomId) -> RepositoryResult<ClassRoom>;

    /// All class rooms ordered by id.
    async fn list_class_rooms(&self) -> RepositoryResult<Vec<ClassRoom>>;

    async fn store_subject(&self, subject: &NewSubject) -> RepositoryResult<Subject>;

    async fn get_subject(&self, id: SubjectId) -> RepositoryResult<Subject>;

    async fn list_subjects(&self) -> RepositoryResult<Vec<Subject>>;

    async fn store_teacher(&self, teacher: &NewTeacher) -> RepositoryResult<Teacher>;

    async fn get_teacher(&self, id: TeacherId) -> RepositoryResult<Teacher>;

    async fn list_teachers(&self) -> RepositoryResult<Vec<Teacher>>;
}
