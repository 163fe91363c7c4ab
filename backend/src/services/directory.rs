//! Class rooms, subjects and teachers.

use log::info;

use super::error::{or_not_found, ScheduleError, ScheduleResult};
use crate::db::FullRepository;
use crate::models::{
    ClassRoom, ClassRoomId, NewClassRoom, NewSubject, NewTeacher, Subject, SubjectId, Teacher,
    TeacherId,
};

fn require(field: &str, value: &str) -> ScheduleResult<()> {
    if value.trim().is_empty() {
        return Err(ScheduleError::validation(format!("{} must not be blank", field)));
    }
    Ok(())
}

pub async fn create_class_room<R: FullRepository + ?Sized>(
    repo: &R,
    class_room: &NewClassRoom,
) -> ScheduleResult<ClassRoom> {
    require("name", &class_room.name)?;
    require("code", &class_room.code)?;
    if class_room.capacity.is_some_and(|c| c <= 0) {
        return Err(ScheduleError::validation("capacity must be positive"));
    }
    let stored = repo.store_class_room(class_room).await?;
    info!("Class room created: {} ({})", stored.name, stored.id);
    Ok(stored)
}

pub async fn get_class_room<R: FullRepository + ?Sized>(
    repo: &R,
    id: ClassRoomId,
) -> ScheduleResult<ClassRoom> {
    repo.get_class_room(id)
        .await
        .map_err(or_not_found("ClassRoom", id.value()))
}

pub async fn list_class_rooms<R: FullRepository + ?Sized>(
    repo: &R,
) -> ScheduleResult<Vec<ClassRoom>> {
    Ok(repo.list_class_rooms().await?)
}

pub async fn create_subject<R: FullRepository + ?Sized>(
    repo: &R,
    subject: &NewSubject,
) -> ScheduleResult<Subject> {
    require("name", &subject.name)?;
    require("code", &subject.code)?;
    let stored = repo.store_subject(subject).await?;
    info!("Subject created: {} ({})", stored.name, stored.id);
    Ok(stored)
}

pub async fn get_subject<R: FullRepository + ?Sized>(
    repo: &R,
    id: SubjectId,
) -> ScheduleResult<Subject> {
    repo.get_subject(id)
        .await
        .map_err(or_not_found("Subject", id.value()))
}

pub async fn list_subjects<R: FullRepository + ?Sized>(repo: &R) -> ScheduleResult<Vec<Subject>> {
    Ok(repo.list_subjects().await?)
}

pub async fn create_teacher<R: FullRepository + ?Sized>(
    repo: &R,
    teacher: &NewTeacher,
) -> ScheduleResult<Teacher> {
    require("first_name", &teacher.first_name)?;
    require("last_name", &teacher.last_name)?;
    require("username", &teacher.username)?;
    let stored = repo.store_teacher(teacher).await?;
    info!("Teacher created: {} ({})", stored.full_name(), stored.id);
    Ok(stored)
}

pub async fn get_teacher<R: FullRepository + ?Sized>(
    repo: &R,
    id: TeacherId,
) -> ScheduleResult<Teacher> {
    repo.get_teacher(id)
        .await
        .map_err(or_not_found("Teacher", id.value()))
}

pub async fn list_teachers<R: FullRepository + ?Sized>(repo: &R) -> ScheduleResult<Vec<Teacher>> {
    Ok(repo.list_teachers().await?)
}
