//! HTTP API tests driving the full router with `tower::ServiceExt::oneshot`.

#![cfg(feature = "http-server")]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use school_sim::db::FullRepository;
use school_sim::http::{create_router, AppState};

const TERM: &str = "academic_year=2024/2025&semester=1";

async fn app() -> Router {
    let repo = Arc::new(support::seeded_repo().await) as Arc<dyn FullRepository>;
    create_router(AppState::new(repo))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn schedule_body(teacher: i64, room: i64, day: &str, start: &str, end: &str) -> Value {
    json!({
        "class_room_id": room,
        "subject_id": 1,
        "teacher_id": teacher,
        "day_of_week": day,
        "start_time": start,
        "end_time": end,
        "academic_year": "2024/2025",
        "semester": 1
    })
}

#[tokio::test]
async fn test_create_then_conflict_returns_409_with_details() {
    let app = app().await;

    let (status, created) = send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 1, "MONDAY", "08:00:00", "09:30:00"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["schedule"]["id"], 1);
    assert_eq!(created["schedule"]["is_active"], true);
    assert_eq!(created["warnings"], json!([]));

    let (status, error) = send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 2, "MONDAY", "09:00:00", "10:00:00"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["code"], "SCHEDULE_CONFLICT");
    assert_eq!(
        error["message"],
        "Schedule conflicts detected: 1 conflicts found"
    );

    let details: Value = serde_json::from_str(error["details"].as_str().unwrap()).unwrap();
    assert_eq!(details[0]["kind"], "TEACHER_CONFLICT");
    assert_eq!(details[0]["existing_schedule_id"], 1);
    assert_eq!(details[0]["conflicting_entity"], "Jane Doe");
}

#[tokio::test]
async fn test_allow_overlap_returns_warnings() {
    let app = app().await;
    send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 1, "MONDAY", "08:00:00", "09:30:00"),
        ),
    )
    .await;

    let mut body = schedule_body(2, 1, "MONDAY", "09:00:00", "10:00:00");
    body["allow_overlap"] = json!(true);
    let (status, created) = send(&app, with_json("POST", "/v1/schedules", body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["warnings"][0]["kind"], "CLASSROOM_CONFLICT");

    let (status, found) = send(&app, get(&format!("/v1/schedules/conflicts?{}", TERM))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().map(Vec::len), Some(1));
    assert_eq!(found[0]["first_schedule_id"], 1);
    assert_eq!(found[0]["second_schedule_id"], 2);
}

#[tokio::test]
async fn test_invalid_slot_is_400() {
    let app = app().await;
    let (status, error) = send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 1, "MONDAY", "10:00:00", "09:00:00"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
    assert_eq!(
        error["message"],
        "Invalid time slot: start time must be before end time"
    );
}

#[tokio::test]
async fn test_unknown_teacher_is_404() {
    let app = app().await;
    let (status, error) = send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(9, 1, "MONDAY", "08:00:00", "09:00:00"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Teacher not found with id: 9");
}

#[tokio::test]
async fn test_update_and_delete_flow() {
    let app = app().await;
    send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 1, "MONDAY", "08:00:00", "09:00:00"),
        ),
    )
    .await;
    send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(2, 2, "MONDAY", "10:00:00", "11:00:00"),
        ),
    )
    .await;

    let (status, check) = send(
        &app,
        with_json(
            "POST",
            "/v1/schedules/1/check-conflicts",
            json!({ "class_room_id": 2, "start_time": "10:30:00", "end_time": "11:30:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["has_conflicts"], true);
    assert_eq!(check["conflicts"][0]["kind"], "CLASSROOM_CONFLICT");

    let (status, _) = send(
        &app,
        with_json(
            "PUT",
            "/v1/schedules/1",
            json!({ "class_room_id": 2, "start_time": "10:30:00", "end_time": "11:30:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, moved) = send(
        &app,
        with_json(
            "PUT",
            "/v1/schedules/1",
            json!({ "start_time": "08:30:00", "end_time": "09:30:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["schedule"]["range"]["start"], "08:30:00");

    let (status, deleted) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/v1/schedules/1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["is_active"], false);

    let (status, fetched) = send(&app, get("/v1/schedules/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["is_active"], false);

    let (_, listed) = send(&app, get(&format!("/v1/teachers/1/schedules?{}", TERM))).await;
    assert_eq!(listed["total"], 0);
}

#[tokio::test]
async fn test_bulk_all_or_nothing_is_422_and_stores_nothing() {
    let app = app().await;
    let body = json!({
        "schedules": [
            schedule_body(1, 1, "MONDAY", "08:00:00", "09:00:00"),
            schedule_body(1, 2, "MONDAY", "08:30:00", "09:30:00")
        ]
    });
    let (status, error) = send(&app, with_json("POST", "/v1/schedules/bulk", body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error["code"], "BULK_ABORTED");
    let details: Value = serde_json::from_str(error["details"].as_str().unwrap()).unwrap();
    assert_eq!(details.as_array().unwrap().len(), 1);
    assert_eq!(details[0]["kind"], "TEACHER_CONFLICT");
    assert_eq!(details[0]["existing_schedule_id"], -1);

    let (status, page) = send(&app, get("/v1/schedules")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 0);
}

#[tokio::test]
async fn test_bulk_per_item_reports_each_result() {
    let app = app().await;
    let body = json!({
        "stop_on_first_error": false,
        "schedules": [
            schedule_body(1, 1, "MONDAY", "08:00:00", "09:00:00"),
            schedule_body(1, 2, "MONDAY", "08:30:00", "09:30:00"),
            schedule_body(2, 2, "TUESDAY", "08:00:00", "09:00:00")
        ]
    });
    let (status, outcome) = send(&app, with_json("POST", "/v1/schedules/bulk", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["total"], 3);
    assert_eq!(outcome["succeeded"], 2);
    assert_eq!(outcome["failed"], 1);
    assert_eq!(outcome["results"][1]["index"], 1);
    assert!(outcome["results"][1]["error"]
        .as_str()
        .unwrap()
        .starts_with("Error creating schedule 2:"));
}

#[tokio::test]
async fn test_search_filters_and_pages() {
    let app = app().await;
    for (day, teacher) in [("MONDAY", 1), ("TUESDAY", 1), ("WEDNESDAY", 2)] {
        send(
            &app,
            with_json(
                "POST",
                "/v1/schedules",
                schedule_body(teacher, teacher, day, "08:00:00", "09:00:00"),
            ),
        )
        .await;
    }

    let (status, page) = send(&app, get("/v1/schedules?teacher_id=1&page=0&size=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total_elements"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["content"][0]["range"]["day_of_week"], "MONDAY");

    let (_, page) = send(&app, get("/v1/schedules?day_of_week=WEDNESDAY")).await;
    assert_eq!(page["total_elements"], 1);
    assert_eq!(page["content"][0]["teacher_id"], 2);
}

#[tokio::test]
async fn test_teacher_timetable_endpoint() {
    let app = app().await;
    send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 1, "MONDAY", "10:00:00", "11:30:00"),
        ),
    )
    .await;
    send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 2, "MONDAY", "08:00:00", "09:00:00"),
        ),
    )
    .await;

    let (status, timetable) =
        send(&app, get(&format!("/v1/teachers/1/timetable?{}", TERM))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timetable["title"], "Teacher Timetable");
    assert_eq!(timetable["entity_name"], "Jane Doe");
    assert_eq!(timetable["entity_code"], "jdoe");

    let monday = timetable["weekly_schedule"]["MONDAY"].as_array().unwrap();
    assert_eq!(monday.len(), 2);
    assert_eq!(monday[0]["time_range"], "08:00 - 09:00");
    assert_eq!(monday[1]["class_room_name"], "Room 101");
    assert_eq!(timetable["statistics"]["total_minutes"], 150);
    assert_eq!(timetable["statistics"]["busiest_day"], "MONDAY");
}

#[tokio::test]
async fn test_availability_and_free_period_endpoints() {
    let app = app().await;
    send(
        &app,
        with_json(
            "POST",
            "/v1/schedules",
            schedule_body(1, 1, "MONDAY", "08:00:00", "09:00:00"),
        ),
    )
    .await;

    let (status, availability) = send(
        &app,
        get(&format!(
            "/v1/class-rooms/1/availability?{}&day_of_week=MONDAY&start_time=08:30:00&end_time=09:30:00",
            TERM
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["is_available"], false);
    assert_eq!(availability["conflicting_schedules"][0]["id"], 1);

    let (status, free) = send(
        &app,
        get(&format!(
            "/v1/teachers/1/free-periods?{}&day_of_week=MONDAY",
            TERM
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(free["total_free_minutes"], 540);
    assert_eq!(free["periods"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_bad_term_in_query_is_400() {
    let app = app().await;
    let (status, error) = send(
        &app,
        get("/v1/class-rooms/1/timetable?academic_year=2024/2025&semester=3"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["message"], "Semester must be 1 or 2");
}

#[tokio::test]
async fn test_directory_endpoints() {
    let app = app().await;

    let (status, teacher) = send(
        &app,
        with_json(
            "POST",
            "/v1/teachers",
            json!({ "first_name": "Ada", "last_name": "Lovelace", "username": "alovelace" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(teacher["id"], 3);

    let (status, fetched) = send(&app, get("/v1/teachers/3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["username"], "alovelace");

    let (status, subjects) = send(&app, get("/v1/subjects")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subjects.as_array().map(Vec::len), Some(2));

    let (status, error) = send(&app, get("/v1/subjects/12")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["message"], "Subject not found with id: 12");
}
