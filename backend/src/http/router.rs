//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Bulk requests carry many schedules; everything else is small.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Schedules
        .route(
            "/schedules",
            get(handlers::search_schedules).post(handlers::create_schedule),
        )
        .route("/schedules/bulk", post(handlers::bulk_create_schedules))
        .route("/schedules/check-conflicts", post(handlers::check_conflicts))
        .route("/schedules/validate", post(handlers::validate_schedule))
        .route("/schedules/conflicts", get(handlers::detect_conflicts))
        .route(
            "/schedules/{id}",
            get(handlers::get_schedule)
                .put(handlers::update_schedule)
                .delete(handlers::delete_schedule),
        )
        .route(
            "/schedules/{id}/check-conflicts",
            post(handlers::check_update_conflicts),
        )
        .route("/schedules/{id}/validate", post(handlers::validate_update))
        // Class rooms
        .route(
            "/class-rooms",
            get(handlers::list_class_rooms).post(handlers::create_class_room),
        )
        .route("/class-rooms/{id}", get(handlers::get_class_room))
        .route("/class-rooms/{id}/schedules", get(handlers::class_room_schedules))
        .route("/class-rooms/{id}/timetable", get(handlers::class_room_timetable))
        .route(
            "/class-rooms/{id}/availability",
            get(handlers::class_room_availability),
        )
        .route(
            "/class-rooms/{id}/free-periods",
            get(handlers::class_room_free_periods),
        )
        // Teachers
        .route(
            "/teachers",
            get(handlers::list_teachers).post(handlers::create_teacher),
        )
        .route("/teachers/{id}", get(handlers::get_teacher))
        .route("/teachers/{id}/schedules", get(handlers::teacher_schedules))
        .route("/teachers/{id}/timetable", get(handlers::teacher_timetable))
        .route(
            "/teachers/{id}/availability",
            get(handlers::teacher_availability),
        )
        .route(
            "/teachers/{id}/free-periods",
            get(handlers::teacher_free_periods),
        )
        // Subjects
        .route(
            "/subjects",
            get(handlers::list_subjects).post(handlers::create_subject),
        )
        .route("/subjects/{id}", get(handlers::get_subject))
        .route("/subjects/{id}/schedules", get(handlers::subject_schedules))
        .route("/subjects/{id}/timetable", get(handlers::subject_timetable));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::db::repositories::LocalRepository;
    use crate::db::repository::FullRepository;

    fn app() -> Router {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
        create_router(AppState::new(repo))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"], "connected");
    }

    #[tokio::test]
    async fn test_unknown_schedule_is_404_with_error_body() {
        let request = Request::builder()
            .uri("/v1/schedules/41")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "Schedule not found with id: 41");
    }

    #[tokio::test]
    async fn test_create_class_room_then_list() {
        let app = app();
        let (status, created) = send(
            app.clone(),
            post_json(
                "/v1/class-rooms",
                serde_json::json!({ "name": "Room 101", "code": "R101" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);

        let request = Request::builder()
            .uri("/v1/class-rooms")
            .body(Body::empty())
            .unwrap();
        let (status, listed) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_validate_endpoint_reports_short_session() {
        let body = serde_json::json!({
            "class_room_id": 1,
            "subject_id": 1,
            "teacher_id": 1,
            "day_of_week": "MONDAY",
            "start_time": "08:00:00",
            "end_time": "08:15:00",
            "academic_year": "2024/2025",
            "semester": 1
        });
        let (status, report) = send(app(), post_json("/v1/schedules/validate", body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["is_valid"], false);
        assert_eq!(report["duration_minutes"], 15);
    }
}
