// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assessment, attempt},
    state::AppState,
    store::Store,
    utils::jwt::{auth_middleware, author_middleware, student_middleware},
};

/// Assembles the main application router.
///
/// * Author routes under `/api/assessments` (teacher, admin, super admin).
/// * Student routes under `/api/student/assessments`.
/// * Both groups sit behind bearer-token authentication; CORS and tracing are global.
pub fn create_router<S: Store>(state: AppState<S>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let author_routes = Router::new()
        .route(
            "/",
            get(assessment::list_assessments::<S>).post(assessment::create_assessment::<S>),
        )
        .route("/{id}", get(assessment::get_assessment::<S>))
        .route("/{id}/questions", post(assessment::add_question::<S>))
        .route("/{id}/publish", post(assessment::publish::<S>))
        .route("/{id}/close", post(assessment::close::<S>))
        .route("/{id}/students", get(assessment::list_students::<S>))
        // Auth runs first (outermost), then the role check
        .layer(middleware::from_fn(author_middleware))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    let student_routes = Router::new()
        .route("/", get(attempt::list_my_assessments::<S>))
        .route("/{id}", get(attempt::view_assessment::<S>))
        .route("/{id}/start", post(attempt::start::<S>))
        .route("/{id}/submit", post(attempt::submit::<S>))
        .route("/{id}/result", get(attempt::result::<S>))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/assessments", author_routes)
        .nest("/api/student/assessments", student_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::Config, store::MemoryStore, utils::clock::SystemClock};

    fn app() -> Router {
        let config = Config {
            database_url: String::new(),
            jwt_secret: "secret".to_string(),
            rust_log: "error".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            max_connections: 1,
            log_dir: "logs".to_string(),
        };
        create_router(AppState::new(MemoryStore::new(), Arc::new(SystemClock), config))
    }

    #[tokio::test]
    async fn test_author_routes_require_token() {
        let response = app()
            .oneshot(Request::get("/api/assessments").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_student_routes_require_token() {
        let response = app()
            .oneshot(
                Request::post("/api/student/assessments/1/start")
                    .header(header::AUTHORIZATION, "Basic abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
