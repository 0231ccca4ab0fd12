// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, analytics, quiz, score},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Every route requires a bearer token; `/api/admin` additionally requires the admin role.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/{id}/availability", get(quiz::availability))
        .route("/{id}/questions", get(quiz::list_questions))
        .route("/{id}/submit", post(quiz::submit_quiz))
        .route("/{id}/timeout", post(quiz::timeout_quiz));

    let admin_routes = Router::new()
        .route("/quizzes", post(admin::create_quiz))
        .route("/quizzes/{id}/questions", post(admin::create_question))
        .route("/quizzes/{id}/stats", get(analytics::quiz_stats))
        .route("/summary", get(analytics::admin_summary))
        .route("/scores/{id}/comments", post(admin::add_comment))
        .route("/comments/{id}", delete(admin::delete_comment))
        .layer(middleware::from_fn(admin_middleware));

    let api = Router::new()
        .nest("/api/quizzes", quiz_routes)
        .route("/api/scores", get(score::list_my_scores))
        .route("/api/scores/{id}", get(score::get_score))
        .route("/api/analytics/me", get(analytics::my_summary))
        .nest("/api/admin", admin_routes)
        // Auth runs before the admin check nested inside.
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Global Middleware (listed from outside in). Cors must wrap the router
    // directly: its inner body has to implement `Default`.
    api.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
    .with_state(state)
}
