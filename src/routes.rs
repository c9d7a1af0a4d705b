// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{
        admin, analytics, assignments, attempts, auth, notify, question_sets, registration,
        schedule, upload,
    },
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, exam-taking, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool + Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/identities", post(auth::create_identity))
        .route("/login", post(auth::login))
        .route("/register-team", post(registration::register_team))
        // Protected
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    // Participant-facing exam routes; any authenticated identity, the
    // handlers themselves require a participant record.
    let exam_routes = Router::new()
        .route("/", get(attempts::list_my_exams))
        .route("/{id}/questions", get(attempts::exam_questions))
        .route("/{id}/start", post(attempts::start_attempt))
        .route("/{id}/submit", post(attempts::submit_attempt))
        .route("/{id}/result", get(attempts::my_result))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/stats", get(analytics::stats))
        .route("/analytics", get(analytics::exam_analytics))
        .route("/analytics/distribution", get(analytics::distribution))
        .route("/analytics/difficulty", get(analytics::question_difficulty))
        .route("/analytics/trends", get(analytics::trends))
        .route(
            "/analytics/participants",
            get(analytics::participant_performance),
        )
        .route("/exams", get(admin::list_exams).post(admin::create_exam))
        .route(
            "/exams/{id}",
            get(admin::get_exam)
                .put(admin::update_exam)
                .delete(admin::delete_exam),
        )
        .route(
            "/exams/{id}/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .route(
            "/exams/{id}/participants",
            get(assignments::list_assignments)
                .post(assignments::assign_participants)
                .delete(assignments::unassign_participants),
        )
        .route("/participants", get(admin::list_participants))
        .route("/teams", get(admin::list_teams))
        .route("/users/{id}/role", put(admin::update_user_role))
        .route(
            "/question-sets",
            get(question_sets::list_question_sets).post(question_sets::create_question_set),
        )
        .route("/schedule/conflicts", post(schedule::check_conflicts))
        .route("/schedule/calendar-feed", get(schedule::calendar_feed))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Relays mail through the provider credentials, so it is admin-gated
    // like the rest of the admin surface.
    let notification_routes = Router::new()
        .route(
            "/send-authority-notification",
            post(notify::send_authority_notification),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Participant-facing: any authenticated identity may set its own photo.
    let upload_routes = Router::new()
        .route(
            "/upload/profile-photo",
            post(upload::profile_photo).layer(DefaultBodyLimit::max(6 * 1024 * 1024)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api", notification_routes)
        .nest("/api", upload_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
