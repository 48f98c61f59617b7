use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{auth, health, sessions, uploads, workouts};
use crate::middleware::require_auth;
use crate::uploads::{MAX_UPLOAD_BYTES, UPLOAD_URL_PREFIX};

/// Request bodies may carry one max-size file plus multipart framing.
const MAX_BODY_BYTES: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

pub fn create_router(
    sessions_state: sessions::SessionsState,
    uploads_state: uploads::UploadsState,
    auth_state: auth::AuthState,
    workouts_state: workouts::WorkoutsState,
    health_state: health::HealthState,
    upload_dir: &Path,
) -> Router {
    // Everything here sits behind the bearer-token check
    let protected = Router::new()
        .route("/api/logout", post(auth::logout))
        .with_state(auth_state.clone())
        .route(
            "/api/workouts",
            get(workouts::list).post(workouts::create),
        )
        .route(
            "/api/workouts/session/{title}",
            delete(workouts::delete_session),
        )
        .route(
            "/api/workouts/{key}",
            get(workouts::session_workouts).delete(workouts::delete),
        )
        .with_state(workouts_state)
        .route_layer(middleware::from_fn_with_state(
            auth_state.clone(),
            require_auth,
        ));

    Router::new()
        // Form flow
        .route("/", get(sessions::index).post(sessions::add_workout))
        .route("/start-workout/{title}", get(sessions::start_workout))
        .route(
            "/workout-session/{title}",
            get(sessions::show).post(sessions::attach_file),
        )
        .route("/delete-session/{title}", post(sessions::delete_session))
        .route(
            "/delete-workout/{title}/{index}",
            post(sessions::delete_workout),
        )
        .route(
            "/delete-exercise/{title}/{index}",
            post(sessions::delete_workout),
        )
        .with_state(sessions_state)
        // Uploads
        .route(
            "/upload",
            get(uploads::upload_page).post(uploads::upload_file),
        )
        .with_state(uploads_state)
        // Public API
        .route("/api", get(auth::welcome))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/check-session", get(auth::check_session))
        .with_state(auth_state)
        .route("/health", get(health::health_check))
        .with_state(health_state)
        .merge(protected)
        .nest_service(UPLOAD_URL_PREFIX, ServeDir::new(upload_dir))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
