#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use workout_tracker::config::StorageBackend;
use workout_tracker::db::{create_memory_pool, DbPool};
use workout_tracker::handlers::{auth, health, sessions, uploads, workouts};
use workout_tracker::migrations::run_migrations_for_tests;
use workout_tracker::repositories::{RevokedTokenRepository, UserRepository, WorkoutRepository};
use workout_tracker::store::{MemoryWorkoutStore, WorkoutStore};
use workout_tracker::token::TokenService;
use workout_tracker::uploads::UploadStore;

pub const TEST_SECRET: &[u8] = b"integration-test-secret";

pub fn setup_test_db() -> DbPool {
    let pool = create_memory_pool().expect("Failed to create test database");
    run_migrations_for_tests(&pool).expect("Failed to run migrations");
    pool
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub fn create_test_app(pool: DbPool) -> TestApp {
    let store: Arc<dyn WorkoutStore> = Arc::new(WorkoutRepository::new(pool.clone()));
    build_app(pool, store, StorageBackend::Sqlite)
}

pub fn create_memory_test_app(pool: DbPool) -> TestApp {
    let store: Arc<dyn WorkoutStore> = Arc::new(MemoryWorkoutStore::new());
    build_app(pool, store, StorageBackend::Memory)
}

fn build_app(pool: DbPool, store: Arc<dyn WorkoutStore>, storage: StorageBackend) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
    let upload_store = UploadStore::new(upload_dir.path());

    let sessions_state = sessions::SessionsState {
        store: store.clone(),
        uploads: upload_store.clone(),
    };
    let uploads_state = uploads::UploadsState {
        uploads: upload_store.clone(),
    };
    let auth_state = auth::AuthState {
        user_repo: UserRepository::new(pool.clone()),
        token_repo: RevokedTokenRepository::new(pool.clone()),
        tokens: TokenService::new(TEST_SECRET, 900),
    };
    let workouts_state = workouts::WorkoutsState { store };
    let health_state = health::HealthState { storage };

    let router = workout_tracker::routes::create_router(
        sessions_state,
        uploads_state,
        auth_state,
        workouts_state,
        health_state,
        upload_store.dir(),
    );

    TestApp {
        router,
        pool,
        upload_dir,
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).expect("response body is not JSON")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn authed(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub const BOUNDARY: &str = "----workout-tracker-test-boundary";

/// A multipart body with a single `file` part.
pub fn multipart_upload(uri: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// A multipart body with only a text field and no file part.
pub fn multipart_without_file(uri: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
        b = BOUNDARY
    );

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Register through the API and return the issued token.
pub async fn register_user(app: &TestApp, username: &str, password: &str) -> String {
    let response = app
        .send(json_request(
            "POST",
            "/api/register",
            None,
            serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": password,
            }),
        ))
        .await;
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "registration failed"
    );
    body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string()
}
