use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workout_tracker::config::{Config, StorageBackend};
use workout_tracker::handlers::{auth, health, sessions, uploads, workouts};
use workout_tracker::migrations::run_migrations;
use workout_tracker::repositories::{RevokedTokenRepository, UserRepository, WorkoutRepository};
use workout_tracker::store::{MemoryWorkoutStore, WorkoutStore};
use workout_tracker::token::TokenService;
use workout_tracker::uploads::UploadStore;
use workout_tracker::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workout_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Connecting to database: {}", config.database_url);

    // Create database pool
    let pool = db::create_pool(&config.database_url)?;

    // Run migrations
    run_migrations(&pool)?;

    // Create repositories
    let user_repo = UserRepository::new(pool.clone());
    let token_repo = RevokedTokenRepository::new(pool.clone());
    let purged = token_repo.cleanup_expired().await?;
    tracing::debug!("Purged {} expired token revocations", purged);

    let store: Arc<dyn WorkoutStore> = match config.storage {
        StorageBackend::Sqlite => Arc::new(WorkoutRepository::new(pool.clone())),
        StorageBackend::Memory => Arc::new(MemoryWorkoutStore::new()),
    };
    tracing::info!("Workouts stored in {} backend", config.storage.as_str());

    let upload_store = UploadStore::new(&config.upload_dir);
    upload_store.ensure_dir().await?;

    // Create handler states
    let sessions_state = sessions::SessionsState {
        store: store.clone(),
        uploads: upload_store.clone(),
    };
    let uploads_state = uploads::UploadsState {
        uploads: upload_store.clone(),
    };
    let auth_state = auth::AuthState {
        user_repo,
        token_repo,
        tokens: TokenService::new(&config.jwt_secret, config.jwt_expiry_seconds),
    };
    let workouts_state = workouts::WorkoutsState { store };
    let health_state = health::HealthState {
        storage: config.storage,
    };

    // Build router
    let app = routes::create_router(
        sessions_state,
        uploads_state,
        auth_state,
        workouts_state,
        health_state,
        upload_store.dir(),
    );

    // Start server
    let addr = config.server_addr();
    tracing::info!("Starting server at http://{}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
