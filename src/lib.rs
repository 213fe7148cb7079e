// Docflow - document management service with asynchronous text extraction

pub mod auth;
pub mod config;
pub mod db;
pub mod extraction;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod routes;
pub mod storage;
pub mod types;
pub mod utils;

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::AuthService;
use crate::db::{DocumentStore, MemoryStore, PgStore, UserStore};
use crate::extraction::DefaultExtractor;
use crate::lifecycle::LifecycleManager;
use crate::queue::{ProcessingQueue, Worker};
use crate::storage::LocalFileStore;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}

/// Wires the stores, upload storage, queue and services into an `AppState`.
///
/// The returned worker owns the receiving end of the queue and must be
/// spawned for uploads to get processed.
pub fn assemble(
    config: Config,
    documents: Arc<dyn DocumentStore>,
    users: Arc<dyn UserStore>,
    database: Option<PgPool>,
) -> (AppState, Worker) {
    let files = Arc::new(LocalFileStore::new(&config.storage.upload_dir));
    let (queue, receiver) = ProcessingQueue::new();

    let lifecycle = Arc::new(LifecycleManager::new(
        documents,
        files,
        Arc::new(DefaultExtractor),
        config.storage.max_upload_size,
        queue,
    ));
    let auth = Arc::new(AuthService::new(users, config.auth.clone()));
    let worker = Worker::new(
        Arc::clone(&lifecycle),
        receiver,
        config.processing.concurrency,
    );

    let state = AppState {
        config,
        lifecycle,
        auth,
        database,
    };
    (state, worker)
}

/// Connects to PostgreSQL when `DATABASE_URL` is set, otherwise keeps all
/// records in memory.
pub async fn bootstrap(config: Config) -> anyhow::Result<(AppState, Worker)> {
    if config.database.url.is_none() {
        warn!("DATABASE_URL is not set; records are kept in memory and lost on restart");
        let store = Arc::new(MemoryStore::new());
        return Ok(assemble(config, store.clone(), store, None));
    }

    let pool = db::create_pool(&config.database).await?;
    info!("Connected to database");
    db::run_migrations(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    Ok(assemble(config, store.clone(), store, Some(pool)))
}
