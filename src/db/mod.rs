use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::warn;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{
    Document, DocumentPatch, NewDocument, NewUser, ProcessingOutcome, ProcessingStatus, Role, User,
};
use crate::types::AppResult;
use crate::utils::with_retry;

pub use memory::*;
pub use operations::*;
pub use pool::*;

pub mod memory;
pub mod operations;
pub mod pool;

/// Persistence of document metadata.
///
/// Status changes go through `claim_for_processing` and `finish_processing`,
/// which only apply when the stored status allows the transition. That keeps
/// concurrent triggers for the same id from processing it twice.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, doc: NewDocument) -> AppResult<Document>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>>;

    /// Newest first.
    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Document>>;

    /// Newest first.
    async fn find_all(&self) -> AppResult<Vec<Document>>;

    async fn find_by_status(&self, status: ProcessingStatus) -> AppResult<Vec<Document>>;

    /// Applies title/description changes. Returns `None` if the row is gone.
    async fn update(&self, id: Uuid, patch: &DocumentPatch) -> AppResult<Option<Document>>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// PENDING -> PROCESSING. Returns `None` unless this call made the move.
    async fn claim_for_processing(&self, id: Uuid) -> AppResult<Option<Document>>;

    /// PROCESSING -> COMPLETED | FAILED. Returns `None` unless this call made the move.
    async fn finish_processing(
        &self,
        id: Uuid,
        outcome: &ProcessingOutcome,
    ) -> AppResult<Option<Document>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Unknown ids are skipped.
    async fn find_users_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>>;

    async fn set_user_role(&self, email: &str, role: Role) -> AppResult<Option<User>>;
}

pub async fn create_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let url = config
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not configured"))?;

    let pool = with_retry(
        || async move {
            PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .connect(url)
                .await
                .inspect_err(|e| warn!("Database connection attempt failed: {}", e))
        },
        config.connect_retries + 1,
    )
    .await?;

    // Test connection
    health_check(&pool).await?;

    Ok(pool)
}
