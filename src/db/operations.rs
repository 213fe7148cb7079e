use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{DocumentStore, UserStore};
use crate::models::*;
use crate::types::{AppError, AppResult};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed document and user persistence.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert(&self, doc: NewDocument) -> AppResult<Document> {
        let row = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (id, title, description, file_name, file_path, file_type, file_size, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(doc.id)
        .bind(&doc.title)
        .bind(&doc.description)
        .bind(&doc.file_name)
        .bind(&doc.file_path)
        .bind(&doc.file_type)
        .bind(doc.file_size)
        .bind(doc.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(doc)
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(docs)
    }

    async fn find_all(&self) -> AppResult<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>("SELECT * FROM documents ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(docs)
    }

    async fn find_by_status(&self, status: ProcessingStatus) -> AppResult<Vec<Document>> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE processing_status = $1 ORDER BY created_at ASC",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(docs)
    }

    async fn update(&self, id: Uuid, patch: &DocumentPatch) -> AppResult<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.title)
        .bind(&patch.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn claim_for_processing(&self, id: Uuid) -> AppResult<Option<Document>> {
        let doc = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET processing_status = 'PROCESSING', updated_at = NOW()
            WHERE id = $1 AND processing_status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }

    async fn finish_processing(
        &self,
        id: Uuid,
        outcome: &ProcessingOutcome,
    ) -> AppResult<Option<Document>> {
        let (content, error) = match outcome {
            ProcessingOutcome::Completed(content) => (Some(content.clone()), None),
            ProcessingOutcome::Failed(message) => (None, Some(message.clone())),
        };

        let doc = sqlx::query_as::<_, Document>(
            r#"
            UPDATE documents
            SET processing_status = $2,
                content = $3,
                error = $4,
                processed_at = NOW(),
                updated_at = NOW()
            WHERE id = $1 AND processing_status = 'PROCESSING'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(outcome.status())
        .bind(content)
        .bind(error)
        .fetch_optional(&self.pool)
        .await?;

        Ok(doc)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some(UNIQUE_VIOLATION) => Err(
                AppError::Conflict("User with this email already exists".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn set_user_role(&self, email: &str, role: Role) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE email = $1 RETURNING *",
        )
        .bind(email)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
