use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DocumentStore, UserStore};
use crate::models::*;
use crate::types::{AppError, AppResult};

/// In-process store used when no database is configured.
///
/// Every status transition happens under the write lock, so the
/// compare-and-set semantics match the conditional updates of `PgStore`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut docs: Vec<Document>) -> Vec<Document> {
    docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    docs
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, doc: NewDocument) -> AppResult<Document> {
        let now = Utc::now();
        let record = Document {
            id: doc.id,
            title: doc.title,
            description: doc.description,
            file_name: doc.file_name,
            file_path: doc.file_path,
            file_type: doc.file_type,
            file_size: doc.file_size,
            processing_status: ProcessingStatus::Pending,
            content: None,
            error: None,
            user_id: doc.user_id,
            created_at: now,
            updated_at: now,
            processed_at: None,
        };

        let mut guard = self.documents.write().await;
        if guard.contains_key(&record.id) {
            return Err(AppError::Conflict(format!("Document {} already exists", record.id)));
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Document>> {
        let guard = self.documents.read().await;
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<Document>> {
        let guard = self.documents.read().await;
        let docs = guard
            .values()
            .filter(|doc| doc.user_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(docs))
    }

    async fn find_all(&self) -> AppResult<Vec<Document>> {
        let guard = self.documents.read().await;
        Ok(newest_first(guard.values().cloned().collect()))
    }

    async fn find_by_status(&self, status: ProcessingStatus) -> AppResult<Vec<Document>> {
        let guard = self.documents.read().await;
        let mut docs: Vec<Document> = guard
            .values()
            .filter(|doc| doc.processing_status == status)
            .cloned()
            .collect();
        docs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(docs)
    }

    async fn update(&self, id: Uuid, patch: &DocumentPatch) -> AppResult<Option<Document>> {
        let mut guard = self.documents.write().await;
        let Some(doc) = guard.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            doc.title = title.clone();
        }
        if let Some(description) = &patch.description {
            doc.description = Some(description.clone());
        }
        doc.updated_at = Utc::now();
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut guard = self.documents.write().await;
        Ok(guard.remove(&id).is_some())
    }

    async fn claim_for_processing(&self, id: Uuid) -> AppResult<Option<Document>> {
        let mut guard = self.documents.write().await;
        match guard.get_mut(&id) {
            Some(doc) if doc.processing_status.can_transition_to(ProcessingStatus::Processing) => {
                doc.processing_status = ProcessingStatus::Processing;
                doc.updated_at = Utc::now();
                Ok(Some(doc.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn finish_processing(
        &self,
        id: Uuid,
        outcome: &ProcessingOutcome,
    ) -> AppResult<Option<Document>> {
        let mut guard = self.documents.write().await;
        let doc = match guard.get_mut(&id) {
            Some(doc) if doc.processing_status.can_transition_to(outcome.status()) => doc,
            _ => return Ok(None),
        };

        let now = Utc::now();
        doc.processing_status = outcome.status();
        match outcome {
            ProcessingOutcome::Completed(content) => {
                doc.content = Some(content.clone());
                doc.error = None;
            }
            ProcessingOutcome::Failed(message) => {
                doc.content = None;
                doc.error = Some(message.clone());
            }
        }
        doc.processed_at = Some(now);
        doc.updated_at = now;
        Ok(Some(doc.clone()))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut guard = self.users.write().await;
        if guard.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let record = User {
            id: user.id,
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let guard = self.users.read().await;
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let guard = self.users.read().await;
        Ok(guard.get(&id).cloned())
    }

    async fn find_users_by_ids(&self, ids: &[Uuid]) -> AppResult<Vec<User>> {
        let guard = self.users.read().await;
        Ok(ids.iter().filter_map(|id| guard.get(id).cloned()).collect())
    }

    async fn set_user_role(&self, email: &str, role: Role) -> AppResult<Option<User>> {
        let mut guard = self.users.write().await;
        let Some(user) = guard.values_mut().find(|user| user.email == email) else {
            return Ok(None);
        };
        user.role = role;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}
