//! Document lifecycle
//!
//! `LifecycleManager` owns the path from an upload to a terminal processing
//! state: it stores the bytes, inserts the PENDING record, hands the id to the
//! processing queue and later records the extraction outcome. Every read or
//! mutation on behalf of a caller goes through the ownership check in
//! [`access`].

pub mod access;

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::DocumentStore;
use crate::extraction::{ExtractedContent, ExtractionError, Extractor, FileKind};
use crate::models::{
    Caller, Document, DocumentPatch, NewDocument, ProcessingOutcome, ProcessingStatus,
    UploadMetadata,
};
use crate::queue::ProcessingQueue;
use crate::storage::{generate_key, FileStore};
use crate::types::{AppError, AppResult};

use access::Access;

pub const INTERRUPTED_ERROR: &str = "processing interrupted";

const GENERIC_MIME: &str = "application/octet-stream";

/// Result of the startup reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Documents found PROCESSING and moved to FAILED.
    pub failed: usize,
    /// Documents found PENDING and put back on the queue.
    pub requeued: usize,
}

pub struct LifecycleManager {
    documents: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
    extractor: Arc<dyn Extractor>,
    max_upload_size: u64,
    queue: ProcessingQueue,
}

impl LifecycleManager {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
        extractor: Arc<dyn Extractor>,
        max_upload_size: u64,
        queue: ProcessingQueue,
    ) -> Self {
        Self {
            documents,
            files,
            extractor,
            max_upload_size,
            queue,
        }
    }

    pub fn max_upload_size(&self) -> u64 {
        self.max_upload_size
    }

    /// Stores an upload and returns the PENDING record.
    ///
    /// Processing is queued but not awaited; a queueing failure is logged and
    /// the document stays PENDING until the next recovery pass.
    pub async fn create_document(
        &self,
        caller: &Caller,
        metadata: UploadMetadata,
        data: Bytes,
    ) -> AppResult<Document> {
        let file_name = metadata.file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::Validation("File name is required".to_string()));
        }
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".to_string()));
        }
        if data.len() as u64 > self.max_upload_size {
            return Err(AppError::Validation(format!(
                "File exceeds the maximum size of {} bytes",
                self.max_upload_size
            )));
        }

        let key = generate_key(file_name);
        let file_path = self.files.save(&key, &data).await?;

        let title = metadata
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or(file_name)
            .to_string();
        let description = metadata
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let new_doc = NewDocument {
            id: Uuid::new_v4(),
            title,
            description,
            file_name: file_name.to_string(),
            file_path: file_path.clone(),
            file_type: resolve_file_type(metadata.file_type.as_deref(), file_name),
            file_size: data.len() as i64,
            user_id: caller.id,
        };

        let doc = match self.documents.insert(new_doc).await {
            Ok(doc) => doc,
            Err(e) => {
                if let Err(cleanup) = self.files.delete(&file_path).await {
                    warn!(path = %file_path, "Failed to remove orphaned upload: {}", cleanup);
                }
                return Err(e);
            }
        };

        info!(
            document_id = %doc.id,
            user_id = %caller.id,
            file_size = doc.file_size,
            "Document uploaded"
        );
        self.schedule(doc.id);

        Ok(doc)
    }

    /// Runs extraction for a PENDING document and records the outcome.
    ///
    /// Does nothing unless this call wins the PENDING -> PROCESSING claim, so
    /// duplicate triggers for the same id are harmless. Failures end up on the
    /// record, never in the return value.
    pub async fn process_document(&self, id: Uuid) {
        let doc = match self.documents.claim_for_processing(id).await {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(document_id = %id, "Document is not pending, skipping");
                return;
            }
            Err(e) => {
                error!(document_id = %id, "Failed to claim document: {}", e);
                return;
            }
        };

        info!(document_id = %id, "Processing document");
        let outcome = match self.extract(&doc).await {
            Ok(content) => ProcessingOutcome::Completed(content.into_json()),
            Err(e) => {
                warn!(document_id = %id, "Extraction failed: {}", e);
                ProcessingOutcome::Failed(e.to_string())
            }
        };

        match self.documents.finish_processing(id, &outcome).await {
            Ok(Some(doc)) => {
                info!(document_id = %id, status = %doc.processing_status, "Processing finished")
            }
            Ok(None) => warn!(document_id = %id, "Document was removed during processing"),
            Err(e) => error!(document_id = %id, "Failed to record processing outcome: {}", e),
        }
    }

    async fn extract(&self, doc: &Document) -> Result<ExtractedContent, ExtractionError> {
        let kind = FileKind::detect(&doc.file_path)?;
        let data = self.files.read(&doc.file_path).await?;

        let extractor = Arc::clone(&self.extractor);
        tokio::task::spawn_blocking(move || extractor.extract(&data, kind))
            .await
            .map_err(|e| ExtractionError::Task(e.to_string()))?
    }

    pub async fn get_document(&self, id: Uuid, caller: &Caller) -> AppResult<Document> {
        let doc = self
            .documents
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        match access::check(caller, doc.user_id) {
            Access::Allow => Ok(doc),
            Access::Deny => {
                warn!(document_id = %id, user_id = %caller.id, "Access denied");
                Err(AppError::Forbidden(
                    "You do not have permission to access this document".to_string(),
                ))
            }
        }
    }

    /// Admins see every document, everyone else only their own. Newest first.
    pub async fn list_documents(&self, caller: &Caller) -> AppResult<Vec<Document>> {
        if caller.is_admin() {
            self.documents.find_all().await
        } else {
            self.documents.find_by_owner(caller.id).await
        }
    }

    pub async fn update_metadata(
        &self,
        id: Uuid,
        caller: &Caller,
        patch: DocumentPatch,
    ) -> AppResult<Document> {
        if patch.is_empty() {
            return Err(AppError::Validation("No changes provided".to_string()));
        }
        let patch = DocumentPatch {
            title: match patch.title {
                Some(title) if title.trim().is_empty() => {
                    return Err(AppError::Validation("Title cannot be empty".to_string()))
                }
                Some(title) => Some(title.trim().to_string()),
                None => None,
            },
            description: patch.description.map(|d| d.trim().to_string()),
        };

        self.get_document(id, caller).await?;
        let doc = self
            .documents
            .update(id, &patch)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        info!(document_id = %id, user_id = %caller.id, "Document updated");
        Ok(doc)
    }

    /// Removes the record and, best effort, the stored file.
    pub async fn delete_document(&self, id: Uuid, caller: &Caller) -> AppResult<()> {
        let doc = self.get_document(id, caller).await?;

        match self.files.delete(&doc.file_path).await {
            Ok(true) => debug!(document_id = %id, path = %doc.file_path, "Removed stored file"),
            Ok(false) => warn!(document_id = %id, path = %doc.file_path, "Stored file was already gone"),
            Err(e) => error!(document_id = %id, path = %doc.file_path, "Failed to remove stored file: {}", e),
        }

        if !self.documents.delete(id).await? {
            return Err(AppError::NotFound("Document not found".to_string()));
        }

        info!(document_id = %id, user_id = %caller.id, "Document deleted");
        Ok(())
    }

    pub async fn read_file(&self, id: Uuid, caller: &Caller) -> AppResult<(Document, Vec<u8>)> {
        let doc = self.get_document(id, caller).await?;
        match self.files.read(&doc.file_path).await {
            Ok(data) => Ok((doc, data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                error!(document_id = %id, path = %doc.file_path, "Stored file is missing");
                Err(AppError::NotFound("Stored file not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reconciles work left behind by a previous process.
    ///
    /// Nothing can still be extracting a PROCESSING document at startup, so
    /// those are failed. PENDING documents never got picked up and are queued
    /// again.
    pub async fn recover_interrupted(&self) -> AppResult<RecoveryReport> {
        let mut report = RecoveryReport::default();

        let interrupted = ProcessingOutcome::Failed(INTERRUPTED_ERROR.to_string());
        for doc in self.documents.find_by_status(ProcessingStatus::Processing).await? {
            if self.documents.finish_processing(doc.id, &interrupted).await?.is_some() {
                warn!(document_id = %doc.id, "Marked interrupted document as failed");
                report.failed += 1;
            }
        }

        for doc in self.documents.find_by_status(ProcessingStatus::Pending).await? {
            self.schedule(doc.id);
            report.requeued += 1;
        }

        info!(
            failed = report.failed,
            requeued = report.requeued,
            "Startup recovery finished"
        );
        Ok(report)
    }

    fn schedule(&self, id: Uuid) {
        if let Err(e) = self.queue.enqueue(id) {
            error!(document_id = %id, "Failed to schedule processing: {}", e);
        }
    }
}

/// Client-reported MIME type, or a guess from the file name when the client
/// sent nothing useful.
fn resolve_file_type(reported: Option<&str>, file_name: &str) -> String {
    match reported.map(str::trim) {
        Some(mime) if !mime.is_empty() && mime != GENERIC_MIME => mime.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    use crate::db::MemoryStore;
    use crate::extraction::DefaultExtractor;
    use crate::models::Role;
    use crate::queue::{JobReceiver, Worker};
    use crate::storage::LocalFileStore;

    const MAX_UPLOAD: u64 = 64 * 1024;

    struct Fixture {
        manager: Arc<LifecycleManager>,
        store: MemoryStore,
        files: LocalFileStore,
        _dir: TempDir,
    }

    fn fixture_with(extractor: Arc<dyn Extractor>) -> (Fixture, JobReceiver) {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let files = LocalFileStore::new(dir.path().join("uploads"));
        let (queue, receiver) = ProcessingQueue::new();
        let manager = Arc::new(LifecycleManager::new(
            Arc::new(store.clone()),
            Arc::new(files.clone()),
            extractor,
            MAX_UPLOAD,
            queue,
        ));
        let fixture = Fixture {
            manager,
            store,
            files,
            _dir: dir,
        };
        (fixture, receiver)
    }

    /// Manager with a running worker.
    fn running() -> Fixture {
        let (fixture, receiver) = fixture_with(Arc::new(DefaultExtractor));
        Worker::new(Arc::clone(&fixture.manager), receiver, 2).spawn();
        fixture
    }

    fn user(role: Role) -> Caller {
        Caller {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            role,
        }
    }

    fn upload(file_name: &str) -> UploadMetadata {
        UploadMetadata {
            file_name: file_name.to_string(),
            ..Default::default()
        }
    }

    async fn wait_for_terminal(store: &MemoryStore, id: Uuid) -> Document {
        for _ in 0..500 {
            let doc = store.find_by_id(id).await.unwrap().unwrap();
            if doc.processing_status.is_terminal() {
                return doc;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("document {id} never reached a terminal state");
    }

    #[tokio::test]
    async fn test_upload_returns_pending_then_completes() {
        let fx = running();
        let alice = user(Role::User);

        let doc = fx
            .manager
            .create_document(
                &alice,
                UploadMetadata {
                    title: Some("Notes".to_string()),
                    description: Some("Meeting notes".to_string()),
                    file_name: "notes.txt".to_string(),
                    file_type: Some("text/plain".to_string()),
                },
                Bytes::from_static(b"first line\nsecond line"),
            )
            .await
            .unwrap();

        assert_eq!(doc.processing_status, ProcessingStatus::Pending);
        assert_eq!(doc.title, "Notes");
        assert_eq!(doc.user_id, alice.id);
        assert!(doc.file_path.ends_with(".txt"));
        assert!(doc.content.is_none());

        let done = wait_for_terminal(&fx.store, doc.id).await;
        assert_eq!(done.processing_status, ProcessingStatus::Completed);
        let content = done.content.unwrap();
        assert_eq!(content["text"], "first line\nsecond line");
        assert_eq!(content["metadata"]["lineCount"], 2);
        assert!(done.error.is_none());
        assert!(done.processed_at.is_some());
    }

    #[tokio::test]
    async fn test_report_scenario() {
        let fx = running();
        let alice = user(Role::User);
        let bob = user(Role::User);
        let admin = user(Role::Admin);

        let doc = fx
            .manager
            .create_document(&alice, upload("report.pdf"), Bytes::from(vec![7u8; 5000]))
            .await
            .unwrap();
        assert_eq!(doc.processing_status, ProcessingStatus::Pending);
        assert_eq!(doc.file_size, 5000);
        assert_eq!(doc.title, "report.pdf");
        assert_eq!(doc.file_type, "application/pdf");

        // Not a real PDF, but it must still end in a terminal state.
        let done = wait_for_terminal(&fx.store, doc.id).await;
        assert!(done.processing_status.is_terminal());

        let err = fx.manager.delete_document(doc.id, &bob).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_ok!(fx.manager.get_document(doc.id, &alice).await);

        fx.manager.delete_document(doc.id, &admin).await.unwrap();
        let err = fx.manager.get_document(doc.id, &alice).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_err!(fx.files.read(&doc.file_path).await);
    }

    #[tokio::test]
    async fn test_unsupported_extension_fails_without_content() {
        let fx = running();
        let alice = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("photo.png"), Bytes::from_static(b"\x89PNG...."))
            .await
            .unwrap();
        assert_eq!(doc.file_type, "image/png");

        let done = wait_for_terminal(&fx.store, doc.id).await;
        assert_eq!(done.processing_status, ProcessingStatus::Failed);
        assert!(done.content.is_none());
        assert!(done.error.unwrap().contains(".png"));
    }

    #[tokio::test]
    async fn test_oversize_and_empty_uploads_are_rejected() {
        let (fx, mut receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);

        let too_big = Bytes::from(vec![0u8; MAX_UPLOAD as usize + 1]);
        let err = fx
            .manager
            .create_document(&alice, upload("big.txt"), too_big)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = fx
            .manager
            .create_document(&alice, upload("empty.txt"), Bytes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(fx.store.find_all().await.unwrap().is_empty());
        assert!(receiver.try_recv().is_err());
        assert!(!fx.files.root().exists());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_update_or_delete() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);
        let mallory = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let patch = DocumentPatch {
            title: Some("Pwned".to_string()),
            description: None,
        };
        let err = fx
            .manager
            .update_metadata(doc.id, &mallory, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = fx.manager.delete_document(doc.id, &mallory).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let unchanged = fx.store.find_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "a.txt");
        assert_ok!(fx.files.read(&doc.file_path).await);
    }

    #[tokio::test]
    async fn test_update_metadata() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);
        let admin = user(Role::Admin);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let updated = fx
            .manager
            .update_metadata(
                doc.id,
                &alice,
                DocumentPatch {
                    title: Some("  Renamed  ".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.file_name, "a.txt");
        assert_eq!(updated.file_size, 5);

        let by_admin = fx
            .manager
            .update_metadata(
                doc.id,
                &admin,
                DocumentPatch {
                    title: None,
                    description: Some("Checked".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(by_admin.title, "Renamed");
        assert_eq!(by_admin.description.as_deref(), Some("Checked"));

        let empty = fx
            .manager
            .update_metadata(doc.id, &alice, DocumentPatch::default())
            .await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let blank = fx
            .manager
            .update_metadata(
                doc.id,
                &alice,
                DocumentPatch {
                    title: Some("   ".to_string()),
                    description: None,
                },
            )
            .await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let missing = fx
            .manager
            .update_metadata(
                Uuid::new_v4(),
                &alice,
                DocumentPatch {
                    title: Some("x".to_string()),
                    description: None,
                },
            )
            .await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();
        assert_ok!(fx.files.read(&doc.file_path).await);

        fx.manager.delete_document(doc.id, &alice).await.unwrap();
        assert!(fx.store.find_by_id(doc.id).await.unwrap().is_none());
        assert_err!(fx.files.read(&doc.file_path).await);

        let err = fx
            .manager
            .delete_document(Uuid::new_v4(), &alice)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_file() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();
        fx.files.delete(&doc.file_path).await.unwrap();

        assert_ok!(fx.manager.delete_document(doc.id, &alice).await);
        assert!(fx.store.find_by_id(doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_documents_scoped_by_role() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);
        let bob = user(Role::User);
        let admin = user(Role::Admin);

        for (caller, name) in [(&alice, "a1.txt"), (&alice, "a2.txt"), (&bob, "b1.txt")] {
            fx.manager
                .create_document(caller, upload(name), Bytes::from_static(b"x"))
                .await
                .unwrap();
        }

        assert_eq!(fx.manager.list_documents(&alice).await.unwrap().len(), 2);
        assert_eq!(fx.manager.list_documents(&bob).await.unwrap().len(), 1);
        assert_eq!(fx.manager.list_documents(&admin).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_read_file_is_guarded() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);
        let bob = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let (found, data) = fx.manager.read_file(doc.id, &alice).await.unwrap();
        assert_eq!(found.id, doc.id);
        assert_eq!(data, b"hello");

        let err = fx.manager.read_file(doc.id, &bob).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    struct CountingExtractor {
        calls: AtomicUsize,
    }

    impl Extractor for CountingExtractor {
        fn extract(
            &self,
            data: &[u8],
            _kind: FileKind,
        ) -> Result<ExtractedContent, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok(ExtractedContent {
                text: String::from_utf8_lossy(data).into_owned(),
                pages: Vec::new(),
                sections: Vec::new(),
                metadata: serde_json::json!({}),
            })
        }
    }

    #[tokio::test]
    async fn test_concurrent_triggers_process_once() {
        let extractor = Arc::new(CountingExtractor {
            calls: AtomicUsize::new(0),
        });
        let (fx, _receiver) = fixture_with(extractor.clone());
        let alice = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();

        let runs = (0..5).map(|_| fx.manager.process_document(doc.id));
        futures::future::join_all(runs).await;

        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
        let done = fx.store.find_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(done.processing_status, ProcessingStatus::Completed);

        // Terminal documents are left alone.
        fx.manager.process_document(doc.id).await;
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_stored_file_fails_processing() {
        let (fx, _receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);

        let doc = fx
            .manager
            .create_document(&alice, upload("a.txt"), Bytes::from_static(b"hello"))
            .await
            .unwrap();
        fx.files.delete(&doc.file_path).await.unwrap();

        fx.manager.process_document(doc.id).await;
        let done = fx.store.find_by_id(doc.id).await.unwrap().unwrap();
        assert_eq!(done.processing_status, ProcessingStatus::Failed);
        assert!(done.error.is_some());
    }

    #[tokio::test]
    async fn test_recovery_fails_stuck_and_requeues_pending() {
        let (fx, mut receiver) = fixture_with(Arc::new(DefaultExtractor));
        let alice = user(Role::User);

        let stuck = fx
            .manager
            .create_document(&alice, upload("stuck.txt"), Bytes::from_static(b"a"))
            .await
            .unwrap();
        let waiting = fx
            .manager
            .create_document(&alice, upload("waiting.txt"), Bytes::from_static(b"b"))
            .await
            .unwrap();
        // Drain the jobs queued at upload time.
        while receiver.try_recv().is_ok() {}

        fx.store.claim_for_processing(stuck.id).await.unwrap();

        let report = fx.manager.recover_interrupted().await.unwrap();
        assert_eq!(
            report,
            RecoveryReport {
                failed: 1,
                requeued: 1
            }
        );

        let failed = fx.store.find_by_id(stuck.id).await.unwrap().unwrap();
        assert_eq!(failed.processing_status, ProcessingStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some(INTERRUPTED_ERROR));

        let job = receiver.try_recv().unwrap();
        assert_eq!(job.document_id, waiting.id);
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_resolve_file_type() {
        assert_eq!(resolve_file_type(Some("text/markdown"), "a.md"), "text/markdown");
        assert_eq!(resolve_file_type(None, "a.pdf"), "application/pdf");
        assert_eq!(
            resolve_file_type(Some("application/octet-stream"), "a.txt"),
            "text/plain"
        );
        assert_eq!(resolve_file_type(Some(""), "blob"), GENERIC_MIME);
    }
}
