use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection}, DefaultBodyLimit, Multipart,
        State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use crate::middleware::AuthUser;
use crate::models::{
    AppState, Document, DocumentDetail, DocumentPatch, DocumentSummary, UploadMetadata,
};
use crate::types::{AppError, AppResult};

/// Room for multipart framing and the text fields next to the file.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let limit = body_limit(state.lifecycle.max_upload_size());

    Router::new()
        .route("/documents", get(list_documents).post(upload_document))
        .route("/documents/upload", post(upload_document))
        .route(
            "/documents/{id}",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route("/documents/{id}/file", get(download_file))
        .layer(DefaultBodyLimit::max(limit))
        .with_state(state)
}

fn body_limit(max_upload_size: u64) -> usize {
    usize::try_from(max_upload_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD)
}

async fn with_owner(state: &AppState, document: Document) -> AppResult<DocumentDetail> {
    let user = state
        .auth
        .owners(&[document.user_id])
        .await?
        .remove(&document.user_id);
    Ok(DocumentDetail { document, user })
}

async fn list_documents(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> AppResult<Json<Value>> {
    let documents = state.lifecycle.list_documents(&caller).await?;
    let owner_ids: Vec<Uuid> = documents.iter().map(|doc| doc.user_id).collect();
    let owners = state.auth.owners(&owner_ids).await?;

    let documents: Vec<DocumentSummary> = documents
        .into_iter()
        .map(|doc| {
            let user = owners.get(&doc.user_id).cloned();
            DocumentSummary {
                user,
                ..DocumentSummary::from(doc)
            }
        })
        .collect();

    if documents.is_empty() {
        return Ok(Json(json!({
            "documents": documents,
            "message": "No documents found",
        })));
    }
    Ok(Json(json!({ "documents": documents })))
}

async fn upload_document(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (metadata, data) = read_upload(multipart?).await?;
    debug!(
        user_id = %caller.id,
        file_name = %metadata.file_name,
        bytes = data.len(),
        "Upload received"
    );

    let document = state
        .lifecycle
        .create_document(&caller, metadata, data)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document uploaded successfully",
            "document": document,
        })),
    ))
}

async fn get_document(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    let document = state.lifecycle.get_document(id, &caller).await?;
    let document = with_owner(&state, document).await?;
    Ok(Json(json!({ "document": document })))
}

async fn update_document(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<DocumentPatch>,
) -> AppResult<Json<Value>> {
    let document = state.lifecycle.update_metadata(id, &caller, patch).await?;
    let document = with_owner(&state, document).await?;
    Ok(Json(json!({ "document": document })))
}

async fn delete_document(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Value>> {
    state.lifecycle.delete_document(id, &caller).await?;
    Ok(Json(json!({ "success": true })))
}

async fn download_file(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<impl IntoResponse> {
    let (document, data) = state.lifecycle.read_file(id, &caller).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        document.file_name.replace(['"', '\\', '\r', '\n'], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, document.file_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

/// Collects the `file`, `title` and `description` parts of an upload form.
async fn read_upload(mut multipart: Multipart) -> AppResult<(UploadMetadata, Bytes)> {
    let mut metadata = UploadMetadata::default();
    let mut data = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                metadata.file_name = field.file_name().unwrap_or_default().to_string();
                metadata.file_type = field.content_type().map(str::to_string);
                data = Some(field.bytes().await.map_err(multipart_error)?);
            }
            "title" => metadata.title = Some(field.text().await.map_err(multipart_error)?),
            "description" => {
                metadata.description = Some(field.text().await.map_err(multipart_error)?)
            }
            other => debug!(field = %other, "Ignoring unknown form field"),
        }
    }

    let data = data.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;
    Ok((metadata, data))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}
