//! File attachment routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State, rejection::QueryRejection},
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use bytes::Bytes;
use serde::Serialize;
use tether_core::files::{Attachment, UploadFileCommand};
use tether_core::storage::{SignedQuery, content_disposition};
use tether_shared::{AppError, FileId};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    AppState,
    error::ApiError,
    extractors::{Creator, Tenant},
};

/// Creates the file routes, mounted under `/api/files`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(upload_file))
        .route("/ping", get(ping))
        .route("/reference/{id}", get(list_attachments))
        .route("/{id}", delete(delete_file))
        .route("/download/{tenant}/{file_name}", get(download))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// An attachment as returned to clients.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// File id.
    #[serde(rename = "ID")]
    pub id: String,
    /// File name.
    #[serde(rename = "FileName")]
    pub file_name: String,
    /// Time-limited download URL.
    #[serde(rename = "Url")]
    pub url: String,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id.to_string(),
            file_name: attachment.file_name,
            url: attachment.url,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// File and reference ids must be UUIDs.
fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::validation(format!("'{raw}' is not a valid UUID")))
}

/// Canonical (lowercase, hyphenated) form under which references are stored.
fn reference_key(raw: &str) -> Result<String, ApiError> {
    parse_id::<Uuid>(raw).map(|id| id.to_string())
}

/// Last path component of a client-supplied file name.
fn base_name(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_string()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/ping`
async fn ping() -> &'static str {
    "Pong"
}

/// POST `/`
/// Multipart upload with fields `file` and `referenceObjectId`.
async fn upload_file(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Creator(creator_id): Creator,
    mut multipart: Multipart,
) -> Result<StatusCode, ApiError> {
    let mut reference_id: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!(error = %e, "Unreadable multipart body");
        ApiError::validation("corrupt file")
    })? {
        match field.name() {
            Some("referenceObjectId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|_| ApiError::validation("referenceObjectId is unreadable"))?;
                reference_id = Some(value);
            }
            Some("file") => {
                let name = field.file_name().map(base_name).unwrap_or_default();
                let content = field.bytes().await.map_err(|e| {
                    debug!(error = %e, "Unreadable file part");
                    ApiError::validation("corrupt file")
                })?;
                file = Some((name, content));
            }
            _ => {}
        }
    }

    let reference_id = reference_id
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::validation("referenceObjectId is empty"))?;
    let reference_id = reference_key(&reference_id)?;
    let (file_name, content) = file.ok_or_else(|| ApiError::validation("file is missing"))?;

    let command = UploadFileCommand {
        creator_id,
        file_name,
        reference_id,
        content: content.as_ref(),
    };

    let scope = state.request_scope();
    match state.files.upload_file(&tenant, command, scope.token()).await {
        Ok(record) => {
            info!(
                tenant = %tenant,
                file_id = %record.id,
                file_name = %record.file_name,
                "Upload accepted"
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            warn!(tenant = %tenant, error = %e, "Upload rejected");
            Err(e.into())
        }
    }
}

/// GET `/reference/{id}`
/// List attachments of a business object.
async fn list_attachments(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(id): Path<String>,
) -> Result<Json<Vec<AttachmentResponse>>, ApiError> {
    let reference_id = reference_key(&id)?;

    let scope = state.request_scope();
    let attachments = state
        .files
        .list_attachments(&tenant, &reference_id, scope.token())
        .await?;

    Ok(Json(
        attachments
            .into_iter()
            .map(AttachmentResponse::from)
            .collect(),
    ))
}

/// DELETE `/{id}`
async fn delete_file(
    State(state): State<AppState>,
    Tenant(tenant): Tenant,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let file_id: FileId = parse_id(&id)?;

    let scope = state.request_scope();
    state
        .files
        .delete_file(&tenant, file_id, scope.token())
        .await?;

    info!(tenant = %tenant, file_id = %file_id, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/download/{tenant}/{file_name}`
/// Serve a blob through a locally signed URL.
async fn download(
    State(state): State<AppState>,
    Path((tenant, file_name)): Path<(String, String)>,
    query: Result<Query<SignedQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Some(signer) = &state.signer else {
        return Err(AppError::NotFound("downloads are served by the storage provider".into()).into());
    };
    let Ok(Query(query)) = query else {
        return Err(AppError::Forbidden("signature is missing".into()).into());
    };

    signer
        .verify(&tenant, &file_name, &query)
        .map_err(|e| ApiError(AppError::Forbidden(e.to_string())))?;

    let scope = state.request_scope();
    let content = state
        .files
        .read_blob(&tenant, &file_name, scope.token())
        .await?;

    Ok((
        [
            (CONTENT_TYPE, query.content_type),
            (CONTENT_DISPOSITION, content_disposition(&file_name)),
        ],
        content,
    )
        .into_response())
}
