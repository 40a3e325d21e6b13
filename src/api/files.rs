use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::services::ServeFile;

use super::{ApiError, ApiResponse, AppState, FileDto};
use crate::db::FileRecordInput;
use crate::services::FileError;

#[derive(Deserialize)]
pub struct UploadParams {
    pub name: String,
    pub algorithm_id: Option<i32>,
    pub project_id: Option<i32>,
}

/// POST /files?name=...&algorithm_id=... | &project_id=...
///
/// The raw request body is the payload; the Content-Type header is the
/// declared type. An upload belongs to at most one owner.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<ApiResponse<FileDto>>, ApiError> {
    if params.name.trim().is_empty() {
        return Err(ApiError::validation("File name is required"));
    }
    if params.algorithm_id.is_some() && params.project_id.is_some() {
        return Err(ApiError::validation(
            "A file can belong to an algorithm or a project, not both",
        ));
    }

    let declared_mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .ok_or_else(|| ApiError::validation("Content-Type header is required"))?;

    if let Some(algorithm_id) = params.algorithm_id {
        state
            .store()
            .get_algorithm(algorithm_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Algorithm", algorithm_id))?;
    }
    if let Some(project_id) = params.project_id {
        state
            .store()
            .get_project(project_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Project", project_id))?;
    }

    let stored = state
        .shared
        .file_service
        .store(&params.name, &declared_mime, body.into_data_stream())
        .await?;

    let input = FileRecordInput {
        storage_name: stored.storage_name.clone(),
        original_name: params.name.clone(),
        mime_type: declared_mime,
        size_bytes: stored.size_bytes,
        algorithm_id: params.algorithm_id,
        project_id: params.project_id,
    };

    // Keep disk and database consistent: a failed insert takes the
    // published bytes with it.
    let record = match state.store().insert_file(&input).await {
        Ok(record) => record,
        Err(e) => {
            state
                .shared
                .file_service
                .delete(&stored.storage_name)
                .await
                .ok();
            return Err(e.into());
        }
    };

    tracing::info!(
        id = record.id,
        name = %record.original_name,
        size_bytes = record.size_bytes,
        "File uploaded"
    );

    Ok(Json(ApiResponse::success(record.into())))
}

/// GET /files/{id}
///
/// Serves the stored bytes with the content type recorded at upload time,
/// honoring Range requests for partial content.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .store()
        .get_file(id)
        .await?
        .ok_or_else(|| ApiError::not_found("File", id))?;

    let path = state
        .shared
        .file_service
        .path_for(&record.storage_name)
        .await?;

    let mime = record
        .mime_type
        .parse::<mime_guess::mime::Mime>()
        .map_err(|_| ApiError::internal(format!("Stored content type is invalid: {id}")))?;

    let mut builder = axum::http::Request::builder();
    if let Some(range) = headers.get(header::RANGE) {
        builder = builder.header(header::RANGE, range);
    }
    let req = builder
        .body(Body::empty())
        .map_err(|e| ApiError::internal(format!("Failed to build request: {e}")))?;

    let mut response = ServeFile::new_with_mime(path, &mime)
        .try_call(req)
        .await
        .map_err(|e| ApiError::internal(format!("File read error: {e}")))?;

    if let Ok(disposition) = format!(
        "inline; filename=\"{}\"",
        record.original_name.replace(['"', '\\'], "_")
    )
    .parse()
    {
        response
            .headers_mut()
            .insert(header::CONTENT_DISPOSITION, disposition);
    }

    Ok(response)
}

/// DELETE /files/{id}
pub async fn remove_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let record = state
        .store()
        .get_file(id)
        .await?
        .ok_or_else(|| ApiError::not_found("File", id))?;

    state.store().remove_file(id).await?;

    match state.shared.file_service.delete(&record.storage_name).await {
        // Bytes already gone; the record was the last trace.
        Ok(()) | Err(FileError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!(id, name = %record.original_name, "File removed");
    Ok(Json(ApiResponse::success(())))
}
