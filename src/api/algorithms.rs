use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    AlgorithmDetailDto, AlgorithmDto, ApiError, ApiResponse, AppState, ContentDto, FileDto,
};
use crate::db::{AlgorithmInput, ContentInput};

#[derive(Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
}

#[derive(Deserialize)]
pub struct AlgorithmPayload {
    pub title: String,
    pub category: String,
    pub difficulty: Option<String>,
    pub summary: Option<String>,
    pub body: String,
}

impl AlgorithmPayload {
    fn validate(&self) -> Result<AlgorithmInput, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("Title is required"));
        }
        if self.category.trim().is_empty() {
            return Err(ApiError::validation("Category is required"));
        }

        Ok(AlgorithmInput {
            title: self.title.trim().to_string(),
            category: self.category.trim().to_string(),
            difficulty: self.difficulty.clone(),
            summary: self.summary.clone(),
            body: self.body.clone(),
        })
    }
}

#[derive(Deserialize)]
pub struct ContentPayload {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub sort_index: i32,
}

impl ContentPayload {
    fn validate(&self) -> Result<ContentInput, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("Title is required"));
        }

        Ok(ContentInput {
            title: self.title.trim().to_string(),
            body: self.body.clone(),
            sort_index: self.sort_index,
        })
    }
}

/// GET /algorithms
pub async fn list_algorithms(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<AlgorithmDto>>>, ApiError> {
    let algorithms = state
        .store()
        .list_algorithms(params.category.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(
        algorithms.into_iter().map(AlgorithmDto::from).collect(),
    )))
}

/// GET /algorithms/{id}
pub async fn get_algorithm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<AlgorithmDetailDto>>, ApiError> {
    let algorithm = state
        .store()
        .get_algorithm(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Algorithm", id))?;

    let contents = state.store().list_contents(id).await?;
    let files = state.store().list_files_for_algorithm(id).await?;

    Ok(Json(ApiResponse::success(AlgorithmDetailDto {
        algorithm: algorithm.into(),
        contents: contents.into_iter().map(ContentDto::from).collect(),
        files: files.into_iter().map(FileDto::from).collect(),
    })))
}

/// POST /algorithms
pub async fn create_algorithm(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AlgorithmPayload>,
) -> Result<Json<ApiResponse<AlgorithmDto>>, ApiError> {
    let input = payload.validate()?;
    let created = state.store().create_algorithm(&input).await?;

    tracing::info!(id = created.id, title = %created.title, "Algorithm created");

    Ok(Json(ApiResponse::success(created.into())))
}

/// PUT /algorithms/{id}
pub async fn update_algorithm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<AlgorithmPayload>,
) -> Result<Json<ApiResponse<AlgorithmDto>>, ApiError> {
    let input = payload.validate()?;

    let updated = state
        .store()
        .update_algorithm(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Algorithm", id))?;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /algorithms/{id}
///
/// Published bytes for attached uploads go first; the row delete then
/// cascades over contents and file records.
pub async fn remove_algorithm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let files = state.store().list_files_for_algorithm(id).await?;
    for file in files {
        if let Err(e) = state.shared.file_service.delete(&file.storage_name).await {
            tracing::warn!(
                file_id = file.id,
                storage_name = %file.storage_name,
                "Failed to remove bytes for attached file: {e}"
            );
        }
    }

    let removed = state.store().remove_algorithm(id).await?;
    if !removed {
        return Err(ApiError::not_found("Algorithm", id));
    }

    tracing::info!(id, "Algorithm removed");
    Ok(Json(ApiResponse::success(())))
}

/// GET /algorithms/{id}/contents
pub async fn list_contents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ContentDto>>>, ApiError> {
    state
        .store()
        .get_algorithm(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Algorithm", id))?;

    let contents = state.store().list_contents(id).await?;

    Ok(Json(ApiResponse::success(
        contents.into_iter().map(ContentDto::from).collect(),
    )))
}

/// POST /algorithms/{id}/contents
pub async fn create_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ContentPayload>,
) -> Result<Json<ApiResponse<ContentDto>>, ApiError> {
    let input = payload.validate()?;

    state
        .store()
        .get_algorithm(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Algorithm", id))?;

    let created = state.store().create_content(id, &input).await?;

    Ok(Json(ApiResponse::success(created.into())))
}

/// PUT /contents/{id}
pub async fn update_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ContentPayload>,
) -> Result<Json<ApiResponse<ContentDto>>, ApiError> {
    let input = payload.validate()?;

    let updated = state
        .store()
        .update_content(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Content section", id))?;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /contents/{id}
pub async fn remove_content(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let removed = state.store().remove_content(id).await?;
    if !removed {
        return Err(ApiError::not_found("Content section", id));
    }

    Ok(Json(ApiResponse::success(())))
}
