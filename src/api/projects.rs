use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, FileDto, ProjectDetailDto, ProjectDto};
use crate::db::ProjectInput;

#[derive(Deserialize)]
pub struct ProjectPayload {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
}

impl ProjectPayload {
    fn validate(&self) -> Result<ProjectInput, ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::validation("Title is required"));
        }

        Ok(ProjectInput {
            title: self.title.trim().to_string(),
            summary: self.summary.clone(),
            body: self.body.clone(),
            repo_url: self.repo_url.clone(),
            demo_url: self.demo_url.clone(),
        })
    }
}

/// GET /projects
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProjectDto>>>, ApiError> {
    let projects = state.store().list_projects().await?;

    Ok(Json(ApiResponse::success(
        projects.into_iter().map(ProjectDto::from).collect(),
    )))
}

/// GET /projects/{id}
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProjectDetailDto>>, ApiError> {
    let project = state
        .store()
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project", id))?;

    let files = state.store().list_files_for_project(id).await?;

    Ok(Json(ApiResponse::success(ProjectDetailDto {
        project: project.into(),
        files: files.into_iter().map(FileDto::from).collect(),
    })))
}

/// POST /projects
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<ApiResponse<ProjectDto>>, ApiError> {
    let input = payload.validate()?;
    let created = state.store().create_project(&input).await?;

    tracing::info!(id = created.id, title = %created.title, "Project created");

    Ok(Json(ApiResponse::success(created.into())))
}

/// PUT /projects/{id}
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<ApiResponse<ProjectDto>>, ApiError> {
    let input = payload.validate()?;

    let updated = state
        .store()
        .update_project(id, &input)
        .await?
        .ok_or_else(|| ApiError::not_found("Project", id))?;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /projects/{id}
pub async fn remove_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let files = state.store().list_files_for_project(id).await?;
    for file in files {
        if let Err(e) = state.shared.file_service.delete(&file.storage_name).await {
            tracing::warn!(
                file_id = file.id,
                storage_name = %file.storage_name,
                "Failed to remove bytes for attached file: {e}"
            );
        }
    }

    let removed = state.store().remove_project(id).await?;
    if !removed {
        return Err(ApiError::not_found("Project", id));
    }

    tracing::info!(id, "Project removed");
    Ok(Json(ApiResponse::success(())))
}
