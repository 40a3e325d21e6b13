use serde::{Deserialize, Serialize};

use crate::entities::{algorithm_contents, algorithms, projects, uploaded_files};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error discriminant, e.g. "locked_out".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn error(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: Some(kind.into()),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_hours: i64,
}

#[derive(Debug, Serialize)]
pub struct AlgorithmDto {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub difficulty: Option<String>,
    pub summary: Option<String>,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<algorithms::Model> for AlgorithmDto {
    fn from(m: algorithms::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            category: m.category,
            difficulty: m.difficulty,
            summary: m.summary,
            body: m.body,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Full algorithm page: the entry plus its sections and attachments.
#[derive(Debug, Serialize)]
pub struct AlgorithmDetailDto {
    #[serde(flatten)]
    pub algorithm: AlgorithmDto,
    pub contents: Vec<ContentDto>,
    pub files: Vec<FileDto>,
}

#[derive(Debug, Serialize)]
pub struct ContentDto {
    pub id: i32,
    pub algorithm_id: i32,
    pub title: String,
    pub body: String,
    pub sort_index: i32,
}

impl From<algorithm_contents::Model> for ContentDto {
    fn from(m: algorithm_contents::Model) -> Self {
        Self {
            id: m.id,
            algorithm_id: m.algorithm_id,
            title: m.title,
            body: m.body,
            sort_index: m.sort_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDto {
    pub id: i32,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<projects::Model> for ProjectDto {
    fn from(m: projects::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            summary: m.summary,
            body: m.body,
            repo_url: m.repo_url,
            demo_url: m.demo_url,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailDto {
    #[serde(flatten)]
    pub project: ProjectDto,
    pub files: Vec<FileDto>,
}

#[derive(Debug, Serialize)]
pub struct FileDto {
    pub id: i32,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub algorithm_id: Option<i32>,
    pub project_id: Option<i32>,
    pub created_at: String,
}

impl From<uploaded_files::Model> for FileDto {
    fn from(m: uploaded_files::Model) -> Self {
        Self {
            id: m.id,
            original_name: m.original_name,
            mime_type: m.mime_type,
            size_bytes: m.size_bytes,
            algorithm_id: m.algorithm_id,
            project_id: m.project_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SystemStatusDto {
    pub version: String,
    pub uptime_seconds: u64,
    pub database_ok: bool,
    pub algorithm_count: u64,
    pub project_count: u64,
}
