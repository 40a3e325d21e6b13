use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::uploaded_files;

/// Metadata recorded for a freshly published upload.
#[derive(Debug, Clone)]
pub struct FileRecordInput {
    pub storage_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub algorithm_id: Option<i32>,
    pub project_id: Option<i32>,
}

pub struct FileRepository {
    conn: DatabaseConnection,
}

impl FileRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&self, input: &FileRecordInput) -> Result<uploaded_files::Model> {
        let active = uploaded_files::ActiveModel {
            storage_name: Set(input.storage_name.clone()),
            original_name: Set(input.original_name.clone()),
            mime_type: Set(input.mime_type.clone()),
            size_bytes: Set(input.size_bytes),
            algorithm_id: Set(input.algorithm_id),
            project_id: Set(input.project_id),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        active
            .insert(&self.conn)
            .await
            .context("Failed to insert uploaded file record")
    }

    pub async fn get(&self, id: i32) -> Result<Option<uploaded_files::Model>> {
        uploaded_files::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query uploaded file")
    }

    pub async fn list_for_algorithm(&self, algorithm_id: i32) -> Result<Vec<uploaded_files::Model>> {
        uploaded_files::Entity::find()
            .filter(uploaded_files::Column::AlgorithmId.eq(algorithm_id))
            .all(&self.conn)
            .await
            .context("Failed to list files for algorithm")
    }

    pub async fn list_for_project(&self, project_id: i32) -> Result<Vec<uploaded_files::Model>> {
        uploaded_files::Entity::find()
            .filter(uploaded_files::Column::ProjectId.eq(project_id))
            .all(&self.conn)
            .await
            .context("Failed to list files for project")
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = uploaded_files::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete uploaded file record")?;

        Ok(result.rows_affected > 0)
    }
}
