use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::info;

use crate::entities::projects;

#[derive(Debug, Clone)]
pub struct ProjectInput {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub repo_url: Option<String>,
    pub demo_url: Option<String>,
}

pub struct ProjectRepository {
    conn: DatabaseConnection,
}

impl ProjectRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: &ProjectInput) -> Result<projects::Model> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = projects::ActiveModel {
            title: Set(input.title.clone()),
            summary: Set(input.summary.clone()),
            body: Set(input.body.clone()),
            repo_url: Set(input.repo_url.clone()),
            demo_url: Set(input.demo_url.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert project")?;

        info!(id = model.id, title = %model.title, "Added project");
        Ok(model)
    }

    pub async fn get(&self, id: i32) -> Result<Option<projects::Model>> {
        projects::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query project")
    }

    pub async fn list(&self) -> Result<Vec<projects::Model>> {
        projects::Entity::find()
            .order_by_desc(projects::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list projects")
    }

    pub async fn update(&self, id: i32, input: &ProjectInput) -> Result<Option<projects::Model>> {
        let Some(existing) = self.get(id).await? else {
            return Ok(None);
        };

        let mut active: projects::ActiveModel = existing.into();
        active.title = Set(input.title.clone());
        active.summary = Set(input.summary.clone());
        active.body = Set(input.body.clone());
        active.repo_url = Set(input.repo_url.clone());
        active.demo_url = Set(input.demo_url.clone());
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update project")?;

        Ok(Some(model))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = projects::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        projects::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count projects")
    }
}
